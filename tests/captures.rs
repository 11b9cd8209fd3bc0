use pike_regex::{Regex, RegexBuilder};

const UNSET: usize = usize::MAX;

#[test]
fn group_slots() {
    assert_saves("(a*)b", "aaab", Some(4), &[0, 3]);
    assert_saves("(a)(b)(c)", "abc", Some(3), &[0, 1, 1, 2, 2, 3]);
    assert_saves("((a)b)", "ab", Some(2), &[0, 2, 0, 1]);
    assert_saves("(a)|(b)", "b", Some(1), &[UNSET, UNSET, 0, 1]);
    assert_saves("(a)|b", "b", Some(1), &[UNSET, UNSET]);
}

#[test]
fn repeated_group_keeps_last_iteration() {
    assert_saves("(a|b)*", "abba", Some(4), &[3, 4]);
    assert_saves("(ab)+c", "ababc", Some(5), &[2, 4]);
}

#[test]
fn priority_decides_captures() {
    // both alternatives match the same text; the left one wins
    assert_saves("(a)b|a(b)", "ab", Some(2), &[0, 1, UNSET, UNSET]);
    assert_saves("(a*)(a*)", "aaa", Some(3), &[0, 3, 3, 3]);
    assert_saves("(a*?)(a*)", "aaa", Some(3), &[0, 0, 0, 3]);
}

#[test]
fn captures_api() {
    let re = Regex::new(r"(\w+)-(\d+)?x").unwrap();
    let caps = re.captures("key-x").unwrap();
    assert_eq!(caps.len(), 3);
    assert_eq!(&caps[0], "key-x");
    assert_eq!(&caps[1], "key");
    assert!(caps.get(2).is_none());
    assert!(caps.get(3).is_none());
    assert_eq!(caps.substrings(), vec![Some("key"), None]);

    let all: Vec<Option<&str>> = caps.iter().map(|m| m.map(|m| m.as_str())).collect();
    assert_eq!(all, vec![Some("key-x"), Some("key"), None]);

    assert!(re.captures("-x").is_none());
}

#[test]
fn captures_at_scans() {
    let re = Regex::new(r"(\d+)\.(\d+)").unwrap();
    let text = "v1 and 10.25!";
    let caps = re.captures_at(text, 0).unwrap();
    assert_eq!(caps.get(0).unwrap().range(), 7..12);
    assert_eq!(&caps[1], "10");
    assert_eq!(&caps[2], "25");
    assert!(re.captures_at(text, 10).is_none());
}

#[test]
fn narrow_captures() {
    let re = RegexBuilder::new().build_bytes(b"(\xe9+)(.)").unwrap();
    let text = &b"\xe9\xe9z"[..];
    let caps = re.captures(text).unwrap();
    assert_eq!(&caps[1], &b"\xe9\xe9"[..]);
    assert_eq!(caps.get(2).unwrap().as_bytes(), b"z");
    assert_eq!(caps.substrings(), vec![Some(&b"\xe9\xe9"[..]), Some(&b"z"[..])]);
}

#[test]
#[should_panic(expected = "no group at index '2'")]
fn index_unmatched_group_panics() {
    let re = Regex::new("(a)|(b)").unwrap();
    let caps = re.captures("a").unwrap();
    let _ = &caps[2];
}

#[cfg_attr(feature = "track_caller", track_caller)]
fn assert_saves(re: &str, text: &str, len: Option<usize>, expected: &[usize]) {
    let regex = Regex::new(re).unwrap();
    let mut saves = Vec::new();
    assert_eq!(regex.exec_to(&mut saves, text), len, "pattern {re:?} on {text:?}");
    assert_eq!(saves, expected, "pattern {re:?} on {text:?}");
}
