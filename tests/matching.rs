use pike_regex::{Error, ParseError, Regex, RegexBuilder};

#[test]
fn literals_match_exactly() {
    assert_match_len("abc", "abc", Some(3));
    assert_match_len("abc", "abcd", Some(3));
    assert_match_len("abc", "ab", None);
    assert_match_len("abc", "xabc", None);
    assert_match_len(r"a\.b", "a.b", Some(3));
    assert_match_len(r"a\.b", "axb", None);
}

#[test]
fn star_plus_question() {
    for n in 0..20 {
        let text = "a".repeat(n);
        assert_match_len("a*", &text, Some(n));
        assert_match_len("a+", &text, if n == 0 { None } else { Some(n) });
        assert_match_len("a?", &text, Some(n.min(1)));
    }
}

#[test]
fn lazy_quantifiers() {
    assert_match_len("a*?", "aaa", Some(0));
    assert_match_len("a+?", "aaa", Some(1));
    assert_match_len("a??", "aaa", Some(0));
    assert_match_len("a*?b", "aaab", Some(4));
    assert_match_len("(a|b)*?b", "aabab", Some(3));
}

#[test]
fn leftmost_first_alternation() {
    assert_match_len("a|ab", "ab", Some(1));
    assert_match_len("ab|a", "ab", Some(2));
    assert_match_len("(a|ab)(c|bcd)", "abcd", Some(4));
    assert_match_len("x*|y", "y", Some(0));
}

#[test]
fn classes() {
    for c in ["a", "b", "c"] {
        assert_match_len("[^abc]", c, None);
    }
    assert_match_len("[^abc]", "", None);
    assert_match_len("[^abc]", "d", Some(1));
    assert_match_len("[^abc]", "é", Some(2));
    assert_match_len("[a-cx-z]+", "abzyq", Some(4));
    assert_match_len("[-a]+", "-a-b", Some(3));
    assert_match_len("[a-]+", "a--", Some(3));
    assert_match_len("[(|)*]+", "(|)*x", Some(4));
}

#[test]
fn shorthands() {
    assert_match_len(r"\d+", "2024-01", Some(4));
    assert_match_len(r"\D+", "ab1", Some(2));
    assert_match_len(r"\w+", "foo_bar9 baz", Some(8));
    assert_match_len(r"\W", "_", None);
    assert_match_len(r"\s+", " \t\r\n\x0b\x0cx", Some(6));
    assert_match_len(r"\S", " ", None);
    assert_match_len(r"[\d\s]+", "1 2 3x", Some(5));
}

#[test]
fn escapes() {
    assert_match_len(r"\t\n", "\t\n", Some(2));
    assert_match_len(r"\0", "\0", Some(1));
    assert_match_len(r"\\", "\\", Some(1));
    assert_match_len("a\\", "a\\", Some(2));
    assert_match_len(r"\(\)\[\]\+\-\*\?\^\|\.", "()[]+-*?^|.", Some(11));
}

#[test]
fn bare_caret_and_hyphen_are_literals() {
    assert_match_len("^a", "^a", Some(2));
    assert_match_len("^a", "a", None);
    assert_match_len("a-b", "a-b", Some(3));
}

#[test]
fn dot_matches_whole_characters() {
    assert_match_len("..", "日本語", Some(6));
    assert_match_len("...", "日本", None);
}

#[test]
fn narrow_text() {
    let re = RegexBuilder::new().build_bytes(b"[\xe0-\xff]+.").unwrap();
    assert_eq!(re.match_len(&b"\xe9\xe8\x01"[..]), Some(3));
    assert_eq!(re.match_len(&b"a"[..]), None);

    // a wide pattern can run on narrow text and vice versa
    let re = Regex::new("caf\u{e9}").unwrap();
    assert_eq!(re.match_len(&b"caf\xe9"[..]), Some(4));
    let re = RegexBuilder::new().build_bytes(b"caf\xe9").unwrap();
    assert_eq!(re.match_len("café"), Some(5));
}

#[test]
fn find() {
    let re = Regex::new(r"\d+").unwrap();
    let m = re.find("abc 123 456").unwrap();
    assert_eq!((m.start(), m.end(), m.as_str()), (4, 7, "123"));
    let m = re.find_at("abc 123 456", 7).unwrap();
    assert_eq!(m.as_str(), "456");
    assert!(re.find("no digits").is_none());

    // empty match at the very end
    let re = Regex::new("x*").unwrap();
    let m = re.find_at("ab", 2).unwrap();
    assert!(m.is_empty());
    assert_eq!(m.range(), 2..2);

    let re = RegexBuilder::new().build_bytes(b"b+").unwrap();
    let m = re.find(&b"aabbc"[..]).unwrap();
    assert_eq!(m.as_bytes(), b"bb");
}

#[test]
fn parse_errors() {
    assert_parse_error("", 0);
    assert_parse_error("(ab", 3);
    assert_parse_error("ab)", 2);
    assert_parse_error("a||b", 2);
    assert_parse_error("*a", 0);
    assert_parse_error("a**", 2);
    assert_parse_error("[]", 1);
    assert_parse_error("[a", 2);
    assert_parse_error("[a-", 3);
    assert!(matches!(
        Regex::new(r"a\k"),
        Err(Error::ParseError(1, ParseError::InvalidEscape('k')))
    ));
    assert!(matches!(
        Regex::new(r"[a\D]"),
        Err(Error::ParseError(2, ParseError::NegatedClassInBrackets('D')))
    ));
}

#[test]
fn error_messages() {
    let err = Regex::new("(ab").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parsing error at position 3: expected `)`, found end of pattern"
    );
    let err = RegexBuilder::new().size_limit(1).build("ab").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error compiling regex: program of 3 instructions exceeds the size limit of 1"
    );
}

#[test]
fn long_patterns_compile() {
    let literal = "a".repeat(99_000);
    let re = Regex::new(literal.as_str()).unwrap();
    assert_eq!(re.prog().len(), 99_001);
    assert_eq!(re.match_len(literal.as_str()), Some(99_000));
    assert_eq!(re.match_len(&literal[1..]), None);

    let words: Vec<String> = (0..10_000).rev().map(|i| format!("w{i}")).collect();
    let re = Regex::new(words.join("|")).unwrap();
    assert_eq!(re.match_len("w9999"), Some(5));
    assert_eq!(re.match_len("w1000"), Some(5));
    assert_eq!(re.match_len("w5x"), Some(2));
    assert_eq!(re.match_len("x"), None);

    let re = Regex::new(format!("[{}z]", "a-c".repeat(30_000))).unwrap();
    assert_eq!(re.match_len("z"), Some(1));
    assert_eq!(re.match_len("d"), None);
}

#[test]
fn nesting_limit() {
    let nested = |depth: usize| format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
    let re = Regex::new(nested(250)).unwrap();
    assert_eq!(re.captures_len(), 251);
    assert_eq!(re.match_len("a"), Some(1));
    assert!(matches!(
        Regex::new(nested(251)),
        Err(Error::ParseError(250, ParseError::NestingTooDeep(250)))
    ));
    assert!(matches!(
        Regex::new("(".repeat(100_000)),
        Err(Error::ParseError(250, ParseError::NestingTooDeep(250)))
    ));
}

#[test]
fn agrees_with_regex_crate() {
    let patterns = [
        "a(b|c)*d",
        "(ab|a)(bc|c)?",
        "[a-c]+?c",
        "a*b*c*",
        "(a|b)+?(c|d)",
        "((a|b)c)+",
        "[^b]+b?",
        "ab|abc|a",
    ];
    let texts = [
        "", "a", "ab", "abc", "abcd", "acbd", "aabbcc", "cab", "abcbcd", "bbbc", "acacb",
    ];
    for pattern in patterns {
        let ours = Regex::new(pattern).unwrap();
        let theirs = regex::Regex::new(&format!("^(?:{pattern})")).unwrap();
        for text in texts {
            assert_eq!(
                ours.match_len(text),
                theirs.find(text).map(|m| m.end()),
                "pattern {pattern:?} on {text:?}"
            );
        }
    }
}

#[test]
fn shared_across_threads() {
    let re = std::sync::Arc::new(Regex::new("(a|b)*c").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let re = re.clone();
            std::thread::spawn(move || {
                let text = format!("{}c", "ab".repeat(i * 100));
                re.match_len(text.as_str())
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(i * 200 + 1));
    }
}

#[cfg_attr(feature = "track_caller", track_caller)]
fn assert_match_len(re: &str, text: &str, expected: Option<usize>) {
    let regex = Regex::new(re).unwrap();
    assert_eq!(
        regex.match_len(text),
        expected,
        "pattern {re:?} on {text:?}"
    );
    assert_eq!(regex.is_match(text), expected.is_some());
}

#[cfg_attr(feature = "track_caller", track_caller)]
fn assert_parse_error(re: &str, position: usize) {
    match Regex::new(re) {
        Err(Error::ParseError(pos, _)) => {
            assert_eq!(pos, position, "error position for {re:?}");
        }
        other => panic!("expected parse error for {re:?}, got {other:?}"),
    }
}
