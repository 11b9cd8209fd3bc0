//! Input abstraction shared by the lexer and the VM.
//!
//! Patterns and haystacks come in two encodings: wide text (`str`, one unit per code point) and
//! narrow text (`[u8]`, one unit per byte, read as the Latin-1 code point of the same value).
//! Offsets are always byte offsets into the underlying storage.

use std::ops::Range;

/// Text that can be lexed or matched one unit at a time.
pub trait Text {
    /// Decode the unit starting at byte offset `ix`, returning it with its width in bytes.
    ///
    /// Returns `None` at (or past) the end of the text.
    fn unit_at(&self, ix: usize) -> Option<(char, usize)>;

    /// The subtext covering the byte `range`.
    fn slice(&self, range: Range<usize>) -> &Self;
}

impl Text for str {
    #[inline]
    fn unit_at(&self, ix: usize) -> Option<(char, usize)> {
        let b = *self.as_bytes().get(ix)?;
        if b < 0x80 {
            return Some((char::from(b), 1));
        }
        let len = codepoint_len(b);
        self.get(ix..ix + len)
            .and_then(|s| s.chars().next())
            .map(|c| (c, len))
    }

    #[inline]
    fn slice(&self, range: Range<usize>) -> &str {
        &self[range]
    }
}

impl Text for [u8] {
    #[inline]
    fn unit_at(&self, ix: usize) -> Option<(char, usize)> {
        self.get(ix).map(|&b| (char::from(b), 1))
    }

    #[inline]
    fn slice(&self, range: Range<usize>) -> &[u8] {
        &self[range]
    }
}

#[inline]
pub(crate) fn codepoint_len(b: u8) -> usize {
    match b {
        b if b < 0x80 => 1,
        b if b < 0xe0 => 2,
        b if b < 0xf0 => 3,
        _ => 4,
    }
}

/// Offset of the unit following the one at `ix`, or `None` at the end of the text.
#[inline]
pub(crate) fn next_unit_ix<T: Text + ?Sized>(text: &T, ix: usize) -> Option<usize> {
    text.unit_at(ix).map(|(_, len)| ix + len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_units() {
        let s = "aé€😀";
        assert_eq!(s.unit_at(0), Some(('a', 1)));
        assert_eq!(s.unit_at(1), Some(('é', 2)));
        assert_eq!(s.unit_at(3), Some(('€', 3)));
        assert_eq!(s.unit_at(6), Some(('😀', 4)));
        assert_eq!(s.unit_at(10), None);
        assert_eq!(next_unit_ix(s, 1), Some(3));
        assert_eq!(next_unit_ix(s, 10), None);
    }

    #[test]
    fn narrow_units() {
        let b: &[u8] = b"a\xe9";
        assert_eq!(b.unit_at(0), Some(('a', 1)));
        assert_eq!(b.unit_at(1), Some(('\u{e9}', 1)));
        assert_eq!(b.unit_at(2), None);
        assert_eq!(b.slice(1..2), b"\xe9");
    }
}
