// Copyright 2016 The Fancy Regex Authors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Assembly-like text form of a program.
//!
//! One instruction per line, indented by four spaces. Instructions that are the target of a
//! `jump` or `split` get a label line of their own, numbered in program order:
//!
//! ```text
//!     save 0
//! L1:
//!     split L2 L3
//! L2:
//!     char a
//!     jump L1
//! L3:
//!     save 1
//!     range a z 0 9
//!     match
//! ```
//!
//! When reading, `;` starts a comment, blank lines are ignored and a label may share its line
//! with the instruction it names. Character operands are written raw or as one of the escapes
//! `\n \r \t \v \f \\ \xHH \uHHHH`. Jump targets are label names, or plain instruction indices.

use std::collections::HashMap;
use std::fmt::{self, Write};
use std::str::FromStr;

use bit_set::BitSet;

use crate::vm::{Insn, Prog};
use crate::{DecodeError, DecodeErrorKind, Error, Result};

/// Render a program in its text form.
pub fn write(prog: &Prog) -> String {
    prog.to_string()
}

/// Decode the text form of a program.
pub fn read(text: &str) -> Result<Prog> {
    Reader::default().read(text)
}

fn write_prog(f: &mut impl Write, prog: &Prog) -> fmt::Result {
    let mut targets = BitSet::with_capacity(prog.len());
    for insn in &prog.body {
        match *insn {
            Insn::Jump(t) => {
                targets.insert(t);
            }
            Insn::Split(x, y) => {
                targets.insert(x);
                targets.insert(y);
            }
            _ => (),
        }
    }
    let labels: Vec<usize> = targets.iter().filter(|&t| t < prog.len()).collect();

    for (ix, insn) in prog.body.iter().enumerate() {
        if let Ok(n) = labels.binary_search(&ix) {
            writeln!(f, "L{}:", n + 1)?;
        }
        f.write_str("    ")?;
        match insn {
            Insn::Char(c) => {
                f.write_str("char ")?;
                write_char(f, *c)?;
            }
            Insn::Any => f.write_str("any")?,
            Insn::Range(ranges) | Insn::NRange(ranges) => {
                f.write_str(if matches!(insn, Insn::Range(_)) {
                    "range"
                } else {
                    "nrange"
                })?;
                for &(lo, hi) in ranges.iter() {
                    f.write_char(' ')?;
                    write_char(f, lo)?;
                    f.write_char(' ')?;
                    write_char(f, hi)?;
                }
            }
            Insn::Match => f.write_str("match")?,
            Insn::Jump(t) => {
                f.write_str("jump")?;
                write_target(f, &labels, *t)?;
            }
            Insn::Split(x, y) => {
                f.write_str("split")?;
                write_target(f, &labels, *x)?;
                write_target(f, &labels, *y)?;
            }
            Insn::Save(slot) => write!(f, "save {slot}")?,
        }
        f.write_char('\n')?;
    }
    Ok(())
}

fn write_target(f: &mut impl Write, labels: &[usize], t: usize) -> fmt::Result {
    match labels.binary_search(&t) {
        Ok(n) => write!(f, " L{}", n + 1),
        // no instruction to hang a label on
        Err(_) => write!(f, " {t}"),
    }
}

fn write_char(f: &mut impl Write, c: char) -> fmt::Result {
    match c {
        '\n' => f.write_str("\\n"),
        '\r' => f.write_str("\\r"),
        '\t' => f.write_str("\\t"),
        '\x0b' => f.write_str("\\v"),
        '\x0c' => f.write_str("\\f"),
        '\\' => f.write_str("\\\\"),
        c if c == ';' || c.is_whitespace() || c.is_control() => {
            if (c as u32) < 0x100 {
                write!(f, "\\x{:02x}", c as u32)
            } else {
                write!(f, "\\u{:04x}", c as u32)
            }
        }
        c => f.write_char(c),
    }
}

impl fmt::Display for Prog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_prog(f, self)
    }
}

impl FromStr for Prog {
    type Err = Error;

    fn from_str(s: &str) -> Result<Prog> {
        read(s)
    }
}

/// An instruction as it appears in the text, before labels are resolved.
struct Line<'a> {
    line: usize,
    opcode: &'a str,
    operands: Vec<&'a str>,
}

#[derive(Default)]
struct Reader<'a> {
    labels: HashMap<&'a str, usize>,
    lines: Vec<Line<'a>>,
}

fn fail(line: usize, kind: DecodeErrorKind) -> Error {
    DecodeError { line, kind }.into()
}

impl<'a> Reader<'a> {
    fn read(mut self, text: &'a str) -> Result<Prog> {
        // labels waiting for the next instruction, with the line they were defined on
        let mut pending: Vec<(&'a str, usize)> = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let code = raw.split(';').next().unwrap_or("");
            let mut tokens = code.split_whitespace().peekable();
            while let Some(label) = tokens
                .peek()
                .copied()
                .and_then(|tok| tok.strip_suffix(':'))
                .filter(|label| !label.is_empty())
            {
                tokens.next();
                if self.labels.contains_key(label) || pending.iter().any(|&(l, _)| l == label) {
                    return Err(fail(line, DecodeErrorKind::DuplicateLabel(label.to_string())));
                }
                pending.push((label, line));
            }
            let Some(opcode) = tokens.next() else {
                continue;
            };
            let ix = self.lines.len();
            for (label, _) in pending.drain(..) {
                self.labels.insert(label, ix);
            }
            self.lines.push(Line {
                line,
                opcode,
                operands: tokens.collect(),
            });
        }
        if let Some(&(label, line)) = pending.first() {
            return Err(fail(line, DecodeErrorKind::DanglingLabel(label.to_string())));
        }

        let body = self
            .lines
            .iter()
            .map(|line| self.decode(line))
            .collect::<Result<Vec<_>>>()?;
        Ok(Prog::new(body))
    }

    fn decode(&self, line: &Line<'a>) -> Result<Insn> {
        let Line {
            line: n,
            opcode,
            ref operands,
        } = *line;
        let arity = |name: &'static str, expected: &'static str, ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(fail(
                    n,
                    DecodeErrorKind::OperandCount {
                        opcode: name,
                        expected,
                        found: operands.len(),
                    },
                ))
            }
        };
        let insn = match opcode {
            "char" => {
                arity("char", "1", operands.len() == 1)?;
                Insn::Char(parse_char(n, operands[0])?)
            }
            "any" => {
                arity("any", "0", operands.is_empty())?;
                Insn::Any
            }
            "range" | "nrange" => {
                let name = if opcode == "range" { "range" } else { "nrange" };
                arity(name, "an even number of", operands.len() % 2 == 0)?;
                let ranges = operands
                    .chunks(2)
                    .map(|pair| -> Result<(char, char)> {
                        Ok((parse_char(n, pair[0])?, parse_char(n, pair[1])?))
                    })
                    .collect::<Result<Box<[_]>>>()?;
                if name == "range" {
                    Insn::Range(ranges)
                } else {
                    Insn::NRange(ranges)
                }
            }
            "match" => {
                arity("match", "0", operands.is_empty())?;
                Insn::Match
            }
            "jump" => {
                arity("jump", "1", operands.len() == 1)?;
                Insn::Jump(self.target(n, operands[0])?)
            }
            "split" => {
                arity("split", "2", operands.len() == 2)?;
                Insn::Split(self.target(n, operands[0])?, self.target(n, operands[1])?)
            }
            "save" => {
                arity("save", "1", operands.len() == 1)?;
                Insn::Save(parse_slot(n, operands[0])?)
            }
            _ => return Err(fail(n, DecodeErrorKind::UnknownOpcode(opcode.to_string()))),
        };
        Ok(insn)
    }

    fn target(&self, line: usize, tok: &str) -> Result<usize> {
        if let Some(&ix) = self.labels.get(tok) {
            return Ok(ix);
        }
        tok.parse()
            .map_err(|_| fail(line, DecodeErrorKind::UnknownLabel(tok.to_string())))
    }
}

/// Slot numbers are capped at `u32::MAX` so counting them can't overflow.
fn parse_slot(line: usize, tok: &str) -> Result<usize> {
    tok.parse::<u32>()
        .map(|slot| slot as usize)
        .map_err(|_| fail(line, DecodeErrorKind::InvalidNumber(tok.to_string())))
}

fn parse_char(line: usize, tok: &str) -> Result<char> {
    let invalid = || fail(line, DecodeErrorKind::InvalidChar(tok.to_string()));
    let mut chars = tok.chars();
    let first = chars.next().ok_or_else(invalid)?;
    let rest = chars.as_str();
    if first != '\\' || rest.is_empty() {
        return if rest.is_empty() { Ok(first) } else { Err(invalid()) };
    }
    let hex = |digits: &str, n: usize| {
        if digits.len() != n || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
    };
    let c = match rest {
        "n" => Some('\n'),
        "r" => Some('\r'),
        "t" => Some('\t'),
        "v" => Some('\x0b'),
        "f" => Some('\x0c'),
        "\\" => Some('\\'),
        _ => {
            if let Some(digits) = rest.strip_prefix('x') {
                hex(digits, 2)
            } else if let Some(digits) = rest.strip_prefix('u') {
                hex(digits, 4)
            } else {
                None
            }
        }
    };
    c.ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use matches::assert_matches;

    fn decode_err(text: &str) -> DecodeError {
        match read(text) {
            Err(Error::DecodeError(err)) => err,
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn write_format() {
        let prog = compile("(a|b)*c").unwrap();
        assert_eq!(
            write(&prog),
            "\
L1:
    split L2 L6
L2:
    save 0
    split L3 L4
L3:
    char a
    jump L5
L4:
    char b
L5:
    save 1
    jump L1
L6:
    char c
    match
"
        );
    }

    #[test]
    fn write_escapes() {
        let prog = Prog::new(vec![
            Insn::Char(' '),
            Insn::Char(';'),
            Insn::Char('\\'),
            Insn::Char('\n'),
            Insn::Range(vec![('\0', '\u{1f}'), ('\u{2028}', '\u{2029}'), ('é', 'é')].into()),
            Insn::Match,
        ]);
        assert_eq!(
            write(&prog),
            "    char \\x20\n    char \\x3b\n    char \\\\\n    char \\n\n    \
             range \\x00 \\x1f \\u2028 \\u2029 é é\n    match\n"
        );
    }

    #[test]
    fn read_with_comments_and_labels() {
        let text = "\
; a* by hand
start: split body end   ; loop
body:
    char a
    jump start

end: match
";
        let prog = read(text).unwrap();
        assert_eq!(
            prog.body,
            vec![
                Insn::Split(1, 3),
                Insn::Char('a'),
                Insn::Jump(0),
                Insn::Match
            ]
        );
    }

    #[test]
    fn read_escapes_and_indices() {
        let prog = read("char \\t\nchar \\x41\nnrange \\u00e9 \\u00ff\nsplit 0 4\nsave 3\n").unwrap();
        assert_eq!(
            prog.body,
            vec![
                Insn::Char('\t'),
                Insn::Char('A'),
                Insn::NRange(vec![('é', 'ÿ')].into()),
                Insn::Split(0, 4),
                Insn::Save(3),
            ]
        );
        assert_eq!(prog.n_saves(), 4);
    }

    #[test]
    fn round_trip() {
        for pattern in [
            "abc",
            "a*?b+c??",
            "(a|b|c)*d",
            r"[\w.-]+@[^ ;]+",
            r"((x)|\s)\D",
            "\\\\;[\t ]",
        ] {
            let prog = compile(pattern).unwrap();
            let text = prog.to_string();
            assert_eq!(text.parse::<Prog>().unwrap(), prog, "{pattern}\n{text}");
        }
    }

    #[test]
    fn errors() {
        assert_eq!(
            decode_err("  match\n  frob 1\n"),
            DecodeError {
                line: 2,
                kind: DecodeErrorKind::UnknownOpcode("frob".to_string())
            }
        );
        assert_matches!(
            decode_err("split L1\nL1: match").kind,
            DecodeErrorKind::OperandCount {
                opcode: "split",
                found: 1,
                ..
            }
        );
        assert_matches!(
            decode_err("range a b c").kind,
            DecodeErrorKind::OperandCount {
                opcode: "range",
                ..
            }
        );
        assert_eq!(
            decode_err("char ab").kind,
            DecodeErrorKind::InvalidChar("ab".to_string())
        );
        assert_eq!(
            decode_err("char \\x4").kind,
            DecodeErrorKind::InvalidChar("\\x4".to_string())
        );
        assert_eq!(
            decode_err("char \\q").kind,
            DecodeErrorKind::InvalidChar("\\q".to_string())
        );
        assert_eq!(
            decode_err("save -1").kind,
            DecodeErrorKind::InvalidNumber("-1".to_string())
        );
        assert_eq!(
            decode_err("save 18446744073709551615\nmatch").kind,
            DecodeErrorKind::InvalidNumber("18446744073709551615".to_string())
        );
        assert_eq!(
            decode_err("save 4294967296").kind,
            DecodeErrorKind::InvalidNumber("4294967296".to_string())
        );
        assert_eq!(
            read("save 4294967295\nmatch").unwrap().n_saves() as u64,
            1 << 32
        );
        assert_eq!(
            decode_err("jump nowhere\nmatch"),
            DecodeError {
                line: 1,
                kind: DecodeErrorKind::UnknownLabel("nowhere".to_string())
            }
        );
        assert_eq!(
            decode_err("a: match\na: match"),
            DecodeError {
                line: 2,
                kind: DecodeErrorKind::DuplicateLabel("a".to_string())
            }
        );
        assert_eq!(
            decode_err("match\nend:\n; nothing after\n"),
            DecodeError {
                line: 2,
                kind: DecodeErrorKind::DanglingLabel("end".to_string())
            }
        );
    }
}
