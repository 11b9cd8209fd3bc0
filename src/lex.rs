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

//! Tokenizer for regex patterns.

use std::fmt;

use crate::text::Text;

/// Depth of the pushback buffer. The grammar needs a single token of pushback.
const PUSHBACK_DEPTH: usize = 4;

/// Kind of a token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sym {
    /// A literal character
    CharSym,
    /// An escape the lexer doesn't know, such as `\w`; the payload is the escaped letter
    Special,
    /// End of the pattern
    Eof,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `?`
    Question,
    /// `^`
    Caret,
    /// `|`
    Pipe,
    /// `.`
    Dot,
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sym::CharSym => "character",
            Sym::Special => "escape",
            Sym::Eof => "end of pattern",
            Sym::LParen => "`(`",
            Sym::RParen => "`)`",
            Sym::LBracket => "`[`",
            Sym::RBracket => "`]`",
            Sym::Plus => "`+`",
            Sym::Minus => "`-`",
            Sym::Star => "`*`",
            Sym::Question => "`?`",
            Sym::Caret => "`^`",
            Sym::Pipe => "`|`",
            Sym::Dot => "`.`",
        };
        f.write_str(s)
    }
}

/// A token read from a pattern.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub sym: Sym,
    /// The literal character, the escape letter for `Special`, or the operator itself.
    pub c: char,
    /// Byte offset of the token in the pattern.
    pub pos: usize,
}

impl Token {
    const fn eof(pos: usize) -> Token {
        Token {
            sym: Sym::Eof,
            c: '\0',
            pos,
        }
    }
}

pub(crate) struct Lexer<'a, T: Text + ?Sized> {
    input: &'a T,
    ix: usize,
    buf: [Token; PUSHBACK_DEPTH],
    nbuf: usize,
}

impl<'a, T: Text + ?Sized> Lexer<'a, T> {
    pub(crate) fn new(input: &'a T) -> Self {
        Lexer {
            input,
            ix: 0,
            buf: [Token::eof(0); PUSHBACK_DEPTH],
            nbuf: 0,
        }
    }

    /// Advance and return the next token, replaying pushed back tokens first.
    pub(crate) fn next_symbol(&mut self) -> Token {
        if self.nbuf > 0 {
            self.nbuf -= 1;
            self.buf[self.nbuf]
        } else {
            self.lex()
        }
    }

    /// Queue `tok` to be returned by the next call to [`Lexer::next_symbol`].
    ///
    /// # Panics
    ///
    /// Panics if more than `PUSHBACK_DEPTH` tokens are pending, which the grammar never needs.
    pub(crate) fn push_back(&mut self, tok: Token) {
        assert!(
            self.nbuf < PUSHBACK_DEPTH,
            "lexer pushback buffer overflow"
        );
        self.buf[self.nbuf] = tok;
        self.nbuf += 1;
    }

    fn lex(&mut self) -> Token {
        let pos = self.ix;
        let Some((c, len)) = self.input.unit_at(pos) else {
            return Token::eof(pos);
        };
        self.ix += len;
        let sym = match c {
            '(' => Sym::LParen,
            ')' => Sym::RParen,
            '[' => Sym::LBracket,
            ']' => Sym::RBracket,
            '+' => Sym::Plus,
            '-' => Sym::Minus,
            '*' => Sym::Star,
            '?' => Sym::Question,
            '^' => Sym::Caret,
            '|' => Sym::Pipe,
            '.' => Sym::Dot,
            '\\' => return self.lex_escape(pos),
            _ => Sym::CharSym,
        };
        Token { sym, c, pos }
    }

    fn lex_escape(&mut self, pos: usize) -> Token {
        let Some((c, len)) = self.input.unit_at(self.ix) else {
            // trailing backslash
            return Token {
                sym: Sym::CharSym,
                c: '\\',
                pos,
            };
        };
        self.ix += len;
        let (sym, c) = match c {
            'n' => (Sym::CharSym, '\n'),
            'r' => (Sym::CharSym, '\r'),
            't' => (Sym::CharSym, '\t'),
            'f' => (Sym::CharSym, '\x0c'),
            'v' => (Sym::CharSym, '\x0b'),
            '0' => (Sym::CharSym, '\0'),
            '(' | ')' | '[' | ']' | '+' | '-' | '*' | '?' | '^' | '|' | '.' | '\\' => {
                (Sym::CharSym, c)
            }
            _ => (Sym::Special, c),
        };
        Token { sym, c, pos }
    }
}
