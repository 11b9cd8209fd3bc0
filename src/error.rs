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

use thiserror::Error;

use crate::lex::Sym;

/// Result type for this crate with specific error enum.
pub type Result<T> = ::std::result::Result<T, Error>;

/// An error as the result of parsing, compiling or decoding a regex.
///
/// Matching never fails, so there is no runtime variant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An error as a result of parsing a regex pattern, with the position where the error occurred
    #[error("Parsing error at position {0}: {1}")]
    ParseError(usize, ParseError),
    /// A regex pattern was parsed, but lowering it to a program failed
    #[error("Error compiling regex: {0}")]
    CompileError(#[from] CompileError),
    /// A textual program could not be decoded
    #[error("Error decoding program: {0}")]
    DecodeError(#[from] DecodeError),
}

/// An error for the result of parsing a regex pattern.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The parser met a token that no production accepts here
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the grammar would have accepted
        expected: &'static str,
        /// The symbol that was actually read
        found: Sym,
    },
    /// Escape sequence that is neither a literal nor a known class shorthand
    #[error("invalid escape: \\{0}")]
    InvalidEscape(char),
    /// Negated shorthands like `\W` cannot be merged into a bracket class
    #[error("negated class \\{0} is not allowed inside brackets")]
    NegatedClassInBrackets(char),
    /// Class range whose start is after its end, like `z-a`
    #[error("invalid class range {0:?}-{1:?}")]
    InvalidClassRange(char, char),
    /// Groups nested deeper than the given limit
    #[error("groups nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// An error as the result of compiling a parse tree into a program.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    /// The generated program has more instructions than the configured limit
    #[error("program of {size} instructions exceeds the size limit of {limit}")]
    TooLarge {
        /// Number of instructions generated
        size: usize,
        /// The configured limit
        limit: usize,
    },
    /// The program needs more capture slots than the size limit allows
    #[error("program uses {slots} capture slots, exceeding the size limit of {limit}")]
    TooManySlots {
        /// Number of capture slots the program writes
        slots: usize,
        /// The configured limit
        limit: usize,
    },
    /// A shorthand class letter has no range table
    #[error("unknown class shorthand \\{0}")]
    UnknownClass(char),
}

/// An error decoding the textual form of a program, with the 1-based line it occurred on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct DecodeError {
    /// Line of the input where decoding failed
    pub line: usize,
    /// What went wrong
    pub kind: DecodeErrorKind,
}

/// The different ways decoding a textual program can fail.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// Opcode keyword not recognized
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    /// Opcode given the wrong number of operands
    #[error("`{opcode}` takes {expected} operand(s), found {found}")]
    OperandCount {
        /// The opcode keyword
        opcode: &'static str,
        /// Expected operand count, as text (e.g. "an even number of")
        expected: &'static str,
        /// Operands present on the line
        found: usize,
    },
    /// Operand is not a valid character literal
    #[error("invalid character literal `{0}`")]
    InvalidChar(String),
    /// Operand is not a valid slot number, or is too large for one
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    /// Reference to a label that is never defined
    #[error("unknown label `{0}`")]
    UnknownLabel(String),
    /// Label defined twice
    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),
    /// Label that is not followed by any instruction
    #[error("label `{0}` does not precede an instruction")]
    DanglingLabel(String),
}
