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

/*!
A small regex engine built on Pike's algorithm: patterns are compiled to a bytecode program, which
a thread-list virtual machine runs against the input in time proportional to the program length
times the input length. There is no backtracking, so no pattern can take exponential time.

# Usage

Compile a regex once, then run it against any number of inputs. Execution is anchored at the
start of the input; [`Regex::find`] and friends scan forward for a match start.

## Example: Matching text

```rust
use pike_regex::Regex;

let re = Regex::new(r"(a|b)*c").unwrap();
assert!(re.is_match("abbac"));
assert!(!re.is_match("xabc"));
assert_eq!(re.match_len("abcab"), Some(3));
```

## Example: Capturing groups

```rust
use pike_regex::Regex;

let re = Regex::new(r"(\w+)@(\w+)\.com").unwrap();
let caps = re.captures("joe@example.com").unwrap();
assert_eq!(&caps[0], "joe@example.com");
assert_eq!(&caps[1], "joe");
assert_eq!(caps.get(2).unwrap().as_str(), "example");
```

## Example: Narrow input

Byte strings are matched one byte at a time, each byte read as the Latin-1 character of the same
value:

```rust
use pike_regex::RegexBuilder;

let re = RegexBuilder::new().build_bytes(b"caf\xe9+").unwrap();
assert_eq!(re.match_len(&b"caf\xe9\xe9!"[..]), Some(5));
```

## Example: Programs as text

```rust
use pike_regex::{asm, Regex};

let re = Regex::new("ab*").unwrap();
let text = asm::write(re.prog());
assert_eq!(text, "    char a\nL1:\n    split L2 L3\nL2:\n    char b\n    jump L1\nL3:\n    match\n");
assert_eq!(asm::read(&text).unwrap(), *re.prog());
```

# Syntax

`a`
: literal character \
`.`
: any character \
`[abc]`, `[a-z]`, `[^a-z]`
: character class, negated class; operators are literals inside brackets and a `-` before `]` is
  a literal hyphen \
`\s`, `\w`, `\d`
: whitespace (`\t` to `\r` and space), word character (`[a-zA-Z0-9_]`), digit (`[0-9]`); the
  uppercase forms are the negations, which can't be used inside brackets \
`\n`, `\r`, `\t`, `\f`, `\v`, `\0`
: control characters; any operator can be escaped to match it literally \
`(exp)`
: capture group \
`x|y`
: alternation, preferring the left side \
`x*`, `x+`, `x?`
: greedy repetition \
`x*?`, `x+?`, `x??`
: lazy repetition

A `^` or `-` outside brackets is a literal character.
*/

#![doc(html_root_url = "https://docs.rs/pike-regex/0.1.0")]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

use regex_automata::util::pool::{Pool, PoolGuard};
use std::iter::FusedIterator;
use std::ops::{Index, Range};
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

use log::debug;

pub mod asm;
mod compile;
mod error;
mod lex;
mod parse;
mod text;
mod vm;

use crate::compile::{compile_with_options, DEFAULT_SIZE_LIMIT};
use crate::text::next_unit_ix;
use crate::vm::{Machine, Session, OPTION_TRACE, UNSET};

pub use crate::error::{
    CompileError, DecodeError, DecodeErrorKind, Error, ParseError, Result,
};
pub use crate::lex::Sym;
pub use crate::text::Text;
pub use crate::vm::{Insn, Prog};

type SessionPool =
    Pool<Session, Box<dyn Fn() -> Session + Send + Sync + UnwindSafe + RefUnwindSafe>>;
type SavesPool = Pool<Vec<usize>, fn() -> Vec<usize>>;

// the public API

/// A compiled regular expression.
#[derive(Debug)]
pub struct Regex {
    pattern: Option<Arc<String>>,
    machine: Machine,
    session: SessionPool,
    saves: SavesPool,
}

impl Regex {
    /// Parse and compile a regex with default options, see [`RegexBuilder`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the pattern could not be parsed or compiled.
    #[inline]
    pub fn new(re: impl Into<String>) -> Result<Regex> {
        RegexBuilder::new().build(re)
    }

    fn new_with_source_and_options(source: RegexSource, options: RegexOptions) -> Result<Regex> {
        let (prog, pattern) = match source {
            RegexSource::Pattern(pattern) => {
                (compile_with_options(pattern.as_str(), &options)?, Some(pattern))
            }
            RegexSource::Bytes(bytes) => {
                let prog = compile_with_options(bytes.as_slice(), &options)?;
                (prog, Some(bytes.iter().map(|&b| char::from(b)).collect()))
            }
            RegexSource::Prog(prog) => {
                if prog.len() > options.size_limit {
                    return Err(CompileError::TooLarge {
                        size: prog.len(),
                        limit: options.size_limit,
                    }
                    .into());
                }
                if prog.n_saves() > options.size_limit {
                    return Err(CompileError::TooManySlots {
                        slots: prog.n_saves(),
                        limit: options.size_limit,
                    }
                    .into());
                }
                debug!("loaded program: {} instructions", prog.len());
                (prog, None)
            }
        };
        let vm_options = if options.trace { OPTION_TRACE } else { 0 };
        let machine = Machine::new(Arc::new(prog), vm_options);
        Ok(Regex {
            pattern: pattern.map(Arc::new),
            machine: machine.clone(),
            session: new_session_pool(machine),
            saves: new_saves_pool(),
        })
    }

    /// Returns the pattern this regex was compiled from, or `None` if it was built from a
    /// program with [`RegexBuilder::build_from_prog()`].
    ///
    /// A byte pattern is returned with each byte decoded as its Latin-1 character.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        self.pattern.as_ref().map(|p| p.as_str())
    }

    /// Returns the compiled program.
    #[must_use]
    #[inline]
    pub fn prog(&self) -> &Prog {
        &self.machine.prog
    }

    /// Check if the regex matches at the start of the input text.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use pike_regex::Regex;
    /// let re = Regex::new(r"\d+-\d+").unwrap();
    /// assert!(re.is_match("2018-04 and later"));
    /// assert!(!re.is_match("since 2018-04"));
    /// ```
    #[inline]
    pub fn is_match<T: Text + ?Sized>(&self, text: &T) -> bool {
        self.match_len(text).is_some()
    }

    /// Returns the length in bytes of the match at the start of `text`, or `None` if there is no
    /// match there.
    ///
    /// Alternatives are tried left to right and the first one that leads to a match wins, so
    /// `a|ab` matches one byte of `"ab"`.
    #[inline]
    pub fn match_len<T: Text + ?Sized>(&self, text: &T) -> Option<usize> {
        let mut saves = self.saves.get();
        self.session.get().run_to(&mut saves, text, 0)
    }

    /// Run the regex at the start of `text`, writing the raw capture slots into `saves`.
    ///
    /// Slots come in (start, end) pairs, one pair per group in order of the opening parenthesis.
    /// Slots of groups that did not participate hold `usize::MAX`. Returns the match length, and
    /// leaves `saves` untouched if there is no match.
    #[inline]
    pub fn exec_to<T: Text + ?Sized>(&self, saves: &mut Vec<usize>, text: &T) -> Option<usize> {
        self.session.get().run_to(saves, text, 0)
    }

    /// Returns the capture groups for the match at the start of `text`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use pike_regex::Regex;
    /// let re = Regex::new(r"(\d+)-(\d+)?").unwrap();
    /// let caps = re.captures("2018-").unwrap();
    /// assert_eq!(caps.get(1).unwrap().as_str(), "2018");
    /// assert!(caps.get(2).is_none());
    /// ```
    #[inline]
    pub fn captures<'r, 't, T: Text + ?Sized>(&'r self, text: &'t T) -> Option<Captures<'r, 't, T>> {
        let mut saves = self.saves.get();
        let end = self.session.get().run_to(&mut saves, text, 0)?;
        Some(Captures {
            text,
            start: 0,
            end,
            saves,
        })
    }

    /// Find the first match in the input text, trying each start position in turn.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use pike_regex::Regex;
    /// let re = Regex::new(r"\d+").unwrap();
    /// let m = re.find("in 2018 and 2020").unwrap();
    /// assert_eq!(m.range(), 3..7);
    /// ```
    #[inline]
    pub fn find<'t, T: Text + ?Sized>(&self, text: &'t T) -> Option<Match<'t, T>> {
        self.find_at(text, 0)
    }

    /// Returns the first match in `text` starting at or after byte position `pos`.
    ///
    /// `pos` must be on a character boundary of `text`.
    #[inline]
    pub fn find_at<'t, T: Text + ?Sized>(&self, text: &'t T, pos: usize) -> Option<Match<'t, T>> {
        let mut saves = self.saves.get();
        let (start, end) = self.scan(&mut saves, text, pos)?;
        Some(Match { text, start, end })
    }

    /// Returns the capture groups for the first match in `text` starting at or after byte
    /// position `pos`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use pike_regex::Regex;
    /// let re = Regex::new(r"(\w+)=(\d+)").unwrap();
    /// let text = "a=1, bc=22";
    /// let caps = re.captures_at(text, 3).unwrap();
    /// assert_eq!(&caps[1], "bc");
    /// assert_eq!(caps.get(2).unwrap().range(), 8..10);
    /// ```
    #[inline]
    pub fn captures_at<'r, 't, T: Text + ?Sized>(
        &'r self,
        text: &'t T,
        pos: usize,
    ) -> Option<Captures<'r, 't, T>> {
        let mut saves = self.saves.get();
        let (start, end) = self.scan(&mut saves, text, pos)?;
        Some(Captures {
            text,
            start,
            end,
            saves,
        })
    }

    fn scan<T: Text + ?Sized>(
        &self,
        saves: &mut Vec<usize>,
        text: &T,
        pos: usize,
    ) -> Option<(usize, usize)> {
        let mut session = self.session.get();
        let mut start = pos;
        loop {
            if let Some(end) = session.run_to(saves, text, start) {
                return Some((start, end));
            }
            start = next_unit_ix(text, start)?;
        }
    }

    /// Returns the number of captures, including the implicit capture of the entire match.
    #[must_use]
    #[inline]
    pub fn captures_len(&self) -> usize {
        self.machine.prog.n_saves() / 2 + 1
    }

    // for debugging only
    #[cfg(debug_assertions)]
    #[doc(hidden)]
    pub fn debug_print(&self) {
        self.machine.debug_print();
    }
}

fn new_saves_pool() -> SavesPool {
    Pool::new(Vec::default)
}

fn new_session_pool(machine: Machine) -> SessionPool {
    Pool::new(Box::new(move || {
        let state = Machine::create_state(&machine.prog);

        machine.clone().create_session(state)
    }))
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        let machine = self.machine.clone();
        Regex {
            pattern: self.pattern.clone(),
            machine: machine.clone(),
            session: new_session_pool(machine),
            saves: new_saves_pool(),
        }
    }
}

impl FromStr for Regex {
    type Err = Error;

    /// Attempts to parse a string into a regular expression
    fn from_str(s: &str) -> Result<Regex> {
        Regex::new(s)
    }
}

#[derive(Clone, Debug)]
enum RegexSource {
    Pattern(String),
    Bytes(Vec<u8>),
    Prog(Prog),
}

#[derive(Copy, Clone, Debug)]
struct RegexOptions {
    size_limit: usize,
    trace: bool,
}

impl Default for RegexOptions {
    fn default() -> Self {
        RegexOptions {
            size_limit: DEFAULT_SIZE_LIMIT,
            trace: false,
        }
    }
}

/// A builder for a `Regex` to allow configuring options.
#[derive(Debug, Copy, Clone, Default)]
pub struct RegexBuilder(RegexOptions);

impl RegexBuilder {
    /// Create a new regex builder with default options.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [`Regex`] from a pattern matched one code point at a time.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the pattern could not be parsed or compiled.
    #[inline]
    pub fn build(&self, pattern: impl Into<String>) -> Result<Regex> {
        Regex::new_with_source_and_options(RegexSource::Pattern(pattern.into()), self.0)
    }

    /// Build the [`Regex`] from a byte pattern, each byte being the Latin-1 character of the
    /// same value.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the pattern could not be parsed or compiled.
    #[inline]
    pub fn build_bytes(&self, pattern: impl AsRef<[u8]>) -> Result<Regex> {
        Regex::new_with_source_and_options(
            RegexSource::Bytes(pattern.as_ref().to_vec()),
            self.0,
        )
    }

    /// Build the [`Regex`] from an already compiled program, for example one decoded with
    /// [`asm::read()`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error::CompileError`] if the program has more instructions or capture slots
    /// than the size limit.
    #[inline]
    pub fn build_from_prog(&self, prog: Prog) -> Result<Regex> {
        Regex::new_with_source_and_options(RegexSource::Prog(prog), self.0)
    }

    /// Limit the number of instructions of the compiled program. Patterns that compile to a
    /// larger program fail with [`CompileError::TooLarge`]. Programs passed to
    /// [`build_from_prog()`](Self::build_from_prog) are also limited to as many capture slots,
    /// failing with [`CompileError::TooManySlots`].
    ///
    /// Default is `100_000`.
    #[inline]
    pub fn size_limit(&mut self, limit: usize) -> &mut Self {
        self.0.size_limit = limit;
        self
    }

    /// Log every step of the virtual machine at trace level. Meant for debugging patterns.
    ///
    /// Default is `false`.
    #[inline]
    pub fn trace(&mut self, trace: bool) -> &mut Self {
        self.0.trace = trace;
        self
    }
}

/// A single match of a regex or group in an input text
#[derive(Debug, PartialEq, Eq)]
pub struct Match<'t, T: ?Sized = str> {
    text: &'t T,
    start: usize,
    end: usize,
}

impl<'t, T: ?Sized> Clone for Match<'t, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'t, T: ?Sized> Copy for Match<'t, T> {}

impl<'t, T: Text + ?Sized> Match<'t, T> {
    /// Returns the starting byte offset of the match in the text.
    #[must_use]
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the ending byte offset of the match in the text.
    #[must_use]
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the range over the starting and ending byte offsets of the match in text.
    #[must_use]
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns the matched part of the text.
    #[must_use]
    #[inline]
    pub fn as_text(&self) -> &'t T {
        self.text.slice(self.range())
    }

    /// Returns the length, in bytes, of this match.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.range().len()
    }

    /// Returns true if and only if this match has a length of zero.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range().is_empty()
    }
}

impl<'t> Match<'t, str> {
    /// Returns the matched text.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &'t str {
        &self.text[self.start..self.end]
    }
}

impl<'t> Match<'t, [u8]> {
    /// Returns the matched bytes.
    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &'t [u8] {
        &self.text[self.start..self.end]
    }
}

impl<'t, T: Text + ?Sized> From<Match<'t, T>> for Range<usize> {
    fn from(m: Match<'t, T>) -> Range<usize> {
        m.range()
    }
}

/// A set of capture groups found for a regex.
///
/// Group 0 is the whole match; group `i` is the `i`-th parenthesis of the pattern.
#[derive(Debug)]
pub struct Captures<'r, 't, T: ?Sized = str> {
    text: &'t T,
    start: usize,
    end: usize,
    saves: PoolGuard<'r, Vec<usize>, fn() -> Vec<usize>>,
}

#[allow(clippy::len_without_is_empty)] // there is always the whole match
impl<'r, 't, T: Text + ?Sized> Captures<'r, 't, T> {
    /// Get the capture group by its index in the regex.
    ///
    /// If there is no match for that group or the index does not correspond to a group, `None` is
    /// returned. The index 0 returns the whole match.
    #[must_use]
    #[inline]
    pub fn get(&self, i: usize) -> Option<Match<'t, T>> {
        if i == 0 {
            return Some(Match {
                text: self.text,
                start: self.start,
                end: self.end,
            });
        }
        let slot = (i - 1).saturating_mul(2);
        let lo = *self.saves.get(slot)?;
        if lo == UNSET {
            return None;
        }
        Some(Match {
            text: self.text,
            start: lo,
            end: self.saves[slot + 1],
        })
    }

    /// The text of every group, in order, without the whole match. Groups that did not
    /// participate in the match are `None`.
    #[must_use]
    pub fn substrings(&self) -> Vec<Option<&'t T>> {
        (1..self.len())
            .map(|i| self.get(i).map(|m| m.as_text()))
            .collect()
    }

    /// Iterate over the captured groups in order in which they appeared in the regex. The first
    /// capture corresponds to the whole match.
    #[must_use]
    #[inline]
    pub fn iter<'c>(&'c self) -> SubCaptureMatches<'c, 'r, 't, T> {
        SubCaptureMatches {
            caps: self,
            groups: 0..self.len(),
        }
    }

    /// How many groups were captured. This is always at least 1 because group 0 returns the whole
    /// match.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.saves.len() / 2 + 1
    }
}

impl<'r, 't, 'c, T: Text + ?Sized> IntoIterator for &'c Captures<'r, 't, T> {
    type IntoIter = SubCaptureMatches<'c, 'r, 't, T>;
    type Item = Option<Match<'t, T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Get a group by index.
///
/// The text can't outlive the `Captures` object if this method is
/// used, because of how `Index` is defined (normally `a[i]` is part
/// of `a` and can't outlive it); to do that, use `get()` instead.
///
/// # Panics
///
/// If there is no group at the given index, or it did not participate in the match.
impl<'r, 't, T: Text + ?Sized> Index<usize> for Captures<'r, 't, T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        self.get(i)
            .map_or_else(|| panic!("no group at index '{i}'"), |m| m.as_text())
    }
}

/// Iterator for captured groups in order in which they appear in the regex.
#[derive(Debug)]
pub struct SubCaptureMatches<'c, 'r, 't, T: ?Sized> {
    caps: &'c Captures<'r, 't, T>,
    groups: Range<usize>,
}

impl<'c, 'r, 't, T: Text + ?Sized> Iterator for SubCaptureMatches<'c, 'r, 't, T> {
    type Item = Option<Match<'t, T>>;

    fn next(&mut self) -> Option<Option<Match<'t, T>>> {
        self.groups.next().map(|i| self.caps.get(i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.groups.size_hint()
    }
}

impl<'c, 'r, 't, T: Text + ?Sized> DoubleEndedIterator for SubCaptureMatches<'c, 'r, 't, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.groups.next_back().map(|i| self.caps.get(i))
    }
}

impl<'c, 'r, 't, T: Text + ?Sized> ExactSizeIterator for SubCaptureMatches<'c, 'r, 't, T> {}

impl<'c, 'r, 't, T: Text + ?Sized> FusedIterator for SubCaptureMatches<'c, 'r, 't, T> {}

/// The internal module only exists so that tests and benchmarks can access internals for
/// debugging and experimenting.
#[doc(hidden)]
pub mod internal {
    pub use crate::compile::compile;
    pub use crate::vm::{run_default, run_trace, Insn, Prog};
}
