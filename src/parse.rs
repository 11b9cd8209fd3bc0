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

//! A recursive descent parser for regex patterns.
//!
//! The grammar, one function per nonterminal:
//!
//! ```text
//! REGEX  := SUB ('|' REGEX)?
//! SUB    := EXPR SUB?
//! EXPR   := TERM (('*'|'+'|'?') '?'?)?
//! TERM   := CharSym | Caret | Minus | Dot | Special
//!         | '(' REGEX ')'
//!         | '[' CLASS ']' | '[' '^' CLASS ']'
//! CLASS  := char '-' char CLASS?  |  char CLASS?
//! ```
//!
//! Every node records which alternative produced it in `production`, numbered from 1 in the order
//! the alternatives are listed in the docs of [`TreeKind`]. The code generator dispatches on it.
//!
//! The right-recursive rules (`REGEX`, `SUB`, `CLASS`) are read with loops and the nested nodes
//! are built afterwards, so only group nesting uses the native stack. It is capped at
//! [`NEST_LIMIT`].

use crate::compile::shorthand;
use crate::lex::{Lexer, Sym, Token};
use crate::text::Text;
use crate::{Error, ParseError, Result};

/// Maximum depth of nested groups.
pub(crate) const NEST_LIMIT: usize = 250;

/// Nonterminal of a parse tree node, or `Leaf` for a token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TreeKind {
    /// 1: bare token, 2: `( REGEX )`, 3: `[ CLASS ]`, 4: `[ ^ CLASS ]`
    Term,
    /// 1: `TERM *`, 2: `TERM +`, 3: `TERM ?`, 4: `TERM`; a non-greedy `?` is an extra leaf
    Expr,
    /// 1: `SUB | REGEX`, 2: `SUB`
    Regex,
    /// 1: `char - char CLASS`, 2: `char - char`, 3: `char CLASS`, 4: `char`
    Class,
    /// 1: `EXPR SUB`, 2: `EXPR`
    Sub,
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tree {
    pub kind: TreeKind,
    pub production: u8,
    pub tok: Option<Token>,
    pub children: Vec<Tree>,
}

impl Tree {
    fn leaf(tok: Token) -> Tree {
        Tree {
            kind: TreeKind::Leaf,
            production: 0,
            tok: Some(tok),
            children: Vec::new(),
        }
    }

    fn node(kind: TreeKind, production: u8, children: Vec<Tree>) -> Tree {
        debug_assert!(children.len() <= 4);
        Tree {
            kind,
            production,
            tok: None,
            children,
        }
    }

    /// The token of a leaf. Only valid on `Leaf` nodes.
    pub(crate) fn token(&self) -> Token {
        self.tok.expect("token() called on an inner node")
    }
}

// Long concatenations nest as deep as they are long, so tear down without recursing.
impl Drop for Tree {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// One `CLASS` item: a character, or a range with its `-` token.
type ClassItem = (Token, Option<(Token, Token)>);

struct Parser<'a, T: Text + ?Sized> {
    lexer: Lexer<'a, T>,
    depth: usize,
}

/// Parse a pattern into a tree. The whole pattern must be consumed.
pub(crate) fn parse<T: Text + ?Sized>(pattern: &T) -> Result<Tree> {
    let mut parser = Parser {
        lexer: Lexer::new(pattern),
        depth: 0,
    };
    let tree = parser.regex()?;
    parser.expect(Sym::Eof, "end of pattern")?;
    Ok(tree)
}

fn unexpected(tok: Token, expected: &'static str) -> Error {
    Error::ParseError(
        tok.pos,
        ParseError::UnexpectedToken {
            expected,
            found: tok.sym,
        },
    )
}

fn starts_term(sym: Sym) -> bool {
    matches!(
        sym,
        Sym::CharSym
            | Sym::Caret
            | Sym::Minus
            | Sym::Dot
            | Sym::Special
            | Sym::LParen
            | Sym::LBracket
    )
}

impl<'a, T: Text + ?Sized> Parser<'a, T> {
    fn peek(&mut self) -> Token {
        let tok = self.lexer.next_symbol();
        self.lexer.push_back(tok);
        tok
    }

    fn expect(&mut self, sym: Sym, expected: &'static str) -> Result<Token> {
        let tok = self.lexer.next_symbol();
        if tok.sym == sym {
            Ok(tok)
        } else {
            Err(unexpected(tok, expected))
        }
    }

    fn regex(&mut self) -> Result<Tree> {
        let first = self.sub()?;
        let mut rest = Vec::new();
        loop {
            let tok = self.lexer.next_symbol();
            if tok.sym != Sym::Pipe {
                self.lexer.push_back(tok);
                break;
            }
            rest.push((tok, self.sub()?));
        }
        // fold from the right; each node owns the pipe in front of its tail
        let mut tail = None;
        for (pipe, sub) in rest.into_iter().rev() {
            tail = Some((pipe, regex_node(sub, tail)));
        }
        Ok(regex_node(first, tail))
    }

    fn sub(&mut self) -> Result<Tree> {
        let first = self.expr()?;
        let mut rest = Vec::new();
        while starts_term(self.peek().sym) {
            rest.push(self.expr()?);
        }
        let tail = rest
            .into_iter()
            .rev()
            .fold(None, |tail, expr| Some(sub_node(expr, tail)));
        Ok(sub_node(first, tail))
    }

    fn expr(&mut self) -> Result<Tree> {
        let term = self.term()?;
        let tok = self.lexer.next_symbol();
        let production = match tok.sym {
            Sym::Star => 1,
            Sym::Plus => 2,
            Sym::Question => 3,
            _ => {
                self.lexer.push_back(tok);
                return Ok(Tree::node(TreeKind::Expr, 4, vec![term]));
            }
        };
        let mut children = vec![term, Tree::leaf(tok)];
        let lazy = self.lexer.next_symbol();
        if lazy.sym == Sym::Question {
            children.push(Tree::leaf(lazy));
        } else {
            self.lexer.push_back(lazy);
        }
        Ok(Tree::node(TreeKind::Expr, production, children))
    }

    fn term(&mut self) -> Result<Tree> {
        let tok = self.lexer.next_symbol();
        match tok.sym {
            Sym::CharSym | Sym::Caret | Sym::Minus | Sym::Dot => {
                Ok(Tree::node(TreeKind::Term, 1, vec![Tree::leaf(tok)]))
            }
            Sym::Special => {
                if shorthand(tok.c).is_none() {
                    return Err(Error::ParseError(tok.pos, ParseError::InvalidEscape(tok.c)));
                }
                Ok(Tree::node(TreeKind::Term, 1, vec![Tree::leaf(tok)]))
            }
            Sym::LParen => {
                if self.depth == NEST_LIMIT {
                    return Err(Error::ParseError(
                        tok.pos,
                        ParseError::NestingTooDeep(NEST_LIMIT),
                    ));
                }
                self.depth += 1;
                let inner = self.regex()?;
                self.depth -= 1;
                self.expect(Sym::RParen, "`)`")?;
                Ok(Tree::node(TreeKind::Term, 2, vec![inner]))
            }
            Sym::LBracket => {
                let caret = self.lexer.next_symbol();
                let production = if caret.sym == Sym::Caret {
                    4
                } else {
                    self.lexer.push_back(caret);
                    3
                };
                let class = self.class()?;
                self.expect(Sym::RBracket, "`]`")?;
                Ok(Tree::node(TreeKind::Term, production, vec![class]))
            }
            _ => Err(unexpected(tok, "a character, group or class")),
        }
    }

    /// Read one member of a bracket class. Operators are plain characters in there.
    fn class_char(&mut self) -> Result<Token> {
        let tok = self.lexer.next_symbol();
        match tok.sym {
            Sym::RBracket | Sym::Eof => Err(unexpected(tok, "a class character")),
            Sym::Special => match shorthand(tok.c) {
                Some((_, false)) => Ok(tok),
                Some((_, true)) => Err(Error::ParseError(
                    tok.pos,
                    ParseError::NegatedClassInBrackets(tok.c),
                )),
                None => Err(Error::ParseError(tok.pos, ParseError::InvalidEscape(tok.c))),
            },
            _ => Ok(tok),
        }
    }

    fn class_continues(&mut self) -> bool {
        !matches!(self.peek().sym, Sym::RBracket | Sym::Eof)
    }

    fn class_item(&mut self) -> Result<ClassItem> {
        let lo = self.class_char()?;
        if lo.sym == Sym::Special {
            return Ok((lo, None));
        }
        let dash = self.lexer.next_symbol();
        if dash.sym != Sym::Minus {
            self.lexer.push_back(dash);
            return Ok((lo, None));
        }
        let hi = self.lexer.next_symbol();
        if hi.sym == Sym::RBracket {
            // `-` right before `]` is a literal: replay both tokens
            self.lexer.push_back(hi);
            self.lexer.push_back(dash);
            return Ok((lo, None));
        }
        if hi.sym == Sym::Special || hi.sym == Sym::Eof {
            return Err(unexpected(hi, "a range end character"));
        }
        if lo.c > hi.c {
            return Err(Error::ParseError(
                lo.pos,
                ParseError::InvalidClassRange(lo.c, hi.c),
            ));
        }
        Ok((lo, Some((dash, hi))))
    }

    fn class(&mut self) -> Result<Tree> {
        let first = self.class_item()?;
        let mut rest = Vec::new();
        while self.class_continues() {
            rest.push(self.class_item()?);
        }
        let tail = rest
            .into_iter()
            .rev()
            .fold(None, |tail, item| Some(class_node(item, tail)));
        Ok(class_node(first, tail))
    }
}

fn regex_node(sub: Tree, tail: Option<(Token, Tree)>) -> Tree {
    match tail {
        Some((pipe, rest)) => Tree::node(TreeKind::Regex, 1, vec![sub, Tree::leaf(pipe), rest]),
        None => Tree::node(TreeKind::Regex, 2, vec![sub]),
    }
}

fn sub_node(expr: Tree, tail: Option<Tree>) -> Tree {
    match tail {
        Some(rest) => Tree::node(TreeKind::Sub, 1, vec![expr, rest]),
        None => Tree::node(TreeKind::Sub, 2, vec![expr]),
    }
}

fn class_node((lo, range): ClassItem, tail: Option<Tree>) -> Tree {
    let mut children = vec![Tree::leaf(lo)];
    let mut production = 3;
    if let Some((dash, hi)) = range {
        children.push(Tree::leaf(dash));
        children.push(Tree::leaf(hi));
        production = 1;
    }
    match tail {
        Some(rest) => children.push(rest),
        None => production += 1,
    }
    Tree::node(TreeKind::Class, production, children)
}
