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

//! Compilation of a parse tree into a VM program.
//!
//! Code is generated bottom-up as *chains* of fragments. Each fragment is one instruction plus an
//! id that never changes, and every chain ends in exactly one `Match`, its last fragment, marking
//! where the code continues. While a chain is under construction, `Jump` and `Split` targets are
//! fragment ids rather than positions, since chains get spliced together and fragments get
//! deleted. A deleted fragment forwards to the fragment that replaced it. Once the whole program is
//! one chain, [`link`] follows the forwarding, assigns positions and rewrites every target.

use log::debug;

use crate::lex::Sym;
use crate::parse::{parse, Tree, TreeKind};
use crate::text::Text;
use crate::vm::{Insn, Prog};
use crate::{CompileError, RegexOptions, Result};

pub(crate) const DEFAULT_SIZE_LIMIT: usize = 100_000;

const SPACE: &[(char, char)] = &[('\t', '\r'), (' ', ' ')];
const WORD: &[(char, char)] = &[('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')];
const DIGIT: &[(char, char)] = &[('0', '9')];

/// Ranges for a class shorthand letter (`\s`, `\w`, `\d` and their negations), and whether the
/// class is negated.
pub(crate) fn shorthand(c: char) -> Option<(&'static [(char, char)], bool)> {
    match c {
        's' => Some((SPACE, false)),
        'S' => Some((SPACE, true)),
        'w' => Some((WORD, false)),
        'W' => Some((WORD, true)),
        'd' => Some((DIGIT, false)),
        'D' => Some((DIGIT, true)),
        _ => None,
    }
}

#[derive(Debug)]
struct Frag {
    id: usize,
    insn: Insn,
}

type Chain = Vec<Frag>;

/// Turn the terminal `Match` of `chain` into a jump to fragment `target`.
fn redirect(chain: &mut Chain, target: usize) {
    if let Some(last) = chain.last_mut() {
        debug_assert_eq!(last.insn, Insn::Match);
        last.insn = Insn::Jump(target);
    }
}

/// Lay the chain out as an instruction array, resolving fragment ids to positions.
fn link(chain: Chain, forward: &[usize]) -> Vec<Insn> {
    let mut index = vec![usize::MAX; forward.len()];
    for (ix, frag) in chain.iter().enumerate() {
        index[frag.id] = ix;
    }
    let resolve = |mut id: usize| {
        while forward[id] != id {
            id = forward[id];
        }
        let ix = index[id];
        debug_assert_ne!(ix, usize::MAX, "jump to deleted fragment {id}");
        ix
    };
    chain
        .into_iter()
        .map(|frag| match frag.insn {
            Insn::Jump(t) => Insn::Jump(resolve(t)),
            Insn::Split(x, y) => Insn::Split(resolve(x), resolve(y)),
            insn => insn,
        })
        .collect()
}

struct Compiler {
    /// Per fragment id, the id jumps to it go to. Itself unless the fragment was deleted.
    forward: Vec<usize>,
    next_save: usize,
}

impl Compiler {
    fn fresh_id(&mut self) -> usize {
        let id = self.forward.len();
        self.forward.push(id);
        id
    }

    fn frag(&mut self, insn: Insn) -> Frag {
        Frag {
            id: self.fresh_id(),
            insn,
        }
    }

    /// A chain of one instruction followed by its terminal `Match`.
    fn single(&mut self, insn: Insn) -> Chain {
        vec![self.frag(insn), self.frag(Insn::Match)]
    }

    /// Send every jump to fragment `from` to fragment `to` instead.
    fn retarget(&mut self, from: usize, to: usize) {
        self.forward[from] = to;
    }

    /// Append `b` to `a`, continuing the terminal `Match` of `a` at the entry of `b`.
    ///
    /// The `Match` would become a jump to the very next instruction, so it is deleted instead,
    /// and jumps to it go to the entry of `b`.
    fn join(&mut self, a: &mut Chain, b: Chain) {
        if let Some(last) = a.pop() {
            debug_assert_eq!(last.insn, Insn::Match);
            self.retarget(last.id, b[0].id);
        }
        a.extend(b);
    }

    fn visit_regex(&mut self, tree: &Tree) -> Result<Chain> {
        debug_assert_eq!(tree.kind, TreeKind::Regex);
        let mut node = tree;
        let mut alternatives = vec![&node.children[0]];
        while node.production == 1 {
            node = &node.children[2];
            alternatives.push(&node.children[0]);
        }
        let Some((last, init)) = alternatives.split_last() else {
            unreachable!("REGEX without alternatives")
        };
        if init.is_empty() {
            return self.visit_sub(last);
        }
        let exit = self.frag(Insn::Match);
        let mut chain = Vec::new();
        // second target of the previous split, resolved once the next alternative starts
        let mut pending = None;
        for sub in init {
            let mut left = self.visit_sub(sub)?;
            let rest = self.fresh_id();
            let split = self.frag(Insn::Split(left[0].id, rest));
            if let Some(prev) = pending.replace(rest) {
                self.retarget(prev, split.id);
            }
            // left can't fall through into the next alternative, so its end stays a jump
            redirect(&mut left, exit.id);
            chain.push(split);
            chain.extend(left);
        }
        let mut right = self.visit_sub(last)?;
        if let Some(prev) = pending {
            self.retarget(prev, right[0].id);
        }
        self.join(&mut right, vec![exit]);
        chain.extend(right);
        Ok(chain)
    }

    fn visit_sub(&mut self, tree: &Tree) -> Result<Chain> {
        debug_assert_eq!(tree.kind, TreeKind::Sub);
        let mut chain = self.visit_expr(&tree.children[0])?;
        let mut node = tree;
        while node.production == 1 {
            node = &node.children[1];
            let next = self.visit_expr(&node.children[0])?;
            self.join(&mut chain, next);
        }
        Ok(chain)
    }

    fn visit_expr(&mut self, tree: &Tree) -> Result<Chain> {
        debug_assert_eq!(tree.kind, TreeKind::Expr);
        let mut body = self.visit_term(&tree.children[0])?;
        if tree.production == 4 {
            return Ok(body);
        }
        let greedy = tree.children.len() < 3;
        let entry = body[0].id;
        let exit = self.frag(Insn::Match);
        let order = |a: usize, b: usize| {
            if greedy {
                Insn::Split(a, b)
            } else {
                Insn::Split(b, a)
            }
        };
        match tree.production {
            // TERM *
            1 => {
                let split = self.frag(order(entry, exit.id));
                let back = self.frag(Insn::Jump(split.id));
                self.join(&mut body, vec![back]);
                let mut chain = vec![split];
                chain.extend(body);
                chain.push(exit);
                Ok(chain)
            }
            // TERM +
            2 => {
                let split = self.frag(order(entry, exit.id));
                self.join(&mut body, vec![split, exit]);
                Ok(body)
            }
            // TERM ?
            3 => {
                let split = self.frag(order(entry, exit.id));
                self.join(&mut body, vec![exit]);
                let mut chain = vec![split];
                chain.extend(body);
                Ok(chain)
            }
            _ => unreachable!("EXPR production {}", tree.production),
        }
    }

    fn visit_term(&mut self, tree: &Tree) -> Result<Chain> {
        debug_assert_eq!(tree.kind, TreeKind::Term);
        match tree.production {
            1 => {
                let tok = tree.children[0].token();
                let insn = match tok.sym {
                    Sym::Dot => Insn::Any,
                    Sym::Special => {
                        let (ranges, negated) =
                            shorthand(tok.c).ok_or(CompileError::UnknownClass(tok.c))?;
                        if negated {
                            Insn::NRange(ranges.into())
                        } else {
                            Insn::Range(ranges.into())
                        }
                    }
                    _ => Insn::Char(tok.c),
                };
                Ok(self.single(insn))
            }
            2 => {
                let slot = self.next_save;
                self.next_save += 2;
                let mut chain = self.single(Insn::Save(slot));
                let body = self.visit_regex(&tree.children[0])?;
                self.join(&mut chain, body);
                let close = self.single(Insn::Save(slot + 1));
                self.join(&mut chain, close);
                Ok(chain)
            }
            production => {
                let mut ranges = Vec::new();
                class_ranges(&tree.children[0], &mut ranges)?;
                let insn = if production == 4 {
                    Insn::NRange(ranges.into())
                } else {
                    Insn::Range(ranges.into())
                };
                Ok(self.single(insn))
            }
        }
    }
}

/// Collect the ranges of a `CLASS` chain in order.
fn class_ranges(tree: &Tree, out: &mut Vec<(char, char)>) -> Result<()> {
    let mut node = Some(tree);
    while let Some(class) = node {
        debug_assert_eq!(class.kind, TreeKind::Class);
        let rest = match class.production {
            1 | 2 => {
                let lo = class.children[0].token();
                let hi = class.children[2].token();
                out.push((lo.c, hi.c));
                class.children.get(3)
            }
            _ => {
                let tok = class.children[0].token();
                if tok.sym == Sym::Special {
                    let (ranges, _) = shorthand(tok.c).ok_or(CompileError::UnknownClass(tok.c))?;
                    out.extend_from_slice(ranges);
                } else {
                    out.push((tok.c, tok.c));
                }
                class.children.get(1)
            }
        };
        node = rest;
    }
    Ok(())
}

/// Lower a parse tree to a program.
pub(crate) fn compile_tree(tree: &Tree, options: &RegexOptions) -> Result<Prog> {
    let mut compiler = Compiler {
        forward: Vec::new(),
        next_save: 0,
    };
    let chain = compiler.visit_regex(tree)?;
    if chain.len() > options.size_limit {
        return Err(CompileError::TooLarge {
            size: chain.len(),
            limit: options.size_limit,
        }
        .into());
    }
    let prog = Prog::new(link(chain, &compiler.forward));
    debug!(
        "compiled program: {} instructions, {} capture slots",
        prog.len(),
        prog.n_saves()
    );
    Ok(prog)
}

/// Parse and compile a pattern with the given options.
pub(crate) fn compile_with_options<T: Text + ?Sized>(
    pattern: &T,
    options: &RegexOptions,
) -> Result<Prog> {
    let tree = parse(pattern)?;
    compile_tree(&tree, options)
}

/// Parse and compile a pattern with default options.
pub fn compile<T: Text + ?Sized>(pattern: &T) -> Result<Prog> {
    compile_with_options(pattern, &RegexOptions::default())
}
