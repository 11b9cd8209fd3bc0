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

//! Pike VM for executing compiled regexes.
//!
//! Read <https://swtch.com/~rsc/regexp/regexp2.html> for a good introduction for how this works.
//!
//! The VM executes a sequence of instructions (a program) against an input string. Instead of
//! backtracking, it advances all possible executions in lockstep, one input character at a time.
//! Each execution is a *thread*: a program counter (PC) plus its own array of capture slots.
//!
//! A very simple program for the regex `a`:
//!
//! ```text
//! 0: Char('a')
//! 1: Match
//! ```
//!
//! The `Split` instruction forks a thread into two. Both are kept alive, but the first one has
//! priority: it is scheduled earlier in the thread list, so if both reach `Match` at the same
//! position, the first one wins.
//!
//! Example program for the regex `ab|ac`:
//!
//! ```text
//! 0: Split(1, 4)
//! 1: Char('a')
//! 2: Char('b')
//! 3: Jump(6)
//! 4: Char('a')
//! 5: Char('c')
//! 6: Match
//! ```
//!
//! `Jump`, `Split` and `Save` don't consume input. They are followed eagerly when a thread is
//! scheduled, so the thread lists only ever contain instructions that consume a character, and
//! `Match`.
//!
//! Let's step through execution with that program for the input `ac`:
//!
//! 1. Scheduling PC 0 at IX 0 follows the split and yields threads at PC 1 and PC 4
//! 2. At IX 0 both `Char('a')` match, scheduling PC 2 and PC 5 for IX 1
//! 3. At IX 1 `Char('b')` fails and that thread dies; `Char('c')` matches and schedules PC 6
//! 4. At IX 2 the only thread is at `Match` -> successful match of length 2
//!
//! An instruction is scheduled at most once per input position. A second attempt to schedule it
//! at the same position is dropped, since the thread already there has higher priority and the
//! same future. This bounds the work to O(program length x input length).

use std::fmt;
use std::mem;
use std::sync::Arc;

use log::trace;

use crate::text::Text;

/// Enable tracing of VM execution. Only for debugging/investigating.
pub(crate) const OPTION_TRACE: u32 = 1 << 0;

/// Marker for a capture slot that was never written.
pub(crate) const UNSET: usize = usize::MAX;

/// Instruction of the VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insn {
    /// Consume one character if it equals the payload
    Char(char),
    /// Consume any one character
    Any,
    /// Consume one character that falls in any of the inclusive ranges
    Range(Box<[(char, char)]>),
    /// Consume one character that falls in none of the inclusive ranges
    NRange(Box<[(char, char)]>),
    /// Successful end of program
    Match,
    /// Jump to instruction at position
    Jump(usize),
    /// Fork execution into two threads. The first position has priority.
    Split(usize, usize),
    /// Save the current string index into the specified slot
    Save(usize),
}

/// Sequence of instructions for the VM to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prog {
    /// Instructions of the program
    pub body: Vec<Insn>,
    n_saves: usize,
}

impl Prog {
    /// Create a program, computing the number of capture slots it needs.
    #[must_use]
    pub fn new(body: Vec<Insn>) -> Prog {
        let n_saves = count_saves(&body);
        Prog { body, n_saves }
    }

    /// Number of capture slots, always even: one (start, end) pair per group.
    #[must_use]
    pub fn n_saves(&self) -> usize {
        self.n_saves
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the program has no instructions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[cfg(debug_assertions)]
    #[doc(hidden)]
    pub(crate) fn debug_print(&self) {
        for (i, insn) in self.body.iter().enumerate() {
            println!("{i:3}: {insn:?}");
        }
    }
}

/// One past the highest slot written, rounded up to a whole pair. Saturates near `usize::MAX`.
fn count_saves(body: &[Insn]) -> usize {
    body.iter()
        .filter_map(|insn| match *insn {
            Insn::Save(slot) => Some(slot.saturating_add(2) & !1),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

#[inline]
fn in_ranges(ranges: &[(char, char)], c: char) -> bool {
    ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
}

#[derive(Debug)]
struct Thread {
    pc: usize,
    saves: Vec<usize>,
}

/// Schedules threads into a thread list, following non-consuming instructions.
#[derive(Debug, Default)]
struct Scheduler {
    /// `(generation, ix)` at which each instruction was last scheduled.
    marks: Vec<(u64, usize)>,
    /// Bumped on every run, so marks from earlier runs never compare equal.
    generation: u64,
    /// Pending branches of the epsilon walk, lowest priority at the bottom.
    stack: Vec<(usize, Vec<usize>)>,
    /// Position that `admitted` is counting for.
    count_ix: usize,
    /// Scheduling attempts that were not dropped as duplicates at `count_ix`.
    admitted: usize,
    /// Largest `admitted` over the run.
    peak: usize,
}

impl Scheduler {
    fn begin(&mut self, prog_len: usize) {
        if self.marks.len() != prog_len {
            self.marks.clear();
            self.marks.resize(prog_len, (0, 0));
        }
        self.generation += 1;
        self.stack.clear();
        self.count_ix = 0;
        self.admitted = 0;
        self.peak = 0;
    }

    fn admit(&mut self, pc: usize, ix: usize) -> bool {
        let mark = (self.generation, ix);
        if self.marks[pc] == mark {
            return false;
        }
        self.marks[pc] = mark;
        if self.count_ix != ix {
            self.count_ix = ix;
            self.admitted = 0;
        }
        self.admitted += 1;
        self.peak = self.peak.max(self.admitted);
        true
    }

    /// Add a thread at `pc` to `list` for position `ix`.
    ///
    /// Target 1 of a split is walked to completion before target 2, with its own copy of the
    /// captures, so the order of `list` is the priority order.
    fn add(
        &mut self,
        prog: &Prog,
        list: &mut Vec<Thread>,
        pc: usize,
        saves: Vec<usize>,
        ix: usize,
    ) {
        self.stack.push((pc, saves));
        while let Some((mut pc, mut saves)) = self.stack.pop() {
            loop {
                // a program without a final `Match` can run off its end; the thread just dies
                let Some(insn) = prog.body.get(pc) else {
                    break;
                };
                if !self.admit(pc, ix) {
                    break;
                }
                match *insn {
                    Insn::Jump(target) => pc = target,
                    Insn::Split(x, y) => {
                        self.stack.push((y, saves.clone()));
                        pc = x;
                    }
                    Insn::Save(slot) => {
                        if let Some(save) = saves.get_mut(slot) {
                            *save = ix;
                        }
                        pc += 1;
                    }
                    Insn::Char(_)
                    | Insn::Any
                    | Insn::Range(_)
                    | Insn::NRange(_)
                    | Insn::Match => {
                        list.push(Thread { pc, saves });
                        break;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct State {
    sched: Scheduler,
    /// Threads for the current position, in priority order.
    clist: Vec<Thread>,
    /// Threads for the next position.
    nlist: Vec<Thread>,
}

impl State {
    fn new(prog: &Prog) -> State {
        State {
            sched: Scheduler {
                marks: vec![(0, 0); prog.len()],
                ..Scheduler::default()
            },
            clist: Vec::with_capacity(prog.len()),
            nlist: Vec::with_capacity(prog.len()),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Machine {
    pub prog: Arc<Prog>,
    pub options: u32,
}

/// A machine with its own scheduling state. One run at a time.
#[derive(Debug)]
pub(crate) struct Session {
    pub prog: Arc<Prog>,
    pub options: u32,
    state: State,
}

impl Machine {
    pub(crate) fn new(prog: Arc<Prog>, options: u32) -> Machine {
        Machine { prog, options }
    }

    pub(crate) fn create_state(prog: &Prog) -> State {
        State::new(prog)
    }

    pub(crate) fn create_session(self, state: State) -> Session {
        Session {
            prog: self.prog,
            options: self.options,
            state,
        }
    }

    #[cfg(debug_assertions)]
    #[doc(hidden)]
    pub(crate) fn debug_print(&self) {
        self.prog.debug_print();
    }
}

fn trace(options: u32, args: fmt::Arguments) {
    if options & OPTION_TRACE != 0 {
        trace!("{args}");
    }
}

impl Session {
    /// Run the program anchored at byte offset `start` of `text`.
    ///
    /// Returns the end offset of the match together with its capture slots.
    pub(crate) fn run<T: Text + ?Sized>(
        &mut self,
        text: &T,
        start: usize,
    ) -> Option<(usize, Vec<usize>)> {
        let mut saves = Vec::new();
        self.run_to(&mut saves, text, start).map(|end| (end, saves))
    }

    /// Run the program anchored at byte offset `start` of `text`, writing the capture slots of the
    /// match into `stash`. Returns the end offset of the match.
    ///
    /// `stash` is left untouched when there is no match.
    pub(crate) fn run_to<T: Text + ?Sized>(
        &mut self,
        stash: &mut Vec<usize>,
        text: &T,
        start: usize,
    ) -> Option<usize> {
        let prog = &*self.prog;
        let options = self.options;
        let State {
            sched,
            clist,
            nlist,
        } = &mut self.state;

        trace(options, format_args!("pos\tthreads"));
        sched.begin(prog.len());
        clist.clear();
        nlist.clear();

        let mut matched = None;
        let mut ix = start;
        sched.add(prog, clist, 0, vec![UNSET; prog.n_saves()], ix);
        while !clist.is_empty() {
            let unit = text.unit_at(ix);
            let next_ix = unit.map_or(ix, |(_, len)| ix + len);
            if options & OPTION_TRACE != 0 {
                let pcs: Vec<usize> = clist.iter().map(|t| t.pc).collect();
                trace!("{ix}\t{pcs:?}");
            }
            for Thread { pc, saves } in clist.drain(..) {
                let c = unit.map(|(c, _)| c);
                let consumed = match (&prog.body[pc], c) {
                    (Insn::Match, _) => {
                        trace(options, format_args!("match at {ix}: {saves:?}"));
                        matched = Some(ix);
                        *stash = saves;
                        // threads after this one have lower priority
                        break;
                    }
                    (Insn::Char(expected), Some(c)) => *expected == c,
                    (Insn::Any, Some(_)) => true,
                    (Insn::Range(ranges), Some(c)) => in_ranges(ranges, c),
                    (Insn::NRange(ranges), Some(c)) => !in_ranges(ranges, c),
                    (Insn::Char(_) | Insn::Any | Insn::Range(_) | Insn::NRange(_), None) => false,
                    (Insn::Jump(_) | Insn::Split(..) | Insn::Save(_), _) => {
                        unreachable!("non-consuming instruction in thread list")
                    }
                };
                if consumed {
                    sched.add(prog, nlist, pc + 1, saves, next_ix);
                }
            }
            if unit.is_none() {
                break;
            }
            mem::swap(clist, nlist);
            ix = next_ix;
        }
        clist.clear();
        nlist.clear();
        trace(
            options,
            format_args!("peak threads per position: {}", sched.peak),
        );
        matched
    }
}

fn create_session(prog: Arc<Prog>, options: u32) -> Session {
    let state = Machine::create_state(&prog);
    Machine::new(prog, options).create_session(state)
}

/// Run the program with trace logging for debugging.
#[doc(hidden)]
pub fn run_trace<T: Text + ?Sized>(
    prog: Arc<Prog>,
    text: &T,
    pos: usize,
) -> Option<(usize, Vec<usize>)> {
    create_session(prog, OPTION_TRACE).run(text, pos)
}

/// Run the program with default options.
#[doc(hidden)]
pub fn run_default<T: Text + ?Sized>(
    prog: Arc<Prog>,
    text: &T,
    pos: usize,
) -> Option<(usize, Vec<usize>)> {
    create_session(prog, 0).run(text, pos)
}
