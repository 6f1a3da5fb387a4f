//! Mutable state of one tokenizer run.

use crate::error::UnknownState;
use crate::table::{Stack, StateId, StateTable, Transition};
use smallvec::smallvec;

/// Position, end bound and state stack of a run over one input.
///
/// The plain engine only changes a context through rule transitions.
/// [`ExtendedLexer`](crate::ExtendedLexer) also hands it to context
/// callbacks, which may move the position and edit the stack directly, and
/// lets callers create one up front to resume tokenizing from a chosen
/// position and stack.
///
/// The stack is never empty: popping always keeps the bottom frame.
#[derive(Clone, Debug)]
pub struct LexerContext<'a> {
    table: &'a StateTable,
    text: &'a str,
    pos: usize,
    end: usize,
    stack: Stack,
}

impl<'a> LexerContext<'a> {
    /// A fresh run over `text`, at offset 0 in the root state.
    pub fn new(table: &'a StateTable, text: &'a str) -> Self {
        LexerContext {
            table,
            text,
            pos: 0,
            end: text.len(),
            stack: smallvec![table.root()],
        }
    }

    /// A run starting from a named stack, bottom first. An empty stack
    /// means `root`.
    pub fn with_stack(
        table: &'a StateTable,
        text: &'a str,
        states: &[&str],
    ) -> Result<Self, UnknownState> {
        let mut context = LexerContext::new(table, text);
        if !states.is_empty() {
            context.stack = states
                .iter()
                .map(|name| {
                    table
                        .state_id(name)
                        .ok_or_else(|| UnknownState((*name).to_owned()))
                })
                .collect::<Result<_, _>>()?;
        }
        Ok(context)
    }

    /// A run starting from a resolved, non-empty stack.
    pub(crate) fn with_ids(table: &'a StateTable, text: &'a str, stack: &[StateId]) -> Self {
        let mut context = LexerContext::new(table, text);
        if !stack.is_empty() {
            context.stack = stack.iter().copied().collect();
        }
        context
    }

    pub fn table(&self) -> &'a StateTable {
        self.table
    }

    /// The whole input of this run.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// The next byte offset to tokenize.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the position. Offsets past the end bound are clamped to it, and
    /// offsets inside a multi-byte character round up to the next character.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = self.char_boundary(pos.min(self.end));
    }

    /// Offset where tokenizing stops.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Stop tokenizing at `end` instead of the end of the input. Clamped to
    /// the input and never before the current position.
    pub fn set_end(&mut self, end: usize) {
        self.end = self.char_boundary(end.min(self.text.len())).max(self.pos);
    }

    /// The not yet tokenized part of the input.
    pub fn remaining(&self) -> &'a str {
        &self.text[self.pos..self.end]
    }

    /// The state stack, bottom first.
    pub fn stack(&self) -> &[StateId] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn top(&self) -> StateId {
        self.stack.last().copied().unwrap_or(self.table.root())
    }

    pub fn top_name(&self) -> &'a str {
        self.table.state(self.top()).name()
    }

    /// Names of the stacked states, bottom first.
    pub fn state_names(&self) -> Vec<&'a str> {
        let table = self.table;
        self.stack
            .iter()
            .map(|&id| table.state(id).name())
            .collect()
    }

    pub fn push(&mut self, state: &str) -> Result<(), UnknownState> {
        let id = self
            .table
            .state_id(state)
            .ok_or_else(|| UnknownState(state.to_owned()))?;
        self.stack.push(id);
        Ok(())
    }

    /// Push another copy of the current top state.
    pub fn push_top(&mut self) {
        let top = self.top();
        self.stack.push(top);
    }

    /// Pop up to `count` frames, always keeping the bottom one.
    pub fn pop(&mut self, count: usize) {
        let keep = self.stack.len().saturating_sub(count).max(1);
        self.stack.truncate(keep);
    }

    /// Stack depth and top, which together tell whether a step changed
    /// the state the next step will match in.
    pub(crate) fn shape(&self) -> (usize, StateId) {
        (self.stack.len(), self.top())
    }

    pub(crate) fn apply(&mut self, transition: &Transition) {
        transition.apply(&mut self.stack);
    }

    fn char_boundary(&self, mut pos: usize) -> usize {
        while !self.text.is_char_boundary(pos) {
            pos += 1;
        }
        pos
    }
}
