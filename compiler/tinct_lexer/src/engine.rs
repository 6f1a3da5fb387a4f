//! The tokenizer loop.
//!
//! [`Tokens`] interprets a [`StateTable`](crate::StateTable) one step at a
//! time. Each step tries the rules of the top state in order, anchored at
//! the current position; the first match wins. Tokens are produced lazily:
//! a step may yield several (group actions, delegation), which are buffered
//! and handed out before the next step runs.
//!
//! Every step makes progress. A match consumes input, or changes the stack
//! without consuming (bounded by [`MAX_ZERO_WIDTH_STEPS`] in a row), or the
//! step falls back to one `Error` token for the next character.

use crate::action::{Emission, MatchView};
use crate::context::LexerContext;
use crate::stack::ensure_sufficient_stack;
use crate::table::{CompiledDelegate, CompiledGroup, Rule, RuleAction, StateId};
use regex_automata::util::captures::Captures;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::ops::Range;
use tinct_token::{Token, TokenType};
use tracing::{trace, warn};

/// Consecutive steps allowed to change the stack without consuming input
/// before the engine treats the position as stuck and emits an `Error`.
pub const MAX_ZERO_WIDTH_STEPS: usize = 32;

/// Nesting limit for rules that delegate to their own grammar. Deeper
/// spans become a single `Error` token.
pub const MAX_DELEGATION_DEPTH: usize = 64;

/// A lazy token stream over one input.
///
/// Yields tokens in order; their texts concatenate to the input between
/// the start position and the end bound. Dropping the iterator early is
/// fine, no work is done ahead of demand except the tokens of one step.
pub struct Tokens<'a> {
    ctx: LexerContext<'a>,
    pending: VecDeque<Token<'a>>,
    /// Capture slots per rule, keyed by state and rule index, reused
    /// across steps.
    captures: FxHashMap<(StateId, usize), Captures>,
    zero_width_steps: usize,
    depth: usize,
}

/// A piece of a match to be emitted.
enum Piece<'a> {
    Kind(TokenType),
    Using(&'a CompiledDelegate),
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(ctx: LexerContext<'a>) -> Self {
        Tokens::nested(ctx, 0)
    }

    fn nested(ctx: LexerContext<'a>, depth: usize) -> Self {
        Tokens {
            ctx,
            pending: VecDeque::new(),
            captures: FxHashMap::default(),
            zero_width_steps: 0,
            depth,
        }
    }

    /// The run state after the tokens yielded so far.
    ///
    /// Tokens from the current step may still be buffered, so the position
    /// can be ahead of the last yielded token.
    pub fn context(&self) -> &LexerContext<'a> {
        &self.ctx
    }

    fn step(&mut self) {
        let table = self.ctx.table();
        let text = self.ctx.text();
        let (pos, end) = (self.ctx.pos(), self.ctx.end());
        let top = self.ctx.top();
        let state = table.state(top);

        for (index, rule) in state.rules().iter().enumerate() {
            let pattern = rule.pattern();
            if rule.needs_captures() {
                let key = (top, index);
                let mut captures = self
                    .captures
                    .remove(&key)
                    .unwrap_or_else(|| pattern.create_captures());
                let found = pattern.captures_at(text, pos, end, &mut captures);
                if let Some(found) = found {
                    self.apply(rule, pos..found, Some(&captures));
                }
                self.captures.insert(key, captures);
                if found.is_some() {
                    return;
                }
            } else if let Some(found) = pattern.match_at(text, pos, end) {
                self.apply(rule, pos..found, None);
                return;
            }
        }
        self.recover();
    }

    fn apply(&mut self, rule: &'a Rule, span: Range<usize>, captures: Option<&Captures>) {
        if let (RuleAction::Context(callback), Some(captures)) = (rule.action(), captures) {
            let text = self.ctx.text();
            let before = self.ctx.shape();
            let start = span.start;
            let view = MatchView::new(text, captures);
            let emissions = callback(&view, &mut self.ctx);
            if self.ctx.end() < start {
                warn!(
                    grammar = self.ctx.table().name(),
                    end = self.ctx.end(),
                    start,
                    "context callback moved the end bound before the match"
                );
                self.ctx.set_end(start);
            }
            if self.ctx.pos() < start {
                warn!(
                    grammar = self.ctx.table().name(),
                    pos = self.ctx.pos(),
                    start,
                    "context callback moved the position backwards"
                );
                self.ctx.set_pos(start);
            }
            let resumed = self.ctx.pos();
            self.push_pieces(
                start..resumed,
                emissions
                    .into_iter()
                    .map(|e| (e.offset..e.offset.saturating_add(e.len), Piece::Kind(e.kind))),
            );
            self.ctx.apply(rule.transition());
            self.settle(start, before);
            return;
        }

        if span.is_empty() {
            let before = self.ctx.shape();
            self.ctx.apply(rule.transition());
            self.settle(span.start, before);
            return;
        }

        match (rule.action(), captures) {
            (RuleAction::Token(kind), _) => {
                let text = self.ctx.text();
                self.pending
                    .push_back(Token::new(span.start, *kind, &text[span.clone()]));
            }
            (RuleAction::ByGroups(groups), Some(captures)) => {
                let pieces = groups.iter().enumerate().filter_map(|(i, group)| {
                    let range = captures.get_group(i + 1)?.range();
                    let piece = match group {
                        CompiledGroup::Token(kind) => Piece::Kind(*kind),
                        CompiledGroup::Using(delegate) => Piece::Using(delegate),
                    };
                    Some((range, piece))
                });
                self.push_pieces(span.clone(), pieces);
            }
            (RuleAction::Using(delegate), _) => self.delegate(span.clone(), delegate),
            (RuleAction::Callback(callback), Some(captures)) => {
                let view = MatchView::new(self.ctx.text(), captures);
                let emissions: Vec<Emission> = callback(&view);
                self.push_pieces(
                    span.clone(),
                    emissions
                        .into_iter()
                        .map(|e| (e.offset..e.offset.saturating_add(e.len), Piece::Kind(e.kind))),
                );
            }
            // Silent rules, and capture actions without captures, which
            // the step loop never produces.
            _ => {}
        }
        self.ctx.set_pos(span.end);
        self.ctx.apply(rule.transition());
        self.zero_width_steps = 0;
    }

    /// Account for a step that may not have consumed input. A step that
    /// neither consumed nor changed the stack, or one zero-width step past
    /// the limit, falls back to an `Error` token.
    fn settle(&mut self, start: usize, before: (usize, StateId)) {
        if self.ctx.pos() > start {
            self.zero_width_steps = 0;
            return;
        }
        if self.ctx.shape() == before {
            self.recover();
            return;
        }
        self.zero_width_steps += 1;
        if self.zero_width_steps > MAX_ZERO_WIDTH_STEPS {
            trace!(
                grammar = self.ctx.table().name(),
                pos = start,
                "zero-width step limit reached"
            );
            self.recover();
        }
    }

    /// Emit pieces over `span`, in order. Pieces that are empty, overlap an
    /// earlier piece, leave the span or split a character are dropped;
    /// uncovered text becomes `Text`.
    fn push_pieces(
        &mut self,
        span: Range<usize>,
        pieces: impl IntoIterator<Item = (Range<usize>, Piece<'a>)>,
    ) {
        let text = self.ctx.text();
        let mut cursor = span.start;
        for (range, piece) in pieces {
            if range.is_empty()
                || range.start < cursor
                || range.end > span.end
                || !text.is_char_boundary(range.start)
                || !text.is_char_boundary(range.end)
            {
                continue;
            }
            if range.start > cursor {
                self.pending
                    .push_back(Token::new(cursor, TokenType::TEXT, &text[cursor..range.start]));
            }
            match piece {
                Piece::Kind(kind) => self
                    .pending
                    .push_back(Token::new(range.start, kind, &text[range.clone()])),
                Piece::Using(delegate) => self.delegate(range.clone(), delegate),
            }
            cursor = range.end;
        }
        if cursor < span.end {
            self.pending
                .push_back(Token::new(cursor, TokenType::TEXT, &text[cursor..span.end]));
        }
    }

    /// Tokenize `span` with `delegate` and splice the result in, shifted to
    /// absolute offsets.
    fn delegate(&mut self, span: Range<usize>, delegate: &'a CompiledDelegate) {
        let slice = &self.ctx.text()[span.clone()];
        let tokens: Vec<Token<'a>> = match delegate {
            CompiledDelegate::This(stack) => {
                if self.depth >= MAX_DELEGATION_DEPTH {
                    warn!(
                        grammar = self.ctx.table().name(),
                        offset = span.start,
                        "delegation nested too deeply"
                    );
                    self.pending
                        .push_back(Token::new(span.start, TokenType::ERROR, slice));
                    return;
                }
                let ctx = LexerContext::with_ids(self.ctx.table(), slice, stack);
                let nested = Tokens::nested(ctx, self.depth + 1);
                ensure_sufficient_stack(|| nested.collect())
            }
            CompiledDelegate::Lexer(lexer) => {
                ensure_sufficient_stack(|| lexer.tokens(slice).collect())
            }
        };
        self.pending
            .extend(tokens.into_iter().map(|token| token.shifted(span.start)));
    }

    /// One `Error` token for the next character; the stack is unchanged.
    fn recover(&mut self) {
        self.zero_width_steps = 0;
        let text = self.ctx.text();
        let pos = self.ctx.pos();
        let Some(len) = text[pos..self.ctx.end()].chars().next().map(char::len_utf8) else {
            return;
        };
        trace!(
            grammar = self.ctx.table().name(),
            state = self.ctx.top_name(),
            pos,
            "no rule matched"
        );
        self.pending
            .push_back(Token::new(pos, TokenType::ERROR, &text[pos..pos + len]));
        self.ctx.set_pos(pos + len);
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.ctx.pos() >= self.ctx.end() {
                return None;
            }
            self.step();
        }
    }
}

impl FusedIterator for Tokens<'_> {}

#[cfg(test)]
mod tests;
