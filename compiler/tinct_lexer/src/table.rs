//! Compiled state tables.
//!
//! A [`StateTable`] is the immutable, fully resolved form of a [`Grammar`]:
//! every state is a flat rule list with includes spliced in, every
//! transition names states by [`StateId`], and every pattern is compiled.
//! Tables are built once per lexer and shared read-only by all runs.

use crate::action::{Callback, ContextCallback};
use crate::compiler;
use crate::error::BuildError;
use crate::grammar::Grammar;
use crate::lexer::Lexer;
use crate::pattern::Pattern;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tinct_token::TokenType;

/// The state stack of one run, bottom first.
pub(crate) type Stack = SmallVec<[StateId; 8]>;

/// Index of a state in its [`StateTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    #[allow(clippy::cast_possible_truncation)] // state counts always fit u32
    pub(crate) const fn new(index: usize) -> Self {
        StateId(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A compiled state: its name and flattened rules, in match order.
#[derive(Clone, Debug)]
pub struct State {
    name: String,
    rules: Vec<Rule>,
}

impl State {
    pub(crate) fn new(name: String, rules: Vec<Rule>) -> Self {
        State { name, rules }
    }

    /// The state's name. Combined states are named after their parts,
    /// joined with `+`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// One compiled rule.
#[derive(Clone, Debug)]
pub struct Rule {
    pattern: Pattern,
    action: RuleAction,
    transition: Transition,
}

impl Rule {
    pub(crate) fn new(pattern: Pattern, action: RuleAction, transition: Transition) -> Self {
        Rule {
            pattern,
            action,
            transition,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn action(&self) -> &RuleAction {
        &self.action
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    /// Whether applying the action needs capture group spans.
    #[inline]
    pub fn needs_captures(&self) -> bool {
        matches!(
            self.action,
            RuleAction::ByGroups(_) | RuleAction::Callback(_) | RuleAction::Context(_)
        )
    }
}

/// A rule action with delegate states resolved.
#[derive(Clone)]
pub enum RuleAction {
    Token(TokenType),
    ByGroups(Box<[CompiledGroup]>),
    Using(CompiledDelegate),
    Callback(Callback),
    Context(ContextCallback),
    /// Emits nothing. Used by `default` entries, which match the empty
    /// string and only transition.
    Silent,
}

impl fmt::Debug for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Token(kind) => f.debug_tuple("Token").field(kind).finish(),
            RuleAction::ByGroups(groups) => f.debug_tuple("ByGroups").field(groups).finish(),
            RuleAction::Using(delegate) => f.debug_tuple("Using").field(delegate).finish(),
            RuleAction::Callback(_) => f.write_str("Callback(..)"),
            RuleAction::Context(_) => f.write_str("Context(..)"),
            RuleAction::Silent => f.write_str("Silent"),
        }
    }
}

/// The action for one capture group, resolved.
#[derive(Clone, Debug)]
pub enum CompiledGroup {
    Token(TokenType),
    Using(CompiledDelegate),
}

/// A resolved delegation target.
#[derive(Clone)]
pub enum CompiledDelegate {
    /// The same table, starting from this stack (bottom first, never empty).
    This(SmallVec<[StateId; 2]>),
    Lexer(Arc<dyn Lexer>),
}

impl fmt::Debug for CompiledDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledDelegate::This(stack) => f.debug_tuple("This").field(stack).finish(),
            CompiledDelegate::Lexer(lexer) => write!(f, "Lexer({})", lexer.name()),
        }
    }
}

/// One primitive stack edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StackOp {
    Push(StateId),
    /// Push the current top again.
    PushTop,
    /// Pop up to this many frames, always keeping the bottom one.
    Pop(usize),
}

/// The stack edits a rule performs after its action, applied in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    ops: SmallVec<[StackOp; 2]>,
}

impl Transition {
    pub(crate) fn new(ops: SmallVec<[StackOp; 2]>) -> Self {
        Transition { ops }
    }

    /// No stack edits.
    #[inline]
    pub fn is_stay(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[StackOp] {
        &self.ops
    }

    pub(crate) fn apply(&self, stack: &mut Stack) {
        for op in &self.ops {
            match *op {
                StackOp::Push(id) => stack.push(id),
                StackOp::PushTop => {
                    if let Some(&top) = stack.last() {
                        stack.push(top);
                    }
                }
                StackOp::Pop(count) => {
                    let keep = stack.len().saturating_sub(count).max(1);
                    stack.truncate(keep);
                }
            }
        }
    }
}

/// The compiled, immutable form of a grammar.
#[derive(Clone, Debug)]
pub struct StateTable {
    name: String,
    states: Vec<State>,
    index: FxHashMap<String, StateId>,
    combined: FxHashMap<Vec<StateId>, StateId>,
    root: StateId,
}

impl StateTable {
    pub(crate) fn from_parts(
        name: String,
        states: Vec<State>,
        index: FxHashMap<String, StateId>,
        combined: FxHashMap<Vec<StateId>, StateId>,
        root: StateId,
    ) -> Self {
        StateTable {
            name,
            states,
            index,
            combined,
            root,
        }
    }

    /// Compile a grammar for the plain engine.
    ///
    /// Context callbacks are rejected with
    /// [`BuildError::ContextActionInPlainLexer`].
    pub fn build(grammar: &Grammar) -> Result<StateTable, BuildError> {
        compiler::compile(grammar, false)
    }

    /// Compile a grammar for the extended engine, which honors context
    /// callbacks.
    pub fn build_extended(grammar: &Grammar) -> Result<StateTable, BuildError> {
        compiler::compile(grammar, true)
    }

    /// The grammar's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn root(&self) -> StateId {
        self.root
    }

    /// The state with this id. Ids come from this table, so the lookup
    /// cannot miss.
    #[inline]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Look up a named state. Combined states have no name to look up.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// The interned combined state for these named states, if any rule
    /// pushes it.
    pub fn combined(&self, names: &[&str]) -> Option<StateId> {
        let parts = names
            .iter()
            .map(|name| self.state_id(name))
            .collect::<Option<Vec<_>>>()?;
        self.combined.get(&parts).copied()
    }

    /// Number of states, named and combined.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All states, in id order: named states in definition order, then
    /// combined states in first-use order.
    pub fn states(&self) -> &[State] {
        &self.states
    }
}
