//! Declarative grammars: the authoring form of a lexer.
//!
//! A [`Grammar`] maps state names to ordered [`Entry`] lists. Entries are
//! rules or directives (`include`, `inherit`, `default`). Nothing is resolved
//! here; [`StateTable::build`](crate::StateTable::build) validates and
//! flattens the grammar in one pass.
//!
//! ```text
//! Grammar::new("ini")
//!     .state("root", |s| {
//!         s.rule(r"\s+", TokenType::TEXT)
//!             .rule(r"[;#].*", TokenType::COMMENT_SINGLE)
//!             .rule_then(r"\[", TokenType::KEYWORD, Next::push("section"))
//!     })
//!     .state("section", |s| {
//!         s.rule_then(r"\]", TokenType::KEYWORD, Next::pop(1))
//!             .rule(r"[^\]\n]+", TokenType::KEYWORD)
//!     })
//! ```

use crate::action::Action;
use crate::pattern::RegexFlags;

/// How a matching rule changes the state stack.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Next {
    #[default]
    Stay,
    Push(String),
    /// Push another copy of the current top state.
    PushSelf,
    /// Pop this many frames. The bottom frame is never popped.
    Pop(usize),
    /// Apply each step in order, e.g. pop one frame then push `"beer"`.
    Seq(Vec<Next>),
    /// Push the anonymous state made of the named states' rules, in order.
    Combined(Vec<String>),
}

impl Next {
    pub fn push(state: &str) -> Next {
        Next::Push(state.to_owned())
    }

    pub fn pop(count: usize) -> Next {
        Next::Pop(count)
    }

    pub fn seq(steps: impl IntoIterator<Item = Next>) -> Next {
        Next::Seq(steps.into_iter().collect())
    }

    /// Push several named states; the last one ends up on top.
    pub fn push_all<'s>(states: impl IntoIterator<Item = &'s str>) -> Next {
        Next::Seq(states.into_iter().map(Next::push).collect())
    }

    pub fn combined<'s>(states: impl IntoIterator<Item = &'s str>) -> Next {
        Next::Combined(states.into_iter().map(str::to_owned).collect())
    }

    pub fn is_stay(&self) -> bool {
        match self {
            Next::Stay => true,
            Next::Seq(steps) => steps.iter().all(Next::is_stay),
            _ => false,
        }
    }
}

/// One rule as written: pattern, action, transition.
#[derive(Clone, Debug)]
pub struct RuleSpec {
    pub pattern: String,
    pub action: Action,
    pub next: Next,
}

/// One line of a state definition.
#[derive(Clone, Debug)]
pub enum Entry {
    Rule(RuleSpec),
    /// Splice the named state's (flattened) rules here.
    Include(String),
    /// Splice the parent grammar's entries for this same state here.
    Inherit,
    /// Transition without consuming input when nothing earlier matched.
    Default(Next),
}

/// Collects the entries of one state.
pub struct StateBuilder {
    entries: Vec<Entry>,
}

impl StateBuilder {
    fn new() -> Self {
        StateBuilder {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn rule(self, pattern: &str, action: impl Into<Action>) -> Self {
        self.rule_then(pattern, action, Next::Stay)
    }

    #[must_use]
    pub fn rule_then(mut self, pattern: &str, action: impl Into<Action>, next: Next) -> Self {
        self.entries.push(Entry::Rule(RuleSpec {
            pattern: pattern.to_owned(),
            action: action.into(),
            next,
        }));
        self
    }

    #[must_use]
    pub fn include(mut self, state: &str) -> Self {
        self.entries.push(Entry::Include(state.to_owned()));
        self
    }

    #[must_use]
    pub fn inherit(mut self) -> Self {
        self.entries.push(Entry::Inherit);
        self
    }

    #[must_use]
    pub fn default(mut self, next: Next) -> Self {
        self.entries.push(Entry::Default(next));
        self
    }

    #[must_use]
    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }
}

/// A lexer definition: named states of ordered entries.
#[derive(Clone, Debug)]
pub struct Grammar {
    name: String,
    flags: RegexFlags,
    states: Vec<(String, Vec<Entry>)>,
}

impl Grammar {
    pub fn new(name: &str) -> Self {
        Grammar {
            name: name.to_owned(),
            flags: RegexFlags::default(),
            states: Vec::new(),
        }
    }

    #[must_use]
    pub fn flags(mut self, flags: RegexFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Define (or redefine) a state.
    #[must_use]
    pub fn state(mut self, name: &str, build: impl FnOnce(StateBuilder) -> StateBuilder) -> Self {
        let entries = build(StateBuilder::new()).entries;
        self.set_state(name, entries);
        self
    }

    /// Resolve this grammar's `inherit` markers against `parent`.
    ///
    /// For each state the child defines, its first `inherit` marker is
    /// replaced by the parent's entries for that state. A child state with
    /// no marker overrides the parent's; parent states the child does not
    /// define are copied. The result can itself be inherited from, so
    /// chains compose one level at a time.
    #[must_use]
    pub fn inheriting(mut self, parent: &Grammar) -> Self {
        for (name, entries) in &mut self.states {
            let Some(inherited) = parent.entries(name) else {
                continue;
            };
            if let Some(at) = entries.iter().position(|e| matches!(e, Entry::Inherit)) {
                entries.splice(at..=at, inherited.iter().cloned());
            }
        }
        for (name, entries) in &parent.states {
            if self.entries(name).is_none() {
                self.states.push((name.clone(), entries.clone()));
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regex_flags(&self) -> RegexFlags {
        self.flags
    }

    /// State names in definition order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|(name, _)| name.as_str())
    }

    pub fn entries(&self, state: &str) -> Option<&[Entry]> {
        self.states
            .iter()
            .find(|(name, _)| name == state)
            .map(|(_, entries)| entries.as_slice())
    }

    fn set_state(&mut self, name: &str, entries: Vec<Entry>) {
        match self.states.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = entries,
            None => self.states.push((name.to_owned(), entries)),
        }
    }
}
