//! What a rule does with the text it matched.

use crate::context::LexerContext;
use crate::lexer::Lexer;
use regex_automata::util::captures::Captures;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use tinct_token::TokenType;

/// Computes tokens from a match. Used for context-dependent classification
/// that a fixed token type cannot express.
pub type Callback = Arc<dyn Fn(&MatchView<'_>) -> Vec<Emission> + Send + Sync>;

/// Like [`Callback`], but may also inspect and rewrite the run state.
///
/// The engine does not advance past the match after a context callback; the
/// callback moves the position itself through [`LexerContext::set_pos`].
pub type ContextCallback =
    Arc<dyn Fn(&MatchView<'_>, &mut LexerContext<'_>) -> Vec<Emission> + Send + Sync>;

/// A token produced by a callback: absolute byte offset, type, byte length.
///
/// Emissions must come in increasing offset order. Overlapping or
/// out-of-range emissions are dropped; text between emissions is emitted as
/// `Text`, so the stream still reconstructs the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Emission {
    pub offset: usize,
    pub kind: TokenType,
    pub len: usize,
}

impl Emission {
    pub fn new(offset: usize, kind: TokenType, len: usize) -> Self {
        Emission { offset, kind, len }
    }
}

/// The action part of a rule.
#[derive(Clone)]
pub enum Action {
    /// One token for the whole match.
    Token(TokenType),
    /// One action per capture group, in group order. Groups that did not
    /// participate or matched nothing are skipped.
    ByGroups(Vec<GroupAction>),
    /// Feed the match through another lexer and splice its tokens in.
    Using(Delegate),
    Callback(Callback),
    /// Only honored by [`ExtendedLexer`](crate::ExtendedLexer).
    Context(ContextCallback),
}

impl Action {
    pub fn by_groups<I, G>(groups: I) -> Action
    where
        I: IntoIterator<Item = G>,
        G: Into<GroupAction>,
    {
        Action::ByGroups(groups.into_iter().map(Into::into).collect())
    }

    pub fn callback<F>(f: F) -> Action
    where
        F: Fn(&MatchView<'_>) -> Vec<Emission> + Send + Sync + 'static,
    {
        Action::Callback(Arc::new(f))
    }

    pub fn context<F>(f: F) -> Action
    where
        F: Fn(&MatchView<'_>, &mut LexerContext<'_>) -> Vec<Emission> + Send + Sync + 'static,
    {
        Action::Context(Arc::new(f))
    }
}

impl From<TokenType> for Action {
    fn from(kind: TokenType) -> Self {
        Action::Token(kind)
    }
}

impl From<Delegate> for Action {
    fn from(delegate: Delegate) -> Self {
        Action::Using(delegate)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Token(kind) => f.debug_tuple("Token").field(kind).finish(),
            Action::ByGroups(groups) => f.debug_tuple("ByGroups").field(groups).finish(),
            Action::Using(delegate) => f.debug_tuple("Using").field(delegate).finish(),
            Action::Callback(_) => f.write_str("Callback(..)"),
            Action::Context(_) => f.write_str("Context(..)"),
        }
    }
}

/// The action for one capture group.
#[derive(Clone, Debug)]
pub enum GroupAction {
    Token(TokenType),
    Using(Delegate),
}

impl From<TokenType> for GroupAction {
    fn from(kind: TokenType) -> Self {
        GroupAction::Token(kind)
    }
}

impl From<Delegate> for GroupAction {
    fn from(delegate: Delegate) -> Self {
        GroupAction::Using(delegate)
    }
}

/// Where delegated text is tokenized.
#[derive(Clone)]
pub enum Delegate {
    /// The same grammar, starting from the given stack (bottom first).
    /// An empty stack starts from `root`.
    This(Vec<String>),
    /// Another lexer, run from its own start state.
    Lexer(Arc<dyn Lexer>),
}

impl Delegate {
    /// The same grammar from `root`.
    pub fn this() -> Delegate {
        Delegate::This(Vec::new())
    }

    /// The same grammar with `state` pushed on top of `root`.
    pub fn this_in(state: &str) -> Delegate {
        Delegate::This(vec!["root".to_owned(), state.to_owned()])
    }

    pub fn lexer(lexer: Arc<dyn Lexer>) -> Delegate {
        Delegate::Lexer(lexer)
    }
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delegate::This(stack) => f.debug_tuple("This").field(stack).finish(),
            Delegate::Lexer(lexer) => write!(f, "Lexer({})", lexer.name()),
        }
    }
}

/// Read-only view of one match, handed to callbacks.
///
/// All offsets are absolute byte offsets into the input being tokenized.
pub struct MatchView<'a> {
    input: &'a str,
    captures: &'a Captures,
}

impl<'a> MatchView<'a> {
    pub(crate) fn new(input: &'a str, captures: &'a Captures) -> Self {
        MatchView { input, captures }
    }

    /// The whole input, for callbacks that need surrounding context.
    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn start(&self) -> usize {
        self.span().start
    }

    pub fn end(&self) -> usize {
        self.span().end
    }

    /// The matched text.
    pub fn as_str(&self) -> &'a str {
        &self.input[self.span()]
    }

    /// Number of groups, counting the implicit whole-match group 0.
    pub fn group_count(&self) -> usize {
        self.captures.group_len()
    }

    /// Span of group `index`, or `None` if it did not participate.
    pub fn group_span(&self, index: usize) -> Option<Range<usize>> {
        self.captures.get_group(index).map(|span| span.range())
    }

    pub fn group(&self, index: usize) -> Option<&'a str> {
        self.group_span(index).map(|range| &self.input[range])
    }

    /// An emission covering group `index`, if it matched something.
    pub fn emit_group(&self, index: usize, kind: TokenType) -> Option<Emission> {
        self.group_span(index)
            .filter(|range| !range.is_empty())
            .map(|range| Emission::new(range.start, kind, range.len()))
    }

    fn span(&self) -> Range<usize> {
        self.captures
            .get_match()
            .map_or(0..0, |found| found.range())
    }
}
