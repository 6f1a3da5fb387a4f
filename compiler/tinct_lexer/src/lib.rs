//! Declarative, stateful tokenizer engine.
//!
//! Every concrete language lexer is data: a [`Grammar`] mapping state names to
//! ordered rules. The grammar is compiled once into an immutable
//! [`StateTable`] (with `include`, `inherit` and `combined` directives
//! flattened), and an engine interprets that table against input text,
//! producing a lazy stream of [`Token`]s.
//!
//! # Engines
//!
//! - [`RegexLexer`]: the plain interpreter. First matching rule wins, the
//!   stack changes only through declared transitions.
//! - [`ExtendedLexer`]: same table shape, but [`Action::Context`] callbacks get
//!   a mutable [`LexerContext`] and may rewrite the stack and position.
//! - [`DelegatingLexer`]: composes two lexers; spans the primary marks with a
//!   needle type (`Other`) are re-tokenized by the secondary.
//!
//! # Guarantees
//!
//! Tokenizing never fails and never hangs. Input no rule accepts becomes
//! one-character `Error` tokens, and concatenating the token texts always
//! reproduces the input.
//!
//! ```text
//! let grammar = Grammar::new("demo").state("root", |s| {
//!     s.rule(r"[0-9]+", TokenType::NUMBER)
//!         .rule(r"[a-z]+", TokenType::NAME)
//! });
//! let lexer = RegexLexer::new(&grammar)?;
//! let tokens: Vec<_> = lexer.tokenize("12ab").collect();
//! ```

mod action;
mod compiler;
mod context;
mod delegating;
mod engine;
mod error;
mod grammar;
mod lexer;
mod options;
mod pattern;
mod stack;
mod table;

pub use action::{Action, Callback, ContextCallback, Delegate, Emission, GroupAction, MatchView};
pub use context::LexerContext;
pub use delegating::{DelegatingLexer, SpliceMode};
pub use engine::{Tokens, MAX_DELEGATION_DEPTH, MAX_ZERO_WIDTH_STEPS};
pub use error::{BuildError, UnknownState};
pub use grammar::{Entry, Grammar, Next, RuleSpec, StateBuilder};
pub use lexer::{ExtendedLexer, Lexer, RegexLexer, TokenStream};
pub use options::{LexerOptions, OptionError, OptionValue, MAX_TAB_SIZE};
pub use pattern::{words, Pattern, RegexFlags};
pub use table::{
    CompiledDelegate, CompiledGroup, Rule, RuleAction, StackOp, State, StateId, StateTable,
    Transition,
};

pub use tinct_token::{OwnedToken, Token, TokenType};
