//! Errors raised while compiling a grammar.
//!
//! Tokenizing never fails; every error here is a defect in a lexer
//! *definition* and is reported once, when its state table is built. A
//! failing grammar does not affect any other lexer.

use thiserror::Error;

/// A grammar could not be compiled into a state table.
///
/// `index` always refers to the entry's position in the state as written,
/// before include/inherit flattening.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("grammar `{grammar}` has no `root` state")]
    MissingRoot { grammar: String },

    #[error("grammar `{grammar}`: state `{state}` entry {index} refers to unknown state `{target}`")]
    UnknownState {
        grammar: String,
        state: String,
        index: usize,
        target: String,
    },

    #[error("grammar `{grammar}`: include cycle {}", chain.join(" -> "))]
    IncludeCycle { grammar: String, chain: Vec<String> },

    #[error("grammar `{grammar}`: state `{state}` entry {index} has an invalid pattern: {message}")]
    InvalidPattern {
        grammar: String,
        state: String,
        index: usize,
        message: String,
    },

    #[error(
        "grammar `{grammar}`: state `{state}` entry {index} can only match the empty string \
         and never changes state"
    )]
    ZeroWidthRule {
        grammar: String,
        state: String,
        index: usize,
    },

    #[error("grammar `{grammar}`: state `{state}` entry {index} pops zero states")]
    ZeroPop {
        grammar: String,
        state: String,
        index: usize,
    },

    #[error("grammar `{grammar}`: state `{state}` entry {index} combines no states")]
    EmptyCombined {
        grammar: String,
        state: String,
        index: usize,
    },

    #[error(
        "grammar `{grammar}`: state `{state}` entry {index} uses a context callback, \
         which only the extended engine supports"
    )]
    ContextActionInPlainLexer {
        grammar: String,
        state: String,
        index: usize,
    },
}

/// A state name that the table does not define.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown state `{0}`")]
pub struct UnknownState(pub String);
