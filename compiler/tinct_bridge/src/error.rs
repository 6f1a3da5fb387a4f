//! Errors surfaced to a calling process.

use thiserror::Error;
use tinct_lexer::OptionError;

/// No registered lexer matched a selection query.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no lexer named `{0}`")]
    Name(String),

    #[error("no lexer for mimetype `{0}`")]
    Mimetype(String),

    #[error("no lexer for filename `{0}`")]
    Filename(String),

    #[error("no lexer requested: give a lexer, mimetype or filename")]
    EmptyQuery,
}

/// A request that could not be answered.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("bad options: {0}")]
    Options(#[from] OptionError),
}
