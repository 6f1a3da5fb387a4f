//! Token types and token values for the tinct tokenizer.
//!
//! This crate is standalone: it has no dependency on the regex engine or any
//! other tinct crate, so formatters and highlighters that only consume token
//! streams can depend on it alone.
//!
//! - [`TokenType`]: an immutable, hierarchical label such as `Comment.Single`
//!   with prefix-based subtype semantics.
//! - [`Token`]: a classified span `(offset, TokenType, text)` borrowing its
//!   text from the tokenized input.
//! - [`OwnedToken`]: the detached, serializable form of a token.

mod token;
mod token_type;

pub use token::{OwnedToken, Token};
pub use token_type::TokenType;
