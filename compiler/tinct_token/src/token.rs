//! Token values.

use super::TokenType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A classified contiguous span of the tokenized input.
///
/// `offset` is the byte offset of `text` in the input the engine was run
/// over. Tokens of one stream never overlap and leave no gaps, so
/// concatenating their texts in order reproduces that input.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token<'a> {
    pub offset: usize,
    pub kind: TokenType,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    #[inline]
    pub fn new(offset: usize, kind: TokenType, text: &'a str) -> Self {
        Token { offset, kind, text }
    }

    /// Byte offset one past the last byte of this token.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// Same token moved by `delta` bytes (used when splicing a sub-stream
    /// produced over a slice of the input).
    #[inline]
    #[must_use]
    pub fn shifted(self, delta: usize) -> Self {
        Token {
            offset: self.offset + delta,
            ..self
        }
    }

    /// Detach the token from the input buffer.
    pub fn to_owned_token(&self) -> OwnedToken {
        OwnedToken {
            offset: self.offset,
            kind: self.kind,
            text: self.text.to_owned(),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?}, {:?})", self.offset, self.kind, self.text)
    }
}

/// A token that owns its text.
///
/// Serializes as the triple `[offset, "Type.Path", "text"]`, which is the
/// lossless text form handed to a calling process.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    from = "(usize, TokenType, String)",
    into = "(usize, TokenType, String)"
)]
pub struct OwnedToken {
    pub offset: usize,
    pub kind: TokenType,
    pub text: String,
}

impl OwnedToken {
    /// Borrow as a [`Token`].
    pub fn as_token(&self) -> Token<'_> {
        Token::new(self.offset, self.kind, &self.text)
    }
}

impl From<(usize, TokenType, String)> for OwnedToken {
    fn from((offset, kind, text): (usize, TokenType, String)) -> Self {
        OwnedToken { offset, kind, text }
    }
}

impl From<OwnedToken> for (usize, TokenType, String) {
    fn from(token: OwnedToken) -> Self {
        (token.offset, token.kind, token.text)
    }
}

impl From<Token<'_>> for OwnedToken {
    fn from(token: Token<'_>) -> Self {
        token.to_owned_token()
    }
}

impl fmt::Debug for OwnedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_token(), f)
    }
}

#[cfg(test)]
mod tests;
