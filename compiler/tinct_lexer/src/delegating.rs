//! Composition of two lexers.
//!
//! A template language is lexed by a *primary* lexer that only understands
//! its own tags and marks everything else with a needle type (`Other` by
//! default). The marked text is then handed to a *secondary* lexer for the
//! host language, and its tokens are spliced into the stream where the
//! marked text was. Neither lexer knows the other's grammar.

use crate::lexer::{Lexer, TokenStream};
use std::iter::Peekable;
use std::sync::Arc;
use tinct_token::{Token, TokenType};

/// How marked text is handed to the secondary lexer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SpliceMode {
    /// Each run of adjacent marked tokens is lexed on its own, lazily, as
    /// the stream is consumed. Secondary state does not carry across runs.
    #[default]
    PerSpan,
    /// All marked text is concatenated and lexed once, so secondary state
    /// carries across the primary's tokens. Secondary tokens that straddle
    /// a primary token are split around it. Runs the primary to completion
    /// before yielding.
    Contiguous,
}

/// Runs `primary`, re-lexing its needle-typed text with `secondary`.
#[derive(Clone)]
pub struct DelegatingLexer {
    name: String,
    primary: Arc<dyn Lexer>,
    secondary: Arc<dyn Lexer>,
    needle: TokenType,
    mode: SpliceMode,
}

impl DelegatingLexer {
    pub fn new(name: &str, primary: Arc<dyn Lexer>, secondary: Arc<dyn Lexer>) -> Self {
        DelegatingLexer {
            name: name.to_owned(),
            primary,
            secondary,
            needle: TokenType::OTHER,
            mode: SpliceMode::default(),
        }
    }

    /// Mark delegated text with `needle` instead of `Other`. Only tokens of
    /// exactly this type are delegated, not its subtypes.
    #[must_use]
    pub fn with_needle(mut self, needle: TokenType) -> Self {
        self.needle = needle;
        self
    }

    #[must_use]
    pub fn splice(mut self, mode: SpliceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn needle(&self) -> TokenType {
        self.needle
    }

    pub fn mode(&self) -> SpliceMode {
        self.mode
    }

    fn contiguous<'a>(&'a self, text: &'a str) -> Vec<Token<'a>> {
        let mut buffer = String::new();
        let mut segments: Vec<Segment<'a>> = Vec::new();
        for token in self.primary.tokens(text) {
            if token.kind != self.needle {
                segments.push(Segment::Kept(token));
                continue;
            }
            let buffer_start = buffer.len();
            buffer.push_str(token.text);
            match segments.last_mut() {
                Some(Segment::Marked { offset, len, .. }) if *offset + *len == token.offset => {
                    *len += token.text.len();
                }
                _ => segments.push(Segment::Marked {
                    offset: token.offset,
                    buffer_start,
                    len: token.text.len(),
                }),
            }
        }

        let hosted: Vec<(usize, usize, TokenType)> = self
            .secondary
            .tokens(&buffer)
            .map(|token| (token.offset, token.end(), token.kind))
            .collect();

        let mut out = Vec::with_capacity(segments.len() + hosted.len());
        let mut next = 0;
        for segment in segments {
            let (offset, buffer_start, len) = match segment {
                Segment::Kept(token) => {
                    out.push(token);
                    continue;
                }
                Segment::Marked {
                    offset,
                    buffer_start,
                    len,
                } => (offset, buffer_start, len),
            };
            let buffer_end = buffer_start + len;
            while let Some(&(start, end, kind)) = hosted.get(next) {
                let (from, to) = (start.max(buffer_start), end.min(buffer_end));
                if from < to {
                    let at = offset + (from - buffer_start);
                    out.push(Token::new(at, kind, &text[at..at + (to - from)]));
                }
                if end > buffer_end {
                    break;
                }
                next += 1;
            }
        }
        out
    }
}

impl Lexer for DelegatingLexer {
    fn name(&self) -> &str {
        &self.name
    }

    fn tokens<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        match self.mode {
            SpliceMode::PerSpan => Box::new(PerSpan {
                text,
                primary: self.primary.tokens(text).peekable(),
                secondary: &*self.secondary,
                needle: self.needle,
                inner: None,
            }),
            SpliceMode::Contiguous => Box::new(self.contiguous(text).into_iter()),
        }
    }
}

/// A primary token kept as is, or a run of marked text.
enum Segment<'a> {
    Kept(Token<'a>),
    Marked {
        offset: usize,
        buffer_start: usize,
        len: usize,
    },
}

/// Lazy splice: one secondary run per span of adjacent marked tokens.
struct PerSpan<'a> {
    text: &'a str,
    primary: Peekable<TokenStream<'a>>,
    secondary: &'a dyn Lexer,
    needle: TokenType,
    /// Offset of the span being spliced, and the secondary's tokens for it.
    inner: Option<(usize, TokenStream<'a>)>,
}

impl<'a> Iterator for PerSpan<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            if let Some((shift, inner)) = &mut self.inner {
                if let Some(token) = inner.next() {
                    return Some(token.shifted(*shift));
                }
                self.inner = None;
            }

            let token = self.primary.next()?;
            if token.kind != self.needle {
                return Some(token);
            }
            let needle = self.needle;
            let mut end = token.end();
            while let Some(more) = self
                .primary
                .next_if(|next| next.kind == needle && next.offset == end)
            {
                end = more.end();
            }
            let span = &self.text[token.offset..end];
            self.inner = Some((token.offset, self.secondary.tokens(span)));
        }
    }
}
