//! Lexer front ends.

use crate::context::LexerContext;
use crate::engine::Tokens;
use crate::error::{BuildError, UnknownState};
use crate::grammar::Grammar;
use crate::table::StateTable;
use std::sync::Arc;
use tinct_token::Token;

/// A boxed lazy token stream.
pub type TokenStream<'a> = Box<dyn Iterator<Item = Token<'a>> + 'a>;

/// Anything that turns text into a token stream.
///
/// Implementors must uphold the stream guarantees: tokens in order,
/// offsets relative to `text`, texts concatenating to `text`, and no
/// failure on any input.
pub trait Lexer: Send + Sync {
    /// Name used in diagnostics and registries.
    fn name(&self) -> &str;

    fn tokens<'a>(&'a self, text: &'a str) -> TokenStream<'a>;
}

/// The plain engine over a compiled grammar.
#[derive(Clone, Debug)]
pub struct RegexLexer {
    table: Arc<StateTable>,
}

impl RegexLexer {
    /// Compile `grammar`. Context callbacks are rejected; use
    /// [`ExtendedLexer`] for grammars that need them.
    pub fn new(grammar: &Grammar) -> Result<Self, BuildError> {
        Ok(RegexLexer {
            table: Arc::new(StateTable::build(grammar)?),
        })
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Tokenize `text` from the root state.
    pub fn tokenize<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens::new(LexerContext::new(&self.table, text))
    }

    /// Tokenize `text` starting from a named stack, bottom first.
    pub fn tokenize_from<'a>(
        &'a self,
        text: &'a str,
        stack: &[&str],
    ) -> Result<Tokens<'a>, UnknownState> {
        LexerContext::with_stack(&self.table, text, stack).map(Tokens::new)
    }
}

impl Lexer for RegexLexer {
    fn name(&self) -> &str {
        self.table.name()
    }

    fn tokens<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        Box::new(self.tokenize(text))
    }
}

/// The extended engine: like [`RegexLexer`], but context callbacks may
/// edit the position and stack, and runs can start from a caller-built
/// [`LexerContext`].
#[derive(Clone, Debug)]
pub struct ExtendedLexer {
    table: Arc<StateTable>,
}

impl ExtendedLexer {
    pub fn new(grammar: &Grammar) -> Result<Self, BuildError> {
        Ok(ExtendedLexer {
            table: Arc::new(StateTable::build_extended(grammar)?),
        })
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    pub fn tokenize<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens::new(self.context(text))
    }

    /// A fresh context over `text`, to adjust before [`resume`](Self::resume).
    pub fn context<'a>(&'a self, text: &'a str) -> LexerContext<'a> {
        LexerContext::new(&self.table, text)
    }

    /// Continue tokenizing from `ctx`'s position, end bound and stack.
    ///
    /// The context must come from this lexer's table.
    pub fn resume<'a>(&'a self, ctx: LexerContext<'a>) -> Tokens<'a> {
        debug_assert!(std::ptr::eq(ctx.table(), &*self.table));
        Tokens::new(ctx)
    }
}

impl Lexer for ExtendedLexer {
    fn name(&self) -> &str {
        self.table.name()
    }

    fn tokens<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        Box::new(self.tokenize(text))
    }
}
