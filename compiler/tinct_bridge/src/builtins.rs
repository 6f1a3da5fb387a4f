//! Lexers every registry starts with.
//!
//! Each is a plain [`Grammar`]; nothing here is special-cased by the
//! engine.

use crate::registry::{LexerInfo, LexerRegistry};
use std::sync::Arc;
use tinct_lexer::{Action, BuildError, Grammar, RegexLexer};
use tinct_token::TokenType;

/// Register all built-in lexers.
pub fn register_all(registry: &mut LexerRegistry) -> Result<(), BuildError> {
    for (info, grammar) in [
        (text_info(), text()),
        (ini_info(), ini()),
        (diff_info(), diff()),
    ] {
        registry.register(info, Arc::new(RegexLexer::new(&grammar)?));
    }
    Ok(())
}

// -- Plain text --

fn text_info() -> LexerInfo {
    LexerInfo::new("Text only")
        .with_aliases(["text"])
        .with_filenames(["*.txt"])
        .with_mimetypes(["text/plain"])
}

/// The whole input as one `Text` token.
pub fn text() -> Grammar {
    Grammar::new("text").state("root", |s| s.rule(r"(?s).+", TokenType::TEXT))
}

// -- INI --

fn ini_info() -> LexerInfo {
    LexerInfo::new("INI")
        .with_aliases(["ini", "cfg", "dosini"])
        .with_filenames(["*.ini", "*.cfg", "*.inf"])
        .with_mimetypes(["text/x-ini", "text/inf"])
}

/// Sections, `key = value` pairs with indented continuation lines, and
/// `;` or `#` comments.
pub fn ini() -> Grammar {
    Grammar::new("ini").state("root", |s| {
        s.rule(r"\s+", TokenType::WHITESPACE)
            .rule(r"[;#].*", TokenType::COMMENT_SINGLE)
            .rule(r"\[.*?\]$", TokenType::KEYWORD)
            .rule(
                r"(.*?)([ \t]*)(=)([ \t]*)(.*(?:\n[ \t].+)*)",
                Action::by_groups([
                    TokenType::NAME_ATTRIBUTE,
                    TokenType::WHITESPACE,
                    TokenType::OPERATOR,
                    TokenType::WHITESPACE,
                    TokenType::STRING,
                ]),
            )
    })
}

// -- Unified and context diffs --

fn diff_info() -> LexerInfo {
    LexerInfo::new("Diff")
        .with_aliases(["diff", "udiff"])
        .with_filenames(["*.diff", "*.patch"])
        .with_mimetypes(["text/x-diff", "text/x-patch"])
}

/// One token per line, typed by the line's leading marker.
pub fn diff() -> Grammar {
    Grammar::new("diff").state("root", |s| {
        s.rule(r" .*\n", TokenType::TEXT)
            .rule(r"\+.*\n", TokenType::GENERIC_INSERTED)
            .rule(r"-.*\n", TokenType::GENERIC_DELETED)
            .rule(r"!.*\n", TokenType::GENERIC_STRONG)
            .rule(r"@.*\n", TokenType::GENERIC_SUBHEADING)
            .rule(r"([Ii]ndex|diff).*\n", TokenType::GENERIC_HEADING)
            .rule(r"=.*\n", TokenType::GENERIC_HEADING)
            .rule(r".*\n", TokenType::TEXT)
    })
}
