//! Compiled rule patterns.
//!
//! Patterns are matched *anchored* at the current offset, over the whole
//! input rather than a suffix copy. Keeping the full haystack means
//! assertions such as `^` (multi-line), `\b` and `$` see the real
//! surrounding text, and offsets need no translation.

use bitflags::bitflags;
use regex_automata::meta::Regex;
use regex_automata::util::captures::Captures;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input};
use std::fmt;

bitflags! {
    /// Regex syntax flags applied to every pattern of a grammar.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RegexFlags: u8 {
        /// `^` and `$` match at line boundaries.
        const MULTI_LINE = 1;
        const CASE_INSENSITIVE = 1 << 1;
        /// `.` also matches `\n`.
        const DOT_MATCHES_NEW_LINE = 1 << 2;
        /// Whitespace and `#` comments in patterns are ignored.
        const IGNORE_WHITESPACE = 1 << 3;
    }
}

impl Default for RegexFlags {
    fn default() -> Self {
        RegexFlags::MULTI_LINE
    }
}

/// A compiled regular expression plus the static facts the compiler needs.
#[derive(Clone)]
pub struct Pattern {
    source: Box<str>,
    regex: Regex,
    min_len: Option<usize>,
    max_len: Option<usize>,
}

impl Pattern {
    /// Compile `source` with the given flags.
    ///
    /// The error is the regex parser's or builder's message.
    pub fn new(source: &str, flags: RegexFlags) -> Result<Pattern, String> {
        let config = syntax::Config::new()
            .multi_line(flags.contains(RegexFlags::MULTI_LINE))
            .case_insensitive(flags.contains(RegexFlags::CASE_INSENSITIVE))
            .dot_matches_new_line(flags.contains(RegexFlags::DOT_MATCHES_NEW_LINE))
            .ignore_whitespace(flags.contains(RegexFlags::IGNORE_WHITESPACE));
        let hir = syntax::parse_with(source, &config).map_err(|err| err.to_string())?;
        let properties = hir.properties();
        let (min_len, max_len) = (properties.minimum_len(), properties.maximum_len());
        let regex = Regex::builder()
            .build_from_hir(&hir)
            .map_err(|err| err.to_string())?;
        Ok(Pattern {
            source: source.into(),
            regex,
            min_len,
            max_len,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether some input matches this pattern with an empty span.
    pub fn can_match_empty(&self) -> bool {
        self.min_len == Some(0)
    }

    /// Whether every match of this pattern is empty.
    pub fn only_matches_empty(&self) -> bool {
        self.max_len == Some(0)
    }

    /// End offset of the match starting exactly at `pos`, searching no
    /// further than `end`.
    ///
    /// `pos <= end <= text.len()` must hold.
    #[inline]
    pub fn match_at(&self, text: &str, pos: usize, end: usize) -> Option<usize> {
        let input = Input::new(text).range(pos..end).anchored(Anchored::Yes);
        self.regex.search(&input).map(|found| found.end())
    }

    /// Like [`Pattern::match_at`], but fills capture groups.
    #[inline]
    pub(crate) fn captures_at(
        &self,
        text: &str,
        pos: usize,
        end: usize,
        captures: &mut Captures,
    ) -> Option<usize> {
        let input = Input::new(text).range(pos..end).anchored(Anchored::Yes);
        self.regex.search_captures(&input, captures);
        captures.get_match().map(|found| found.end())
    }

    pub(crate) fn create_captures(&self) -> Captures {
        self.regex.create_captures()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Build a pattern matching any of `words` literally.
///
/// Alternatives are ordered longest first, because matching is
/// leftmost-first: `words(&["in", "int"], ..)` must try `int` before `in`.
/// `prefix` and `suffix` are raw regex, typically `\b`.
pub fn words<S: AsRef<str>>(words: &[S], prefix: &str, suffix: &str) -> String {
    let mut sorted: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sorted.dedup();
    let alternatives: Vec<String> = sorted.into_iter().map(regex_syntax::escape).collect();
    format!("{prefix}(?:{}){suffix}", alternatives.join("|"))
}
