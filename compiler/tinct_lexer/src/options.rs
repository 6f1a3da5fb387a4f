//! Per-lexer input options.
//!
//! Options are applied to the input before tokenizing. They are supplied
//! by name, usually from a caller's configuration, and validated up front:
//! an unknown name or a malformed value is an [`OptionError`], reported
//! before any tokenizing starts.
//!
//! | name       | type | default | effect                                   |
//! |------------|------|---------|------------------------------------------|
//! | `stripnl`  | bool | true    | strip leading and trailing newlines      |
//! | `stripall` | bool | false   | strip all leading and trailing whitespace |
//! | `ensurenl` | bool | true    | make sure the input ends with a newline  |
//! | `tabsize`  | int  | 0       | expand tabs to this width (0 keeps tabs) |
//!
//! `tabsize` is at most [`MAX_TAB_SIZE`]. Line endings are always normalized to `\n` first.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::Range;
use thiserror::Error;

/// Largest accepted `tabsize`.
pub const MAX_TAB_SIZE: usize = 64;

/// A raw option value as supplied by a caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// An option that could not be applied.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown lexer option `{0}`")]
    Unknown(String),

    #[error("lexer option `{name}` expects a boolean, got {value}")]
    InvalidBool { name: String, value: String },

    #[error("lexer option `{name}` expects an integer from 0 to {max}, got {value}")]
    InvalidInt {
        name: String,
        value: String,
        max: usize,
    },
}

/// Input preprocessing applied before tokenizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexerOptions {
    #[serde(rename = "stripnl")]
    pub strip_nl: bool,
    #[serde(rename = "stripall")]
    pub strip_all: bool,
    #[serde(rename = "ensurenl")]
    pub ensure_nl: bool,
    #[serde(rename = "tabsize")]
    pub tab_size: usize,
}

impl Default for LexerOptions {
    fn default() -> Self {
        LexerOptions {
            strip_nl: true,
            strip_all: false,
            ensure_nl: true,
            tab_size: 0,
        }
    }
}

impl LexerOptions {
    /// Defaults overridden by named values. Later values for the same name
    /// win.
    pub fn from_options<K>(
        options: impl IntoIterator<Item = (K, OptionValue)>,
    ) -> Result<Self, OptionError>
    where
        K: AsRef<str>,
    {
        let mut parsed = LexerOptions::default();
        for (name, value) in options {
            let name = name.as_ref();
            match name {
                "stripnl" => parsed.strip_nl = bool_option(name, &value)?,
                "stripall" => parsed.strip_all = bool_option(name, &value)?,
                "ensurenl" => parsed.ensure_nl = bool_option(name, &value)?,
                "tabsize" => parsed.tab_size = int_option(name, &value, MAX_TAB_SIZE)?,
                _ => return Err(OptionError::Unknown(name.to_owned())),
            }
        }
        Ok(parsed)
    }

    /// Apply the options to `text`. Borrows when nothing changes.
    pub fn preprocess<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let normalized = if text.contains('\r') {
            Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
        } else {
            Cow::Borrowed(text)
        };

        let kept = self.trim(&normalized);
        // A newline right after the kept text already satisfies `ensurenl`.
        let end = if self.ensure_nl
            && !normalized[kept.clone()].ends_with('\n')
            && normalized[kept.end..].starts_with('\n')
        {
            kept.end + 1
        } else {
            kept.end
        };
        let mut text = match normalized {
            Cow::Borrowed(text) => Cow::Borrowed(&text[kept.start..end]),
            Cow::Owned(text) => Cow::Owned(text[kept.start..end].to_owned()),
        };

        if self.tab_size > 0 && text.contains('\t') {
            text = Cow::Owned(expand_tabs(&text, self.tab_size));
        }

        if self.ensure_nl && !text.ends_with('\n') {
            text.to_mut().push('\n');
        }
        text
    }

    /// The byte range of `text` left after stripping.
    fn trim(&self, text: &str) -> Range<usize> {
        let (head, both) = if self.strip_all {
            (text.trim_start(), text.trim())
        } else if self.strip_nl {
            (text.trim_start_matches('\n'), text.trim_matches('\n'))
        } else {
            (text, text)
        };
        let start = text.len() - head.len();
        start..start + both.len()
    }
}

/// Accepts booleans, integers (zero is false) and the usual words.
fn bool_option(name: &str, value: &OptionValue) -> Result<bool, OptionError> {
    match value {
        OptionValue::Bool(flag) => Ok(*flag),
        OptionValue::Int(number) => Ok(*number != 0),
        OptionValue::Str(word) => match word.to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(OptionError::InvalidBool {
                name: name.to_owned(),
                value: format!("{word:?}"),
            }),
        },
    }
}

/// Accepts integers from 0 to `max`, also spelled as strings.
fn int_option(name: &str, value: &OptionValue, max: usize) -> Result<usize, OptionError> {
    let invalid = |shown: String| OptionError::InvalidInt {
        name: name.to_owned(),
        value: shown,
        max,
    };
    let parsed = match value {
        OptionValue::Int(number) => usize::try_from(*number).ok(),
        OptionValue::Str(word) => word.trim().parse::<usize>().ok(),
        OptionValue::Bool(_) => None,
    };
    parsed.filter(|&n| n <= max).ok_or_else(|| match value {
        OptionValue::Str(word) => invalid(format!("{word:?}")),
        OptionValue::Int(number) => invalid(number.to_string()),
        OptionValue::Bool(flag) => invalid(flag.to_string()),
    })
}

/// Replace tabs with spaces up to the next multiple of `size` columns.
/// Columns count characters and restart after each newline.
fn expand_tabs(text: &str, size: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for ch in text.chars() {
        match ch {
            '\t' => {
                let pad = size - column % size;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' => {
                out.push(ch);
                column = 0;
            }
            _ => {
                out.push(ch);
                column += 1;
            }
        }
    }
    out
}
