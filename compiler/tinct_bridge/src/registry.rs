//! Lexers indexed for lookup by a calling process.
//!
//! Each registered lexer carries a [`LexerInfo`]: its proper name, short
//! aliases, filename patterns and mimetypes. Lookup tables are built at
//! registration time:
//!
//! | lookup                | key                      | duplicate keys |
//! |-----------------------|--------------------------|----------------|
//! | [`find_by_name`]      | exact name               | last wins      |
//! | [`find_by_alias`]     | exact alias              | last wins      |
//! | [`find_by_extension`] | extension with the dot   | last wins      |
//! | [`find_by_mimetype`]  | exact mimetype           | last wins      |
//! | [`find`]              | lowercased name, alias or bare extension | name wins, then first alias or extension |
//!
//! Filename patterns contribute their extension, with a bracket class
//! expanded: `*.[ch]` indexes both `.c` and `.h`. Patterns without
//! wildcards (`Makefile`) are also indexed as literal filenames.
//!
//! [`find_by_name`]: LexerRegistry::find_by_name
//! [`find_by_alias`]: LexerRegistry::find_by_alias
//! [`find_by_extension`]: LexerRegistry::find_by_extension
//! [`find_by_mimetype`]: LexerRegistry::find_by_mimetype
//! [`find`]: LexerRegistry::find

use crate::builtins;
use crate::error::SelectionError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tinct_lexer::{BuildError, Lexer};
use tracing::{debug, trace};

/// Descriptive metadata of a lexer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexerInfo {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub mimetypes: Vec<String>,
}

impl LexerInfo {
    pub fn new(name: &str) -> Self {
        LexerInfo {
            name: name.to_owned(),
            ..LexerInfo::default()
        }
    }

    #[must_use]
    pub fn with_aliases<'s>(mut self, aliases: impl IntoIterator<Item = &'s str>) -> Self {
        self.aliases.extend(aliases.into_iter().map(str::to_owned));
        self
    }

    #[must_use]
    pub fn with_filenames<'s>(mut self, filenames: impl IntoIterator<Item = &'s str>) -> Self {
        self.filenames.extend(filenames.into_iter().map(str::to_owned));
        self
    }

    #[must_use]
    pub fn with_mimetypes<'s>(mut self, mimetypes: impl IntoIterator<Item = &'s str>) -> Self {
        self.mimetypes.extend(mimetypes.into_iter().map(str::to_owned));
        self
    }

    /// The short name a caller should use to ask for this lexer again: the
    /// first alias, or the proper name when there is none.
    pub fn short_name(&self) -> &str {
        self.aliases.first().map_or(self.name.as_str(), String::as_str)
    }
}

/// A lexer together with its metadata.
#[derive(Clone)]
pub struct RegisteredLexer {
    info: LexerInfo,
    lexer: Arc<dyn Lexer>,
}

impl RegisteredLexer {
    pub fn info(&self) -> &LexerInfo {
        &self.info
    }

    pub fn lexer(&self) -> &dyn Lexer {
        &*self.lexer
    }

    pub fn shared(&self) -> Arc<dyn Lexer> {
        Arc::clone(&self.lexer)
    }
}

impl fmt::Debug for RegisteredLexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredLexer")
            .field("info", &self.info)
            .field("lexer", &self.lexer.name())
            .finish()
    }
}

/// Which lexer a request wants. The first key present decides; later keys
/// are not consulted even when the first finds nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexerQuery {
    #[serde(default)]
    pub lexer: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl LexerQuery {
    pub fn lexer(name: &str) -> Self {
        LexerQuery {
            lexer: Some(name.to_owned()),
            ..LexerQuery::default()
        }
    }

    pub fn mimetype(mimetype: &str) -> Self {
        LexerQuery {
            mimetype: Some(mimetype.to_owned()),
            ..LexerQuery::default()
        }
    }

    pub fn filename(filename: &str) -> Self {
        LexerQuery {
            filename: Some(filename.to_owned()),
            ..LexerQuery::default()
        }
    }
}

/// Registered lexers and their lookup tables.
#[derive(Clone, Debug, Default)]
pub struct LexerRegistry {
    lexers: Vec<RegisteredLexer>,
    index: FxHashMap<String, usize>,
    names: FxHashMap<String, usize>,
    aliases: FxHashMap<String, usize>,
    extensions: FxHashMap<String, usize>,
    filenames: FxHashMap<String, usize>,
    mimetypes: FxHashMap<String, usize>,
}

impl LexerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        LexerRegistry::default()
    }

    /// A registry holding the [built-in lexers](builtins).
    pub fn with_builtins() -> Result<Self, BuildError> {
        let mut registry = LexerRegistry::new();
        builtins::register_all(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, info: LexerInfo, lexer: Arc<dyn Lexer>) {
        let slot = self.lexers.len();
        trace!(name = %info.name, slot, "registering lexer");

        self.index.insert(info.name.to_lowercase(), slot);
        self.names.insert(info.name.clone(), slot);

        for alias in &info.aliases {
            self.aliases.insert(alias.clone(), slot);
            self.index.entry(alias.to_lowercase()).or_insert(slot);
        }

        for pattern in &info.filenames {
            if is_literal(pattern) {
                self.filenames.insert(pattern.clone(), slot);
            }
            for ext in expand_extension(pattern) {
                let bare = ext.trim_start_matches('.').to_lowercase();
                self.extensions.insert(ext, slot);
                self.index.entry(bare).or_insert(slot);
            }
        }

        for mimetype in &info.mimetypes {
            self.mimetypes.insert(mimetype.clone(), slot);
        }

        self.lexers.push(RegisteredLexer { info, lexer });
    }

    /// Every registered lexer, in registration order.
    pub fn all(&self) -> &[RegisteredLexer] {
        &self.lexers
    }

    pub fn len(&self) -> usize {
        self.lexers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexers.is_empty()
    }

    /// Case-insensitive lookup by name, alias or bare extension.
    pub fn find(&self, key: &str) -> Option<&RegisteredLexer> {
        self.lookup(&self.index, &key.to_lowercase())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&RegisteredLexer> {
        self.lookup(&self.names, name)
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<&RegisteredLexer> {
        self.lookup(&self.aliases, alias)
    }

    /// Lookup by extension, including the leading dot (`.ini`).
    pub fn find_by_extension(&self, extension: &str) -> Option<&RegisteredLexer> {
        self.lookup(&self.extensions, extension)
    }

    pub fn find_by_mimetype(&self, mimetype: &str) -> Option<&RegisteredLexer> {
        self.lookup(&self.mimetypes, mimetype)
    }

    /// Lookup by a file path: its base name as a literal filename first,
    /// then its extension.
    pub fn find_by_filename(&self, path: &str) -> Option<&RegisteredLexer> {
        let base = base_name(path);
        self.lookup(&self.filenames, base)
            .or_else(|| extension(base).and_then(|ext| self.find_by_extension(ext)))
    }

    /// Resolve a query. `lexer` is matched like [`find`](Self::find).
    pub fn select(&self, query: &LexerQuery) -> Result<&RegisteredLexer, SelectionError> {
        let found = if let Some(name) = &query.lexer {
            self.find(name)
                .ok_or_else(|| SelectionError::Name(name.clone()))
        } else if let Some(mimetype) = &query.mimetype {
            self.find_by_mimetype(mimetype)
                .ok_or_else(|| SelectionError::Mimetype(mimetype.clone()))
        } else if let Some(filename) = &query.filename {
            self.find_by_filename(filename)
                .ok_or_else(|| SelectionError::Filename(filename.clone()))
        } else {
            Err(SelectionError::EmptyQuery)
        };

        match &found {
            Ok(lexer) => debug!(?query, lexer = %lexer.info.name, "selected lexer"),
            Err(err) => debug!(?query, %err, "no lexer selected"),
        }
        found
    }

    fn lookup(&self, table: &FxHashMap<String, usize>, key: &str) -> Option<&RegisteredLexer> {
        table.get(key).and_then(|&slot| self.lexers.get(slot))
    }
}

fn is_literal(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '['])
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// The extension of a file name including its dot. Dot files such as
/// `.bashrc` have none.
fn extension(filename: &str) -> Option<&str> {
    let base = base_name(filename);
    let dot = base.rfind('.')?;
    (dot > 0 && dot + 1 < base.len()).then(|| &base[dot..])
}

/// Concrete extensions a filename pattern stands for. A bracket class
/// yields one extension per character; other wildcards yield none.
fn expand_extension(pattern: &str) -> Vec<String> {
    let Some(ext) = extension(pattern) else {
        return Vec::new();
    };
    if let (Some(open), Some(close)) = (ext.find('['), ext.rfind(']')) {
        if open + 1 < close {
            let (head, tail) = (&ext[..open], &ext[close + 1..]);
            return ext[open + 1..close]
                .chars()
                .map(|ch| format!("{head}{ch}{tail}"))
                .collect();
        }
    }
    if ext.contains(['*', '?', '[', ']']) {
        Vec::new()
    } else {
        vec![ext.to_owned()]
    }
}
