//! Hierarchical token types.
//!
//! A [`TokenType`] is an ordered path of identifiers such as
//! `["Comment", "Single"]`. Every type except the root is a subtype of its
//! parent, so a consumer that matches on `Comment` also matches
//! `Comment.Single` and every other descendant.
//!
//! # Registration
//!
//! The standard catalogue is declared as associated constants
//! (`TokenType::COMMENT_SINGLE`, ...). Types outside the catalogue are
//! registered at run time through a process-wide interner
//! ([`TokenType::intern`], [`TokenType::from_dotted`]). Interned paths are
//! leaked to `'static` and never freed, which keeps `TokenType` a `Copy`
//! two-word handle. The interner only grows: grammars register their custom
//! types once at definition time.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// An immutable, hierarchical token label.
///
/// Equality, hashing and ordering are by path, so an interned
/// `Comment.Single` equals [`TokenType::COMMENT_SINGLE`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenType {
    path: &'static [&'static str],
}

/// Declares the standard catalogue: one associated constant per type plus
/// the table of short (CSS class) names used by formatters.
macro_rules! standard_types {
    ($($name:ident = [$($seg:literal),*] => $short:literal;)*) => {
        impl TokenType {
            $(
                #[doc = concat!("Standard type `", stringify!($name), "`.")]
                pub const $name: TokenType = TokenType::from_static(&[$($seg),*]);
            )*
        }

        /// Standard types and their short names, in declaration order.
        static STANDARD_TYPES: &[(TokenType, &str)] = &[$((TokenType::$name, $short),)*];
    };
}

standard_types! {
    ROOT = [] => "";

    TEXT = ["Text"] => "";
    WHITESPACE = ["Text", "Whitespace"] => "w";
    ESCAPE = ["Escape"] => "esc";
    ERROR = ["Error"] => "err";
    OTHER = ["Other"] => "x";

    KEYWORD = ["Keyword"] => "k";
    KEYWORD_CONSTANT = ["Keyword", "Constant"] => "kc";
    KEYWORD_DECLARATION = ["Keyword", "Declaration"] => "kd";
    KEYWORD_NAMESPACE = ["Keyword", "Namespace"] => "kn";
    KEYWORD_PSEUDO = ["Keyword", "Pseudo"] => "kp";
    KEYWORD_RESERVED = ["Keyword", "Reserved"] => "kr";
    KEYWORD_TYPE = ["Keyword", "Type"] => "kt";

    NAME = ["Name"] => "n";
    NAME_ATTRIBUTE = ["Name", "Attribute"] => "na";
    NAME_BUILTIN = ["Name", "Builtin"] => "nb";
    NAME_BUILTIN_PSEUDO = ["Name", "Builtin", "Pseudo"] => "bp";
    NAME_CLASS = ["Name", "Class"] => "nc";
    NAME_CONSTANT = ["Name", "Constant"] => "no";
    NAME_DECORATOR = ["Name", "Decorator"] => "nd";
    NAME_ENTITY = ["Name", "Entity"] => "ni";
    NAME_EXCEPTION = ["Name", "Exception"] => "ne";
    NAME_FUNCTION = ["Name", "Function"] => "nf";
    NAME_PROPERTY = ["Name", "Property"] => "py";
    NAME_LABEL = ["Name", "Label"] => "nl";
    NAME_NAMESPACE = ["Name", "Namespace"] => "nn";
    NAME_OTHER = ["Name", "Other"] => "nx";
    NAME_TAG = ["Name", "Tag"] => "nt";
    NAME_VARIABLE = ["Name", "Variable"] => "nv";
    NAME_VARIABLE_CLASS = ["Name", "Variable", "Class"] => "vc";
    NAME_VARIABLE_GLOBAL = ["Name", "Variable", "Global"] => "vg";
    NAME_VARIABLE_INSTANCE = ["Name", "Variable", "Instance"] => "vi";

    LITERAL = ["Literal"] => "l";
    LITERAL_DATE = ["Literal", "Date"] => "ld";

    STRING = ["Literal", "String"] => "s";
    STRING_BACKTICK = ["Literal", "String", "Backtick"] => "sb";
    STRING_CHAR = ["Literal", "String", "Char"] => "sc";
    STRING_DOC = ["Literal", "String", "Doc"] => "sd";
    STRING_DOUBLE = ["Literal", "String", "Double"] => "s2";
    STRING_ESCAPE = ["Literal", "String", "Escape"] => "se";
    STRING_HEREDOC = ["Literal", "String", "Heredoc"] => "sh";
    STRING_INTERPOL = ["Literal", "String", "Interpol"] => "si";
    STRING_OTHER = ["Literal", "String", "Other"] => "sx";
    STRING_REGEX = ["Literal", "String", "Regex"] => "sr";
    STRING_SINGLE = ["Literal", "String", "Single"] => "s1";
    STRING_SYMBOL = ["Literal", "String", "Symbol"] => "ss";

    NUMBER = ["Literal", "Number"] => "m";
    NUMBER_BIN = ["Literal", "Number", "Bin"] => "mb";
    NUMBER_FLOAT = ["Literal", "Number", "Float"] => "mf";
    NUMBER_HEX = ["Literal", "Number", "Hex"] => "mh";
    NUMBER_INTEGER = ["Literal", "Number", "Integer"] => "mi";
    NUMBER_INTEGER_LONG = ["Literal", "Number", "Integer", "Long"] => "il";
    NUMBER_OCT = ["Literal", "Number", "Oct"] => "mo";

    OPERATOR = ["Operator"] => "o";
    OPERATOR_WORD = ["Operator", "Word"] => "ow";

    PUNCTUATION = ["Punctuation"] => "p";

    COMMENT = ["Comment"] => "c";
    COMMENT_HASHBANG = ["Comment", "Hashbang"] => "ch";
    COMMENT_MULTILINE = ["Comment", "Multiline"] => "cm";
    COMMENT_PREPROC = ["Comment", "Preproc"] => "cp";
    COMMENT_SINGLE = ["Comment", "Single"] => "c1";
    COMMENT_SPECIAL = ["Comment", "Special"] => "cs";

    GENERIC = ["Generic"] => "g";
    GENERIC_DELETED = ["Generic", "Deleted"] => "gd";
    GENERIC_EMPH = ["Generic", "Emph"] => "ge";
    GENERIC_ERROR = ["Generic", "Error"] => "gr";
    GENERIC_HEADING = ["Generic", "Heading"] => "gh";
    GENERIC_INSERTED = ["Generic", "Inserted"] => "gi";
    GENERIC_OUTPUT = ["Generic", "Output"] => "go";
    GENERIC_PROMPT = ["Generic", "Prompt"] => "gp";
    GENERIC_STRONG = ["Generic", "Strong"] => "gs";
    GENERIC_SUBHEADING = ["Generic", "Subheading"] => "gu";
    GENERIC_TRACEBACK = ["Generic", "Traceback"] => "gt";
}

/// Process-wide table of registered paths, keyed by dotted name.
///
/// Seeded with the standard catalogue so interning a standard path hands back
/// the constant's own slice.
fn registry() -> &'static RwLock<FxHashMap<Box<str>, &'static [&'static str]>> {
    static REGISTRY: OnceLock<RwLock<FxHashMap<Box<str>, &'static [&'static str]>>> =
        OnceLock::new();
    REGISTRY.get_or_init(|| {
        let seeded = STANDARD_TYPES
            .iter()
            .map(|(ty, _)| (ty.path.join(".").into_boxed_str(), ty.path))
            .collect();
        RwLock::new(seeded)
    })
}

impl TokenType {
    const fn from_static(path: &'static [&'static str]) -> Self {
        TokenType { path }
    }

    /// Register (or look up) the type with the given path.
    ///
    /// Segments containing `.` are split, empty segments are dropped, so
    /// `intern(&["Name", "Custom.Deep"])` is `Name.Custom.Deep`. An empty path
    /// is the root.
    pub fn intern(path: &[&str]) -> TokenType {
        let segments: Vec<&str> = path
            .iter()
            .flat_map(|segment| segment.split('.'))
            .filter(|segment| !segment.is_empty())
            .collect();
        let key = segments.join(".");

        let table = registry();
        if let Some(&found) = table.read().get(key.as_str()) {
            return TokenType { path: found };
        }

        let mut table = table.write();
        // Another thread may have registered it between the two locks.
        if let Some(&found) = table.get(key.as_str()) {
            return TokenType { path: found };
        }
        let leaked: Vec<&'static str> = segments
            .iter()
            .map(|segment| &*Box::leak(Box::<str>::from(*segment)))
            .collect();
        let leaked: &'static [&'static str] = Box::leak(leaked.into_boxed_slice());
        table.insert(key.into_boxed_str(), leaked);
        TokenType { path: leaked }
    }

    /// Parse a dotted name such as `Comment.Single` or `Token.Name.Tag`.
    ///
    /// A leading `Token` segment is optional. `String` and `Number` at the
    /// top level are the shorthands for `Literal.String` and
    /// `Literal.Number`. The empty string is the root.
    pub fn from_dotted(name: &str) -> TokenType {
        let mut segments: Vec<&str> = name.split('.').filter(|s| !s.is_empty()).collect();
        if segments.first() == Some(&"Token") {
            segments.remove(0);
        }
        if matches!(segments.first(), Some(&("String" | "Number"))) {
            segments.insert(0, "Literal");
        }
        Self::intern(&segments)
    }

    /// The identifiers making up this type, root first. Empty for the root.
    #[inline]
    pub fn path(self) -> &'static [&'static str] {
        self.path
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self.path.is_empty()
    }

    /// Number of segments; the root has depth 0.
    #[inline]
    pub fn depth(self) -> usize {
        self.path.len()
    }

    /// The direct supertype, or `None` for the root.
    pub fn parent(self) -> Option<TokenType> {
        let (_, rest) = self.path.split_last()?;
        Some(TokenType { path: rest })
    }

    /// True iff `other`'s path is a prefix of this type's path (reflexive).
    #[inline]
    pub fn is_subtype_of(self, other: TokenType) -> bool {
        self.path.starts_with(other.path)
    }

    /// All ancestors from the root down to and including this type.
    pub fn split(self) -> Vec<TokenType> {
        (0..=self.path.len())
            .map(|len| TokenType {
                path: &self.path[..len],
            })
            .collect()
    }

    /// Register a subtype of this type, e.g. `NAME.child("Register")`.
    pub fn child(self, name: &str) -> TokenType {
        let mut segments: Vec<&str> = self.path.to_vec();
        segments.push(name);
        Self::intern(&segments)
    }

    /// Whether this type belongs to the standard catalogue.
    pub fn is_standard(self) -> bool {
        standard_short_name(self).is_some()
    }

    /// Dotted name without the `Token.` prefix; empty for the root.
    pub fn dotted(self) -> String {
        self.path.join(".")
    }

    /// The short class name formatters use for this type.
    ///
    /// Non-standard types take the nearest standard ancestor's short name and
    /// append each remaining segment as `-Segment`, so `Name.Register`
    /// becomes `n-Register`.
    pub fn short_name(self) -> String {
        let mut current = self;
        let mut suffix = String::new();
        loop {
            if let Some(short) = standard_short_name(current) {
                return format!("{short}{suffix}");
            }
            let Some((last, _)) = current.path.split_last() else {
                return suffix;
            };
            suffix = format!("-{last}{suffix}");
            current = current.parent().unwrap_or(TokenType::ROOT);
        }
    }
}

fn standard_short_name(ty: TokenType) -> Option<&'static str> {
    STANDARD_TYPES
        .iter()
        .find(|(standard, _)| *standard == ty)
        .map(|(_, short)| *short)
}

impl Default for TokenType {
    fn default() -> Self {
        TokenType::TEXT
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token")?;
        for segment in self.path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("Token")
        } else {
            f.write_str(&self.dotted())
        }
    }
}

impl Serialize for TokenType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.dotted())
    }
}

impl<'de> Deserialize<'de> for TokenType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(TokenType::from_dotted(&name))
    }
}
