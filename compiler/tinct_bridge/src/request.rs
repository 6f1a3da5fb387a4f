//! One request, one response.
//!
//! Requests are JSON objects tagged by `method`:
//!
//! ```json
//! {"method": "tokenize", "lexer": "ini", "options": {"stripnl": false}, "text": "a=1"}
//! {"method": "lexer_name_for", "filename": "setup.cfg"}
//! {"method": "get_all_lexers"}
//! ```
//!
//! Responses are bare JSON values: an array of `[offset, "Type", "text"]`
//! triples, a lexer short name, or an array of lexer descriptions. Any
//! failure is `{"error": "..."}` instead.

use crate::error::BridgeError;
use crate::registry::{LexerInfo, LexerQuery, LexerRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tinct_lexer::{LexerOptions, OptionValue};
use tinct_token::OwnedToken;
use tracing::{debug, warn};

/// A decoded request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    /// Tokenize `text` with the selected lexer after applying `options`.
    Tokenize {
        lexer: Option<String>,
        mimetype: Option<String>,
        filename: Option<String>,
        #[serde(default)]
        options: BTreeMap<String, OptionValue>,
        text: String,
    },
    /// The short name of the lexer a query selects.
    LexerNameFor {
        lexer: Option<String>,
        mimetype: Option<String>,
        filename: Option<String>,
    },
    /// Descriptions of every registered lexer.
    GetAllLexers,
}

/// The answer to a [`Request`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Tokens(Vec<OwnedToken>),
    LexerName(String),
    Lexers(Vec<LexerInfo>),
    Error { error: String },
}

/// Run a decoded request against `registry`.
pub fn handle(registry: &LexerRegistry, request: Request) -> Result<Response, BridgeError> {
    match request {
        Request::Tokenize {
            lexer,
            mimetype,
            filename,
            options,
            text,
        } => {
            let query = LexerQuery {
                lexer,
                mimetype,
                filename,
            };
            let selected = registry.select(&query)?;
            let options = LexerOptions::from_options(options)?;
            let text = options.preprocess(&text);
            let tokens: Vec<OwnedToken> = selected
                .lexer()
                .tokens(&text)
                .map(OwnedToken::from)
                .collect();
            debug!(
                lexer = %selected.info().name,
                bytes = text.len(),
                tokens = tokens.len(),
                "tokenized"
            );
            Ok(Response::Tokens(tokens))
        }
        Request::LexerNameFor {
            lexer,
            mimetype,
            filename,
        } => {
            let query = LexerQuery {
                lexer,
                mimetype,
                filename,
            };
            let selected = registry.select(&query)?;
            Ok(Response::LexerName(selected.info().short_name().to_owned()))
        }
        Request::GetAllLexers => Ok(Response::Lexers(
            registry.all().iter().map(|l| l.info().clone()).collect(),
        )),
    }
}

/// Decode `request`, run it, and encode the answer. Never panics: every
/// failure becomes an `{"error": ...}` response.
pub fn respond(registry: &LexerRegistry, request: &str) -> String {
    let response = serde_json::from_str::<Request>(request)
        .map_err(BridgeError::from)
        .and_then(|request| handle(registry, request))
        .unwrap_or_else(|err| {
            debug!(%err, "request failed");
            Response::Error {
                error: err.to_string(),
            }
        });

    serde_json::to_string(&response).unwrap_or_else(|err| {
        warn!(%err, "response could not be encoded");
        String::from(r#"{"error":"response could not be encoded"}"#)
    })
}
