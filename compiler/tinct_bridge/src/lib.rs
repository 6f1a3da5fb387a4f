//! Lexer registry and the process bridge contract.
//!
//! A calling process (typically another language's highlighter front end)
//! sends one JSON request at a time and gets one JSON response back. This
//! crate owns everything on this side of that boundary:
//!
//! - [`LexerRegistry`]: lexers indexed by name, alias, filename extension
//!   and mimetype, with the selection rules the caller relies on.
//! - [`builtins`]: the lexers every registry starts with.
//! - [`respond`]: decodes a [`Request`], runs it, and encodes the
//!   [`Response`]. It never panics; every failure is an error response.
//!
//! # Tracing
//!
//! Call [`init_tracing`] once at startup, then set `RUST_LOG` (for
//! example `tinct_bridge=debug,tinct_lexer=debug`) to see selection, table
//! builds and request handling.

pub mod builtins;
mod error;
mod registry;
mod request;

pub use error::{BridgeError, SelectionError};
pub use registry::{LexerInfo, LexerQuery, LexerRegistry, RegisteredLexer};
pub use request::{handle, respond, Request, Response};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize the tracing subscriber for the bridge.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once; an
/// embedder that installed its own subscriber keeps it.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();

            // A subscriber set by the embedder wins.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
