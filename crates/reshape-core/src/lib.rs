//! # Reshape Core
//!
//! Bidirectional templates for nested data:
//! - Signals, the named slots linking a match template to a format template
//! - The scope tree that mirrors the list nesting of matched data
//! - Match and format hooks routing values through user functions
//! - The matcher, which fills a scope tree from a template/data pair
//! - The formatter, which rebuilds data from a scope tree, transposing or
//!   accumulating list dimensions as the format template asks
//!
//! A single match pass can feed any number of format passes.

#![warn(clippy::all)]

pub mod access;
pub mod formatter;
pub mod hooks;
pub mod matcher;
pub mod runtime;
pub mod signal;
pub mod store;
pub mod template;
pub mod utils;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use access::{Attribute, FieldAccessor, HostValue, Record};
pub use formatter::Formatter;
pub use hooks::{CombinedHook, FormatHook, HookFn, HookOutcome, MatchHook};
pub use matcher::Matcher;
pub use runtime::{format_data, match_data, transform, ShapeRuntime};
pub use signal::{Signal, S};
pub use store::{Lookup, ScopeId, ScopeTree};
pub use template::Template;

pub use serde_json::Value;

/// Reshape version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for reshape components
pub fn init_tracing() {
    init_tracing_with_default("reshape_core=info");
}

/// Initialize tracing, using `default_directive` when `RUST_LOG` is unset
pub fn init_tracing_with_default(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    // A subscriber may already be installed by the embedding application.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Per-pass configuration shared by the matcher and the formatter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Treat every hook as strict, whatever it was built with
    pub strict_hooks: bool,
    /// Also strip objects and lists that end up empty after cleaning
    pub deep_clean: bool,
    /// Emit walk events at info level
    pub debug: bool,
}

/// Error types for reshape operations
#[derive(thiserror::Error, Debug)]
pub enum ShapeError {
    /// A single value was requested where the scope tree holds several
    #[error("Incorrect type at {path}: {message}")]
    IncorrectType { path: String, message: String },

    /// A match hook was built around something other than a signal or an
    /// object of signals
    #[error("Invalid hook template: {reason}")]
    InvalidHookTemplate { reason: String },

    /// A combined hook was built without any function
    #[error("A combined hook needs a format function, a match function, or both")]
    MissingHookFunction,

    /// A hook function failed while running in strict mode
    #[error("Hook failed at {path}: {source}")]
    Hook {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// A match hook returned a key its template does not declare
    #[error("Hook at {path} returned unknown key '{key}'")]
    HookContract { path: String, key: String },

    /// A JSON template could not be read
    #[error("Template notation error at {path}: {message}")]
    Notation { path: String, message: String },
}

impl ShapeError {
    /// Create a shape mismatch error
    pub fn incorrect_type(path: &str, message: impl Into<String>) -> Self {
        Self::IncorrectType {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Create a hook template validation error
    pub fn invalid_hook_template(reason: impl Into<String>) -> Self {
        Self::InvalidHookTemplate {
            reason: reason.into(),
        }
    }

    /// Create a notation error
    pub fn notation(path: &str, message: impl Into<String>) -> Self {
        Self::Notation {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for reshape operations
pub type Result<T> = std::result::Result<T, ShapeError>;

/// Logs a walk event at debug level, or at info level when the pass runs
/// with `ShapeConfig::debug`.
macro_rules! walk_event {
    ($config:expr, $($arg:tt)+) => {
        if $config.debug {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}
pub(crate) use walk_event;

/// Join a dotted template path with the next key or index.
pub(crate) fn next_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
