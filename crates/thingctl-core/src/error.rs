// ── Core error types ──
//
// Every fallible core operation fails with exactly one of these kinds.
// Per-device action failures are not errors at this level; they are
// captured as `ActionOutcome` records by the batch runner.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Construction / parameter errors ──────────────────────────────
    /// Invalid filter construction or action parameters. Always raised
    /// before any external call is made.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("{kind} not found: {identifier}")]
    NotFound { kind: String, identifier: String },

    #[error("Collection already exists: {name}")]
    DuplicateName { name: String },

    // ── Collaborator errors ──────────────────────────────────────────
    /// The device data source could not be reached or read.
    #[error("Device source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Collection store I/O failed at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt collection record at {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CoreError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn collection_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "collection".into(),
            identifier: name.into(),
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a `NotFound` of any kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
