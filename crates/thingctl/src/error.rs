//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use thingctl_config::ConfigError;
use thingctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const SOURCE_UNAVAILABLE: i32 = 7;
    pub const BATCH_WITH_ERRORS: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Inventory ────────────────────────────────────────────────────
    #[error("Device inventory unavailable: {reason}")]
    #[diagnostic(
        code(thingctl::source_unavailable),
        help("Check that the inventory file exists and holds a JSON array of devices.")
    )]
    SourceUnavailable { reason: String },

    #[error("No device inventory configured")]
    #[diagnostic(
        code(thingctl::no_inventory),
        help(
            "Pass --inventory <PATH>, set THINGCTL_INVENTORY, or run:\n\
             thingctl config init --set-inventory <PATH>"
        )
    )]
    NoInventory,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(thingctl::not_found),
        help("Run: thingctl {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(thingctl::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    #[error("Collection store error: {message}")]
    #[diagnostic(code(thingctl::storage))]
    Storage { message: String },

    // ── Batch ────────────────────────────────────────────────────────
    #[error("Batch completed with errors: {failed} of {total} devices failed")]
    #[diagnostic(
        code(thingctl::batch_with_errors),
        help("The per-device report above lists each failure.")
    )]
    BatchWithErrors { failed: usize, total: usize },

    #[error("Batch failed: no device succeeded ({failed} failed)")]
    #[diagnostic(code(thingctl::batch_failed))]
    BatchFailed { failed: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(thingctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(thingctl::config),
        help("Check the config file shown by: thingctl config path")
    )]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(thingctl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::SourceUnavailable { .. } => exit_code::SOURCE_UNAVAILABLE,
            Self::BatchWithErrors { .. } => exit_code::BATCH_WITH_ERRORS,
            Self::Validation { .. } | Self::NoInventory | Self::NonInteractiveRequiresYes { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Configuration { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::NotFound { kind, identifier } => CliError::NotFound {
                list_command: format!("{kind}s list"),
                resource_type: kind,
                identifier,
            },

            CoreError::DuplicateName { name } => CliError::Conflict {
                resource_type: "collection".into(),
                identifier: name,
            },

            CoreError::SourceUnavailable { reason } => CliError::SourceUnavailable { reason },

            e @ (CoreError::Storage { .. } | CoreError::Corrupt { .. }) => CliError::Storage {
                message: e.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoInventory => CliError::NoInventory,
            other => CliError::Config(Box::new(other)),
        }
    }
}
