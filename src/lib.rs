//! # Symmem
//!
//! A symbolic memory store for short text entries.
//!
//! Entries ("symbols") are reachable by their primary name or by any alias.
//! When an entry is saved without a full taxonomy, symmem proposes a
//! category/subcategory placement by comparing the entry's tokens against
//! entries that are already classified.
//!
//! ## Features
//!
//! - `SQLite` symbol store with one-hop alias resolution
//! - Deterministic Jaccard-based taxonomy suggestions
//! - Accept / edit / reject / undo workflow backed by an append-only journal
//! - JSON-RPC gateway over stdio (and HTTP with the `http` feature)
//! - Tool-calling bridge for OpenAI-compatible chat backends
//!
//! ## Example
//!
//! ```rust,ignore
//! use symmem::services::SymbolService;
//! use symmem::models::SaveRequest;
//!
//! let service = SymbolService::in_memory()?;
//! let response = service.save(&SaveRequest::new("HGI.DEF", "hybrid intelligence"))?;
//! assert_eq!(service.read("HGI.DEF")?, "hybrid intelligence");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod bridge;
pub mod config;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod services;
pub mod similarity;
pub mod storage;

pub use config::SymmemConfig;
pub use models::{
    ApplyOutcome, ApplyRecord, Decision, SaveOutcome, SaveRequest, SaveStatus, Symbol,
    TaxonomySuggestions, TextEntry,
};
pub use services::{ApplyWorkflow, SymbolService, TaxonomySuggester};
pub use storage::{ApplyJournal, SqliteSymbolStore, SymbolStore};

/// Error type for symmem operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Missing, oversized or malformed save arguments |
/// | `NotFound` | A symbol or alias does not resolve |
/// | `Protocol` | Unknown JSON-RPC method or tool, malformed resource URI |
/// | `Transport` | Network failures and timeouts on the client side |
/// | `OperationFailed` | `SQLite`, filesystem or serialization failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - `symbol` or `text` is missing or empty
    /// - A field exceeds its length bound
    /// - `aliases` is not an array of strings
    /// - A DEFINE block is missing or has an empty body
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A symbol or alias could not be resolved.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request does not follow the gateway protocol.
    ///
    /// Raised when:
    /// - The method name is not one of the supported methods
    /// - The tool name is not `sm.texts.save`
    /// - The resource URI does not use the `resource://sm/v1/texts/` scheme
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A network call failed before a response was received.
    ///
    /// Only raised by callers of the gateway (RPC client, LLM backends).
    /// No partial effect is assumed when this is returned.
    #[error("transport '{operation}' failed: {cause}")]
    Transport {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` database operations fail
    /// - Filesystem I/O errors occur (journal, config)
    /// - Responses cannot be (de)serialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// The four fault kinds callers can distinguish, plus internal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Bad save arguments.
    Validation,
    /// Unresolved symbol or alias.
    NotFound,
    /// Unknown method or malformed URI.
    Protocol,
    /// Network failure or timeout.
    Transport,
    /// Storage or I/O failure.
    Internal,
}

impl Error {
    /// Returns the fault kind of this error.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::InvalidInput(_) => FaultKind::Validation,
            Self::NotFound(_) => FaultKind::NotFound,
            Self::Protocol(_) => FaultKind::Protocol,
            Self::Transport { .. } => FaultKind::Transport,
            Self::OperationFailed { .. } => FaultKind::Internal,
        }
    }

    /// Shorthand for building an [`Error::OperationFailed`].
    pub fn operation(operation: &str, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for symmem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current UTC time as ISO-8601 with second precision.
///
/// ```rust
/// let ts = symmem::current_timestamp_iso();
/// assert!(ts.ends_with('Z'));
/// assert_eq!(ts.len(), "2025-01-01T00:00:00Z".len());
/// ```
#[must_use]
pub fn current_timestamp_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}
