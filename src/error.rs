//! Error handling for the autofill engine
//!
//! Idiomatic thiserror types. Almost nothing here is fatal to a pass:
//! unresolvable controls are skipped, low-confidence matches are left for
//! the AI pass, and per-field failures degrade to `Failed` ledger entries.
//! Only a malformed action batch aborts an operation outright.

use thiserror::Error;

/// Errors surfaced by the autofill engine.
#[derive(Error, Debug)]
pub enum AutofillError {
    /// The externally supplied action payload could not be interpreted as a
    /// batch at all. The whole batch is rejected with zero successes and
    /// zero failures; individual instruction failures never raise this.
    #[error("malformed action batch: {reason}")]
    MalformedBatch { reason: String },

    /// File payload retrieval failed for an upload control.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Serialization error while emitting protocol documents.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AutofillError>;
