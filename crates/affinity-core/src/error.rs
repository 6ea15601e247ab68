//! Error types for `Affinity`.
//!
//! A single error enum covers every failure the engine surfaces. Missing
//! evidence is not an error: correlations and estimates report it as `NaN`.

use thiserror::Error;

use crate::model::{ItemId, UserId};

/// Result type alias for `Affinity` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `Affinity` operations.
///
/// Error codes follow the pattern `AFF-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument (AFF-001).
    ///
    /// Raised for `how_many == 0`, NaN where a real value is required,
    /// out-of-range sampling rates and similar caller mistakes.
    #[error("[AFF-001] Invalid argument: {0}")]
    InvalidArgument(String),

    /// User not found (AFF-002).
    #[error("[AFF-002] User '{0}' not found")]
    UserNotFound(UserId),

    /// Item not found (AFF-003).
    #[error("[AFF-003] Item '{0}' not found")]
    ItemNotFound(ItemId),

    /// Unsupported operation (AFF-004).
    #[error("[AFF-004] Unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid state (AFF-005).
    ///
    /// Indicates an internal inconsistency, for example removing a datum
    /// from an empty running average.
    #[error("[AFF-005] Invalid state: {0}")]
    InvalidState(String),

    /// Data model failure (AFF-006).
    #[error("[AFF-006] Data model error: {0}")]
    DataModel(String),

    /// Configuration error (AFF-007).
    #[error("[AFF-007] Configuration error: {0}")]
    Config(String),

    /// IO error (AFF-008).
    #[error("[AFF-008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed preference line (AFF-009).
    #[error("[AFF-009] Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the source file.
        line: u64,
        /// What was wrong with the line.
        message: String,
    },
}

impl Error {
    /// Returns the error code (e.g., "AFF-002").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "AFF-001",
            Self::UserNotFound(_) => "AFF-002",
            Self::ItemNotFound(_) => "AFF-003",
            Self::Unsupported(_) => "AFF-004",
            Self::InvalidState(_) => "AFF-005",
            Self::DataModel(_) => "AFF-006",
            Self::Config(_) => "AFF-007",
            Self::Io(_) => "AFF-008",
            Self::Parse { .. } => "AFF-009",
        }
    }

    /// Returns true for the not-found class (unknown user or item).
    ///
    /// Candidate iteration uses this to skip ids that vanished between
    /// listing and lookup.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::ItemNotFound(_))
    }

    /// Returns true if the caller can reasonably retry or continue.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidState(_))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
