// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for idscan.

use thiserror::Error;

/// Top-level error type for all detection operations.
#[derive(Debug, Error)]
pub enum IdScanError {
    // -- Caller errors --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration value {value:?} for {key}: {reason}")]
    InvalidConfig {
        key: String,
        value: String,
        reason: String,
    },

    // -- Pipeline outcomes --
    /// The pipeline ran but nothing survived the named stage.
    #[error("no document found: {0}")]
    NoDocumentFound(String),

    #[error("processing failed: {0}")]
    ProcessingFailure(String),

    // -- Loading / persistence --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IdScanError {
    /// Shorthand for a configuration rejection.
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means "ran fine, nothing there" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoDocumentFound(_))
    }

    /// Numeric status code matching the C header's `IdReaderError` values.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::InvalidConfig { .. } => -1,
            Self::ProcessingFailure(_) | Self::ImageError(_) => -3,
            Self::NoDocumentFound(_) => -4,
            Self::Io(_) | Self::Serialization(_) => -6,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IdScanError>;
