//! Unified error types for the mockshape core library.
//!
//! This module provides a unified error type [`MockshapeError`] that covers all
//! failure modes across the library. Each module also has its own specific error
//! types (`CodecError`, `MergeError`, `SynthesisError`, `ConfigError`) for
//! internal use.
//!
//! # Design Principles
//!
//! - **Specific variants**: Each error variant captures exactly one failure mode
//! - **Actionable messages**: Error messages point at the offending path or field
//! - **Context preservation**: Wrapped errors maintain their original context
//!
//! # Example
//!
//! ```rust
//! use mockshape_core::error::{MockshapeError, Result};
//! use std::path::PathBuf;
//!
//! fn load_config(path: &PathBuf) -> Result<()> {
//!     if !path.exists() {
//!         return Err(MockshapeError::ConfigNotFound(path.clone()));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{render_path, PathSegment};

/// The unified error type for all mockshape operations.
#[derive(Debug, Error)]
pub enum MockshapeError {
    // =========================================================================
    // STRUCTURAL ERRORS
    // =========================================================================
    /// Chunks disagree about the kind of container at a path.
    #[error("Conflicting structure at '{}': {message}", render_path(.path))]
    StructuralConflict {
        /// Path where the conflict was found.
        path: Vec<PathSegment>,
        /// Description of the conflict.
        message: String,
    },

    /// A chunk path addresses an array position that is too large.
    #[error("Array index {index} at '{}' is out of range", render_path(.path))]
    IndexOutOfRange {
        /// Path of the array being entered.
        path: Vec<PathSegment>,
        /// The rejected index.
        index: usize,
    },

    /// Two schema nodes share a display name.
    #[error("Duplicate display name '{0}'. Rename one of the schema properties.")]
    DuplicateDisplayName(String),

    // =========================================================================
    // SYNTHESIS ERRORS
    // =========================================================================
    /// A generated value refers to a property the schema does not describe.
    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    /// The value source could not produce values.
    #[error("Value source failed: {0}")]
    ValueSourceFailed(String),

    // =========================================================================
    // INPUT ERRORS
    // =========================================================================
    /// Input is not valid JSON or not the expected JSON shape.
    #[error("Invalid JSON input: {0}")]
    InvalidJson(#[from] serde_json::Error),

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration contains invalid values.
    #[error("Invalid configuration: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // PERSISTENCE & I/O ERRORS
    // =========================================================================
    /// An error occurred while persisting or reading data.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for mockshape operations.
pub type Result<T> = std::result::Result<T, MockshapeError>;

impl MockshapeError {
    /// Returns `true` if chunks or schema nodes could not be reconciled.
    #[inline]
    #[must_use]
    pub const fn is_structural_error(&self) -> bool {
        matches!(
            self,
            Self::StructuralConflict { .. }
                | Self::IndexOutOfRange { .. }
                | Self::DuplicateDisplayName(_)
        )
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ConfigParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns `true` if this error is related to I/O or persistence.
    #[inline]
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::PersistenceError(_) | Self::IoError(_))
    }

    /// Returns `true` if the caller's input was at fault.
    #[inline]
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidJson(_) | Self::UnknownProperty(_)) || self.is_structural_error()
    }

    /// Returns a machine-readable error code.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::StructuralConflict { .. } => "STRUCTURAL_CONFLICT",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::DuplicateDisplayName(_) => "DUPLICATE_DISPLAY_NAME",
            Self::UnknownProperty(_) => "UNKNOWN_PROPERTY",
            Self::ValueSourceFailed(_) => "VALUE_SOURCE_FAILED",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::PersistenceError(_) => "PERSISTENCE_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<crate::codec::CodecError> for MockshapeError {
    fn from(err: crate::codec::CodecError) -> Self {
        use crate::codec::CodecError;
        match err {
            CodecError::ConflictingContainer {
                path,
                expected,
                found,
            } => Self::StructuralConflict {
                path,
                message: format!("expected {expected}, found {found}"),
            },
            CodecError::IndexOutOfRange { path, index } => Self::IndexOutOfRange { path, index },
        }
    }
}

impl From<crate::merge::MergeError> for MockshapeError {
    fn from(err: crate::merge::MergeError) -> Self {
        use crate::merge::MergeError;
        match err {
            MergeError::DuplicateDisplayName { name, .. } => Self::DuplicateDisplayName(name),
        }
    }
}

impl From<crate::synthesis::SynthesisError> for MockshapeError {
    fn from(err: crate::synthesis::SynthesisError) -> Self {
        use crate::synthesis::SynthesisError;
        match err {
            SynthesisError::Merge(e) => e.into(),
            SynthesisError::Codec(e) => e.into(),
            SynthesisError::UnknownProperty(name) => Self::UnknownProperty(name),
            SynthesisError::SourceFailed(message) => Self::ValueSourceFailed(message),
        }
    }
}

impl From<crate::config::ConfigError> for MockshapeError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            ConfigError::ReadError { path, source } => {
                Self::PersistenceError(format!("Failed to read {}: {source}", path.display()))
            }
            ConfigError::WriteError { path, source } => {
                Self::PersistenceError(format!("Failed to write {}: {source}", path.display()))
            }
            ConfigError::ParseError(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::SerializeError(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::ValidationError { field, message } => {
                Self::ConfigValidationError(format!("{field}: {message}"))
            }
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                Self::ConfigValidationError(messages.join("; "))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
