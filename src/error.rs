//! Error taxonomy of the ingestion pipeline.
//!
//! [`SourceError`] covers everything that can go wrong with one source file.
//! It never crosses the combiner boundary: the combiner turns it into a skip
//! record. [`CombineError`] is what a caller of the combiner can see.

use std::path::PathBuf;

use crate::mat::MatError;
use crate::schema::CanonicalRole;

/// Failure affecting a single source file
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A mandatory role was not found by any extraction variant
    #[error("Unresolved role '{role}': {detail}")]
    UnresolvedRole {
        /// Role that could not be found
        role: CanonicalRole,
        /// What was searched
        detail: String,
    },

    /// A recognized structural variant had an invalid shape
    #[error("Structural mismatch for '{role}': {detail}")]
    StructuralMismatch {
        /// Role being extracted when the mismatch was found
        role: CanonicalRole,
        /// Description of the violated shape
        detail: String,
    },

    /// Time was found but none of biomass, substrate or product
    #[error("No measured series (biomass, substrate, product) alongside time")]
    NoMeasuredRoles,

    /// Truncation to the common length left no samples
    #[error("No samples left after alignment")]
    EmptyAfterAlignment,

    /// A cleaning stage removed every sample
    #[error("No samples left after cleaning stage '{stage}'")]
    EmptyAfterCleaning {
        /// Name of the stage that emptied the table
        stage: &'static str,
    },

    /// File extension not handled by any loader
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// I/O error reading the source
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// MAT-file decoding error
    #[error("MAT-file error: {0}")]
    MatError(#[from] MatError),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SourceError {
    pub(crate) fn unresolved(role: CanonicalRole, detail: impl Into<String>) -> Self {
        Self::UnresolvedRole {
            role,
            detail: detail.into(),
        }
    }

    pub(crate) fn mismatch(role: CanonicalRole, detail: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            role,
            detail: detail.into(),
        }
    }
}

/// Failure of a whole combine call
#[derive(Debug, thiserror::Error)]
pub enum CombineError {
    /// Every matched source failed
    #[error("No usable data: all {attempted} source file(s) failed")]
    NoUsableSources {
        /// Number of files that were tried
        attempted: usize,
    },

    /// The pattern matched no files in the directory
    #[error("No files matching '{pattern}' in {}", dir.display())]
    NoFilesMatched {
        /// Directory that was searched
        dir: PathBuf,
        /// Glob pattern used
        pattern: String,
    },

    /// The file pattern is not a valid glob
    #[error("Invalid file pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    /// I/O error listing the directory
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
