//! # bioseries - Bioprocess Time-Series Ingestion
//!
//! `bioseries` reads bioreactor measurements from heterogeneous exports and
//! turns them into one clean, chronologically ordered table of
//! `[biomass, substrate, product]` samples with per-sample provenance.
//!
//! ## Key Features
//!
//! - **Naming Drift Resolution**: Producer-specific field names (`VCD`,
//!   `glucose`, `titer`, ...) are mapped onto canonical roles through ordered
//!   alias tables.
//!
//! - **Structure-Agnostic Extraction**: Flat fields, per-batch structs, boxed
//!   arrays, `val` sub-tables, multi-column matrices and arbitrarily nested
//!   records all yield the same series, without being told which variant a
//!   file uses.
//!
//! - **MAT-file v5, JSON and CSV Sources**: Including zlib-compressed MAT
//!   variables.
//!
//! - **Deterministic Cleaning**: Missing values, substrate estimation,
//!   non-negativity, z-score outlier rejection and time ordering.
//!
//! - **Failure Isolation**: One unusable file is skipped and reported, never
//!   fatal to a multi-file load.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bioseries::prelude::*;
//!
//! let config = PipelineConfig::default();
//! let combiner = MultiExperimentCombiner::from_config(&config);
//!
//! let files = MultiExperimentCombiner::discover("data".as_ref(), "*.mat")?;
//! let dataset = combiner.combine(&files)?;
//!
//! for skipped in &dataset.report.skipped {
//!     eprintln!("skipped {}: {}", skipped.file_name, skipped.reason);
//! }
//! println!("{}", dataset.metadata.to_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! file ─▶ source ─▶ RawRecord ─▶ extract ─▶ align ─▶ preprocess ─▶ combine
//!         (csv/mat/json)          (schema)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod align;
pub mod combine;
pub mod config;
pub mod error;
pub mod extract;
pub mod mat;
pub mod preprocess;
pub mod record;
pub mod schema;
pub mod source;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::align::{AlignedTable, TableProvenance, TimeSeriesAligner};
    pub use crate::combine::{
        CombineOutput, CombinedDataset, ExperimentSet, ExperimentTable, LoadReport, Metadata,
        MultiExperimentCombiner, SkippedSource,
    };
    pub use crate::config::{ConfigError, InputConfig, PipelineConfig};
    pub use crate::error::{CombineError, SourceError};
    pub use crate::extract::{
        ExperimentLabel, ExtractedSeries, ExtractorConfig, HierarchicalExtractor, ShapeDetector,
    };
    pub use crate::mat::{MatError, MatFile};
    pub use crate::preprocess::{PreprocessConfig, Preprocessor, SubstrateEstimate};
    pub use crate::record::{Fields, NumericArray, RawRecord};
    pub use crate::schema::{CanonicalRole, NameAliasTable, SchemaResolver};
    pub use crate::source::{load_source, SourceFormat};
}
