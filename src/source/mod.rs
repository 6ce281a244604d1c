//! # Source Loading
//!
//! One entry point, [`load_source`], turns a file on disk into an
//! [`ExtractedSeries`]. The format is picked from the file extension
//! (case-insensitive):
//!
//! | Extension | Loader |
//! |-----------|--------|
//! | `csv` | header-resolved table ([`read_table`]) |
//! | `mat` | MAT-file v5 decoded to a [`RawRecord`], then extracted |
//! | `json` | JSON document converted to a [`RawRecord`], then extracted |
//!
//! Each load is a single blocking read of the whole file.

mod table;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;

pub use table::read_table;

use crate::error::SourceError;
use crate::extract::{ExtractedSeries, HierarchicalExtractor};
use crate::mat::MatFile;
use crate::record::RawRecord;

/// Supported source file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text with a header row
    Csv,
    /// MAT-file level 5
    Mat,
    /// JSON record document
    Json,
}

impl SourceFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "mat" => Ok(SourceFormat::Mat),
            "json" => Ok(SourceFormat::Json),
            _ => Err(SourceError::UnsupportedFormat(format!(
                "{} (expected .csv, .mat or .json)",
                path.display()
            ))),
        }
    }

    /// Whether the format is a record tree rather than a flat table
    pub fn is_hierarchical(&self) -> bool {
        !matches!(self, SourceFormat::Csv)
    }
}

/// Read a hierarchical source (MAT or JSON) into a record tree.
pub fn read_record(path: &Path) -> Result<RawRecord, SourceError> {
    match SourceFormat::from_path(path)? {
        SourceFormat::Mat => Ok(MatFile::open(path)?.into_record()),
        SourceFormat::Json => {
            let reader = BufReader::new(File::open(path)?);
            let value: serde_json::Value = serde_json::from_reader(reader)?;
            Ok(RawRecord::from(value))
        }
        SourceFormat::Csv => Err(SourceError::UnsupportedFormat(format!(
            "{} is tabular, not a record tree",
            path.display()
        ))),
    }
}

/// Load one source file and extract its canonical series.
pub fn load_source(
    path: &Path,
    extractor: &HierarchicalExtractor,
) -> Result<ExtractedSeries, SourceError> {
    let format = SourceFormat::from_path(path)?;
    debug!("Loading {} as {format:?}", path.display());

    match format {
        SourceFormat::Csv => {
            let reader = BufReader::new(File::open(path)?);
            read_table(reader, extractor.resolver())
        }
        SourceFormat::Mat | SourceFormat::Json => extractor.extract(&read_record(path)?),
    }
}
