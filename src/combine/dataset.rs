use std::io::Write;

use serde::{Deserialize, Serialize};

use super::LoadReport;
use crate::align::AlignedTable;

const CSV_HEADER: [&str; 6] = [
    "time",
    "biomass",
    "substrate",
    "product",
    "experiment_id",
    "file_name",
];

/// Cleaned table of one source file with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentTable {
    /// File name of the source
    pub file_name: String,
    /// File stem, the fallback experiment identifier
    pub name: String,
    /// Cleaned samples; `experiment_ids` is always populated
    pub table: AlignedTable,
}

impl ExperimentTable {
    /// Per-sample experiment identifiers
    pub fn experiment_ids(&self) -> &[String] {
        self.table.experiment_ids.as_deref().unwrap_or_default()
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table has no samples
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Write the table as CSV with the dataset column layout.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;
        self.write_rows(&mut csv_writer)?;
        csv_writer.flush()?;
        Ok(())
    }

    fn write_rows<W: Write>(&self, csv_writer: &mut csv::Writer<W>) -> Result<(), csv::Error> {
        let ids = self.experiment_ids();
        for (i, (time, features)) in self
            .table
            .time
            .iter()
            .zip(self.table.feature_rows())
            .enumerate()
        {
            let [biomass, substrate, product] = features.map(|v| v.to_string());
            csv_writer.write_record([
                time.to_string(),
                biomass,
                substrate,
                product,
                ids.get(i).cloned().unwrap_or_default(),
                self.file_name.clone(),
            ])?;
        }
        Ok(())
    }
}

/// Provenance document of a combined load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Number of experiments (files that produced data)
    pub n_experiments: usize,
    /// Total number of samples
    pub n_samples: usize,
    /// Experiment identifier of every sample
    pub experiment_ids: Vec<String>,
    /// Source file name of every sample
    pub file_names: Vec<String>,
    /// Files that produced data, in processing order
    pub files_loaded: Vec<String>,
}

impl Metadata {
    /// Build the provenance of a sequence of experiment tables.
    pub fn from_experiments(experiments: &[ExperimentTable]) -> Self {
        let mut metadata = Metadata {
            n_experiments: experiments.len(),
            ..Default::default()
        };
        for experiment in experiments {
            metadata.n_samples += experiment.len();
            metadata
                .experiment_ids
                .extend_from_slice(experiment.experiment_ids());
            metadata
                .file_names
                .extend(std::iter::repeat(experiment.file_name.clone()).take(experiment.len()));
            metadata.files_loaded.push(experiment.file_name.clone());
        }
        metadata
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-file tables kept apart (`combine = false`).
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSet {
    /// Tables in file-processing order
    pub experiments: Vec<ExperimentTable>,
    /// Provenance across all tables
    pub metadata: Metadata,
    /// Loaded and skipped files
    pub report: LoadReport,
}

impl ExperimentSet {
    /// Concatenate all tables in order into one dataset.
    pub fn concatenate(self) -> CombinedDataset {
        let n = self.metadata.n_samples;
        let mut features = Vec::with_capacity(n);
        let mut time = Vec::with_capacity(n);
        for experiment in &self.experiments {
            features.extend(experiment.table.feature_rows());
            time.extend_from_slice(&experiment.table.time);
        }

        CombinedDataset {
            features,
            time,
            metadata: self.metadata,
            report: self.report,
            experiments: self.experiments,
        }
    }
}

/// All experiments concatenated into one sample table (`combine = true`).
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedDataset {
    /// Rows of `[biomass, substrate, product]`
    pub features: Vec<[f64; 3]>,
    /// Sample times, parallel to `features`
    pub time: Vec<f64>,
    /// Per-sample provenance
    pub metadata: Metadata,
    /// Loaded and skipped files
    pub report: LoadReport,
    experiments: Vec<ExperimentTable>,
}

impl CombinedDataset {
    /// Total number of samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the dataset has no samples
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Write every sample as CSV: time, features, experiment id, file name.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;
        for experiment in &self.experiments {
            experiment.write_rows(&mut csv_writer)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
