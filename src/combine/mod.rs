//! # Multi-Experiment Combination
//!
//! Runs the per-file pipeline (load, extract, align, clean) over a set of
//! source files and merges the survivors.
//!
//! ## Guarantees
//!
//! - Files are processed in lexicographic file-name order, so output order
//!   is reproducible across runs. With the `parallel` feature, files are
//!   processed on a rayon pool but collected back in that same order.
//! - A failing file never aborts the call. Its error becomes a
//!   [`SkippedSource`] in the [`LoadReport`] and is logged at `warn`.
//! - Only when no file produces data does the call fail, with
//!   [`CombineError::NoUsableSources`].
//! - Samples without an explicit experiment identifier are labelled with the
//!   file stem.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bioseries::combine::MultiExperimentCombiner;
//!
//! let combiner = MultiExperimentCombiner::default();
//! let files = MultiExperimentCombiner::discover("data".as_ref(), "*.csv")?;
//! let dataset = combiner.combine(&files)?;
//!
//! println!("{} samples from {} experiments", dataset.len(), dataset.metadata.n_experiments);
//! # Ok::<(), bioseries::error::CombineError>(())
//! ```

mod dataset;
mod report;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use log::{info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use dataset::{CombinedDataset, ExperimentSet, ExperimentTable, Metadata};
pub use report::{LoadReport, SkippedSource};

use crate::align::TimeSeriesAligner;
use crate::config::PipelineConfig;
use crate::error::{CombineError, SourceError};
use crate::extract::HierarchicalExtractor;
use crate::preprocess::Preprocessor;
use crate::schema::SchemaResolver;
use crate::source::load_source;

/// Output of [`MultiExperimentCombiner::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum CombineOutput {
    /// All experiments concatenated
    Combined(CombinedDataset),
    /// One table per experiment
    Separate(ExperimentSet),
}

impl CombineOutput {
    /// Provenance of the output
    pub fn metadata(&self) -> &Metadata {
        match self {
            CombineOutput::Combined(dataset) => &dataset.metadata,
            CombineOutput::Separate(set) => &set.metadata,
        }
    }

    /// Loaded and skipped files
    pub fn report(&self) -> &LoadReport {
        match self {
            CombineOutput::Combined(dataset) => &dataset.report,
            CombineOutput::Separate(set) => &set.report,
        }
    }
}

/// Loads, cleans and merges many source files.
#[derive(Debug, Default)]
pub struct MultiExperimentCombiner {
    extractor: HierarchicalExtractor,
    aligner: TimeSeriesAligner,
    preprocessor: Preprocessor,
}

impl MultiExperimentCombiner {
    /// Create a combiner from its pipeline stages.
    pub fn new(extractor: HierarchicalExtractor, preprocessor: Preprocessor) -> Self {
        Self {
            extractor,
            aligner: TimeSeriesAligner,
            preprocessor,
        }
    }

    /// Create a combiner from a pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let resolver = SchemaResolver::new(config.aliases.clone());
        Self::new(
            HierarchicalExtractor::new(resolver, config.extraction.clone()),
            Preprocessor::new(config.cleaning),
        )
    }

    /// Regular files in `dir` whose name matches `pattern`, sorted by file
    /// name. Subdirectories are not searched.
    pub fn discover(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CombineError> {
        let matcher = glob::Pattern::new(pattern)?;

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if entry
                .file_name()
                .to_str()
                .is_some_and(|name| matcher.matches(name))
            {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(CombineError::NoFilesMatched {
                dir: dir.to_path_buf(),
                pattern: pattern.to_string(),
            });
        }

        sort_by_file_name(&mut files);
        info!("Found {} data file(s) in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Run the per-file pipeline on one source.
    pub fn process_file(&self, path: &Path) -> Result<ExperimentTable, SourceError> {
        let extracted = load_source(path, &self.extractor)?;
        let aligned = self.aligner.align(extracted)?;
        let mut table = self.preprocessor.clean(aligned)?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        if table.experiment_ids.is_none() {
            table.experiment_ids = Some(vec![name.clone(); table.len()]);
        }

        Ok(ExperimentTable {
            file_name: file_name(path),
            name,
            table,
        })
    }

    /// Process every file and keep the tables apart.
    pub fn load(&self, files: &[PathBuf]) -> Result<ExperimentSet, CombineError> {
        let mut files = files.to_vec();
        sort_by_file_name(&mut files);

        #[cfg(feature = "parallel")]
        let results: Vec<Result<ExperimentTable, SourceError>> =
            files.par_iter().map(|path| self.process_file(path)).collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<ExperimentTable, SourceError>> =
            files.iter().map(|path| self.process_file(path)).collect();

        let mut report = LoadReport {
            attempted: files.len(),
            ..Default::default()
        };
        let experiments: Vec<ExperimentTable> = files
            .iter()
            .zip(results)
            .filter_map(|(path, result)| match result {
                Ok(experiment) => {
                    info!(
                        "Loaded {}: {} samples",
                        experiment.file_name,
                        experiment.len()
                    );
                    report.loaded.push(experiment.file_name.clone());
                    Some(experiment)
                }
                Err(e) => {
                    let file_name = file_name(path);
                    warn!("Skipping {file_name}: {e}");
                    report.skipped.push(SkippedSource {
                        file_name,
                        reason: e.to_string(),
                    });
                    None
                }
            })
            .collect();

        if experiments.is_empty() {
            return Err(CombineError::NoUsableSources {
                attempted: report.attempted,
            });
        }

        let metadata = Metadata::from_experiments(&experiments);
        info!(
            "Loaded {} samples from {} of {} file(s)",
            metadata.n_samples,
            metadata.n_experiments,
            report.attempted
        );

        Ok(ExperimentSet {
            experiments,
            metadata,
            report,
        })
    }

    /// Process every file and concatenate the tables in file order.
    pub fn combine(&self, files: &[PathBuf]) -> Result<CombinedDataset, CombineError> {
        Ok(self.load(files)?.concatenate())
    }

    /// Process every file, concatenating when `combine` is set.
    pub fn run(&self, files: &[PathBuf], combine: bool) -> Result<CombineOutput, CombineError> {
        let set = self.load(files)?;
        Ok(if combine {
            CombineOutput::Combined(set.concatenate())
        } else {
            CombineOutput::Separate(set)
        })
    }

    /// Discover files in `dir` matching `pattern`, then [`run`](Self::run).
    pub fn load_dir(
        &self,
        dir: &Path,
        pattern: &str,
        combine: bool,
    ) -> Result<CombineOutput, CombineError> {
        let files = Self::discover(dir, pattern)?;
        self.run(&files, combine)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn sort_by_file_name(files: &mut [PathBuf]) {
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
}
