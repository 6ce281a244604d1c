use anyhow::{Context, Result};
use log::info;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use bioseries::combine::{CombineOutput, MultiExperimentCombiner};
use bioseries::config::PipelineConfig;

/// Combine all matching sources in `dir` and write the results to `output`.
pub fn run(dir: &Path, output: &Path, config: &PipelineConfig) -> Result<()> {
    info!("Loading '{}' from {}", config.input.file_pattern, dir.display());

    let combiner = MultiExperimentCombiner::from_config(config);
    let result = combiner
        .load_dir(dir, &config.input.file_pattern, config.input.combine)
        .with_context(|| format!("Failed to load data from {}", dir.display()))?;

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    match &result {
        CombineOutput::Combined(dataset) => {
            let path = output.join("dataset.csv");
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            dataset
                .write_csv(BufWriter::new(file))
                .context("Failed to write dataset")?;
            info!("Wrote {} samples to {}", dataset.len(), path.display());
        }
        CombineOutput::Separate(set) => {
            for experiment in &set.experiments {
                let path = output.join(format!("{}.csv", experiment.name));
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                experiment
                    .write_csv(BufWriter::new(file))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {} samples to {}", experiment.len(), path.display());
            }
        }
    }

    let metadata = result.metadata();
    let metadata_path = output.join("metadata.json");
    fs::write(&metadata_path, metadata.to_json()?)
        .with_context(|| format!("Failed to write {}", metadata_path.display()))?;

    let report = result.report();
    println!("Data Load Summary");
    println!("=================");
    println!("  Files matched:  {}", report.attempted);
    println!("  Files loaded:   {}", report.loaded.len());
    println!("  Samples:        {}", metadata.n_samples);
    println!("  Output:         {}", output.display());
    if !report.skipped.is_empty() {
        println!();
        println!("Skipped:");
        for skipped in &report.skipped {
            println!("  {}: {}", skipped.file_name, skipped.reason);
        }
    }

    Ok(())
}
