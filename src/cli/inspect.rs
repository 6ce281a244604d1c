use anyhow::{Context, Result};
use std::path::Path;

use bioseries::config::PipelineConfig;
use bioseries::extract::HierarchicalExtractor;
use bioseries::schema::{CanonicalRole, SchemaResolver};
use bioseries::source::{load_source, read_record, SourceFormat};

/// Print the structure of a source file and the variant behind each role
pub fn run(file: &Path, config: &PipelineConfig, depth: usize) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let format = SourceFormat::from_path(file)?;
    let extractor = HierarchicalExtractor::new(
        SchemaResolver::new(config.aliases.clone()),
        config.extraction.clone(),
    );

    println!("Source File Information");
    println!("=======================");
    println!("File:   {}", file.display());
    println!("Format: {format:?}");
    println!();

    if format.is_hierarchical() {
        let record = read_record(file).context("Failed to read source")?;
        println!("Structure:");
        for line in record.outline(depth).lines() {
            println!("  {line}");
        }
        println!();
    }

    let extracted = match load_source(file, &extractor) {
        Ok(extracted) => extracted,
        Err(e) => {
            println!("Extraction failed: {e}");
            return Ok(());
        }
    };

    println!("Resolved Roles:");
    for role in CanonicalRole::NUMERIC {
        match (extracted.get(role), extracted.sources.get(&role)) {
            (Some(values), Some(source)) => {
                println!("  {:10} {} samples from {source}", role.as_str(), values.len())
            }
            _ => println!("  {:10} <absent>", role.as_str()),
        }
    }
    if let Some(label) = &extracted.experiment {
        println!("  {:10} {label:?}", CanonicalRole::ExperimentId.as_str());
    }

    Ok(())
}
