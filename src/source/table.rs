//! Tabular sources: one header row, one sample per line.

use std::io::Read;

use log::debug;

use crate::error::SourceError;
use crate::extract::{ExperimentLabel, ExtractedSeries, RoleSource, Scope, ShapeKind};
use crate::schema::{CanonicalRole, SchemaResolver};

/// Read a delimited table and resolve its columns.
///
/// Cells that do not parse as numbers (including empty cells and cells
/// missing from short rows) read as NaN; the preprocessor decides what to do
/// with them.
pub fn read_table<R: Read>(
    reader: R,
    resolver: &SchemaResolver,
) -> Result<ExtractedSeries, SourceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let Some(time_column) = resolver.resolve(&headers, CanonicalRole::Time) else {
        return Err(SourceError::unresolved(
            CanonicalRole::Time,
            format!("no temporal column among {} header fields", headers.len()),
        ));
    };
    debug!("CSV time column: '{time_column}'");

    let position = |name: &str| headers.iter().position(|header| header == name);

    let numeric: Vec<(CanonicalRole, &str, usize)> = CanonicalRole::NUMERIC
        .into_iter()
        .filter_map(|role| {
            let name = resolver.resolve(&headers, role)?;
            Some((role, name, position(name)?))
        })
        .collect();
    let experiment_column = resolver
        .resolve(&headers, CanonicalRole::ExperimentId)
        .and_then(position);

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); numeric.len()];
    let mut experiment_ids = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        for ((_, _, index), column) in numeric.iter().zip(columns.iter_mut()) {
            column.push(parse_cell(record.get(*index)));
        }
        if let Some(index) = experiment_column {
            experiment_ids.push(record.get(index).unwrap_or_default().to_string());
        }
    }

    let mut extracted = ExtractedSeries::default();
    for ((role, name, _), values) in numeric.into_iter().zip(columns) {
        let source = RoleSource {
            scope: Scope::Table,
            shape: ShapeKind::Column,
            field: name.to_string(),
        };
        extracted.insert(role, values, source);
    }
    if experiment_column.is_some() {
        extracted.experiment = Some(ExperimentLabel::PerSample(experiment_ids));
    }

    Ok(extracted)
}

fn parse_cell(cell: Option<&str>) -> f64 {
    cell.and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}
