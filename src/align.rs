//! # Time-Series Alignment
//!
//! Series extracted from one source rarely agree on length: a sensor column
//! may carry a trailing sample the offline assays never got. The aligner
//! truncates every present series (and a per-sample experiment label) to the
//! shortest one, so each row of the resulting [`AlignedTable`] is one sample.
//! Arrays are never padded.

use std::collections::BTreeMap;

use log::debug;

use crate::error::SourceError;
use crate::extract::{ExperimentLabel, ExtractedSeries};
use crate::schema::CanonicalRole;

/// How derived columns of a table came to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableProvenance {
    /// Substrate was estimated from biomass growth, not measured
    pub substrate_estimated: bool,
    /// Product was absent and synthesized as zeros
    pub product_filled: bool,
}

/// Per-sample table of one experiment. Every column has the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    /// Sample times
    pub time: Vec<f64>,
    /// Measured columns (biomass, substrate, product) that are present
    pub measurements: BTreeMap<CanonicalRole, Vec<f64>>,
    /// Per-sample experiment identifier, when the source carried one
    pub experiment_ids: Option<Vec<String>>,
    /// Provenance of derived columns
    pub provenance: TableProvenance,
}

impl AlignedTable {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the table has no samples
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Column for a numeric role, time included.
    pub fn get(&self, role: CanonicalRole) -> Option<&[f64]> {
        match role {
            CanonicalRole::Time => Some(&self.time),
            _ => self.measurements.get(&role).map(Vec::as_slice),
        }
    }

    /// Rows of `[biomass, substrate, product]`; absent columns read as zero.
    pub fn feature_rows(&self) -> Vec<[f64; 3]> {
        let column = |role| self.get(role);
        let [biomass, substrate, product] = CanonicalRole::MEASURED.map(column);
        (0..self.len())
            .map(|i| {
                [biomass, substrate, product]
                    .map(|values| values.and_then(|v| v.get(i)).copied().unwrap_or(0.0))
            })
            .collect()
    }

    /// Keep only the rows whose flag is set.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        fn retain<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut flags = keep.iter();
            values.retain(|_| flags.next().copied().unwrap_or(false));
        }

        retain(&mut self.time, keep);
        for values in self.measurements.values_mut() {
            retain(values, keep);
        }
        if let Some(ids) = &mut self.experiment_ids {
            retain(ids, keep);
        }
    }

    /// Rearrange rows so that row `i` becomes former row `order[i]`.
    pub(crate) fn reorder(&mut self, order: &[usize]) {
        fn permute<T: Clone>(values: &mut Vec<T>, order: &[usize]) {
            *values = order.iter().map(|&i| values[i].clone()).collect();
        }

        permute(&mut self.time, order);
        for values in self.measurements.values_mut() {
            permute(values, order);
        }
        if let Some(ids) = &mut self.experiment_ids {
            permute(ids, order);
        }
    }
}

/// Truncates extracted series to a common length.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSeriesAligner;

impl TimeSeriesAligner {
    /// Build an [`AlignedTable`] from the series of one source.
    ///
    /// Requires time and at least one of biomass, substrate or product.
    pub fn align(&self, extracted: ExtractedSeries) -> Result<AlignedTable, SourceError> {
        let ExtractedSeries {
            mut series,
            experiment,
            ..
        } = extracted;

        let mut time = series.remove(&CanonicalRole::Time).ok_or_else(|| {
            SourceError::unresolved(CanonicalRole::Time, "no temporal reference to align on")
        })?;

        let mut measurements: BTreeMap<CanonicalRole, Vec<f64>> = series
            .into_iter()
            .filter(|(role, _)| CanonicalRole::MEASURED.contains(role))
            .collect();
        if measurements.is_empty() {
            return Err(SourceError::NoMeasuredRoles);
        }

        let label_len = match &experiment {
            Some(ExperimentLabel::PerSample(ids)) => Some(ids.len()),
            _ => None,
        };
        let n = measurements
            .values()
            .map(Vec::len)
            .chain(label_len)
            .fold(time.len(), usize::min);
        if n == 0 {
            return Err(SourceError::EmptyAfterAlignment);
        }

        if time.len() != n || measurements.values().any(|values| values.len() != n) {
            debug!(
                "Truncating series to {n} samples (time had {})",
                time.len()
            );
        }
        time.truncate(n);
        for values in measurements.values_mut() {
            values.truncate(n);
        }

        let experiment_ids = experiment.map(|label| match label {
            ExperimentLabel::Constant(id) => vec![id; n],
            ExperimentLabel::PerSample(mut ids) => {
                ids.truncate(n);
                ids
            }
        });

        Ok(AlignedTable {
            time,
            measurements,
            experiment_ids,
            provenance: TableProvenance::default(),
        })
    }
}
