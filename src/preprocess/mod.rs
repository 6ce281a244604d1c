//! # Preprocessing
//!
//! Turns one [`AlignedTable`] into a table that downstream numerical code can
//! consume without further checks. Stages run in a fixed order:
//!
//! 1. Drop samples whose time or biomass is missing
//! 2. Zero-fill missing or non-finite product (synthesize it when absent)
//! 3. Estimate substrate from biomass growth when absent:
//!    `S = S0 - (X - X0) / Yxs`, clipped at zero
//! 4. Drop samples with a non-finite time; missing substrate reads as zero
//! 5. Clip biomass, substrate and product at zero
//! 6. Optionally reject outliers by per-column z-score, rescoring the
//!    remaining rows until none is flagged
//! 7. Stable sort by ascending time
//!
//! After cleaning, time is non-decreasing, every feature column is present
//! and non-negative, and no value is missing. Cleaning an already cleaned
//! table with the same settings keeps every row.
//!
//! Any stage that removes the last sample fails the table with
//! [`SourceError::EmptyAfterCleaning`].

#[cfg(test)]
mod tests;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::align::AlignedTable;
use crate::error::SourceError;
use crate::schema::CanonicalRole;

/// Added to the standard deviation so constant columns score zero.
const STD_EPSILON: f64 = 1e-8;

/// Constants of the substrate-from-biomass fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstrateEstimate {
    /// Initial substrate concentration `S0` (g/L)
    pub initial_substrate: f64,
    /// Biomass yield on substrate `Yxs`
    pub biomass_yield: f64,
}

impl Default for SubstrateEstimate {
    fn default() -> Self {
        Self {
            initial_substrate: 10.0,
            biomass_yield: 0.5,
        }
    }
}

impl SubstrateEstimate {
    /// Substrate series implied by `biomass`, clipped at zero.
    pub fn estimate(&self, biomass: &[f64]) -> Vec<f64> {
        let Some(&x0) = biomass.first() else {
            return Vec::new();
        };
        biomass
            .iter()
            .map(|x| clip(self.initial_substrate - (x - x0) / self.biomass_yield))
            .collect()
    }
}

/// Cleaning settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Whether to reject outliers
    pub remove_outliers: bool,
    /// Rows with `|z| >= outlier_z_threshold` in any feature column are dropped
    pub outlier_z_threshold: f64,
    /// Substrate fallback constants
    pub substrate_estimate: SubstrateEstimate,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_outliers: true,
            outlier_z_threshold: 3.0,
            substrate_estimate: SubstrateEstimate::default(),
        }
    }
}

/// Cleans aligned tables.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    /// Create a preprocessor with the given settings.
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// The cleaning settings
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Run every cleaning stage on `table`.
    pub fn clean(&self, mut table: AlignedTable) -> Result<AlignedTable, SourceError> {
        if !table.measurements.contains_key(&CanonicalRole::Biomass) {
            return Err(SourceError::unresolved(
                CanonicalRole::Biomass,
                "biomass is required for cleaning",
            ));
        }
        let before = table.len();

        // 1. missing time or biomass
        let keep: Vec<bool> = column(&table, CanonicalRole::Biomass)
            .iter()
            .zip(&table.time)
            .map(|(x, t)| x.is_finite() && t.is_finite())
            .collect();
        drop_rows(&mut table, &keep, "missing_values")?;

        // 2. product
        match table.measurements.get_mut(&CanonicalRole::Product) {
            Some(product) => product
                .iter_mut()
                .filter(|p| !p.is_finite())
                .for_each(|p| *p = 0.0),
            None => {
                table
                    .measurements
                    .insert(CanonicalRole::Product, vec![0.0; table.len()]);
                table.provenance.product_filled = true;
            }
        }

        // 3. substrate fallback
        if !table.measurements.contains_key(&CanonicalRole::Substrate) {
            debug!("Substrate not measured, estimating from biomass growth");
            let estimate = self
                .config
                .substrate_estimate
                .estimate(column(&table, CanonicalRole::Biomass));
            table.measurements.insert(CanonicalRole::Substrate, estimate);
            table.provenance.substrate_estimated = true;
        }

        // 4. coercion
        let keep: Vec<bool> = table.time.iter().map(|t| t.is_finite()).collect();
        drop_rows(&mut table, &keep, "coercion")?;
        if let Some(substrate) = table.measurements.get_mut(&CanonicalRole::Substrate) {
            substrate
                .iter_mut()
                .filter(|s| !s.is_finite())
                .for_each(|s| *s = 0.0);
        }

        // 5. non-negativity
        for role in CanonicalRole::MEASURED {
            if let Some(values) = table.measurements.get_mut(&role) {
                values.iter_mut().for_each(|v| *v = clip(*v));
            }
        }

        // 6. outliers, repeated until no row is flagged
        if self.config.remove_outliers {
            loop {
                let keep = self.outlier_mask(&table);
                if keep.iter().all(|k| *k) {
                    break;
                }
                drop_rows(&mut table, &keep, "outlier_removal")?;
            }
        }

        // 7. chronological order
        let mut order: Vec<usize> = (0..table.len()).collect();
        order.sort_by(|&a, &b| table.time[a].total_cmp(&table.time[b]));
        if order.iter().enumerate().any(|(i, &j)| i != j) {
            table.reorder(&order);
        }

        if table.len() < before {
            info!("Cleaning kept {} of {before} samples", table.len());
        }
        Ok(table)
    }

    /// `true` for rows within the z-score threshold in every feature column.
    fn outlier_mask(&self, table: &AlignedTable) -> Vec<bool> {
        let threshold = self.config.outlier_z_threshold;
        let mut keep = vec![true; table.len()];

        for role in CanonicalRole::MEASURED {
            let Some(values) = table.get(role) else {
                continue;
            };
            let scores = z_scores(values);
            let mut dropped = 0usize;
            for (flag, z) in keep.iter_mut().zip(scores) {
                if z.abs() >= threshold {
                    dropped += usize::from(*flag);
                    *flag = false;
                }
            }
            if dropped > 0 {
                debug!("{dropped} outlier(s) in {role} at |z| >= {threshold}");
            }
        }

        keep
    }
}

/// `(x - mean) / (std + 1e-8)` with the sample (n - 1) standard deviation.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    values
        .iter()
        .map(|v| (v - mean) / (std + STD_EPSILON))
        .collect()
}

fn column(table: &AlignedTable, role: CanonicalRole) -> &[f64] {
    table.get(role).unwrap_or(&[])
}

fn clip(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else {
        value
    }
}

fn drop_rows(
    table: &mut AlignedTable,
    keep: &[bool],
    stage: &'static str,
) -> Result<(), SourceError> {
    if keep.iter().all(|k| *k) {
        return Ok(());
    }
    table.retain_rows(keep);
    if table.is_empty() {
        return Err(SourceError::EmptyAfterCleaning { stage });
    }
    debug!("Stage '{stage}' left {} samples", table.len());
    Ok(())
}
