use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic role of a series within a bioprocess record.
///
/// The set is closed: every field of a source either maps onto one of these
/// roles or is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalRole {
    /// Sampling time (hours)
    Time,
    /// Biomass concentration (X), e.g. viable cell density
    Biomass,
    /// Substrate concentration (S), e.g. glucose
    Substrate,
    /// Product concentration (P), e.g. titer
    Product,
    /// Experiment identifier (text)
    ExperimentId,
}

impl CanonicalRole {
    /// All roles in canonical order.
    pub const ALL: [CanonicalRole; 5] = [
        CanonicalRole::Time,
        CanonicalRole::Biomass,
        CanonicalRole::Substrate,
        CanonicalRole::Product,
        CanonicalRole::ExperimentId,
    ];

    /// Roles carried as numeric series.
    pub const NUMERIC: [CanonicalRole; 4] = [
        CanonicalRole::Time,
        CanonicalRole::Biomass,
        CanonicalRole::Substrate,
        CanonicalRole::Product,
    ];

    /// Measured quantities, in feature-column order.
    pub const MEASURED: [CanonicalRole; 3] = [
        CanonicalRole::Biomass,
        CanonicalRole::Substrate,
        CanonicalRole::Product,
    ];

    /// Canonical snake_case name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalRole::Time => "time",
            CanonicalRole::Biomass => "biomass",
            CanonicalRole::Substrate => "substrate",
            CanonicalRole::Product => "product",
            CanonicalRole::ExperimentId => "experiment_id",
        }
    }

    /// Whether the role holds numeric samples.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, CanonicalRole::ExperimentId)
    }
}

impl fmt::Display for CanonicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
