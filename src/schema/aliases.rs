use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::CanonicalRole;

/// Ordered candidate names per canonical role.
///
/// The first name of each list is the primary name; the rest are alternates
/// tried in listed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AliasOverrides", into = "BTreeMap<CanonicalRole, Vec<String>>")]
pub struct NameAliasTable {
    names: BTreeMap<CanonicalRole, Vec<String>>,
}

impl Default for NameAliasTable {
    fn default() -> Self {
        let mut names = BTreeMap::new();
        names.insert(
            CanonicalRole::Time,
            owned(&["time", "Time", "t", "hour", "hours", "time_h", "timepoint", "age"]),
        );
        names.insert(
            CanonicalRole::Biomass,
            owned(&[
                "biomass",
                "X",
                "cell_density",
                "cells",
                "VCD",
                "viable_cell_density",
                "vcd",
                "x",
            ]),
        );
        names.insert(
            CanonicalRole::Substrate,
            owned(&["substrate", "S", "glucose", "carbon_source", "feed", "met", "s"]),
        );
        names.insert(
            CanonicalRole::Product,
            owned(&["product", "P", "protein", "mAb", "antibody", "titer", "p"]),
        );
        names.insert(
            CanonicalRole::ExperimentId,
            owned(&["experiment_id", "experiment", "exp_id", "run", "batch", "condition"]),
        );
        Self { names }
    }
}

impl NameAliasTable {
    /// Replace the candidate list of one role. The first entry becomes the
    /// primary name.
    pub fn with_names<I, S>(mut self, role: CanonicalRole, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names
            .insert(role, names.into_iter().map(Into::into).collect());
        self
    }

    /// All candidate names for a role, primary first.
    pub fn names(&self, role: CanonicalRole) -> &[String] {
        self.names.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Primary name of a role, if the role has any candidates.
    pub fn primary(&self, role: CanonicalRole) -> Option<&str> {
        self.names(role).first().map(String::as_str)
    }

    /// Alternate names of a role, in priority order.
    pub fn alternates(&self, role: CanonicalRole) -> &[String] {
        self.names(role).get(1..).unwrap_or(&[])
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

impl From<NameAliasTable> for BTreeMap<CanonicalRole, Vec<String>> {
    fn from(table: NameAliasTable) -> Self {
        table.names
    }
}

/// Partial alias configuration; roles left out keep their default names.
#[derive(Debug, Default, Deserialize)]
struct AliasOverrides(BTreeMap<CanonicalRole, Vec<String>>);

impl From<AliasOverrides> for NameAliasTable {
    fn from(overrides: AliasOverrides) -> Self {
        overrides
            .0
            .into_iter()
            .filter(|(_, names)| !names.is_empty())
            .fold(NameAliasTable::default(), |table, (role, names)| {
                table.with_names(role, names)
            })
    }
}
