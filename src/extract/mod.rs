//! # Hierarchical Extraction
//!
//! Recovers the canonical series (time, biomass, substrate, product) from a
//! [`RawRecord`] without being told which structural variant the producer
//! used. Every role is located independently, so one source may mix
//! variants (flat time next to boxed biomass, for example).
//!
//! ## Precedence
//!
//! For each numeric role:
//!
//! 1. **Top-level scope**: resolve the role's name among the top-level
//!    fields and offer the value to the shape detectors.
//! 2. **Batch scope**: locate the per-batch container (a record-valued field
//!    whose name contains `batch`, else the first record-valued field, else
//!    the top-level value itself when it is an array of records), take entry
//!    `batch_index`, and repeat the lookup there. An out-of-range index fails
//!    the source only when the container is clearly the batch list or time
//!    depends on it.
//! 3. **Nested walk**: visit every reachable field down to `max_depth` and
//!    take the first numeric leaf whose field name resolves to the role.
//!
//! Shape detectors, tried in order for a resolved field:
//!
//! | Shape | Value | Series |
//! |-------|-------|--------|
//! | flat vector | `1xN` / `Nx1` array | the array |
//! | boxed | singleton array around an array | the inner array (one layer) |
//! | named sub-table | record with a `val`-like field | column `column_index` |
//! | matrix column | `NxK` array | column `column_index` |
//!
//! The first non-empty result wins. A missing time series fails the source
//! with [`SourceError::UnresolvedRole`]; other missing roles are simply
//! absent from the [`ExtractedSeries`].

mod variants;
mod walk;


use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

pub use variants::{
    default_detectors, Boxed, FlatVector, MatrixColumn, NamedSubTable, ShapeContext, ShapeDetector,
};

use crate::error::SourceError;
use crate::record::{Fields, RawRecord};
use crate::schema::{CanonicalRole, SchemaResolver};

/// Where a role was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Fields of the top-level record
    TopLevel,
    /// Fields of one batch entry
    BatchEntry(usize),
    /// Found by the generic walk at this depth
    Nested {
        /// Depth of the leaf below the root
        depth: usize,
    },
    /// Column of a tabular source
    Table,
}

/// Structural shape of the value a role was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Plain vector
    FlatVector,
    /// Singleton-wrapped array
    Boxed,
    /// `val`-like sub-field of a small record
    NamedSubTable,
    /// Designated column of a matrix
    MatrixColumn,
    /// Leaf picked up by the generic walk
    NestedLeaf,
    /// Tabular column
    Column,
}

/// Provenance of one extracted series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSource {
    /// Scope the field was found in
    pub scope: Scope,
    /// Shape of the stored value
    pub shape: ShapeKind,
    /// Source field or column name
    pub field: String,
}

impl fmt::Display for RoleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({:?}, {:?})", self.field, self.scope, self.shape)
    }
}

/// Experiment identifier carried by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentLabel {
    /// One label for every sample
    Constant(String),
    /// One label per sample
    PerSample(Vec<String>),
}

/// Per-role series recovered from one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSeries {
    /// Numeric series by role
    pub series: BTreeMap<CanonicalRole, Vec<f64>>,
    /// Experiment identifier, if the source provides one
    pub experiment: Option<ExperimentLabel>,
    /// Where each series came from
    pub sources: BTreeMap<CanonicalRole, RoleSource>,
}

impl ExtractedSeries {
    /// Series for a role, if present
    pub fn get(&self, role: CanonicalRole) -> Option<&[f64]> {
        self.series.get(&role).map(Vec::as_slice)
    }

    /// Record a series and its provenance.
    pub fn insert(&mut self, role: CanonicalRole, values: Vec<f64>, source: RoleSource) {
        self.series.insert(role, values);
        self.sources.insert(role, source);
    }

    /// Whether any of biomass, substrate or product is present.
    pub fn has_measurements(&self) -> bool {
        CanonicalRole::MEASURED
            .iter()
            .any(|role| self.series.contains_key(role))
    }
}

/// Tunables of the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Entry used in the single-batch-column variant
    pub batch_index: usize,
    /// Column used for matrix-shaped values
    pub column_index: usize,
    /// Recursion bound of the generic walk
    pub max_depth: usize,
    /// Sub-field names that hold the matrix of a named sub-table, in order
    pub value_fields: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            batch_index: 0,
            column_index: 0,
            max_depth: 5,
            value_fields: ["val", "value", "values", "data"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Extracts canonical series from hierarchical records.
pub struct HierarchicalExtractor {
    resolver: SchemaResolver,
    config: ExtractorConfig,
    detectors: Vec<Box<dyn ShapeDetector>>,
}

impl fmt::Debug for HierarchicalExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchicalExtractor")
            .field("config", &self.config)
            .field(
                "detectors",
                &self.detectors.iter().map(|d| d.kind()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for HierarchicalExtractor {
    fn default() -> Self {
        Self::new(SchemaResolver::default(), ExtractorConfig::default())
    }
}

impl HierarchicalExtractor {
    /// Create an extractor with the default detector order.
    pub fn new(resolver: SchemaResolver, config: ExtractorConfig) -> Self {
        Self {
            resolver,
            config,
            detectors: default_detectors(),
        }
    }

    /// Replace the ranked list of shape detectors.
    pub fn with_detectors(mut self, detectors: Vec<Box<dyn ShapeDetector>>) -> Self {
        self.detectors = detectors;
        self
    }

    /// The extractor's configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The resolver used to label fields
    pub fn resolver(&self) -> &SchemaResolver {
        &self.resolver
    }

    /// Recover the canonical series from `record`.
    pub fn extract(&self, record: &RawRecord) -> Result<ExtractedSeries, SourceError> {
        let mut extracted = ExtractedSeries::default();
        let top = record.as_fields();
        // Located on first use so flat sources never look for a batch container
        let mut batch: Option<Option<(usize, &Fields)>> = None;

        for role in CanonicalRole::NUMERIC {
            if let Some(fields) = top {
                if let Some((values, source)) = self.from_scope(fields, role, Scope::TopLevel)? {
                    extracted.insert(role, values, source);
                    continue;
                }
            }

            let entry = match batch {
                Some(entry) => entry,
                None => {
                    let entry = self.batch_entry(record, role)?;
                    batch = Some(entry);
                    entry
                }
            };
            if let Some((index, fields)) = entry {
                let scope = Scope::BatchEntry(index);
                if let Some((values, source)) = self.from_scope(fields, role, scope)? {
                    extracted.insert(role, values, source);
                }
            }
        }

        if CanonicalRole::NUMERIC
            .iter()
            .any(|role| !extracted.series.contains_key(role))
        {
            let mut found = BTreeMap::new();
            walk::NestedWalk {
                resolver: &self.resolver,
                max_depth: self.config.max_depth,
                column_index: self.config.column_index,
            }
            .collect(record, &mut found);

            for (role, (values, source)) in found {
                if !extracted.series.contains_key(&role) {
                    extracted.insert(role, values, source);
                }
            }
        }

        extracted.experiment = top
            .and_then(|fields| self.experiment_label(fields))
            .or_else(|| {
                batch
                    .flatten()
                    .and_then(|(_, fields)| self.experiment_label(fields))
            });

        if !extracted.series.contains_key(&CanonicalRole::Time) {
            return Err(SourceError::unresolved(
                CanonicalRole::Time,
                "no temporal reference in any structural variant",
            ));
        }

        for (role, source) in &extracted.sources {
            debug!("Resolved {role} from {source}");
        }

        Ok(extracted)
    }

    fn from_scope(
        &self,
        fields: &Fields,
        role: CanonicalRole,
        scope: Scope,
    ) -> Result<Option<(Vec<f64>, RoleSource)>, SourceError> {
        let Some(name) = self.resolver.resolve(fields, role) else {
            return Ok(None);
        };
        let Some(value) = fields.get(name) else {
            return Ok(None);
        };

        let ctx = ShapeContext {
            role,
            column_index: self.config.column_index,
            value_fields: &self.config.value_fields,
        };

        for detector in &self.detectors {
            if let Some(values) = detector.attempt(value, &ctx)? {
                if !values.is_empty() {
                    let source = RoleSource {
                        scope,
                        shape: detector.kind(),
                        field: name.to_string(),
                    };
                    return Ok(Some((values, source)));
                }
            }
        }

        Ok(None)
    }

    /// Locate the per-batch container and select entry `batch_index`.
    ///
    /// An index past the end is a structural mismatch when the container is
    /// unambiguously the batch list (a top-level array, or a field named like
    /// `batch`) or when `role` is time. Any other record-valued field is only
    /// a guess, and then the batch scope is simply absent.
    fn batch_entry<'r>(
        &self,
        record: &'r RawRecord,
        role: CanonicalRole,
    ) -> Result<Option<(usize, &'r Fields)>, SourceError> {
        let index = self.config.batch_index;

        let (container, named_batch) = match record {
            RawRecord::ArrayOfRecord(_) if is_batch_container(record) => (record, true),
            RawRecord::NamedRecord(fields) => {
                let candidates: Vec<(&str, &RawRecord)> = fields
                    .iter()
                    .filter(|(_, value)| is_batch_container(value))
                    .collect();
                let chosen = candidates
                    .iter()
                    .find(|(name, _)| name.to_lowercase().contains("batch"))
                    .map(|(_, value)| (*value, true))
                    .or_else(|| candidates.first().map(|(_, value)| (*value, false)));
                let Some(chosen) = chosen else {
                    return Ok(None);
                };
                chosen
            }
            _ => return Ok(None),
        };

        match container {
            RawRecord::NamedRecord(fields) if index == 0 => Ok(Some((0, fields))),
            RawRecord::ArrayOfRecord(items) => {
                match items.get(index).and_then(RawRecord::as_fields) {
                    Some(fields) => Ok(Some((index, fields))),
                    None if named_batch || role == CanonicalRole::Time => {
                        Err(SourceError::mismatch(
                            role,
                            format!(
                                "batch index {index} out of range for {} entries",
                                items.len()
                            ),
                        ))
                    }
                    None => {
                        debug!("Batch index {index} not present, no batch scope");
                        Ok(None)
                    }
                }
            }
            _ => Ok(None),
        }
    }

    fn experiment_label(&self, fields: &Fields) -> Option<ExperimentLabel> {
        let name = self.resolver.resolve(fields, CanonicalRole::ExperimentId)?;
        let value = fields.get(name)?;

        if let Some(text) = value.as_text().or_else(|| value.unbox().and_then(RawRecord::as_text)) {
            return Some(ExperimentLabel::Constant(text.to_string()));
        }
        match value {
            RawRecord::ArrayOfRecord(items) if !items.is_empty() => items
                .iter()
                .map(|item| item.as_text().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(ExperimentLabel::PerSample),
            _ => None,
        }
    }
}

/// A non-empty array of named records, or a single named record.
fn is_batch_container(value: &RawRecord) -> bool {
    match value {
        RawRecord::NamedRecord(_) => true,
        RawRecord::ArrayOfRecord(items) => {
            !items.is_empty() && items.iter().all(|item| item.as_fields().is_some())
        }
        _ => false,
    }
}
