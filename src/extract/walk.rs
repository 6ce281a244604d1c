//! Depth-bounded generic walk, the last-resort variant.

use std::collections::BTreeMap;

use crate::record::RawRecord;
use crate::schema::{CanonicalRole, SchemaResolver};

use super::{RoleSource, Scope, ShapeKind};

pub(super) struct NestedWalk<'a> {
    pub(super) resolver: &'a SchemaResolver,
    pub(super) max_depth: usize,
    pub(super) column_index: usize,
}

impl NestedWalk<'_> {
    /// Visit every reachable field and array element in pre-order, filling
    /// roles missing from `found` with the first matching numeric leaf.
    ///
    /// Array elements inherit the field name of their array, so a boxed or
    /// cell-wrapped leaf is labelled by the field that holds it.
    pub(super) fn collect(
        &self,
        record: &RawRecord,
        found: &mut BTreeMap<CanonicalRole, (Vec<f64>, RoleSource)>,
    ) {
        self.visit(record, None, 0, found);
    }

    fn visit(
        &self,
        record: &RawRecord,
        name: Option<&str>,
        depth: usize,
        found: &mut BTreeMap<CanonicalRole, (Vec<f64>, RoleSource)>,
    ) {
        if depth > self.max_depth {
            return;
        }

        match record {
            RawRecord::NumericArray(array) => {
                let Some(field) = name else { return };
                let Some(role) = self.resolver.role_for_name(field) else {
                    return;
                };
                if !role.is_numeric() || found.contains_key(&role) {
                    return;
                }
                let values = match array.as_vector() {
                    Some(values) => Some(values),
                    None => array.column(self.column_index),
                };
                if let Some(values) = values.filter(|v| !v.is_empty()) {
                    found.insert(
                        role,
                        (
                            values.to_vec(),
                            RoleSource {
                                scope: Scope::Nested { depth },
                                shape: ShapeKind::NestedLeaf,
                                field: field.to_string(),
                            },
                        ),
                    );
                }
            }
            RawRecord::NamedRecord(fields) => {
                for (field, value) in fields.iter() {
                    self.visit(value, Some(field), depth + 1, found);
                }
            }
            RawRecord::ArrayOfRecord(items) => {
                for item in items {
                    self.visit(item, name, depth + 1, found);
                }
            }
            RawRecord::Opaque(_) => {}
        }
    }
}
