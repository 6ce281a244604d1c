//! Shape detectors for the value stored under a resolved field name.
//!
//! Each detector recognizes one structural variant and either extracts the
//! series, reports that the value is not its shape (`Ok(None)`), or reports
//! that the value is its shape but violates it (`Err`). Detectors are tried
//! in the order returned by [`default_detectors`].

use crate::error::SourceError;
use crate::record::{NumericArray, RawRecord};
use crate::schema::CanonicalRole;

use super::ShapeKind;

/// Inputs shared by all detectors for one lookup.
#[derive(Debug, Clone, Copy)]
pub struct ShapeContext<'a> {
    /// Role being extracted
    pub role: CanonicalRole,
    /// Designated column for matrix-shaped values
    pub column_index: usize,
    /// Sub-field names holding the matrix of a named sub-table
    pub value_fields: &'a [String],
}

/// One structural variant of a field value.
pub trait ShapeDetector: Send + Sync {
    /// Which variant this detector recognizes.
    fn kind(&self) -> ShapeKind;

    /// Try to extract a 1-D series from `value`.
    fn attempt(
        &self,
        value: &RawRecord,
        ctx: &ShapeContext<'_>,
    ) -> Result<Option<Vec<f64>>, SourceError>;
}

/// Detectors in precedence order: flat vector, boxed, named sub-table,
/// multi-column matrix.
pub fn default_detectors() -> Vec<Box<dyn ShapeDetector>> {
    vec![
        Box::new(FlatVector),
        Box::new(Boxed),
        Box::new(NamedSubTable),
        Box::new(MatrixColumn),
    ]
}

/// A plain row or column vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatVector;

impl ShapeDetector for FlatVector {
    fn kind(&self) -> ShapeKind {
        ShapeKind::FlatVector
    }

    fn attempt(
        &self,
        value: &RawRecord,
        _ctx: &ShapeContext<'_>,
    ) -> Result<Option<Vec<f64>>, SourceError> {
        Ok(value
            .as_numeric()
            .and_then(NumericArray::as_vector)
            .filter(|values| !values.is_empty())
            .map(<[f64]>::to_vec))
    }
}

/// An array wrapped in one singleton container layer.
///
/// Exactly one layer is removed; a box inside a box is not this variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boxed;

impl ShapeDetector for Boxed {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Boxed
    }

    fn attempt(
        &self,
        value: &RawRecord,
        ctx: &ShapeContext<'_>,
    ) -> Result<Option<Vec<f64>>, SourceError> {
        match value.unbox().and_then(RawRecord::as_numeric) {
            Some(array) => select_column(array, ctx),
            None => Ok(None),
        }
    }
}

/// A small record whose `val`-like sub-field holds the actual matrix.
///
/// The record itself may sit inside one boxing layer (1x1 struct arrays).
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedSubTable;

impl ShapeDetector for NamedSubTable {
    fn kind(&self) -> ShapeKind {
        ShapeKind::NamedSubTable
    }

    fn attempt(
        &self,
        value: &RawRecord,
        ctx: &ShapeContext<'_>,
    ) -> Result<Option<Vec<f64>>, SourceError> {
        let Some(fields) = value
            .as_fields()
            .or_else(|| value.unbox().and_then(RawRecord::as_fields))
        else {
            return Ok(None);
        };

        let Some(inner) = ctx.value_fields.iter().find_map(|name| fields.get(name)) else {
            return Ok(None);
        };

        match inner.as_numeric() {
            Some(array) => select_column(array, ctx),
            None => Err(SourceError::mismatch(
                ctx.role,
                format!("sub-table value is {}, expected a numeric matrix", inner.kind()),
            )),
        }
    }
}

/// A 2-D matrix where one designated column is the series.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixColumn;

impl ShapeDetector for MatrixColumn {
    fn kind(&self) -> ShapeKind {
        ShapeKind::MatrixColumn
    }

    fn attempt(
        &self,
        value: &RawRecord,
        ctx: &ShapeContext<'_>,
    ) -> Result<Option<Vec<f64>>, SourceError> {
        match value.as_numeric() {
            Some(array) if !array.is_vector() => select_column(array, ctx),
            _ => Ok(None),
        }
    }
}

/// Reduce a numeric array to the designated series.
///
/// Vectors are returned whole. Matrices yield column `ctx.column_index`.
/// Empty arrays are treated as absent, except a multi-row matrix declared
/// with zero columns.
pub(crate) fn select_column(
    array: &NumericArray,
    ctx: &ShapeContext<'_>,
) -> Result<Option<Vec<f64>>, SourceError> {
    if array.is_empty() {
        if array.rows() > 1 && array.cols() == 0 {
            return Err(SourceError::mismatch(
                ctx.role,
                format!("{}x0 matrix has no columns", array.rows()),
            ));
        }
        return Ok(None);
    }

    if let Some(values) = array.as_vector() {
        return Ok(Some(values.to_vec()));
    }

    array
        .column(ctx.column_index)
        .map(|column| Some(column.to_vec()))
        .ok_or_else(|| {
            SourceError::mismatch(
                ctx.role,
                format!(
                    "column {} requested from a {}x{} matrix",
                    ctx.column_index,
                    array.rows(),
                    array.cols()
                ),
            )
        })
}
