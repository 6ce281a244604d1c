//! # Raw Hierarchical Records
//!
//! Instrument and simulation exports arrive as loosely-schematized trees:
//! structs of cells of matrices, with field names and nesting depth that
//! change from producer to producer. [`RawRecord`] models that tree as a
//! small closed tagged union so that extraction is plain pattern matching.
//!
//! ```text
//! RawRecord
//! ├── NumericArray   1-D or 2-D numbers (column-major)
//! ├── NamedRecord    ordered field name -> RawRecord
//! ├── ArrayOfRecord  RawRecord elements (cells, struct arrays)
//! └── Opaque         text or anything the extractor does not interpret
//! ```
//!
//! Records are produced by the loaders (MAT-file decoder, JSON) and are never
//! mutated afterwards.

mod json;
mod numeric;

use std::fmt::Write as _;

pub use numeric::NumericArray;

use crate::schema::FieldLookup;

/// Leaf value the extractor does not treat as numeric data.
#[derive(Debug, Clone, PartialEq)]
pub enum Opaque {
    /// Text (MAT char arrays, JSON strings)
    Text(String),
    /// Anything else, described by its source type name
    Unsupported(String),
}

/// One node of a hierarchical record.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// Numeric matrix or vector
    NumericArray(NumericArray),
    /// Named fields in source order
    NamedRecord(Fields),
    /// Sequence of records
    ArrayOfRecord(Vec<RawRecord>),
    /// Uninterpreted leaf
    Opaque(Opaque),
}

/// Ordered named fields of a [`RawRecord::NamedRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, RawRecord)>);

impl Fields {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Later duplicates are kept but never returned by [`Fields::get`].
    pub fn push(&mut self, name: impl Into<String>, value: RawRecord) {
        self.0.push((name.into(), value));
    }

    /// Move all fields of `other` to the end of this set.
    pub fn append(&mut self, mut other: Fields) {
        self.0.append(&mut other.0);
    }

    /// Field value by exact name (first occurrence).
    pub fn get(&self, name: &str) -> Option<&RawRecord> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Iterate fields in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawRecord)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FieldLookup for Fields {
    fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<S: Into<String>> FromIterator<(S, RawRecord)> for Fields {
    fn from_iter<I: IntoIterator<Item = (S, RawRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value)).collect())
    }
}

impl RawRecord {
    /// Build a named record from `(name, value)` pairs.
    pub fn record<S, I>(fields: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, RawRecord)>,
    {
        RawRecord::NamedRecord(fields.into_iter().collect())
    }

    /// Build a single-column numeric leaf.
    pub fn vector(values: Vec<f64>) -> Self {
        RawRecord::NumericArray(NumericArray::vector(values))
    }

    /// Build a text leaf.
    pub fn text(value: impl Into<String>) -> Self {
        RawRecord::Opaque(Opaque::Text(value.into()))
    }

    /// Fields if this is a named record.
    pub fn as_fields(&self) -> Option<&Fields> {
        match self {
            RawRecord::NamedRecord(fields) => Some(fields),
            _ => None,
        }
    }

    /// Numeric payload if this is a numeric array.
    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            RawRecord::NumericArray(array) => Some(array),
            _ => None,
        }
    }

    /// Text payload if this is a text leaf.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawRecord::Opaque(Opaque::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// The sole element of a singleton array, i.e. the content of one boxing layer.
    pub fn unbox(&self) -> Option<&RawRecord> {
        match self {
            RawRecord::ArrayOfRecord(items) if items.len() == 1 => items.first(),
            _ => None,
        }
    }

    /// Short type description used in diagnostics.
    pub fn kind(&self) -> String {
        match self {
            RawRecord::NumericArray(array) => {
                format!("numeric {}x{}", array.rows(), array.cols())
            }
            RawRecord::NamedRecord(fields) => format!("record ({} fields)", fields.len()),
            RawRecord::ArrayOfRecord(items) => format!("array ({} items)", items.len()),
            RawRecord::Opaque(Opaque::Text(text)) => format!("text ({} chars)", text.chars().count()),
            RawRecord::Opaque(Opaque::Unsupported(kind)) => format!("opaque <{kind}>"),
        }
    }

    /// Indented outline of the record tree, down to `max_depth` levels.
    pub fn outline(&self, max_depth: usize) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, "<root>", 0, max_depth);
        out
    }

    fn write_outline(&self, out: &mut String, label: &str, depth: usize, max_depth: usize) {
        let _ = writeln!(out, "{:indent$}{label}: {}", "", self.kind(), indent = depth * 2);
        if depth >= max_depth {
            return;
        }
        match self {
            RawRecord::NamedRecord(fields) => {
                for (name, value) in fields.iter() {
                    value.write_outline(out, name, depth + 1, max_depth);
                }
            }
            RawRecord::ArrayOfRecord(items) => {
                for (index, value) in items.iter().enumerate() {
                    value.write_outline(out, &format!("[{index}]"), depth + 1, max_depth);
                }
            }
            RawRecord::NumericArray(_) | RawRecord::Opaque(_) => {}
        }
    }
}
