//! Shared fixtures: a minimal little-endian MAT-file v5 writer.

#![allow(dead_code)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;

const MI_INT8: u32 = 1;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

const MX_CELL_CLASS: u32 = 1;
const MX_STRUCT_CLASS: u32 = 2;
const MX_CHAR_CLASS: u32 = 4;
const MX_DOUBLE_CLASS: u32 = 6;

const FIELD_NAME_LEN: usize = 32;

/// A MATLAB value to encode.
#[derive(Debug, Clone)]
pub enum MatValue {
    Double {
        rows: usize,
        cols: usize,
        column_major: Vec<f64>,
    },
    Char(String),
    Cell(Vec<MatValue>),
    Struct {
        field_names: Vec<String>,
        entries: Vec<Vec<MatValue>>,
    },
}

impl MatValue {
    /// 1xN row vector
    pub fn row(values: &[f64]) -> Self {
        MatValue::Double {
            rows: 1,
            cols: values.len(),
            column_major: values.to_vec(),
        }
    }

    /// Nx1 column vector
    pub fn column(values: &[f64]) -> Self {
        MatValue::Double {
            rows: values.len(),
            cols: 1,
            column_major: values.to_vec(),
        }
    }

    /// Matrix from its rows
    pub fn matrix(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let column_major = (0..cols)
            .flat_map(|c| rows.iter().map(move |row| row[c]))
            .collect();
        MatValue::Double {
            rows: rows.len(),
            cols,
            column_major,
        }
    }

    pub fn text(value: &str) -> Self {
        MatValue::Char(value.to_string())
    }

    /// 1xN cell array
    pub fn cell(items: Vec<MatValue>) -> Self {
        MatValue::Cell(items)
    }

    /// 1x1 struct
    pub fn structure(fields: Vec<(&str, MatValue)>) -> Self {
        let (names, values): (Vec<_>, Vec<_>) = fields.into_iter().unzip();
        MatValue::Struct {
            field_names: names.into_iter().map(String::from).collect(),
            entries: vec![values],
        }
    }

    /// 1xN struct array; every entry lists values in `field_names` order
    pub fn struct_array(field_names: &[&str], entries: Vec<Vec<MatValue>>) -> Self {
        MatValue::Struct {
            field_names: field_names.iter().map(|n| n.to_string()).collect(),
            entries,
        }
    }

    fn dims(&self) -> (usize, usize) {
        match self {
            MatValue::Double { rows, cols, .. } => (*rows, *cols),
            MatValue::Char(text) => (1, text.encode_utf16().count()),
            MatValue::Cell(items) => (1, items.len()),
            MatValue::Struct { entries, .. } => (1, entries.len()),
        }
    }

    fn class(&self) -> u32 {
        match self {
            MatValue::Double { .. } => MX_DOUBLE_CLASS,
            MatValue::Char(_) => MX_CHAR_CLASS,
            MatValue::Cell(_) => MX_CELL_CLASS,
            MatValue::Struct { .. } => MX_STRUCT_CLASS,
        }
    }
}

/// Builds a MAT-file in memory.
#[derive(Debug, Default)]
pub struct MatWriter {
    body: Vec<u8>,
}

impl MatWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uncompressed top-level variable.
    pub fn variable(mut self, name: &str, value: &MatValue) -> Self {
        self.body.extend(matrix_element(name, value));
        self
    }

    /// Add a top-level variable wrapped in a zlib-compressed element.
    pub fn compressed(mut self, name: &str, value: &MatValue) -> Self {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&matrix_element(name, value)).unwrap();
        let deflated = encoder.finish().unwrap();

        self.body.write_u32::<LittleEndian>(MI_COMPRESSED).unwrap();
        self.body
            .write_u32::<LittleEndian>(deflated.len() as u32)
            .unwrap();
        self.body.extend(deflated);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut bytes = vec![b' '; 116];
        let text = b"MATLAB 5.0 MAT-file, written by test fixtures";
        bytes[..text.len()].copy_from_slice(text);
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.write_u16::<LittleEndian>(0x0100).unwrap();
        bytes.extend_from_slice(b"IM");
        bytes.extend(self.body);
        bytes
    }
}

/// Header followed by one cell `c` declaring 2^31-1 x 2^31-1 entries and
/// holding none of them.
pub fn oversized_cell_file() -> Vec<u8> {
    let mut element = Vec::new();
    let words: [u32; 12] = [
        14, 40, // miMATRIX, 40-byte payload
        6, 8, 1, 0, // array flags: cell class
        5, 8, 0x7FFF_FFFF, 0x7FFF_FFFF, // dimensions
        (1 << 16) | 1, u32::from_le_bytes([b'c', 0, 0, 0]), // name, small element
    ];
    for word in words {
        element.extend_from_slice(&word.to_le_bytes());
    }
    assert_eq!(element.len(), 48);

    let mut bytes = MatWriter::new().finish();
    bytes.extend(element);
    bytes
}

fn matrix_element(name: &str, value: &MatValue) -> Vec<u8> {
    element(MI_MATRIX, &matrix_payload(name, value))
}

fn matrix_payload(name: &str, value: &MatValue) -> Vec<u8> {
    let mut out = Vec::new();

    let mut flags = Vec::new();
    flags.write_u32::<LittleEndian>(value.class()).unwrap();
    flags.write_u32::<LittleEndian>(0).unwrap();
    out.extend(element(MI_UINT32, &flags));

    let (rows, cols) = value.dims();
    let mut dims = Vec::new();
    dims.write_i32::<LittleEndian>(rows as i32).unwrap();
    dims.write_i32::<LittleEndian>(cols as i32).unwrap();
    out.extend(element(MI_INT32, &dims));

    out.extend(element(MI_INT8, name.as_bytes()));

    match value {
        MatValue::Double { column_major, .. } => {
            let mut data = Vec::new();
            for v in column_major {
                data.write_f64::<LittleEndian>(*v).unwrap();
            }
            out.extend(element(MI_DOUBLE, &data));
        }
        MatValue::Char(text) => {
            let mut data = Vec::new();
            for unit in text.encode_utf16() {
                data.write_u16::<LittleEndian>(unit).unwrap();
            }
            out.extend(element(MI_UINT16, &data));
        }
        MatValue::Cell(items) => {
            for item in items {
                out.extend(matrix_element("", item));
            }
        }
        MatValue::Struct {
            field_names,
            entries,
        } => {
            let mut name_len = Vec::new();
            name_len
                .write_i32::<LittleEndian>(FIELD_NAME_LEN as i32)
                .unwrap();
            out.extend(element(MI_INT32, &name_len));

            let mut names = Vec::new();
            for field in field_names {
                let mut padded = field.as_bytes().to_vec();
                padded.resize(FIELD_NAME_LEN, 0);
                names.extend(padded);
            }
            out.extend(element(MI_INT8, &names));

            for entry in entries {
                for field_value in entry {
                    out.extend(matrix_element("", field_value));
                }
            }
        }
    }

    out
}

/// Tagged data element. Payloads of 1-4 bytes use the packed small form.
fn element(data_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    if !payload.is_empty() && payload.len() <= 4 {
        out.write_u32::<LittleEndian>(((payload.len() as u32) << 16) | data_type)
            .unwrap();
        let mut packed = payload.to_vec();
        packed.resize(4, 0);
        out.extend(packed);
        return out;
    }

    out.write_u32::<LittleEndian>(data_type).unwrap();
    out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    out.extend_from_slice(payload);
    out.resize(8 + payload.len().div_ceil(8) * 8, 0);
    out
}
