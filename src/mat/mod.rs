//! # MAT-file Level 5 Decoder
//!
//! Bioreactor batch data is commonly exported as MATLAB `.mat` files: a
//! columnar binary container of named variables, each a numeric matrix, a
//! char array, a cell array or a struct array. This module decodes such a
//! file into a [`RawRecord`] tree so the extractor never has to know the
//! container format.
//!
//! ## Layout
//!
//! ```text
//! [128-byte header]  text | subsystem offset | version | endian ("IM"/"MI")
//! [data element]*    tag (type, size) + payload, padded to 8 bytes
//!     miMATRIX       flags | dims | name | class-specific sub-elements
//!     miCOMPRESSED   zlib stream holding further data elements
//! ```
//!
//! ## Mapping
//!
//! | MAT class | RawRecord |
//! |-----------|-----------|
//! | double, single, (u)int8-64, logical | `NumericArray` (real part) |
//! | char | `Opaque::Text` |
//! | cell | `ArrayOfRecord` |
//! | struct, object | `ArrayOfRecord` of `NamedRecord` |
//! | sparse, function handles, ... | `Opaque::Unsupported` |
//!
//! Struct arrays always keep their array layer, even at 1x1: that is the
//! boxing layer the extractor's variants are written against.
//!
//! Version 7.3 files are HDF5 containers and are rejected.

mod element;
mod error;
mod matrix;

use std::path::Path;

use log::debug;

pub use element::Endian;
pub use error::MatError;

use crate::record::{Fields, RawRecord};

const HEADER_LEN: usize = 128;
const HEADER_TEXT_LEN: usize = 116;
const VERSION_5: u16 = 0x0100;

/// A decoded MAT-file: header text plus its named variables.
#[derive(Debug, Clone)]
pub struct MatFile {
    /// Descriptive header text (trailing padding removed)
    pub header_text: String,
    /// Byte order the file was written in
    pub endian: Endian,
    /// Top-level variables in file order
    pub variables: Fields,
}

impl MatFile {
    /// Read and decode a MAT-file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MatError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a MAT-file held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MatError> {
        if bytes.len() < HEADER_LEN {
            return Err(MatError::InvalidHeader(format!(
                "file is {} bytes, header needs {HEADER_LEN}",
                bytes.len()
            )));
        }

        let endian = match &bytes[126..128] {
            b"IM" => Endian::Little,
            b"MI" => Endian::Big,
            other => {
                return Err(MatError::InvalidHeader(format!(
                    "unknown endian indicator {other:?}"
                )))
            }
        };

        let version = endian.u16(&bytes[124..126]);
        if version != VERSION_5 {
            return Err(MatError::UnsupportedVersion(version));
        }

        let header_text = String::from_utf8_lossy(&bytes[..HEADER_TEXT_LEN])
            .trim_end_matches(['\0', ' '])
            .to_string();
        debug!("MAT-file header: {header_text}");

        let variables = matrix::decode_variables(&bytes[HEADER_LEN..], endian)?;
        debug!("Decoded {} MAT-file variables", variables.len());

        Ok(Self {
            header_text,
            endian,
            variables,
        })
    }

    /// The variables as one named record, ready for extraction.
    pub fn into_record(self) -> RawRecord {
        RawRecord::NamedRecord(self.variables)
    }
}
