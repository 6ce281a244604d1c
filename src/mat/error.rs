/// Errors that can occur while decoding a MAT-file
#[derive(Debug, thiserror::Error)]
pub enum MatError {
    /// I/O error reading the file or inflating a compressed element
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The 128-byte header is missing or not a level 5 MAT-file header
    #[error("Invalid MAT-file header: {0}")]
    InvalidHeader(String),

    /// MAT-file version this decoder does not read (7.3 files are HDF5)
    #[error("Unsupported MAT-file version: 0x{0:04x}")]
    UnsupportedVersion(u16),

    /// A data element extends past the end of its container
    #[error("Truncated data element at offset {offset}: {needed} bytes needed, {available} available")]
    Truncated {
        /// Offset of the element within its container
        offset: usize,
        /// Bytes the element declares
        needed: usize,
        /// Bytes remaining in the container
        available: usize,
    },

    /// Data type code not defined by the level 5 format
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(u32),

    /// Structurally invalid matrix element
    #[error("Malformed matrix: {0}")]
    Malformed(String),
}
