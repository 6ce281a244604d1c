//! `miMATRIX` decoding into [`RawRecord`] nodes.

use std::io::Read;

use flate2::read::ZlibDecoder;
use log::debug;

use super::element::{
    decode_numbers, Element, ElementReader, Endian, MI_COMPRESSED, MI_INT8, MI_MATRIX, MI_UINT16,
    MI_UINT32, MI_UINT8, MI_UTF16, MI_UTF32, MI_UTF8,
};
use super::MatError;
use crate::record::{Fields, NumericArray, Opaque, RawRecord};

const MX_CELL_CLASS: u32 = 1;
const MX_STRUCT_CLASS: u32 = 2;
const MX_OBJECT_CLASS: u32 = 3;
const MX_CHAR_CLASS: u32 = 4;
const MX_SPARSE_CLASS: u32 = 5;
const MX_DOUBLE_CLASS: u32 = 6;
const MX_UINT64_CLASS: u32 = 15;

const FLAG_COMPLEX: u32 = 0x0800;

/// Smallest encoding of a nested element: one regular 8-byte tag.
const MIN_ELEMENT_LEN: usize = 8;

/// Deepest cell/struct nesting (and compressed-in-compressed layering) read.
const MAX_NESTING_DEPTH: usize = 64;

/// Decode every top-level variable in a sequence of data elements.
///
/// Compressed elements are inflated and decoded in place. Elements that are
/// neither matrices nor compressed matrices are skipped.
pub(crate) fn decode_variables(buf: &[u8], endian: Endian) -> Result<Fields, MatError> {
    variables_at(buf, endian, 0)
}

fn variables_at(buf: &[u8], endian: Endian, depth: usize) -> Result<Fields, MatError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(too_deep());
    }
    let mut variables = Fields::new();
    let mut reader = ElementReader::new(buf, endian);

    while let Some(element) = reader.next_element()? {
        match element.data_type {
            MI_MATRIX => {
                let (name, value) = matrix_at(element.data, endian, 0)?;
                variables.push(name, value);
            }
            MI_COMPRESSED => {
                let mut inflated = Vec::new();
                ZlibDecoder::new(element.data).read_to_end(&mut inflated)?;
                variables.append(variables_at(&inflated, endian, depth + 1)?);
            }
            other => debug!("Skipping top-level element of type {other}"),
        }
    }

    Ok(variables)
}

/// Decode the payload of one `miMATRIX` element, `depth` levels below the
/// top-level variable, into its name and value.
///
/// Declared dimensions are untrusted: element counts are checked against
/// the bytes actually present before anything is allocated from them.
fn matrix_at(
    data: &[u8],
    endian: Endian,
    depth: usize,
) -> Result<(String, RawRecord), MatError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(too_deep());
    }
    // Empty cells and struct fields are written as zero-length matrices
    if data.is_empty() {
        return Ok((String::new(), RawRecord::vector(Vec::new())));
    }

    let mut reader = ElementReader::new(data, endian);

    let flags = reader.expect_element("array flags")?;
    if flags.data_type != MI_UINT32 || flags.data.len() < 8 {
        return Err(MatError::Malformed("array flags must be two uint32 values".to_string()));
    }
    let flag_word = endian.u32(&flags.data[..4]);
    let class = flag_word & 0xFF;

    let dims_element = reader.expect_element("dimensions")?;
    let dims: Vec<usize> = decode_numbers(&dims_element, endian)?
        .into_iter()
        .map(|d| d.max(0.0) as usize)
        .collect();
    let name = text_bytes(reader.expect_element("array name")?.data);
    let count = element_count(&dims)?;

    let value = match class {
        MX_DOUBLE_CLASS..=MX_UINT64_CLASS => {
            let real = reader.expect_element("real part")?;
            if flag_word & FLAG_COMPLEX != 0 {
                debug!("Variable '{name}' is complex, keeping the real part");
            }
            RawRecord::NumericArray(numeric(&dims, decode_numbers(&real, endian)?)?)
        }
        MX_CHAR_CLASS => {
            let chars = match reader.next_element()? {
                Some(element) => decode_chars(&element, endian)?,
                None => Vec::new(),
            };
            RawRecord::text(char_matrix_text(&dims, &chars))
        }
        MX_CELL_CLASS => {
            check_children(&reader, count, &name)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(nested_matrix(&mut reader, depth)?);
            }
            RawRecord::ArrayOfRecord(items)
        }
        MX_STRUCT_CLASS | MX_OBJECT_CLASS => {
            if class == MX_OBJECT_CLASS {
                let class_name = text_bytes(reader.expect_element("class name")?.data);
                debug!("Reading object '{name}' of class '{class_name}' as a struct");
            }
            decode_struct(&mut reader, count, &name, data.len(), depth)?
        }
        MX_SPARSE_CLASS => RawRecord::Opaque(Opaque::Unsupported("sparse".to_string())),
        other => RawRecord::Opaque(Opaque::Unsupported(format!("class {other}"))),
    };

    Ok((name, value))
}

fn nested_matrix(reader: &mut ElementReader<'_>, depth: usize) -> Result<RawRecord, MatError> {
    let element = reader.expect_element("nested matrix")?;
    if element.data_type != MI_MATRIX {
        return Err(MatError::Malformed(format!(
            "expected nested matrix, found data type {}",
            element.data_type
        )));
    }
    Ok(matrix_at(element.data, reader.endian(), depth + 1)?.1)
}

fn element_count(dims: &[usize]) -> Result<usize, MatError> {
    dims.iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| MatError::Malformed(format!("dimensions {dims:?} overflow")))
}

/// Every child element needs at least a tag, so a count larger than the
/// remaining bytes allow cannot be genuine.
fn check_children(reader: &ElementReader<'_>, children: usize, name: &str) -> Result<(), MatError> {
    let available = reader.remaining() / MIN_ELEMENT_LEN;
    if children > available {
        return Err(MatError::Malformed(format!(
            "'{name}' declares {children} nested elements, only {available} fit"
        )));
    }
    Ok(())
}

fn too_deep() -> MatError {
    MatError::Malformed(format!("nesting deeper than {MAX_NESTING_DEPTH} levels"))
}

fn decode_struct(
    reader: &mut ElementReader<'_>,
    count: usize,
    name: &str,
    payload_len: usize,
    depth: usize,
) -> Result<RawRecord, MatError> {
    let endian = reader.endian();
    let name_len_element = reader.expect_element("field name length")?;
    if name_len_element.data.len() < 4 {
        return Err(MatError::Malformed("field name length element is empty".to_string()));
    }
    let name_len = endian.i32(&name_len_element.data[..4]).max(0) as usize;
    let names_element = reader.expect_element("field names")?;

    let field_names: Vec<String> = if name_len == 0 {
        Vec::new()
    } else {
        names_element.data.chunks(name_len).map(text_bytes).collect()
    };

    if field_names.is_empty() {
        // Field-less entries occupy no bytes; bound them by the payload instead
        if count > payload_len {
            return Err(MatError::Malformed(format!(
                "'{name}' declares {count} field-less struct entries"
            )));
        }
    } else {
        let children = count.checked_mul(field_names.len()).unwrap_or(usize::MAX);
        check_children(reader, children, name)?;
    }

    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let mut fields = Fields::new();
        for field_name in &field_names {
            fields.push(field_name.clone(), nested_matrix(reader, depth)?);
        }
        items.push(RawRecord::NamedRecord(fields));
    }

    Ok(RawRecord::ArrayOfRecord(items))
}

fn numeric(dims: &[usize], values: Vec<f64>) -> Result<NumericArray, MatError> {
    let rows = dims.first().copied().unwrap_or(0);
    let cols = element_count(dims.get(1..).unwrap_or(&[]))?;
    let declared = values.len();
    NumericArray::from_column_major(rows, cols, values).ok_or_else(|| {
        MatError::Malformed(format!(
            "dimensions {dims:?} do not match {declared} stored values"
        ))
    })
}

fn decode_chars(element: &Element<'_>, endian: Endian) -> Result<Vec<char>, MatError> {
    match element.data_type {
        MI_UTF8 | MI_INT8 | MI_UINT8 => Ok(String::from_utf8_lossy(element.data).chars().collect()),
        MI_UINT16 | MI_UTF16 => {
            let units: Vec<u16> = decode_numbers(element, endian)?
                .into_iter()
                .map(|u| u as u16)
                .collect();
            Ok(String::from_utf16_lossy(&units).chars().collect())
        }
        MI_UTF32 => Ok(decode_numbers(element, endian)?
            .into_iter()
            .filter_map(|c| char::from_u32(c as u32))
            .collect()),
        other => Err(MatError::UnsupportedDataType(other)),
    }
}

/// Char arrays are stored column-major; each row is one string.
fn char_matrix_text(dims: &[usize], chars: &[char]) -> String {
    let rows = dims.first().copied().unwrap_or(0);
    if rows <= 1 || element_count(dims).ok() != Some(chars.len()) {
        return chars.iter().collect();
    }
    let cols = chars.len() / rows;
    (0..rows)
        .map(|row| {
            let line: String = (0..cols).map(|col| chars[row + col * rows]).collect();
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// NUL-terminated or NUL-padded ASCII name
fn text_bytes(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
