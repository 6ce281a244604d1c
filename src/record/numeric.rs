/// Dense numeric array of up to two dimensions.
///
/// Values are stored column-major (the layout used by MAT-files), so a
/// single column is a contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl NumericArray {
    /// Create an array from column-major data.
    ///
    /// Returns `None` if `data.len() != rows * cols`.
    pub fn from_column_major(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        (rows.checked_mul(cols)? == data.len()).then_some(Self { rows, cols, data })
    }

    /// Create a single-column array from a 1-D series.
    pub fn vector(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    /// Create an array from row-major rows. All rows must have equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return None;
        }
        let mut data = Vec::with_capacity(rows.len() * cols);
        for col in 0..cols {
            data.extend(rows.iter().map(|row| row[col]));
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the array is 1-D in disguise (a single row or a single column).
    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }

    /// Flatten a row or column vector. Returns `None` for true matrices.
    pub fn as_vector(&self) -> Option<&[f64]> {
        self.is_vector().then_some(self.data.as_slice())
    }

    /// One column of the array.
    pub fn column(&self, index: usize) -> Option<&[f64]> {
        if index >= self.cols {
            return None;
        }
        let start = index * self.rows;
        Some(&self.data[start..start + self.rows])
    }

    /// Raw column-major values
    pub fn values(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_is_column_major() {
        let array = NumericArray::from_rows(&[vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]])
            .unwrap();

        assert_eq!(array.rows(), 3);
        assert_eq!(array.cols(), 2);
        assert_eq!(array.column(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(array.column(1), Some(&[10.0, 20.0, 30.0][..]));
        assert_eq!(array.column(2), None);
        assert!(array.as_vector().is_none());
    }

    #[test]
    fn test_row_vector_flattens() {
        let array = NumericArray::from_column_major(1, 3, vec![5.0, 6.0, 7.0]).unwrap();

        assert!(array.is_vector());
        assert_eq!(array.as_vector(), Some(&[5.0, 6.0, 7.0][..]));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(NumericArray::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_none());
        assert!(NumericArray::from_column_major(2, 2, vec![1.0]).is_none());
    }
}
