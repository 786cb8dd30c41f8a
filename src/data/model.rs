use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Matrix – a filter state / observation value
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum MatrixError {
    #[error("matrix has no elements")]
    Empty,
    #[error("matrix row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Accepted on-disk shapes of a matrix value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MatrixRepr {
    Scalar(f64),
    /// Flat array, read as a column vector.
    Vector(Vec<f64>),
    Grid(Vec<Vec<f64>>),
}

/// A non-empty, rectangular `f64` matrix stored row-major.
///
/// Filters emit state vectors and covariances as matrices; the chart only
/// ever looks at the top-left element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixRepr", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(MatrixError::Empty);
        }
        for (row, values) in rows.iter().enumerate() {
            if values.len() != expected {
                return Err(MatrixError::Ragged {
                    row,
                    expected,
                    found: values.len(),
                });
            }
        }
        Ok(Matrix { rows })
    }

    pub fn scalar(value: f64) -> Self {
        Matrix {
            rows: vec![vec![value]],
        }
    }

    /// Column vector from a flat slice.
    pub fn column(values: &[f64]) -> Result<Self, MatrixError> {
        Matrix::new(values.iter().map(|&v| vec![v]).collect())
    }

    pub fn top_left(&self) -> f64 {
        self.rows[0][0]
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.rows[0].len())
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

impl TryFrom<MatrixRepr> for Matrix {
    type Error = MatrixError;

    fn try_from(repr: MatrixRepr) -> Result<Self, Self::Error> {
        match repr {
            MatrixRepr::Scalar(v) => Ok(Matrix::scalar(v)),
            MatrixRepr::Vector(values) => Matrix::column(&values),
            MatrixRepr::Grid(rows) => Matrix::new(rows),
        }
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.rows
    }
}

// ---------------------------------------------------------------------------
// SeriesKind – which matrix a plotted series reads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    #[serde(rename = "Xmodel")]
    Xmodel,
    #[serde(rename = "Xk")]
    Xk,
    #[serde(rename = "Zk")]
    Zk,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [SeriesKind::Xmodel, SeriesKind::Xk, SeriesKind::Zk];

    pub fn field_name(self) -> &'static str {
        match self {
            SeriesKind::Xmodel => "Xmodel",
            SeriesKind::Xk => "Xk",
            SeriesKind::Zk => "Zk",
        }
    }

    pub fn matrix(self, point: &DataPoint) -> &Matrix {
        match self {
            SeriesKind::Xmodel => &point.xmodel,
            SeriesKind::Xk => &point.xk,
            SeriesKind::Zk => &point.zk,
        }
    }

    /// The plotted scalar for this series at `point`.
    pub fn value(self, point: &DataPoint) -> f64 {
        self.matrix(point).top_left()
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

// ---------------------------------------------------------------------------
// DataPoint – one filter iteration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Position on the iteration axis.
    pub iter: f64,
    pub date: Option<NaiveDate>,
    /// Model estimate.
    pub xmodel: Matrix,
    /// Filtered (corrected) state.
    pub xk: Matrix,
    /// Raw observation.
    pub zk: Matrix,
    /// Carried through from the input; not plotted.
    pub close: Option<f64>,
}

// ---------------------------------------------------------------------------
// KalmanDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Ordered data points. Input order is draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KalmanDataset {
    pub points: Vec<DataPoint>,
}

impl KalmanDataset {
    pub fn new(points: Vec<DataPoint>) -> Self {
        KalmanDataset { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether every point carries a date.
    pub fn has_dates(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(|p| p.date.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_accepts_scalar_vector_and_grid() {
        let m: Matrix = serde_json::from_str("2.5").unwrap();
        assert_eq!(m.shape(), (1, 1));
        assert_eq!(m.top_left(), 2.5);

        let m: Matrix = serde_json::from_str("[1.0, 0.5]").unwrap();
        assert_eq!(m.shape(), (2, 1));
        assert_eq!(m.top_left(), 1.0);

        let m: Matrix = serde_json::from_str("[[3.0, 4.0], [5.0, 6.0]]").unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.top_left(), 3.0);
    }

    #[test]
    fn matrix_rejects_ragged_and_empty() {
        assert_eq!(
            Matrix::new(vec![vec![1.0, 2.0], vec![3.0]]),
            Err(MatrixError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(Matrix::new(vec![]), Err(MatrixError::Empty));
        assert!(serde_json::from_str::<Matrix>("[]").is_err());
        assert!(serde_json::from_str::<Matrix>("[[]]").is_err());
    }

    #[test]
    fn matrix_serializes_as_rows() {
        let m = Matrix::column(&[1.0, 2.0]).unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "[[1.0],[2.0]]");
    }

    #[test]
    fn series_value_reads_top_left() {
        let point = DataPoint {
            iter: 0.0,
            date: None,
            xmodel: Matrix::new(vec![vec![1.0, 9.0], vec![9.0, 9.0]]).unwrap(),
            xk: Matrix::column(&[2.0, 9.0]).unwrap(),
            zk: Matrix::scalar(3.0),
            close: None,
        };
        assert_eq!(SeriesKind::Xmodel.value(&point), 1.0);
        assert_eq!(SeriesKind::Xk.value(&point), 2.0);
        assert_eq!(SeriesKind::Zk.value(&point), 3.0);
    }

    #[test]
    fn series_kind_uses_field_names_in_json() {
        assert_eq!(serde_json::to_string(&SeriesKind::Xmodel).unwrap(), "\"Xmodel\"");
        let kind: SeriesKind = serde_json::from_str("\"Zk\"").unwrap();
        assert_eq!(kind, SeriesKind::Zk);
    }
}
