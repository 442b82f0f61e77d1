//! General 2-D matrix
//!
//! `Mat` carries point lists, joint lists and every other variable-shape
//! matrix that travels over the wire. Only the operations the codecs and
//! session calls need are exposed.

use crate::{pose::Pose, Result, StationError};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mat {
    data: DMatrix<f64>,
}

impl Mat {
    /// Zero-filled matrix of the given shape
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    pub fn identity(size: usize) -> Self {
        Self {
            data: DMatrix::identity(size, size),
        }
    }

    /// Empty 0x0 matrix
    pub fn empty() -> Self {
        Self::zeros(0, 0)
    }

    /// Build from values laid out column after column
    pub fn from_col_major(rows: usize, cols: usize, values: &[f64]) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(StationError::Input(format!(
                "Expected {} values for a {}x{} matrix, got {}",
                rows * cols,
                rows,
                cols,
                values.len()
            )));
        }
        Ok(Self {
            data: DMatrix::from_column_slice(rows, cols, values),
        })
    }

    /// Build from values laid out row after row
    pub fn from_row_major(rows: usize, cols: usize, values: &[f64]) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(StationError::Input(format!(
                "Expected {} values for a {}x{} matrix, got {}",
                rows * cols,
                rows,
                cols,
                values.len()
            )));
        }
        Ok(Self {
            data: DMatrix::from_row_slice(rows, cols, values),
        })
    }

    /// One column per input vector, e.g. a list of xyz points or joint vectors
    ///
    /// All columns must share the same length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let rows = columns.first().map_or(0, |c| c.len());
        if columns.iter().any(|c| c.len() != rows) {
            return Err(StationError::Input(
                "All columns must have the same length".to_string(),
            ));
        }
        let flat: Vec<f64> = columns.iter().flatten().copied().collect();
        Self::from_col_major(rows, columns.len(), &flat)
    }

    /// Points as columns: a 3xN matrix
    pub fn from_points(points: &[[f64; 3]]) -> Self {
        let flat: Vec<f64> = points.iter().flatten().copied().collect();
        Self {
            data: DMatrix::from_column_slice(3, points.len(), &flat),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)`
    pub fn size(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element access; `None` when out of range
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let (rows, cols) = self.size();
        let slot = self.data.get_mut((row, col)).ok_or_else(|| {
            StationError::Input(format!(
                "Index ({}, {}) out of range for a {}x{} matrix",
                row, col, rows, cols
            ))
        })?;
        *slot = value;
        Ok(())
    }

    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.rows()).then(|| self.data.row(index).iter().copied().collect())
    }

    pub fn col(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.cols()).then(|| self.data.column(index).iter().copied().collect())
    }

    /// Every column as its own vector
    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.cols())
            .map(|c| self.data.column(c).iter().copied().collect())
            .collect()
    }

    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.transpose(),
        }
    }

    /// Values in wire order, column after column
    pub fn to_col_major(&self) -> Vec<f64> {
        self.data.as_slice().to_vec()
    }

    /// Overwrite all values from a column-major slice of the same size
    pub fn fill_from_col_major(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.data.len() {
            return Err(StationError::Input(format!(
                "Expected {} values, got {}",
                self.data.len(),
                values.len()
            )));
        }
        self.data.as_mut_slice().copy_from_slice(values);
        Ok(())
    }

    /// Side-by-side concatenation `[self | other]`
    pub fn concat_h(&self, other: &Mat) -> Result<Mat> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.rows() != other.rows() {
            return Err(StationError::Input(format!(
                "Cannot concatenate horizontally: {} rows vs {} rows",
                self.rows(),
                other.rows()
            )));
        }
        let mut values = self.to_col_major();
        values.extend(other.to_col_major());
        Mat::from_col_major(self.rows(), self.cols() + other.cols(), &values)
    }

    /// Stacked concatenation `[self; other]`
    pub fn concat_v(&self, other: &Mat) -> Result<Mat> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.cols() != other.cols() {
            return Err(StationError::Input(format!(
                "Cannot concatenate vertically: {} cols vs {} cols",
                self.cols(),
                other.cols()
            )));
        }
        Ok(self.transpose().concat_h(&other.transpose())?.transpose())
    }

    /// Interpret a 4x4 matrix as a pose
    pub fn to_pose(&self) -> Result<Pose> {
        if self.size() != (4, 4) {
            return Err(StationError::Input(format!(
                "A pose needs a 4x4 matrix, got {}x{}",
                self.rows(),
                self.cols()
            )));
        }
        Pose::from_col_major(&self.to_col_major())
    }
}

impl From<&Pose> for Mat {
    fn from(pose: &Pose) -> Self {
        Self {
            data: DMatrix::from_column_slice(4, 4, &pose.to_col_major()),
        }
    }
}
