//! GlobalGrid: the assembled N×M interior solution held by the coordinator.

use crate::data::try_zeroed;
use crate::solver_error::SolverError;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Interior-only row-major buffer (no ghost margin), pitch = `cols`.
///
/// Deserialization goes through [`GlobalGrid::from_vec`], so a payload whose
/// `data` length disagrees with its extents is rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct GlobalGrid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Unchecked wire form of [`GlobalGrid`].
#[derive(Deserialize)]
struct RawGrid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<RawGrid> for GlobalGrid {
    type Error = SolverError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        GlobalGrid::from_vec(raw.rows, raw.cols, raw.data)
    }
}

impl GlobalGrid {
    /// # Panics
    /// If `rows * cols` overflows or cannot be allocated; see [`Self::try_new`].
    pub fn new(rows: usize, cols: usize) -> Self {
        match Self::try_new(rows, cols) {
            Ok(g) => g,
            Err(e) => panic!("{e}"),
        }
    }

    /// Zeroed grid, or [`SolverError::Allocation`] if it cannot be stored.
    pub fn try_new(rows: usize, cols: usize) -> Result<Self, SolverError> {
        Ok(Self {
            rows,
            cols,
            data: try_zeroed(rows.checked_mul(cols), rows, cols)?,
        })
    }

    /// Wrap an existing buffer; its length must be `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, SolverError> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(SolverError::ShapeMismatch {
                expected: (rows, cols),
                got: (data.len() / cols.max(1), cols),
            });
        }
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    /// Rows in global order.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.cols.max(1)).take(self.rows)
    }

    /// Largest absolute elementwise difference; `None` if shapes differ.
    pub fn max_abs_diff(&self, other: &GlobalGrid) -> Option<f64> {
        if (self.rows, self.cols) != (other.rows, other.cols) {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }
}

impl Index<(usize, usize)> for GlobalGrid {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{}",
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}
