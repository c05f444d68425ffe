//! LocalGrid: one process's block of the field plus a one-cell ghost margin.
//!
//! Storage is a flat row-major `Vec<f64>` of shape `(rows + 2) × (cols + 2)`.
//! Row/column 0 and `extent + 1` are ghost cells; `1..=rows × 1..=cols` is
//! the interior owned by this process.

use crate::data::try_zeroed;
use crate::solver_error::SolverError;
use itertools::iproduct;
use std::ops::{Index, IndexMut};

/// Owned padded 2D buffer.
///
/// # Invariants
/// - `data.len() == (rows + 2) * (cols + 2)`.
/// - Extents never change after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalGrid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl LocalGrid {
    /// Zero-initialized grid with `rows × cols` interior points.
    ///
    /// # Panics
    /// If the padded size overflows or cannot be allocated; see [`Self::try_new`].
    pub fn new(rows: usize, cols: usize) -> Self {
        match Self::try_new(rows, cols) {
            Ok(g) => g,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible [`Self::new`]: [`SolverError::Allocation`] instead of a panic
    /// or abort when the padded buffer is too large.
    pub fn try_new(rows: usize, cols: usize) -> Result<Self, SolverError> {
        let len = rows
            .checked_add(2)
            .zip(cols.checked_add(2))
            .and_then(|(pr, pc)| pr.checked_mul(pc));
        Ok(Self {
            rows,
            cols,
            data: try_zeroed(len, rows, cols)?,
        })
    }

    /// Zero grid whose interior is filled from `f(i, j)` (1-based interior indices).
    pub fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize, usize) -> f64) -> Self {
        match Self::try_from_fn(rows, cols, f) {
            Ok(g) => g,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_from_fn(
        rows: usize,
        cols: usize,
        mut f: impl FnMut(usize, usize) -> f64,
    ) -> Result<Self, SolverError> {
        let mut g = Self::try_new(rows, cols)?;
        for (i, j) in iproduct!(1..=rows, 1..=cols) {
            g[(i, j)] = f(i, j);
        }
        Ok(g)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Distance in elements between vertically adjacent cells.
    #[inline]
    pub fn pitch(&self) -> usize {
        self.cols + 2
    }

    /// Interior extents `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Padded extents including both ghost margins.
    #[inline]
    pub fn padded_shape(&self) -> (usize, usize) {
        (self.rows + 2, self.cols + 2)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    fn flat(&self, row: usize, col: usize) -> Option<usize> {
        let (pr, pc) = self.padded_shape();
        (row < pr && col < pc).then(|| row * pc + col)
    }

    pub fn try_get(&self, row: usize, col: usize) -> Result<f64, SolverError> {
        self.flat(row, col)
            .map(|k| self.data[k])
            .ok_or(SolverError::OutOfBounds {
                row,
                col,
                shape: self.padded_shape(),
            })
    }

    pub fn try_set(&mut self, row: usize, col: usize, value: f64) -> Result<(), SolverError> {
        let k = self.flat(row, col).ok_or(SolverError::OutOfBounds {
            row,
            col,
            shape: self.padded_shape(),
        })?;
        self.data[k] = value;
        Ok(())
    }

    /// Padded row `i` (ghost columns included).
    pub fn row(&self, i: usize) -> &[f64] {
        let p = self.pitch();
        &self.data[i * p..(i + 1) * p]
    }

    pub fn fill_interior(&mut self, value: f64) {
        let (rows, cols) = self.shape();
        for (i, j) in iproduct!(1..=rows, 1..=cols) {
            self[(i, j)] = value;
        }
    }

    /// Interior values in row-major order.
    pub fn interior(&self) -> impl Iterator<Item = f64> + '_ {
        iproduct!(1..=self.rows, 1..=self.cols).map(move |(i, j)| self[(i, j)])
    }

    /// Error unless `other` has the same interior extents.
    pub fn check_same_shape(&self, other: &LocalGrid) -> Result<(), SolverError> {
        if self.shape() != other.shape() {
            return Err(SolverError::ShapeMismatch {
                expected: self.shape(),
                got: other.shape(),
            });
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for LocalGrid {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        match self.flat(row, col) {
            Some(k) => &self.data[k],
            None => panic!(
                "index ({row}, {col}) out of bounds for padded shape {:?}",
                self.padded_shape()
            ),
        }
    }
}

impl IndexMut<(usize, usize)> for LocalGrid {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        match self.flat(row, col) {
            Some(k) => &mut self.data[k],
            None => panic!(
                "index ({row}, {col}) out of bounds for padded shape {:?}",
                self.padded_shape()
            ),
        }
    }
}
