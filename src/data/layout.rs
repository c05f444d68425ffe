//! Strided slice descriptors over flat row-major buffers.
//!
//! A [`HaloDescriptor`] names one row, row segment, or column of a padded
//! grid; a [`BlockDescriptor`] names a rectangular block. Both pack into and
//! unpack from contiguous `f64` buffers, independent of any messaging
//! library's datatype system.

use crate::solver_error::SolverError;

/// `count` elements starting at `offset`, `stride` apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HaloDescriptor {
    pub offset: usize,
    pub count: usize,
    pub stride: usize,
}

impl HaloDescriptor {
    /// Contiguous run of `count` elements.
    pub const fn contiguous(offset: usize, count: usize) -> Self {
        Self {
            offset,
            count,
            stride: 1,
        }
    }

    pub const fn strided(offset: usize, count: usize, stride: usize) -> Self {
        Self {
            offset,
            count,
            stride,
        }
    }

    /// One past the last element touched.
    #[inline]
    pub fn end(&self) -> usize {
        match self.count {
            0 => self.offset,
            n => self.offset + (n - 1) * self.stride + 1,
        }
    }

    /// Error unless every element lies inside a buffer of `len`.
    pub fn check(&self, len: usize) -> Result<(), SolverError> {
        if self.end() > len {
            return Err(SolverError::InvalidDescriptor(format!(
                "{self:?} (buffer length {len})"
            )));
        }
        Ok(())
    }

    #[inline]
    fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.count).map(move |k| self.offset + k * self.stride)
    }

    /// Copy the described elements of `src` into a fresh contiguous buffer.
    pub fn pack(&self, src: &[f64]) -> Vec<f64> {
        self.indices().map(|k| src[k]).collect()
    }

    /// Scatter `values` into the described elements of `dst`.
    pub fn unpack(&self, dst: &mut [f64], values: &[f64]) {
        debug_assert_eq!(values.len(), self.count);
        for (k, &v) in self.indices().zip(values) {
            dst[k] = v;
        }
    }
}

/// `rows` runs of `cols` contiguous elements, consecutive runs `stride` apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub offset: usize,
    pub rows: usize,
    pub cols: usize,
    pub stride: usize,
}

impl BlockDescriptor {
    pub const fn new(offset: usize, rows: usize, cols: usize, stride: usize) -> Self {
        Self {
            offset,
            rows,
            cols,
            stride,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn end(&self) -> usize {
        if self.is_empty() {
            return self.offset;
        }
        self.offset + (self.rows - 1) * self.stride + self.cols
    }

    pub fn check(&self, len: usize) -> Result<(), SolverError> {
        if self.cols > self.stride && self.rows > 1 {
            return Err(SolverError::InvalidDescriptor(format!(
                "{self:?} (overlapping rows)"
            )));
        }
        if self.end() > len {
            return Err(SolverError::InvalidDescriptor(format!(
                "{self:?} (buffer length {len})"
            )));
        }
        Ok(())
    }

    fn runs(&self) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
        (0..self.rows).map(move |r| {
            let start = self.offset + r * self.stride;
            start..start + self.cols
        })
    }

    pub fn pack(&self, src: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len());
        for run in self.runs() {
            out.extend_from_slice(&src[run]);
        }
        out
    }

    pub fn unpack(&self, dst: &mut [f64], values: &[f64]) {
        debug_assert_eq!(values.len(), self.len());
        for (run, chunk) in self.runs().zip(values.chunks(self.cols.max(1))) {
            dst[run].copy_from_slice(chunk);
        }
    }

    /// Copy this block of `src` into the block `to` of `dst` without an
    /// intermediate buffer. Both blocks must have the same extents.
    pub fn copy_to(&self, src: &[f64], to: &BlockDescriptor, dst: &mut [f64]) {
        debug_assert_eq!((self.rows, self.cols), (to.rows, to.cols));
        for (a, b) in self.runs().zip(to.runs()) {
            dst[b].copy_from_slice(&src[a]);
        }
    }
}
