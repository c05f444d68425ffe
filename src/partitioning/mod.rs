//! Uniform block partitioning of the global interior grid.
//!
//! The chain decomposition splits rows only (`dims = [P, 1]`); the grid
//! decomposition factors `P` into two near-equal axis counts first. Each
//! axis is split by integer division, so trailing rows/columns that do not
//! divide evenly are left to no process.

use crate::solver_error::SolverError;
use serde::{Deserialize, Serialize};

/// How the process group is laid over the global grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decomposition {
    /// 1D strips of full rows, ranks in a line.
    Chain,
    /// 2D blocks, ranks on a non-periodic Cartesian grid.
    Grid,
}

/// Balanced factorization of `nprocs` into `[d0, d1]` with `d0 >= d1` and
/// `d0 * d1 == nprocs`, matching `MPI_Dims_create` for two dimensions.
pub fn dims_create(nprocs: usize) -> [usize; 2] {
    let mut d1 = (nprocs as f64).sqrt() as usize;
    while d1 > 1 && nprocs % d1 != 0 {
        d1 -= 1;
    }
    let d1 = d1.max(1);
    [nprocs / d1, d1]
}

/// Local extents shared by every process of a decomposition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub decomposition: Decomposition,
    /// Global interior extents `(N, M)`.
    pub global: (usize, usize),
    /// Process counts per axis.
    pub dims: [usize; 2],
    /// Per-process interior extents `(n, m)`.
    pub local: (usize, usize),
}

impl Partition {
    /// Split an `N × M` interior over `nprocs` processes.
    ///
    /// # Errors
    /// - [`SolverError::InvalidProcessCount`] if `nprocs == 0`.
    /// - [`SolverError::EmptyPartition`] if any local extent would be 0.
    pub fn new(
        global_rows: usize,
        global_cols: usize,
        nprocs: usize,
        decomposition: Decomposition,
    ) -> Result<Self, SolverError> {
        if nprocs == 0 {
            return Err(SolverError::InvalidProcessCount);
        }
        let dims = match decomposition {
            Decomposition::Chain => [nprocs, 1],
            Decomposition::Grid => dims_create(nprocs),
        };
        let global = [global_rows, global_cols];
        let mut local = [0usize; 2];
        for axis in 0..2 {
            local[axis] = global[axis] / dims[axis];
            if local[axis] == 0 {
                return Err(SolverError::EmptyPartition {
                    axis,
                    global: global[axis],
                    parts: dims[axis],
                });
            }
            let dropped = global[axis] - local[axis] * dims[axis];
            if dropped > 0 {
                log::warn!(
                    "axis {axis}: {} points over {} processes, dropping {dropped} trailing points",
                    global[axis],
                    dims[axis]
                );
            }
        }
        log::debug!(
            "{decomposition:?} partition of {global_rows}x{global_cols}: dims {dims:?}, local {}x{}",
            local[0],
            local[1]
        );
        Ok(Self {
            decomposition,
            global: (global_rows, global_cols),
            dims,
            local: (local[0], local[1]),
        })
    }

    #[inline]
    pub fn nprocs(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    /// Part of the global grid actually owned by some process.
    pub fn covered(&self) -> (usize, usize) {
        (self.local.0 * self.dims[0], self.local.1 * self.dims[1])
    }

    /// Global interior offset (0-based) of the block at process coordinates `coords`.
    pub fn global_origin(&self, coords: [usize; 2]) -> (usize, usize) {
        (coords[0] * self.local.0, coords[1] * self.local.1)
    }
}
