//! Data module: padded local grids, the assembled global grid, and slice descriptors.

pub mod global_grid;
pub mod layout;
pub mod local_grid;

pub use global_grid::GlobalGrid;
pub use layout::{BlockDescriptor, HaloDescriptor};
pub use local_grid::LocalGrid;

use crate::solver_error::SolverError;

/// Zeroed buffer of `len` values for a `rows × cols` grid. `None` (overflowed
/// size) and a refused reservation both map to [`SolverError::Allocation`].
pub(crate) fn try_zeroed(
    len: Option<usize>,
    rows: usize,
    cols: usize,
) -> Result<Vec<f64>, SolverError> {
    let len = len.ok_or(SolverError::Allocation { rows, cols })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| SolverError::Allocation { rows, cols })?;
    data.resize(len, 0.0);
    Ok(data)
}
