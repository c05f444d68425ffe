//! Five-point Jacobi update.

use crate::data::local_grid::LocalGrid;
use crate::solver_error::SolverError;

/// One Jacobi sweep over the interior:
///
/// `t[i,j] = (b[i,j] + x[i+1,j] + x[i-1,j] + x[i,j+1] + x[i,j-1]) / 4`
///
/// Reads `x` (ghost cells must already be synchronized) and `b`, writes only
/// the interior of `t`.
pub fn jacobi_step(x: &LocalGrid, b: &LocalGrid, t: &mut LocalGrid) -> Result<(), SolverError> {
    x.check_same_shape(b)?;
    x.check_same_shape(t)?;
    let (rows, cols) = x.shape();
    let p = x.pitch();
    let xs = x.as_slice();
    let bs = b.as_slice();
    let ts = t.as_mut_slice();
    for i in 1..=rows {
        let above = &xs[(i - 1) * p..i * p];
        let here = &xs[i * p..(i + 1) * p];
        let below = &xs[(i + 1) * p..(i + 2) * p];
        let rhs = &bs[i * p..(i + 1) * p];
        let out = &mut ts[i * p..(i + 1) * p];
        for j in 1..=cols {
            out[j] = (rhs[j] + below[j] + above[j] + here[j + 1] + here[j - 1]) / 4.0;
        }
    }
    Ok(())
}
