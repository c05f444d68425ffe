//! Global convergence test for the Jacobi iteration.
//!
//! Each rank sums `(x - t)²` over its interior; the partial sums are combined
//! with a global sum so every rank sees the same total and takes the same
//! stop/continue decision.

use crate::algs::communicator::Communicator;
use crate::data::local_grid::LocalGrid;
use crate::solver_error::SolverError;
use itertools::Itertools;

/// Squared distance between the interiors of two iterates.
pub fn local_residual_sq(x: &LocalGrid, t: &LocalGrid) -> Result<f64, SolverError> {
    x.check_same_shape(t)?;
    Ok(x.interior()
        .zip_eq(t.interior())
        .map(|(a, b)| (a - b) * (a - b))
        .sum())
}

/// Outcome of one reduction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Residual {
    /// Σ (x - t)² over all ranks.
    pub total_sq: f64,
    /// `sqrt(total_sq)`.
    pub norm: f64,
    pub converged: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConvergenceReducer {
    tolerance: f64,
}

impl ConvergenceReducer {
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;

    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Combine the local residuals of all ranks. Collective: every rank must call it.
    pub fn reduce<C: Communicator>(
        &self,
        x: &LocalGrid,
        t: &LocalGrid,
        comm: &C,
    ) -> Result<Residual, SolverError> {
        let local = local_residual_sq(x, t)?;
        let total_sq = comm.all_reduce_sum(local)?;
        let norm = total_sq.sqrt();
        Ok(Residual {
            total_sq,
            norm,
            converged: norm < self.tolerance,
        })
    }
}

impl Default for ConvergenceReducer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOLERANCE)
    }
}
