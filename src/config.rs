//! Problem and solver configuration.
//!
//! [`ProblemConfig`] describes the global grid and the constant right-hand
//! side; [`SolverConfig`] the decomposition, tolerance and iteration cap.
//! Both carry per-decomposition defaults taken from the chain and grid
//! drivers.

use crate::algs::reduction::ConvergenceReducer;
use crate::partitioning::Decomposition;
use serde::{Deserialize, Serialize};

/// Global Poisson problem: `N × M` interior points, mesh width `h`, constant
/// source `f`, homogeneous Dirichlet boundary.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    pub rows: usize,
    pub cols: usize,
    pub h: f64,
    pub f: f64,
}

impl ProblemConfig {
    pub const H: f64 = 0.01;
    pub const F: f64 = 1.5;

    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            h: Self::H,
            f: Self::F,
        }
    }

    /// Nominal grid size of each driver.
    pub fn default_for(decomposition: Decomposition) -> Self {
        match decomposition {
            Decomposition::Chain => Self::new(40, 50),
            Decomposition::Grid => Self::new(40, 40),
        }
    }

    /// Resolve positional `N`, `M` arguments the way the drivers do.
    ///
    /// A missing argument keeps the nominal default. A non-positive `N`
    /// becomes 40; a non-positive `M` becomes 1, not the nominal default.
    pub fn from_args(decomposition: Decomposition, n: Option<i64>, m: Option<i64>) -> Self {
        let mut cfg = Self::default_for(decomposition);
        if let Some(n) = n {
            cfg.rows = if n > 0 { n as usize } else { 40 };
        }
        if let Some(m) = m {
            cfg.cols = if m > 0 { m as usize } else { 1 };
        }
        cfg
    }

    /// Right-hand side value `h² f` at every interior point.
    #[inline]
    pub fn rhs_value(&self) -> f64 {
        self.h * self.h * self.f
    }
}

/// Iteration controls.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub decomposition: Decomposition,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl SolverConfig {
    pub const CHAIN_MAX_ITERATIONS: usize = 100;
    pub const GRID_MAX_ITERATIONS: usize = 10_000;

    pub fn chain() -> Self {
        Self {
            decomposition: Decomposition::Chain,
            tolerance: ConvergenceReducer::DEFAULT_TOLERANCE,
            max_iterations: Self::CHAIN_MAX_ITERATIONS,
        }
    }

    pub fn grid() -> Self {
        Self {
            decomposition: Decomposition::Grid,
            tolerance: ConvergenceReducer::DEFAULT_TOLERANCE,
            max_iterations: Self::GRID_MAX_ITERATIONS,
        }
    }

    pub fn for_decomposition(decomposition: Decomposition) -> Self {
        match decomposition {
            Decomposition::Chain => Self::chain(),
            Decomposition::Grid => Self::grid(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::chain()
    }
}
