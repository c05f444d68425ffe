//! # poisson-halo
//!
//! Distributed Jacobi iteration for the discrete Poisson equation
//! `-Δu = f` on a rectangular grid with homogeneous Dirichlet boundary.
//! The interior is split across a group of ranks that each own one block
//! plus a one-cell ghost margin, swap boundary values with their neighbours
//! every sweep, and agree on convergence through a global sum.
//!
//! ## Features
//! - Chain (row strips) and Cartesian (2D blocks) decompositions
//! - Declarative, deadlock-free halo exchange plans for blocking sends
//! - Strided row/column/block descriptors for packing and reassembly
//! - Pluggable communication backends: serial, in-process threads, MPI
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! poisson-halo = "0.3"
//! # features = ["mpi-support"]
//! ```
//!
//! ```no_run
//! use poisson_halo::prelude::*;
//!
//! let problem = ProblemConfig::new(40, 40);
//! let (report, grid) =
//!     solve_poisson(&NoComm, &problem, SolverConfig::grid(), |_, _| {}).unwrap();
//! assert!(report.converged);
//! assert_eq!(grid.unwrap().rows(), 40);
//! ```

pub mod algs;
pub mod config;
pub mod data;
pub mod driver;
pub mod output;
pub mod partitioning;
pub mod solver;
pub mod solver_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, NoComm, ThreadComm, run_world};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::{ConvergenceReducer, HaloExchanger, ResultAssembler, jacobi_step};
    pub use crate::config::{ProblemConfig, SolverConfig};
    pub use crate::data::{GlobalGrid, LocalGrid};
    pub use crate::partitioning::{Decomposition, Partition};
    pub use crate::solver::{JacobiSolver, SolveReport, solve_poisson};
    pub use crate::solver_error::{CommError, SolverError};
    pub use crate::topology::{Direction, Neighbors, ProcessContext, ProcessTopology};
}
