//! Shared entry point of the `poisson-chain` and `poisson-grid` binaries.
//!
//! With `mpi-support` the process group is the MPI world (launch with
//! `mpirun -n P`). Without it, `POISSON_RANKS` in-process ranks are run on
//! threads (default 1).

use crate::algs::communicator::Communicator;
use crate::config::{ProblemConfig, SolverConfig};
use crate::output::{iteration_line, render_grid};
use crate::partitioning::Decomposition;
use crate::solver::JacobiSolver;
use anyhow::Context;
use clap::Parser;

/// Positional grid extents; non-positive values fall back to defaults.
#[derive(Parser, Debug)]
#[command(about = "Distributed Jacobi solver for the 2D Poisson equation")]
#[command(allow_negative_numbers = true)]
pub struct Args {
    /// Interior rows N.
    pub n: Option<i64>,
    /// Interior columns M.
    pub m: Option<i64>,
}

pub const RANKS_ENV: &str = "POISSON_RANKS";

/// Parse the command line and run one decomposition end to end.
pub fn main(decomposition: Decomposition) -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let problem = ProblemConfig::from_args(decomposition, args.n, args.m);
    let config = SolverConfig::for_decomposition(decomposition);
    launch(&problem, config)
}

#[cfg(feature = "mpi-support")]
fn launch(problem: &ProblemConfig, config: SolverConfig) -> anyhow::Result<()> {
    let comm = crate::algs::communicator::MpiComm::new()?;
    run_rank(&comm, problem, config)
}

#[cfg(not(feature = "mpi-support"))]
fn launch(problem: &ProblemConfig, config: SolverConfig) -> anyhow::Result<()> {
    use crate::algs::communicator::{ThreadComm, run_world};
    let ranks = match std::env::var(RANKS_ENV) {
        Ok(v) => v
            .parse::<usize>()
            .with_context(|| format!("{RANKS_ENV}={v} is not a rank count"))?,
        Err(_) => 1,
    };
    anyhow::ensure!(ranks > 0, "{RANKS_ENV} must be at least 1");
    run_world(ThreadComm::world(ranks), |comm| {
        run_rank(&comm, problem, config)
    })
    .into_iter()
    .collect::<anyhow::Result<Vec<()>>>()?;
    Ok(())
}

/// Body executed by every rank.
pub fn run_rank<C: Communicator>(
    comm: &C,
    problem: &ProblemConfig,
    config: SolverConfig,
) -> anyhow::Result<()> {
    let mut solver = JacobiSolver::new(comm, problem, config)
        .with_context(|| format!("setting up rank {} of {}", comm.rank(), comm.size()))?;
    if let Some(layout) = solver.context().layout() {
        log::info!(
            "[process {}] located at ({}, {})",
            comm.rank(),
            layout.coords[0],
            layout.coords[1]
        );
    }
    solver
        .solve_with(|k, r| println!("{}", iteration_line(k, r)))
        .with_context(|| format!("iterating on rank {}", comm.rank()))?;
    if let Some(global) = solver.assemble()? {
        print!("{}", render_grid(&global));
    }
    Ok(())
}
