//! Distributed Jacobi driver.
//!
//! [`JacobiSolver`] owns one process's share of the problem. Setup runs the
//! partitioner and topology once; each iteration then performs
//! halo exchange → stencil update → global residual reduction, and swaps the
//! scratch buffer into place. All ranks see the same residual, so they stop
//! on the same iteration.

use crate::algs::assembly::ResultAssembler;
use crate::algs::communicator::Communicator;
use crate::algs::halo_exchange::HaloExchanger;
use crate::algs::reduction::{ConvergenceReducer, Residual};
use crate::algs::stencil::jacobi_step;
use crate::config::{ProblemConfig, SolverConfig};
use crate::data::global_grid::GlobalGrid;
use crate::data::local_grid::LocalGrid;
use crate::partitioning::Partition;
use crate::solver_error::SolverError;
use crate::topology::context::ProcessContext;
use serde::{Deserialize, Serialize};

/// Summary of a finished run, identical on every rank.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Number of sweeps performed.
    pub iterations: usize,
    /// `‖x_k − x_{k+1}‖₂` of the last sweep.
    pub residual: f64,
    /// False when the iteration cap was hit first.
    pub converged: bool,
}

/// One rank's solver state.
pub struct JacobiSolver<'c, C: Communicator> {
    comm: &'c C,
    ctx: ProcessContext,
    partition: Partition,
    config: SolverConfig,
    exchanger: HaloExchanger,
    reducer: ConvergenceReducer,
    assembler: ResultAssembler,
    x: LocalGrid,
    t: LocalGrid,
    b: LocalGrid,
}

impl<'c, C: Communicator> JacobiSolver<'c, C> {
    /// Solver for `problem` with the constant right-hand side `h² f`.
    pub fn new(
        comm: &'c C,
        problem: &ProblemConfig,
        config: SolverConfig,
    ) -> Result<Self, SolverError> {
        let value = problem.rhs_value();
        Self::with_rhs(comm, problem.rows, problem.cols, config, |_, _| value)
    }

    /// Solver with a right-hand side given per global interior point
    /// (0-based global row, column).
    pub fn with_rhs(
        comm: &'c C,
        global_rows: usize,
        global_cols: usize,
        config: SolverConfig,
        rhs: impl Fn(usize, usize) -> f64,
    ) -> Result<Self, SolverError> {
        let ctx = ProcessContext::from_comm(comm, config.decomposition)?;
        let partition = Partition::new(global_rows, global_cols, ctx.size(), config.decomposition)?;
        let (n, m) = partition.local;
        let (r0, c0) = partition.global_origin(ctx.coords());
        let b = LocalGrid::try_from_fn(n, m, |i, j| rhs(r0 + i - 1, c0 + j - 1))?;
        let x = LocalGrid::try_new(n, m)?;
        let t = LocalGrid::try_new(n, m)?;
        let exchanger = HaloExchanger::new(&ctx, partition.local)?;
        log::debug!(
            "rank {} at {:?}: block {n}x{m} from global ({r0}, {c0})",
            ctx.rank(),
            ctx.coords()
        );
        Ok(Self {
            comm,
            ctx,
            partition,
            config,
            exchanger,
            reducer: ConvergenceReducer::new(config.tolerance),
            assembler: ResultAssembler::new(partition)?,
            x,
            t,
            b,
        })
    }

    #[inline]
    pub fn context(&self) -> &ProcessContext {
        &self.ctx
    }

    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Current local iterate (with ghost margin).
    #[inline]
    pub fn solution(&self) -> &LocalGrid {
        &self.x
    }

    #[inline]
    pub fn rhs(&self) -> &LocalGrid {
        &self.b
    }

    #[inline]
    pub fn exchanger(&self) -> &HaloExchanger {
        &self.exchanger
    }

    /// One collective sweep. On return `solution()` holds the new iterate.
    pub fn step(&mut self) -> Result<Residual, SolverError> {
        self.exchanger.exchange(&mut self.x, self.comm)?;
        jacobi_step(&self.x, &self.b, &mut self.t)?;
        let residual = self.reducer.reduce(&self.x, &self.t, self.comm)?;
        std::mem::swap(&mut self.x, &mut self.t);
        Ok(residual)
    }

    pub fn solve(&mut self) -> Result<SolveReport, SolverError> {
        self.solve_with(|_, _| {})
    }

    /// Iterate until the residual drops below the tolerance or the cap is
    /// reached. `monitor(k, residual)` runs on the coordinator only, once
    /// per iteration (`k` starts at 0).
    pub fn solve_with(
        &mut self,
        mut monitor: impl FnMut(usize, f64),
    ) -> Result<SolveReport, SolverError> {
        let mut report = SolveReport {
            iterations: 0,
            residual: f64::INFINITY,
            converged: false,
        };
        while !report.converged && report.iterations < self.config.max_iterations {
            let r = self.step()?;
            if self.ctx.is_coordinator() {
                log::info!("Iteration {}: residual {:e}", report.iterations, r.norm);
                monitor(report.iterations, r.norm);
            }
            report.iterations += 1;
            report.residual = r.norm;
            report.converged = r.converged;
        }
        if !report.converged && self.ctx.is_coordinator() {
            log::warn!(
                "stopped at the {}-iteration cap with residual {:e}",
                self.config.max_iterations,
                report.residual
            );
        }
        Ok(report)
    }

    /// Collective: gather the current iterate on the coordinator.
    pub fn assemble(&self) -> Result<Option<GlobalGrid>, SolverError> {
        self.assembler.assemble(&self.x, self.comm)
    }
}

/// Setup, iterate, and assemble in one call.
pub fn solve_poisson<C: Communicator>(
    comm: &C,
    problem: &ProblemConfig,
    config: SolverConfig,
    monitor: impl FnMut(usize, f64),
) -> Result<(SolveReport, Option<GlobalGrid>), SolverError> {
    let mut solver = JacobiSolver::new(comm, problem, config)?;
    let report = solver.solve_with(monitor)?;
    let global = solver.assemble()?;
    Ok((report, global))
}
