#![allow(dead_code)]
use poisson_halo::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const H: f64 = 0.01;
pub const F: f64 = 1.5;

/// Result of a plain single-buffer Jacobi run.
pub struct Serial {
    /// Interior, row-major N×M.
    pub solution: Vec<f64>,
    pub residuals: Vec<f64>,
}

impl Serial {
    pub fn iterations(&self) -> usize {
        self.residuals.len()
    }

    pub fn grid(&self, n: usize, m: usize) -> GlobalGrid {
        GlobalGrid::from_vec(n, m, self.solution.clone()).unwrap()
    }
}

/// Reference Jacobi over the whole N×M grid with zero boundary, no
/// decomposition and no message passing.
pub fn serial_jacobi(
    n: usize,
    m: usize,
    rhs: impl Fn(usize, usize) -> f64,
    tol: f64,
    max_iter: usize,
) -> Serial {
    let ld = m + 2;
    let mut x = vec![0.0; (n + 2) * ld];
    let mut t = vec![0.0; (n + 2) * ld];
    let mut b = vec![0.0; (n + 2) * ld];
    for i in 1..=n {
        for j in 1..=m {
            b[i * ld + j] = rhs(i - 1, j - 1);
        }
    }
    let mut residuals = Vec::new();
    let mut conv = false;
    while !conv && residuals.len() < max_iter {
        for i in 1..=n {
            for j in 1..=m {
                t[i * ld + j] = (b[i * ld + j]
                    + x[(i + 1) * ld + j]
                    + x[(i - 1) * ld + j]
                    + x[i * ld + j + 1]
                    + x[i * ld + j - 1])
                    / 4.0;
            }
        }
        let mut s = 0.0;
        for i in 1..=n {
            for j in 1..=m {
                let d = x[i * ld + j] - t[i * ld + j];
                s += d * d;
            }
        }
        residuals.push(s.sqrt());
        conv = s.sqrt() < tol;
        for i in 1..=n {
            for j in 1..=m {
                x[i * ld + j] = t[i * ld + j];
            }
        }
    }
    let mut solution = Vec::with_capacity(n * m);
    for i in 1..=n {
        solution.extend_from_slice(&x[i * ld + 1..i * ld + 1 + m]);
    }
    Serial {
        solution,
        residuals,
    }
}

/// Constant `h² f` right-hand side.
pub fn constant_rhs(_i: usize, _j: usize) -> f64 {
    H * H * F
}

/// Seeded random right-hand side over an N×M grid.
pub fn random_rhs(n: usize, m: usize, seed: u64) -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n * m).map(|_| rng.r#gen::<f64>() * 1e-3).collect()
}

/// Run a full distributed solve on `ranks` threads; returns the
/// coordinator's report, residual history and assembled grid.
pub fn distributed(
    ranks: usize,
    n: usize,
    m: usize,
    config: SolverConfig,
    rhs: impl Fn(usize, usize) -> f64 + Sync,
) -> (SolveReport, Vec<f64>, GlobalGrid) {
    let mut out = run_world(ThreadComm::world(ranks), |comm| {
        let mut solver = JacobiSolver::with_rhs(&comm, n, m, config, &rhs).expect("setup");
        let mut history = Vec::new();
        let report = solver.solve_with(|_, r| history.push(r)).expect("solve");
        let grid = solver.assemble().expect("assemble");
        (report, history, grid)
    });
    let reports: Vec<_> = out.iter().map(|(r, _, _)| *r).collect();
    assert!(
        reports.windows(2).all(|w| w[0] == w[1]),
        "ranks disagree on the stopping decision: {reports:?}"
    );
    let (report, history, grid) = out.swap_remove(0);
    (report, history, grid.expect("coordinator holds the global grid"))
}
