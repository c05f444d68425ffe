//! The distributed residual sequence and iterate do not depend on how the
//! grid is split.
mod util;
use util::*;

use poisson_halo::partitioning::dims_create;
use poisson_halo::prelude::*;
use proptest::prelude::*;

const SWEEPS: usize = 25;

fn compare(decomposition: Decomposition, ranks: usize, rows_per: usize, cols_per: usize, seed: u64) {
    let dims = match decomposition {
        Decomposition::Chain => [ranks, 1],
        Decomposition::Grid => dims_create(ranks),
    };
    let (n, m) = (dims[0] * rows_per, dims[1] * cols_per);
    let b = random_rhs(n, m, seed);
    let rhs = |i: usize, j: usize| b[i * m + j];

    let serial = serial_jacobi(n, m, rhs, 0.0, SWEEPS);
    let config = SolverConfig::for_decomposition(decomposition)
        .with_tolerance(0.0)
        .with_max_iterations(SWEEPS);
    let (report, history, grid) = distributed(ranks, n, m, config, rhs);

    assert_eq!(report.iterations, SWEEPS);
    assert_eq!(history.len(), serial.residuals.len());
    for (k, (d, s)) in history.iter().zip(&serial.residuals).enumerate() {
        assert!(
            (d - s).abs() <= 1e-12 * s.abs(),
            "{decomposition:?} P={ranks} iteration {k}: {d} vs {s}"
        );
    }
    // Stencil arithmetic is identical per point, so the iterate is too.
    assert_eq!(grid.as_slice(), serial.solution.as_slice());
}

#[test]
fn chain_matches_serial() {
    for ranks in 1..=5 {
        compare(Decomposition::Chain, ranks, 3, 7, 0xC0FFEE + ranks as u64);
    }
}

#[test]
fn grid_matches_serial() {
    for ranks in [1, 2, 3, 4, 6, 9] {
        compare(Decomposition::Grid, ranks, 4, 3, 0xBEEF + ranks as u64);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn any_split_matches_serial(
        ranks in 1usize..=6,
        grid in any::<bool>(),
        rows_per in 1usize..=4,
        cols_per in 1usize..=4,
        seed in any::<u64>(),
    ) {
        let decomposition = if grid { Decomposition::Grid } else { Decomposition::Chain };
        compare(decomposition, ranks, rows_per, cols_per, seed);
    }
}
