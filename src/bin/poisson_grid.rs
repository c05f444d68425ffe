//! Jacobi/Poisson over a 2D Cartesian grid of blocks.
//!
//! ```sh
//! POISSON_RANKS=4 poisson-grid 40 40
//! mpirun -n 4 poisson-grid 40 40    # with --features mpi-support
//! ```

use poisson_halo::partitioning::Decomposition;

fn main() -> anyhow::Result<()> {
    poisson_halo::driver::main(Decomposition::Grid)
}
