//! Jacobi/Poisson over a chain of row strips.
//!
//! ```sh
//! POISSON_RANKS=4 poisson-chain 40 50
//! mpirun -n 4 poisson-chain 40 50   # with --features mpi-support
//! ```

use poisson_halo::partitioning::Decomposition;

fn main() -> anyhow::Result<()> {
    poisson_halo::driver::main(Decomposition::Chain)
}
