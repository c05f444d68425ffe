//! Re-export public algorithms.

pub mod assembly;
pub mod communicator;
pub mod exchange_plan;
pub mod halo_exchange;
pub mod reduction;
pub mod stencil;

pub use assembly::ResultAssembler;
pub use halo_exchange::HaloExchanger;
pub use reduction::ConvergenceReducer;
pub use stencil::jacobi_step;
