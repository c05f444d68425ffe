//! Process identity and neighbour derivation.

pub mod cartesian;
pub mod context;

pub use cartesian::{Direction, Neighbors, ProcessTopology};
pub use context::{CartesianLayout, ProcessContext};
