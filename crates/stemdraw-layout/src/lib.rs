pub mod geometry;
pub mod heuristic;
pub mod labels;
pub mod seed;
#[cfg(feature = "smt")]
pub mod smt;
pub mod solver;
pub mod symbolic;

pub use labels::place_labels;
pub use solver::LayoutSolver;
