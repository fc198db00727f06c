//! Compute module - Grid addressing, density storage, flow rule and sweep scheduling.

mod field;
mod flow;
mod grid;
mod propagator;
mod seeding;
mod simulation;

pub use field::*;
pub use flow::*;
pub use grid::*;
pub use propagator::*;
pub use seeding::*;
pub use simulation::*;
