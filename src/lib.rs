//! Voxel flow - Cellular automaton water settling on a dense 3D grid.
//!
//! Each cell of a 3D box holds an integer density in `[0, max_density]`.
//! Every tick, each cell looks at its six face neighbours in an immutable
//! snapshot and decides how much density it gains and loses along the
//! enabled directions. All cells are evaluated in parallel and the result
//! is committed by swapping two buffers.
//!
//! # Architecture
//!
//! - `schema`: Configuration, direction sets and seed patterns
//! - `compute`: Grid addressing, double-buffered field, flow rule, scheduler
//!
//! # Example
//!
//! ```rust,no_run
//! use voxel_flow::{
//!     compute::Simulation,
//!     schema::{Pattern, Seed, SimulationConfig},
//! };
//!
//! let config = SimulationConfig::default();
//! let seed = Seed::single(Pattern::Random { seed: Some(42) });
//!
//! let mut simulation = Simulation::from_seed(&seed, config).expect("valid config");
//! simulation.run(100);
//!
//! println!("Total density after 100 ticks: {}", simulation.sum_of_density());
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Simulation, SimulationError, SimulationStats};
pub use schema::{DirectionConfig, Pattern, Seed, SimulationConfig, StepMode};
