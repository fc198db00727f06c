//! Schema module - Configuration and seeding types for voxel flow simulations.

mod config;
mod seed;

pub use config::*;
pub use seed::*;
