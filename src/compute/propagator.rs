//! Sweep scheduler - advances a density field by one tick.
//!
//! A sweep evaluates the flow rule for every cell in parallel, reading the
//! committed buffer and writing the next one, then commits. Each cell owns
//! exactly one slot of the next buffer, so workers share nothing mutable.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::schema::{Direction, DirectionConfig, ParallelismConfig, StepMode};

use super::{DensityField, next_density};

/// Parallel sweep driver.
pub struct Propagator {
    /// Dedicated pool; `None` runs on rayon's global pool.
    pool: Option<ThreadPool>,
    /// Minimum cells per work item.
    batch_size: usize,
}

impl Propagator {
    /// Create a propagator, building a dedicated pool when `threads` is set.
    pub fn new(config: &ParallelismConfig) -> Result<Self, ThreadPoolBuildError> {
        let pool = match config.threads {
            Some(threads) => Some(ThreadPoolBuilder::new().num_threads(threads).build()?),
            None => None,
        };
        Ok(Self {
            pool,
            batch_size: config.batch_size.max(1),
        })
    }

    /// Number of worker threads sweeps run on.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Advance the field by one tick.
    pub fn step(&self, field: &mut DensityField, rules: &DirectionConfig, mode: StepMode) {
        match mode {
            StepMode::Combined => self.sweep(field, rules),
            StepMode::Sequential => {
                for direction in Direction::ALL {
                    // A sweep with no transferring direction is the identity.
                    if direction.transfers() && rules.directions().contains(direction) {
                        self.sweep(field, &rules.restricted_to(direction));
                    }
                }
            }
        }
    }

    /// Run `ticks` steps with the same rules.
    pub fn run(&self, field: &mut DensityField, rules: &DirectionConfig, mode: StepMode, ticks: u64) {
        for _ in 0..ticks {
            self.step(field, rules, mode);
        }
    }

    /// One full pass over every cell followed by a commit.
    pub fn sweep(&self, field: &mut DensityField, rules: &DirectionConfig) {
        let dims = field.dims();
        let batch_size = self.batch_size;
        let (current, next) = field.sweep_buffers();

        let mut fill = move || {
            next.into_par_iter()
                .with_min_len(batch_size)
                .enumerate()
                .for_each(|(index, slot)| {
                    *slot = next_density(index, current, &dims, rules);
                });
        };

        // `for_each` returns only after every slot is written.
        match &self.pool {
            Some(pool) => pool.install(fill),
            None => fill(),
        }

        field.commit();
    }
}

/// Simulation statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimulationStats {
    pub total_density: i64,
    pub max_density: i32,
    pub min_density: i32,
    pub mean_density: f64,
    pub active_cells: usize,
}

impl SimulationStats {
    /// Compute statistics from the committed buffer.
    pub fn from_field(field: &DensityField) -> Self {
        let mut total_density = 0i64;
        let mut max_density = i32::MIN;
        let mut min_density = i32::MAX;
        let mut active_cells = 0usize;

        for &d in field.current() {
            total_density += i64::from(d);
            max_density = max_density.max(d);
            min_density = min_density.min(d);
            if d > 0 {
                active_cells += 1;
            }
        }

        Self {
            total_density,
            max_density,
            min_density,
            mean_density: total_density as f64 / field.len() as f64,
            active_cells,
        }
    }
}
