//! Simulation handle - owns the density field and the sweep scheduler.
//!
//! All mutation goes through `&mut self`, so readers only ever observe the
//! grid between ticks.

use crate::schema::{ConfigError, Density, DirectionConfig, Seed, SimulationConfig, StepMode};

use super::{DensityField, FieldError, GridDims, Propagator, SimulationStats};

/// Errors surfaced by [`Simulation`].
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Rules bound density to {rules} but the grid is bounded to {grid}")]
    DensityBoundMismatch { rules: Density, grid: Density },
}

/// A running voxel flow simulation.
pub struct Simulation {
    config: SimulationConfig,
    rules: DirectionConfig,
    field: DensityField,
    propagator: Propagator,
    tick: u64,
    last_seed: Option<u64>,
}

impl Simulation {
    /// Validate the configuration and allocate an empty grid.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let rules = config.direction_config()?;
        let dims = GridDims::new(config.width, config.height, config.depth)?;
        let field = DensityField::new(dims, config.max_density)?;
        let propagator = Propagator::new(&config.parallelism)?;

        log::info!(
            "Allocated {} grid ({} cells, max density {}) on {} threads",
            dims,
            dims.len(),
            config.max_density,
            propagator.threads()
        );

        Ok(Self {
            config,
            rules,
            field,
            propagator,
            tick: 0,
            last_seed: None,
        })
    }

    /// Create a simulation and apply `seed` to it.
    pub fn from_seed(seed: &Seed, config: SimulationConfig) -> Result<Self, SimulationError> {
        let mut simulation = Self::new(config)?;
        simulation.apply_seed(seed)?;
        Ok(simulation)
    }

    /// Apply every pattern of `seed` in order.
    pub fn apply_seed(&mut self, seed: &Seed) -> Result<(), SimulationError> {
        for pattern in &seed.patterns {
            if let Some(used) = self.field.apply_pattern(pattern)? {
                self.last_seed = Some(used);
            }
        }
        Ok(())
    }

    /// Advance one tick with explicit rules and scheduling.
    pub fn step(&mut self, rules: &DirectionConfig, mode: StepMode) -> Result<(), SimulationError> {
        if rules.max_density() != self.field.max_density() {
            return Err(SimulationError::DensityBoundMismatch {
                rules: rules.max_density(),
                grid: self.field.max_density(),
            });
        }
        self.advance(rules, mode);
        Ok(())
    }

    /// Advance one tick with the configured rules and mode.
    pub fn tick(&mut self) {
        let rules = self.rules;
        self.advance(&rules, self.config.mode);
    }

    /// Advance `ticks` ticks with the configured rules and mode.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn advance(&mut self, rules: &DirectionConfig, mode: StepMode) {
        self.propagator.step(&mut self.field, rules, mode);
        self.tick += 1;
        log::trace!(
            "Tick {} ({:?}): total density {}",
            self.tick,
            mode,
            self.field.sum_of_density()
        );
    }

    /// Density at (x, y, z).
    pub fn get_cell_value(&self, x: usize, y: usize, z: usize) -> Result<Density, SimulationError> {
        Ok(self.field.get_cell_value(x, y, z)?)
    }

    /// Manual point edit.
    pub fn set_cell_value(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        density: Density,
    ) -> Result<(), SimulationError> {
        Ok(self.field.set_cell_value(x, y, z, density)?)
    }

    /// Total density of the committed grid.
    pub fn sum_of_density(&self) -> i64 {
        self.field.sum_of_density()
    }

    /// Random fill from a fresh time-derived seed. The seed is recorded.
    pub fn randomize(&mut self) -> u64 {
        let seed = self.field.randomize();
        self.last_seed = Some(seed);
        seed
    }

    /// Random fill from an explicit seed. The seed is recorded.
    pub fn randomize_seeded(&mut self, seed: u64) {
        self.field.randomize_seeded(seed);
        self.last_seed = Some(seed);
    }

    /// Seed of the most recent random fill.
    pub fn last_seed(&self) -> Option<u64> {
        self.last_seed
    }

    /// Ticks advanced since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Validated rules used by [`tick`](Self::tick).
    pub fn rules(&self) -> &DirectionConfig {
        &self.rules
    }

    pub fn dims(&self) -> GridDims {
        self.field.dims()
    }

    pub fn field(&self) -> &DensityField {
        &self.field
    }

    /// Field access for bulk edits between ticks.
    pub fn field_mut(&mut self) -> &mut DensityField {
        &mut self.field
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats::from_field(&self.field)
    }

    /// Release both buffers and the worker pool.
    pub fn dispose(self) {
        log::debug!("Disposing {} grid after {} ticks", self.field.dims(), self.tick);
    }
}
