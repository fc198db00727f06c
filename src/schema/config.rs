//! Configuration types for voxel flow simulation parameters.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Integer fluid amount stored per cell.
pub type Density = i32;

/// Default upper bound for a single cell's density.
pub const DEFAULT_MAX_DENSITY: Density = 100;

/// Cell count of a `width x height x depth` grid.
///
/// Both density buffers together must stay addressable, so products that
/// overflow `usize` or exceed `isize::MAX` bytes are rejected.
pub fn checked_grid_size(width: usize, height: usize, depth: usize) -> Result<usize, ConfigError> {
    if width == 0 || height == 0 || depth == 0 {
        return Err(ConfigError::InvalidDimensions);
    }
    let too_large = ConfigError::GridTooLarge {
        width,
        height,
        depth,
    };
    let cells = width
        .checked_mul(height)
        .and_then(|layer| layer.checked_mul(depth))
        .ok_or(too_large.clone())?;
    match cells.checked_mul(2 * std::mem::size_of::<Density>()) {
        Some(bytes) if bytes <= isize::MAX as usize => Ok(cells),
        _ => Err(too_large),
    }
}

fn default_max_density() -> Density {
    DEFAULT_MAX_DENSITY
}

fn default_flow_rate() -> Density {
    1
}

fn default_batch_size() -> usize {
    64
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid extent along X (left/right).
    pub width: usize,
    /// Grid extent along Y (down/up).
    pub height: usize,
    /// Grid extent along Z (back/forward).
    pub depth: usize,
    /// Upper bound of a cell's density.
    #[serde(default = "default_max_density")]
    pub max_density: Density,
    /// Flow rule parameters used by [`tick`](crate::compute::Simulation::tick).
    #[serde(default)]
    pub flow: FlowConfig,
    /// How the enabled directions are scheduled within one tick.
    #[serde(default)]
    pub mode: StepMode,
    /// Worker pool parameters.
    #[serde(default)]
    pub parallelism: ParallelismConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 96,
            height: 32,
            depth: 96,
            max_density: DEFAULT_MAX_DENSITY,
            flow: FlowConfig::default(),
            mode: StepMode::default(),
            parallelism: ParallelismConfig::default(),
        }
    }
}

/// Flow rule parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Active directions.
    #[serde(default = "DirectionSet::all")]
    pub directions: DirectionSet,
    /// Units moved per satisfied rule.
    #[serde(default = "default_flow_rate")]
    pub flow_rate: Density,
    /// How gain and loss are decided between neighbours.
    #[serde(default)]
    pub scheme: TransferScheme,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            directions: DirectionSet::all(),
            flow_rate: default_flow_rate(),
            scheme: TransferScheme::default(),
        }
    }
}

/// Worker pool parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelismConfig {
    /// Dedicated worker thread count. `None` uses rayon's global pool.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Minimum number of cells handed to one worker at a time.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self {
            threads: None,
            batch_size: default_batch_size(),
        }
    }
}

/// Scheduling of direction rules within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// One sweep applying every enabled direction additively.
    #[default]
    Combined,
    /// One committed sweep per direction, in [`Direction::ALL`] order.
    Sequential,
}

/// How a cell decides its gain and loss against neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferScheme {
    /// Each cell decides its own gain and loss from the snapshot.
    /// Total density is only approximately conserved.
    #[default]
    Independent,
    /// One flux per neighbour pair, applied to both ends.
    /// Total density is conserved exactly.
    Paired,
}

/// Axis-aligned flow direction.
///
/// Down is -Y, left is -X, back is -Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Down,
    Up,
    Left,
    Right,
    Forward,
    Back,
}

impl Direction {
    /// All directions in sequential sweep order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::Left,
        Direction::Right,
        Direction::Forward,
        Direction::Back,
    ];

    /// Cell offset towards the neighbour this direction drains into.
    #[inline]
    pub fn offset(self) -> (isize, isize, isize) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::Left => (-1, 0, 0),
            Direction::Right => (1, 0, 0),
            Direction::Forward => (0, 0, 1),
            Direction::Back => (0, 0, -1),
        }
    }

    /// Opposite direction (the neighbour this direction fills from).
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Forward => Direction::Back,
            Direction::Back => Direction::Forward,
        }
    }

    /// Whether this direction moves any density. `Up` is reserved and inert.
    #[inline]
    pub fn transfers(self) -> bool {
        !matches!(self, Direction::Up)
    }

    /// Gravity rules drain regardless of the neighbour being lower.
    #[inline]
    pub fn is_gravity(self) -> bool {
        matches!(self, Direction::Down)
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of enabled directions, stored as a bitset.
///
/// Serialized as a list of direction names, e.g. `["down", "left"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Direction>", into = "Vec<Direction>")]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Direction::ALL.into_iter().collect()
    }

    pub fn only(direction: Direction) -> Self {
        Self(direction.bit())
    }

    /// Builder-style insert.
    pub fn with(mut self, direction: Direction) -> Self {
        self.insert(direction);
        self
    }

    pub fn insert(&mut self, direction: Direction) {
        self.0 |= direction.bit();
    }

    pub fn remove(&mut self, direction: Direction) {
        self.0 &= !direction.bit();
    }

    #[inline]
    pub fn contains(&self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Enabled directions in [`Direction::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }

    /// Number of enabled directions that actually move density.
    pub fn transfer_count(&self) -> usize {
        self.iter().filter(|d| d.transfers()).count()
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Self::empty();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

impl From<Vec<Direction>> for DirectionSet {
    fn from(directions: Vec<Direction>) -> Self {
        directions.into_iter().collect()
    }
}

impl From<DirectionSet> for Vec<Direction> {
    fn from(set: DirectionSet) -> Self {
        set.iter().collect()
    }
}

/// Validated rule parameters for one step.
///
/// Only constructible through [`DirectionConfig::new`], so a value in hand
/// always has a positive flow rate and density bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionConfig {
    directions: DirectionSet,
    flow_rate: Density,
    max_density: Density,
    scheme: TransferScheme,
}

impl DirectionConfig {
    pub fn new(
        directions: DirectionSet,
        flow_rate: Density,
        max_density: Density,
    ) -> Result<Self, ConfigError> {
        if max_density <= 0 {
            return Err(ConfigError::InvalidMaxDensity(max_density));
        }
        if flow_rate <= 0 {
            return Err(ConfigError::InvalidFlowRate(flow_rate));
        }
        Ok(Self {
            directions,
            flow_rate,
            max_density,
            scheme: TransferScheme::Independent,
        })
    }

    pub fn with_scheme(mut self, scheme: TransferScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Same parameters with a single direction enabled.
    pub fn restricted_to(mut self, direction: Direction) -> Self {
        self.directions = DirectionSet::only(direction);
        self
    }

    #[inline]
    pub fn directions(&self) -> DirectionSet {
        self.directions
    }

    #[inline]
    pub fn flow_rate(&self) -> Density {
        self.flow_rate
    }

    #[inline]
    pub fn max_density(&self) -> Density {
        self.max_density
    }

    #[inline]
    pub fn scheme(&self) -> TransferScheme {
        self.scheme
    }
}

impl SimulationConfig {
    /// Total number of cells (width * height * depth).
    #[inline]
    pub fn grid_size(&self) -> Result<usize, ConfigError> {
        checked_grid_size(self.width, self.height, self.depth)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid_size()?;
        if self.max_density <= 0 {
            return Err(ConfigError::InvalidMaxDensity(self.max_density));
        }
        if self.flow.flow_rate <= 0 {
            return Err(ConfigError::InvalidFlowRate(self.flow.flow_rate));
        }
        if self.parallelism.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.parallelism.threads == Some(0) {
            return Err(ConfigError::InvalidThreadCount);
        }
        Ok(())
    }

    /// Rule parameters for [`tick`](crate::compute::Simulation::tick).
    pub fn direction_config(&self) -> Result<DirectionConfig, ConfigError> {
        Ok(
            DirectionConfig::new(self.flow.directions, self.flow.flow_rate, self.max_density)?
                .with_scheme(self.flow.scheme),
        )
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions (width, height, depth) must be non-zero")]
    InvalidDimensions,
    #[error("Grid {width}x{height}x{depth} is too large to allocate")]
    GridTooLarge {
        width: usize,
        height: usize,
        depth: usize,
    },
    #[error("Max density must be positive, got {0}")]
    InvalidMaxDensity(Density),
    #[error("Flow rate must be positive, got {0}")]
    InvalidFlowRate(Density),
    #[error("Batch size must be non-zero")]
    InvalidBatchSize,
    #[error("Thread count must be non-zero when set")]
    InvalidThreadCount,
}

/// Errors from [`SimulationConfig::load`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] ConfigError),
}
