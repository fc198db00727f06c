//! Seed types for initializing voxel flow simulations.

use serde::{Deserialize, Serialize};

use super::Density;

/// Ordered list of patterns applied to an empty grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    /// Patterns, applied first to last. Later patterns overwrite earlier ones
    /// wherever they write.
    pub patterns: Vec<Pattern>,
}

impl Default for Seed {
    fn default() -> Self {
        Self {
            patterns: vec![Pattern::Plane {
                level: 0,
                cap: 100,
            }],
        }
    }
}

impl Seed {
    /// Seed consisting of a single pattern.
    pub fn single(pattern: Pattern) -> Self {
        Self {
            patterns: vec![pattern],
        }
    }
}

/// Predefined patterns for initialization and bulk edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    /// Every cell set to 0.
    Clear,
    /// Every cell set to `value`.
    Uniform { value: Density },
    /// Random multiples of 5 in [0, 100].
    Random {
        /// Explicit seed; `None` derives one from the clock.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// `i mod 32` along the flat index.
    Ramp,
    /// Ramp times a random factor of 1 or 2.
    RandomizedRamp {
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Every `every`-th cell along the flat index set to `cap`.
    Alternate { every: usize, cap: Density },
    /// Horizontal plane `y == level` set to `cap`.
    Plane { level: usize, cap: Density },
    /// Interior of the box inset by `inset` emptied.
    CarveHollowBox { inset: usize },
    /// Interior of the box inset by `inset` filled to the density bound.
    FillHollowBox { inset: usize },
    /// Explicit point edits, (x, y, z, density).
    Points {
        values: Vec<(usize, usize, usize, Density)>,
    },
}
