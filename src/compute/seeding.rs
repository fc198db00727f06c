//! Bulk initializers and editors for the committed density buffer.
//!
//! Every operation writes `current` directly and clamps to
//! `[0, max_density]`. They are meant to be called between ticks.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::prelude::*;

use crate::schema::{Density, Pattern};

use super::{DensityField, FieldError};

/// Granularity of random fills: values are multiples of this step.
const RANDOM_STEP: Density = 5;
/// Number of distinct random values, {0, 5, ..., 100}.
const RANDOM_LEVELS: Density = 21;
/// Period of the ramp pattern.
const RAMP_PERIOD: usize = 32;
/// Ceiling of the ramp pattern before the grid bound applies.
const RAMP_CAP: Density = 100;

/// Seed derived from the wall clock, for fills that should differ per run.
pub fn time_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    (nanos as u64) ^ ((nanos >> 64) as u64)
}

impl DensityField {
    #[inline]
    fn bounded(&self, value: Density) -> Density {
        value.clamp(0, self.max_density())
    }

    /// Set every cell to 0.
    pub fn clear(&mut self) {
        self.current_mut().fill(0);
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: Density) {
        let value = self.bounded(value);
        self.current_mut().fill(value);
    }

    /// Random multiples of 5 in [0, 100] from a fresh time-derived seed.
    ///
    /// Returns the seed so the fill can be reproduced with
    /// [`randomize_seeded`](Self::randomize_seeded).
    pub fn randomize(&mut self) -> u64 {
        let seed = time_seed();
        self.randomize_seeded(seed);
        seed
    }

    /// Random multiples of 5 in [0, 100]; same seed gives the same grid.
    pub fn randomize_seeded(&mut self, seed: u64) {
        log::debug!("Random fill with seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let max = self.max_density();
        for cell in self.current_mut() {
            *cell = (rng.gen_range(0..RANDOM_LEVELS) * RANDOM_STEP).min(max);
        }
    }

    /// `i mod 32`, capped at 100. Makes addressing errors visible.
    pub fn ramp(&mut self) {
        let max = self.max_density();
        for (i, cell) in self.current_mut().iter_mut().enumerate() {
            *cell = ramp_value(i).min(max);
        }
    }

    /// Ramp multiplied by a random factor of 1 or 2.
    pub fn randomized_ramp(&mut self, seed: u64) {
        log::debug!("Randomized ramp with seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let max = self.max_density();
        for (i, cell) in self.current_mut().iter_mut().enumerate() {
            *cell = (ramp_value(i) * rng.gen_range(1..=2)).min(max);
        }
    }

    /// Every `every`-th cell along the flat index gets `cap`, the rest 0.
    pub fn alternate(&mut self, every: usize, cap: Density) -> Result<(), FieldError> {
        if every == 0 {
            return Err(FieldError::InvalidAlternateStride);
        }
        let cap = self.bounded(cap);
        for (i, cell) in self.current_mut().iter_mut().enumerate() {
            *cell = if i % every == 0 { cap } else { 0 };
        }
        Ok(())
    }

    /// Cells on the horizontal plane `y == level` get `cap`, the rest 0.
    pub fn plane(&mut self, level: usize, cap: Density) -> Result<(), FieldError> {
        let dims = self.dims();
        if level >= dims.size_y() {
            return Err(FieldError::PlaneOutOfBounds {
                level,
                height: dims.size_y(),
            });
        }
        let cap = self.bounded(cap);
        for (i, cell) in self.current_mut().iter_mut().enumerate() {
            let (_, y, _) = dims.to_coord(i);
            *cell = if y == level { cap } else { 0 };
        }
        Ok(())
    }

    /// Empty the box inset by `inset` on X, Z and the floor, open to the top.
    pub fn carve_hollow_box(&mut self, inset: usize) {
        self.fill_box_interior(inset, 0);
    }

    /// Fill the same region as [`carve_hollow_box`](Self::carve_hollow_box)
    /// to `max_density`.
    pub fn fill_hollow_box(&mut self, inset: usize) {
        let max = self.max_density();
        self.fill_box_interior(inset, max);
    }

    fn fill_box_interior(&mut self, inset: usize, value: Density) {
        let dims = self.dims();
        let x_end = dims.size_x().saturating_sub(inset);
        let z_end = dims.size_z().saturating_sub(inset);
        let y_end = dims.size_y();

        let mut touched = 0usize;
        for z in inset..z_end {
            for y in inset..y_end {
                for x in inset..x_end {
                    let index = dims.to_index(x, y, z);
                    self.current_mut()[index] = value;
                    touched += 1;
                }
            }
        }
        log::debug!("Set {touched} interior cells (inset {inset}) to {value}");
    }

    /// Apply one seed pattern. Returns the random seed used, if any.
    pub fn apply_pattern(&mut self, pattern: &Pattern) -> Result<Option<u64>, FieldError> {
        match pattern {
            Pattern::Clear => self.clear(),
            Pattern::Uniform { value } => self.fill(*value),
            Pattern::Random { seed } => {
                let seed = seed.unwrap_or_else(time_seed);
                self.randomize_seeded(seed);
                return Ok(Some(seed));
            }
            Pattern::Ramp => self.ramp(),
            Pattern::RandomizedRamp { seed } => {
                let seed = seed.unwrap_or_else(time_seed);
                self.randomized_ramp(seed);
                return Ok(Some(seed));
            }
            Pattern::Alternate { every, cap } => self.alternate(*every, *cap)?,
            Pattern::Plane { level, cap } => self.plane(*level, *cap)?,
            Pattern::CarveHollowBox { inset } => self.carve_hollow_box(*inset),
            Pattern::FillHollowBox { inset } => self.fill_hollow_box(*inset),
            Pattern::Points { values } => {
                for &(x, y, z, density) in values {
                    self.set_cell_value(x, y, z, density)?;
                }
            }
        }
        Ok(None)
    }
}

#[inline]
fn ramp_value(index: usize) -> Density {
    ((index % RAMP_PERIOD) as Density).clamp(0, RAMP_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::GridDims;

    fn field(x: usize, y: usize, z: usize) -> DensityField {
        DensityField::new(GridDims::new(x, y, z).unwrap(), 100).unwrap()
    }

    #[test]
    fn test_random_values_are_multiples_of_five() {
        let mut field = field(10, 10, 10);
        field.randomize_seeded(1234);
        assert!(field.current().iter().all(|&d| d % 5 == 0 && (0..=100).contains(&d)));
        // 1000 draws over 21 levels should hit both ends.
        assert!(field.current().contains(&0));
        assert!(field.current().contains(&100));
    }

    #[test]
    fn test_seeded_fill_is_reproducible() {
        let mut a = field(8, 8, 8);
        let mut b = field(8, 8, 8);
        a.randomize_seeded(77);
        b.randomize_seeded(77);
        assert_eq!(a.current(), b.current());

        b.randomize_seeded(78);
        assert_ne!(a.current(), b.current());
    }

    #[test]
    fn test_time_seeded_fill_can_be_replayed() {
        let mut a = field(6, 6, 6);
        let seed = a.randomize();
        let mut b = field(6, 6, 6);
        b.randomize_seeded(seed);
        assert_eq!(a.current(), b.current());
    }

    #[test]
    fn test_random_fill_respects_max_density() {
        let mut field = DensityField::new(GridDims::new(8, 8, 8).unwrap(), 40).unwrap();
        field.randomize_seeded(5);
        assert!(field.within_bounds());
    }

    #[test]
    fn test_ramp_pattern() {
        let mut field = field(40, 1, 1);
        field.ramp();
        assert_eq!(field.read(0), 0);
        assert_eq!(field.read(31), 31);
        assert_eq!(field.read(32), 0);
        assert_eq!(field.read(39), 7);
    }

    #[test]
    fn test_randomized_ramp_doubles_at_most() {
        let mut field = field(64, 2, 1);
        field.randomized_ramp(9);
        for (i, &d) in field.current().iter().enumerate() {
            let base = (i % 32) as Density;
            assert!(d == base || d == base * 2, "cell {i}: {d} from base {base}");
        }
    }

    #[test]
    fn test_alternate_pattern() {
        let mut field = field(7, 1, 1);
        field.alternate(3, 100).unwrap();
        assert_eq!(field.current(), &[100, 0, 0, 100, 0, 0, 100]);
        assert!(matches!(
            field.alternate(0, 100),
            Err(FieldError::InvalidAlternateStride)
        ));
    }

    #[test]
    fn test_plane_fill() {
        let mut field = field(3, 4, 2);
        field.set_cell_value(0, 0, 0, 9).unwrap();
        field.plane(2, 60).unwrap();
        for i in 0..field.len() {
            let (_, y, _) = field.dims().to_coord(i);
            assert_eq!(field.read(i), if y == 2 { 60 } else { 0 });
        }
        assert!(matches!(
            field.plane(4, 60),
            Err(FieldError::PlaneOutOfBounds { level: 4, height: 4 })
        ));
    }

    #[test]
    fn test_clear_and_sum() {
        let mut field = field(4, 4, 4);
        field.fill(30);
        field.clear();
        assert_eq!(field.sum_of_density(), 0);
        field.set_cell_value(2, 2, 2, 50).unwrap();
        assert_eq!(field.sum_of_density(), 50);
    }

    #[test]
    fn test_fill_clamps_to_bound() {
        let mut field = field(2, 2, 2);
        field.fill(250);
        assert!(field.current().iter().all(|&d| d == 100));
    }

    #[test]
    fn test_carve_then_fill_round_trip() {
        let mut field = field(5, 4, 5);
        field.fill(100);
        field.carve_hollow_box(1);

        let dims = field.dims();
        for i in 0..field.len() {
            let (x, y, z) = dims.to_coord(i);
            let interior = (1..4).contains(&x) && (1..4).contains(&z) && y >= 1;
            assert_eq!(field.read(i), if interior { 0 } else { 100 }, "cell {x},{y},{z}");
        }

        field.fill_hollow_box(1);
        assert!(field.current().iter().all(|&d| d == 100));
    }

    #[test]
    fn test_carve_leaves_border_untouched() {
        let mut field = field(4, 3, 4);
        field.randomize_seeded(3);
        let before = field.current().to_vec();
        field.carve_hollow_box(1);

        let dims = field.dims();
        for i in 0..field.len() {
            let (x, y, z) = dims.to_coord(i);
            let border = x == 0 || x == 3 || z == 0 || z == 3 || y == 0;
            if border {
                assert_eq!(field.read(i), before[i]);
            } else {
                assert_eq!(field.read(i), 0);
            }
        }
    }

    #[test]
    fn test_apply_pattern_reports_seed() {
        let mut a = field(4, 4, 4);
        let used = a.apply_pattern(&Pattern::Random { seed: None }).unwrap();
        let mut b = field(4, 4, 4);
        b.apply_pattern(&Pattern::Random { seed: used }).unwrap();
        assert!(used.is_some());
        assert_eq!(a.current(), b.current());

        assert_eq!(a.apply_pattern(&Pattern::Ramp).unwrap(), None);
    }

    #[test]
    fn test_apply_points_fails_on_bad_coordinate() {
        let mut field = field(2, 2, 2);
        let pattern = Pattern::Points {
            values: vec![(0, 0, 0, 10), (2, 0, 0, 10)],
        };
        assert!(matches!(
            field.apply_pattern(&pattern),
            Err(FieldError::OutOfBounds { x: 2, .. })
        ));
    }

    #[test]
    fn test_oversized_inset_is_noop() {
        let mut field = field(3, 3, 3);
        field.fill(10);
        field.carve_hollow_box(5);
        assert!(field.current().iter().all(|&d| d == 10));
    }
}
