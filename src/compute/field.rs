//! Double-buffered density storage.
//!
//! Sweeps read `current` and write `next`; [`DensityField::commit`] swaps the
//! two so the freshly written buffer becomes readable.

use crate::schema::{ConfigError, Density};

use super::GridDims;

/// Errors from reading or editing individual cells.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("Cell ({x}, {y}, {z}) is outside the {dims} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        z: usize,
        dims: GridDims,
    },
    #[error("Density {value} outside [0, {max}]")]
    DensityOutOfRange { value: Density, max: Density },
    #[error("Plane level {level} outside grid height {height}")]
    PlaneOutOfBounds { level: usize, height: usize },
    #[error("Alternate stride must be non-zero")]
    InvalidAlternateStride,
}

/// Current and next density buffers plus the grid they describe.
pub struct DensityField {
    dims: GridDims,
    max_density: Density,
    current: Vec<Density>,
    next: Vec<Density>,
}

impl DensityField {
    /// Allocate both buffers, zero-filled.
    pub fn new(dims: GridDims, max_density: Density) -> Result<Self, ConfigError> {
        if max_density <= 0 {
            return Err(ConfigError::InvalidMaxDensity(max_density));
        }
        Ok(Self {
            dims,
            max_density,
            current: vec![0; dims.len()],
            next: vec![0; dims.len()],
        })
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn max_density(&self) -> Density {
        self.max_density
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Read-only view of the committed buffer.
    #[inline]
    pub fn current(&self) -> &[Density] {
        &self.current
    }

    #[inline]
    pub fn read(&self, index: usize) -> Density {
        self.current[index]
    }

    /// Write into the next buffer. Invisible until [`commit`](Self::commit).
    ///
    /// Sweeps stage in bulk through [`sweep_buffers`](Self::sweep_buffers).
    #[cfg(test)]
    #[inline]
    pub(crate) fn stage(&mut self, index: usize, density: Density) {
        self.next[index] = density;
    }

    /// Swap buffer roles. Every index of `next` must have been staged since
    /// the previous commit.
    #[inline]
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Split borrow for a sweep: snapshot to read from, buffer to fill.
    #[inline]
    pub(crate) fn sweep_buffers(&mut self) -> (&[Density], &mut [Density]) {
        (&self.current, &mut self.next)
    }

    /// Direct mutable access to the committed buffer for bulk edits.
    #[inline]
    pub(crate) fn current_mut(&mut self) -> &mut [Density] {
        &mut self.current
    }

    fn index_of(&self, x: usize, y: usize, z: usize) -> Result<usize, FieldError> {
        self.dims
            .checked_index(x, y, z)
            .ok_or(FieldError::OutOfBounds {
                x,
                y,
                z,
                dims: self.dims,
            })
    }

    /// Density at (x, y, z).
    pub fn get_cell_value(&self, x: usize, y: usize, z: usize) -> Result<Density, FieldError> {
        Ok(self.current[self.index_of(x, y, z)?])
    }

    /// Overwrite one cell of the committed buffer.
    pub fn set_cell_value(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        density: Density,
    ) -> Result<(), FieldError> {
        if !(0..=self.max_density).contains(&density) {
            return Err(FieldError::DensityOutOfRange {
                value: density,
                max: self.max_density,
            });
        }
        let index = self.index_of(x, y, z)?;
        self.current[index] = density;
        Ok(())
    }

    /// Sum of every committed cell.
    pub fn sum_of_density(&self) -> i64 {
        self.current.iter().map(|&d| i64::from(d)).sum()
    }

    /// True when every committed cell lies in `[0, max_density]`.
    #[cfg(test)]
    pub(crate) fn within_bounds(&self) -> bool {
        self.current
            .iter()
            .all(|&d| (0..=self.max_density).contains(&d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(x: usize, y: usize, z: usize) -> DensityField {
        DensityField::new(GridDims::new(x, y, z).unwrap(), 100).unwrap()
    }

    #[test]
    fn test_new_field_is_zeroed() {
        let field = field(3, 4, 5);
        assert_eq!(field.len(), 60);
        assert!(field.current().iter().all(|&d| d == 0));
        assert_eq!(field.sum_of_density(), 0);
    }

    #[test]
    fn test_point_edit_and_sum() {
        let mut field = field(4, 4, 4);
        assert_eq!(field.sum_of_density(), 0);
        field.set_cell_value(1, 2, 3, 50).unwrap();
        assert_eq!(field.sum_of_density(), 50);
        assert_eq!(field.get_cell_value(1, 2, 3).unwrap(), 50);
        assert_eq!(field.read(field.dims().to_index(1, 2, 3)), 50);
    }

    #[test]
    fn test_out_of_bounds_access_fails() {
        let mut field = field(4, 4, 4);
        assert!(matches!(
            field.get_cell_value(4, 0, 0),
            Err(FieldError::OutOfBounds { x: 4, .. })
        ));
        assert!(matches!(
            field.set_cell_value(0, 0, 9, 1),
            Err(FieldError::OutOfBounds { z: 9, .. })
        ));
        // The failed edit must not land anywhere.
        assert_eq!(field.sum_of_density(), 0);
    }

    #[test]
    fn test_point_edit_rejects_out_of_range_density() {
        let mut field = field(2, 2, 2);
        assert!(matches!(
            field.set_cell_value(0, 0, 0, 101),
            Err(FieldError::DensityOutOfRange { value: 101, max: 100 })
        ));
        assert!(field.set_cell_value(0, 0, 0, -1).is_err());
    }

    #[test]
    fn test_stage_is_invisible_until_commit() {
        let mut field = field(2, 1, 1);
        field.stage(0, 7);
        field.stage(1, 9);
        assert_eq!(field.current(), &[0, 0]);
        field.commit();
        assert_eq!(field.current(), &[7, 9]);
    }

    #[test]
    fn test_sum_uses_wide_accumulator() {
        let mut field = DensityField::new(GridDims::new(8, 8, 8).unwrap(), i32::MAX).unwrap();
        field.current_mut().fill(i32::MAX);
        assert_eq!(field.sum_of_density(), 512 * i64::from(i32::MAX));
    }

    #[test]
    fn test_non_positive_bound_rejected() {
        let dims = GridDims::new(2, 2, 2).unwrap();
        assert!(matches!(
            DensityField::new(dims, -5),
            Err(ConfigError::InvalidMaxDensity(-5))
        ));
        assert!(matches!(
            DensityField::new(dims, 0),
            Err(ConfigError::InvalidMaxDensity(0))
        ));
    }
}
