//! Grid addressing for the flat density buffers.
//!
//! Cells are stored with X varying fastest: `index = x + y * width + z * width * height`.

use crate::schema::{ConfigError, Direction, checked_grid_size};

/// Fixed extents of the simulation box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    size_x: usize,
    size_y: usize,
    size_z: usize,
}

impl GridDims {
    pub fn new(size_x: usize, size_y: usize, size_z: usize) -> Result<Self, ConfigError> {
        checked_grid_size(size_x, size_y, size_z)?;
        Ok(Self {
            size_x,
            size_y,
            size_z,
        })
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.size_y
    }

    #[inline]
    pub fn size_z(&self) -> usize {
        self.size_z
    }

    /// Total number of cells. Cannot overflow; checked in [`new`](Self::new).
    #[inline]
    pub fn len(&self) -> usize {
        self.size_x * self.size_y * self.size_z
    }

    /// Always false; extents are validated non-zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.size_x && y < self.size_y && z < self.size_z
    }

    /// Convert (x, y, z) to a flat index.
    ///
    /// Coordinates must be in bounds; use [`checked_index`](Self::checked_index)
    /// when they come from outside the crate.
    #[inline]
    pub fn to_index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(
            self.contains(x, y, z),
            "({x}, {y}, {z}) outside {}x{}x{}",
            self.size_x,
            self.size_y,
            self.size_z
        );
        x + y * self.size_x + z * self.size_x * self.size_y
    }

    #[inline]
    pub fn checked_index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        self.contains(x, y, z).then(|| self.to_index(x, y, z))
    }

    /// Convert a flat index back to (x, y, z).
    #[inline]
    pub fn to_coord(&self, index: usize) -> (usize, usize, usize) {
        debug_assert!(index < self.len(), "index {index} outside grid of {}", self.len());
        let layer = self.size_x * self.size_y;
        let z = index / layer;
        let rest = index - z * layer;
        (rest % self.size_x, rest / self.size_x, z)
    }

    /// Index of the face-adjacent neighbour of `coord` in `direction`,
    /// or `None` at the outer faces.
    #[inline]
    pub fn neighbor(&self, coord: (usize, usize, usize), direction: Direction) -> Option<usize> {
        let (x, y, z) = coord;
        let (dx, dy, dz) = direction.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        let nz = z.checked_add_signed(dz)?;
        self.checked_index(nx, ny, nz)
    }
}

impl std::fmt::Display for GridDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.size_x, self.size_y, self.size_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_extent_rejected() {
        assert!(GridDims::new(0, 4, 4).is_err());
        assert!(GridDims::new(4, 4, 0).is_err());
    }

    #[test]
    fn test_extent_product_overflow_rejected() {
        assert!(matches!(
            GridDims::new(usize::MAX / 2, 4, 1),
            Err(ConfigError::GridTooLarge { .. })
        ));
        assert!(matches!(
            GridDims::new(1 << 20, 1 << 20, 1 << 30),
            Err(ConfigError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_x_varies_fastest() {
        let dims = GridDims::new(3, 4, 5).unwrap();
        assert_eq!(dims.to_index(0, 0, 0), 0);
        assert_eq!(dims.to_index(1, 0, 0), 1);
        assert_eq!(dims.to_index(0, 1, 0), 3);
        assert_eq!(dims.to_index(0, 0, 1), 12);
        assert_eq!(dims.to_index(2, 3, 4), dims.len() - 1);
    }

    #[test]
    fn test_checked_index_rejects_out_of_bounds() {
        let dims = GridDims::new(3, 4, 5).unwrap();
        assert_eq!(dims.checked_index(3, 0, 0), None);
        assert_eq!(dims.checked_index(0, 4, 0), None);
        assert_eq!(dims.checked_index(0, 0, 5), None);
        assert_eq!(dims.checked_index(2, 3, 4), Some(59));
    }

    #[test]
    fn test_neighbors_at_faces() {
        let dims = GridDims::new(2, 2, 2).unwrap();
        let origin = (0, 0, 0);
        assert_eq!(dims.neighbor(origin, Direction::Down), None);
        assert_eq!(dims.neighbor(origin, Direction::Left), None);
        assert_eq!(dims.neighbor(origin, Direction::Back), None);
        assert_eq!(dims.neighbor(origin, Direction::Up), Some(dims.to_index(0, 1, 0)));
        assert_eq!(dims.neighbor(origin, Direction::Right), Some(1));
        assert_eq!(
            dims.neighbor(origin, Direction::Forward),
            Some(dims.to_index(0, 0, 1))
        );

        let corner = (1, 1, 1);
        assert_eq!(dims.neighbor(corner, Direction::Up), None);
        assert_eq!(dims.neighbor(corner, Direction::Right), None);
        assert_eq!(dims.neighbor(corner, Direction::Forward), None);
    }

    #[test]
    fn test_index_coord_exhaustive_small() {
        let dims = GridDims::new(4, 3, 2).unwrap();
        for i in 0..dims.len() {
            let (x, y, z) = dims.to_coord(i);
            assert_eq!(dims.to_index(x, y, z), i);
        }
    }

    proptest! {
        #[test]
        fn prop_coord_index_bijection(
            sx in 1usize..40,
            sy in 1usize..40,
            sz in 1usize..40,
            fx in 0.0f64..1.0,
            fy in 0.0f64..1.0,
            fz in 0.0f64..1.0,
        ) {
            let dims = GridDims::new(sx, sy, sz).unwrap();
            let x = ((fx * sx as f64) as usize).min(sx - 1);
            let y = ((fy * sy as f64) as usize).min(sy - 1);
            let z = ((fz * sz as f64) as usize).min(sz - 1);
            let index = dims.to_index(x, y, z);
            prop_assert!(index < dims.len());
            prop_assert_eq!(dims.to_coord(index), (x, y, z));
        }
    }
}
