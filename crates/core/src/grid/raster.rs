//! Rectangular raster storage
//!
//! Stores 2D raster data as a flat `Vec<T>` in row-major order. This is the
//! only linearization used anywhere in the crate: cell `(x, y)` lives at
//! `y * width + x`, with `(0, 0)` the top-left cell and `y` growing southwards.

use crate::error::TriggerError;
use serde::{Deserialize, Serialize};

/// Value marking a cell with no data (never reached by fire)
pub const NO_DATA: f64 = -9999.0;

/// Raster container
///
/// `width` is the number of columns (`x`), `height` the number of rows (`y`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raster<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Clone> Raster<T> {
    /// Create a new raster with every cell set to `value`
    #[must_use]
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }
}

impl<T: Clone + Default> Raster<T> {
    /// Create a new raster with every cell set to `T::default()`
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T> Raster<T> {
    /// Wrap row-major data
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidDimensions`] if either dimension is zero
    /// or `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, TriggerError> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(TriggerError::InvalidDimensions {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build from nested rows (`rows[y][x]`)
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidDimensions`] if the rows are ragged or empty.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, TriggerError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(TriggerError::InvalidDimensions {
                    width,
                    height,
                    len: row.len(),
                });
            }
            data.extend(row);
        }
        Self::from_vec(width, height, data)
    }

    /// Grid width in cells (columns)
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells (rows)
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the raster holds no cells
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get reference to raster data
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get mutable reference to raster data
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Checked lookup by coordinate
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            self.data.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Checked mutable lookup by coordinate
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x < self.width && y < self.height {
            self.data.get_mut(y * self.width + x)
        } else {
            None
        }
    }

    /// Value at linear index
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds
    #[inline]
    pub fn at(&self, index: usize) -> &T {
        &self.data[index]
    }

    /// Error unless `other` has the same shape as `self`
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::DimensionMismatch`] naming `other`.
    pub fn ensure_same_shape<U>(
        &self,
        other: &Raster<U>,
        name: &'static str,
    ) -> Result<(), TriggerError> {
        if self.dimensions() == other.dimensions() {
            Ok(())
        } else {
            Err(TriggerError::DimensionMismatch {
                name,
                expected: self.dimensions(),
                actual: other.dimensions(),
            })
        }
    }

    /// Map every cell into a new raster of the same shape
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Raster<U> {
        Raster {
            data: self.data.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let raster = Raster::from_vec(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(raster.get(2, 0), Some(&2));
        assert_eq!(raster.get(0, 1), Some(&3));
        assert_eq!(*raster.at(4), 4);
        assert_eq!(raster.get(3, 0), None);
    }

    #[test]
    fn test_count_rasters_compare_exactly() {
        fn assert_total_eq<T: Eq + std::fmt::Debug>(a: &T, b: &T) {
            assert_eq!(a, b);
        }
        let a = Raster::from_rows(vec![vec![1_u32, 0], vec![2, 3]]).unwrap();
        let mut b = Raster::filled(2, 2, 0_u32);
        b.as_mut_slice().copy_from_slice(&[1, 0, 2, 3]);
        assert_total_eq(&a, &b);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Raster::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, TriggerError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Raster::from_vec(4, 4, vec![0_u32; 15]).is_err());
        assert!(Raster::<u32>::from_vec(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn test_shape_mismatch_names_raster() {
        let a = Raster::<f64>::new(4, 5);
        let b = Raster::<f64>::new(5, 4);
        let err = a.ensure_same_shape(&b, "azimuth").unwrap_err();
        assert_eq!(
            err,
            TriggerError::DimensionMismatch {
                name: "azimuth",
                expected: (4, 5),
                actual: (5, 4),
            }
        );
    }
}
