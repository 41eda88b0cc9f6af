//! Rate-of-spread input field
//!
//! Pairs the spread magnitude raster (m/min) with the spread azimuth raster
//! (degrees clockwise from north). Cells holding [`NO_DATA`] in either raster
//! were never reached by fire and are treated as inactive.

use crate::error::TriggerError;
use crate::grid::{GridTopology, Raster, NO_DATA};

/// Per-cell spread magnitude and direction
#[derive(Debug, Clone)]
pub struct SpreadField {
    ros: Raster<f64>,
    azimuth: Raster<f64>,
    active: Vec<bool>,
}

impl SpreadField {
    /// Pair a magnitude raster with an azimuth raster
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::DimensionMismatch`] if the rasters differ in shape.
    pub fn new(ros: Raster<f64>, azimuth: Raster<f64>) -> Result<Self, TriggerError> {
        ros.ensure_same_shape(&azimuth, "azimuth")?;
        let active = ros
            .as_slice()
            .iter()
            .zip(azimuth.as_slice())
            .map(|(&r, &a)| is_active_value(r, a))
            .collect();
        Ok(Self {
            ros,
            azimuth,
            active,
        })
    }

    /// Pair nested `rows[y][x]` magnitude and azimuth grids
    ///
    /// # Errors
    ///
    /// [`TriggerError::InvalidDimensions`] for ragged or empty rows, otherwise
    /// as [`SpreadField::new`].
    pub fn from_rows(ros: Vec<Vec<f64>>, azimuth: Vec<Vec<f64>>) -> Result<Self, TriggerError> {
        Self::new(Raster::from_rows(ros)?, Raster::from_rows(azimuth)?)
    }

    /// Uniform field, handy for calibration runs
    pub fn uniform(width: usize, height: usize, ros: f64, azimuth: f64) -> Self {
        Self {
            ros: Raster::filled(width, height, ros),
            azimuth: Raster::filled(width, height, azimuth),
            active: vec![is_active_value(ros, azimuth); width * height],
        }
    }

    /// Spread magnitude raster (m/min)
    pub fn ros(&self) -> &Raster<f64> {
        &self.ros
    }

    /// Spread azimuth raster (degrees)
    pub fn azimuth(&self) -> &Raster<f64> {
        &self.azimuth
    }

    /// `(width, height)`
    pub fn dimensions(&self) -> (usize, usize) {
        self.ros.dimensions()
    }

    /// Topology matching this field's shape
    pub fn topology(&self) -> GridTopology {
        GridTopology::new(self.ros.width(), self.ros.height())
    }

    /// True if the node was reached by fire
    #[inline]
    pub fn is_active(&self, node: usize) -> bool {
        self.active.get(node).copied().unwrap_or(false)
    }

    /// Number of active cells
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    /// `(ros, azimuth)` at a node, `None` for inactive cells
    #[inline]
    pub fn sample(&self, node: usize) -> Option<(f64, f64)> {
        self.is_active(node)
            .then(|| (*self.ros.at(node), *self.azimuth.at(node)))
    }
}

/// Both values present, finite, and a non-negative magnitude
fn is_active_value(ros: f64, azimuth: f64) -> bool {
    ros.is_finite() && azimuth.is_finite() && ros != NO_DATA && azimuth != NO_DATA && ros >= 0.0
}
