//! Trigger buffer case configuration

use crate::error::TriggerError;
use serde::{Deserialize, Serialize};

/// Arrival time assigned to WUI seed nodes before the search starts
///
/// Cells at exactly the seed origin fall outside the `(0, T]` boundary band,
/// so with [`SeedOrigin::Zero`] the seeds themselves are not part of the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeedOrigin {
    /// Seeds start at 0 minutes
    #[default]
    Zero,
    /// Seeds start at 1 minute, the token value historically used by the
    /// trigger-modelling tools; shifts every arrival time by one minute
    UnitOffset,
}

impl SeedOrigin {
    /// Initial distance in minutes
    pub fn minutes(self) -> f64 {
        match self {
            SeedOrigin::Zero => 0.0,
            SeedOrigin::UnitOffset => 1.0,
        }
    }
}

/// How the boundary search treats nodes whose distance improves after they
/// have already been expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RelaxationMode {
    /// Expanded nodes may still be lowered but are never expanded again.
    /// Reproduces the classic trigger-buffer search. Distances downstream of
    /// such nodes can stay over-estimated, and how much depends on queue and
    /// direction order, so mirrored inputs or a larger buffer may disagree.
    SinglePass,
    /// Expanded nodes are re-queued whenever their distance improves, giving
    /// exact shortest arrival times within the buffer independent of
    /// processing order.
    #[default]
    Converged,
}

/// Parameters for one trigger buffer evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Cell edge length in meters
    pub cell_size: f64,

    /// Evacuation lead time in minutes
    pub trigger_buffer: u32,

    /// Mid-flame wind speed driving the ellipse shape (mi/h, as fitted by Anderson 1983)
    pub mid_flame_wind_speed: f64,

    /// Initial arrival time of seed nodes
    pub seed_origin: SeedOrigin,

    /// Re-expansion policy of the boundary search
    pub relaxation: RelaxationMode,

    /// Largest distance (cells) an unburned WUI cell may be snapped to burning
    /// ground; `None` for unlimited
    pub max_snap_distance: Option<f64>,

    /// Keep the combined distance field in the result for diagnostics
    pub keep_distances: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            cell_size: 30.0,
            trigger_buffer: 60,
            mid_flame_wind_speed: 0.0,
            seed_origin: SeedOrigin::Zero,
            relaxation: RelaxationMode::Converged,
            max_snap_distance: None,
            keep_distances: false,
        }
    }
}

impl TriggerConfig {
    /// Trigger buffer in minutes as a float
    pub fn buffer_minutes(&self) -> f64 {
        f64::from(self.trigger_buffer)
    }

    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<(), TriggerError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(TriggerError::not_positive("cell_size", self.cell_size));
        }
        if self.trigger_buffer == 0 {
            return Err(TriggerError::InvalidParameter {
                name: "trigger_buffer",
                message: "must be at least one minute".to_string(),
            });
        }
        if !self.mid_flame_wind_speed.is_finite() || self.mid_flame_wind_speed < 0.0 {
            return Err(TriggerError::InvalidParameter {
                name: "mid_flame_wind_speed",
                message: format!(
                    "must be finite and non-negative, got {}",
                    self.mid_flame_wind_speed
                ),
            });
        }
        if let Some(limit) = self.max_snap_distance {
            if !limit.is_finite() || limit < 0.0 {
                return Err(TriggerError::InvalidParameter {
                    name: "max_snap_distance",
                    message: format!("must be finite and non-negative, got {limit}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TriggerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let config = TriggerConfig {
            cell_size: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TriggerError::InvalidParameter {
                name: "cell_size",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_zero_buffer() {
        let config = TriggerConfig {
            trigger_buffer: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_wind_and_snap() {
        let config = TriggerConfig {
            mid_flame_wind_speed: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TriggerConfig {
            max_snap_distance: Some(f64::NAN),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_relaxation_is_order_independent() {
        assert_eq!(RelaxationMode::default(), RelaxationMode::Converged);
        assert_eq!(TriggerConfig::default().relaxation, RelaxationMode::Converged);
    }

    #[test]
    fn test_seed_origin_minutes() {
        assert_eq!(SeedOrigin::Zero.minutes(), 0.0);
        assert_eq!(SeedOrigin::UnitOffset.minutes(), 1.0);
    }
}
