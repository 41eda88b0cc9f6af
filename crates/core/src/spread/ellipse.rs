//! Huygens Ellipse Directional Spread
//!
//! Converts a head-fire rate of spread and its azimuth into spread rates along
//! the 8 compass directions, treating every burning cell as the rear focus of
//! an elliptical wavelet (Richards 1990, Finney 1998).
//!
//! # References
//! - Anderson, H.E. (1983). "Predicting wind-driven wild land fire size and shape."
//!   USDA Forest Service Research Paper INT-305.
//! - Richards, G.D. (1990). "An elliptical growth model of forest fire fronts and its
//!   numerical solution." International Journal for Numerical Methods in Engineering, 30.
//! - Finney, M.A. (1998). "FARSITE: Fire Area Simulator - model development and
//!   evaluation." USDA Forest Service Research Paper RMRS-RP-4.

use super::field::SpreadField;
use crate::grid::Direction;
use nalgebra::Vector2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Length-to-breadth ratios this close to 1 are treated as circular
pub const DEGENERATE_LB_TOLERANCE: f64 = 1e-9;

/// Shape of the spread ellipse for a given mid-flame wind speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseShape {
    /// Length-to-breadth ratio (≥ 1)
    pub length_to_breadth: f64,
    /// Head-to-back spread ratio (≥ 1)
    pub head_to_back: f64,
}

impl EllipseShape {
    /// Circular spread: every direction advances at the head rate
    pub const CIRCULAR: EllipseShape = EllipseShape {
        length_to_breadth: 1.0,
        head_to_back: 1.0,
    };

    /// Ellipse shape from mid-flame wind speed (Anderson 1983)
    ///
    /// # Formula
    /// ```text
    /// LB = 0.936·e^(0.2566·U) + 0.461·e^(−0.1548·U) − 0.397
    /// HB = (LB + √(LB² − 1)) / (LB − √(LB² − 1))
    /// ```
    ///
    /// Calm wind makes `LB` collapse to 1 (and marginally below in floating
    /// point), where `√(LB² − 1)` is undefined. Those cases return
    /// [`EllipseShape::CIRCULAR`].
    pub fn from_wind_speed(mid_flame_wind_speed: f64) -> Self {
        let u = mid_flame_wind_speed;
        if !u.is_finite() || u <= 0.0 {
            return Self::CIRCULAR;
        }

        let lb = 0.936 * (0.2566 * u).exp() + 0.461 * (-0.1548 * u).exp() - 0.397;
        if lb <= 1.0 + DEGENERATE_LB_TOLERANCE {
            return Self::CIRCULAR;
        }

        let root = (lb * lb - 1.0).sqrt();
        Self {
            length_to_breadth: lb,
            head_to_back: (lb + root) / (lb - root),
        }
    }

    /// True when spread is the same in every direction
    pub fn is_circular(&self) -> bool {
        self.length_to_breadth <= 1.0 + DEGENERATE_LB_TOLERANCE
    }

    /// Spread rate towards each compass direction
    ///
    /// # Arguments
    /// * `ros` - Head-fire rate of spread (m/min)
    /// * `azimuth` - Head-fire direction, degrees clockwise from north
    ///
    /// # Formula
    /// ```text
    /// a = ros / (2·LB) · (1 + 1/HB)      (semi-minor)
    /// b = ros / 2 · (1 + 1/HB)           (semi-major)
    /// c = ros / 2 · (1 − 1/HB)           (focus offset)
    /// θ = bearing − azimuth
    /// R(θ) = ‖(a·sin θ, c + b·cos θ)‖
    /// ```
    pub fn directional_rates(&self, ros: f64, azimuth: f64) -> [f64; 8] {
        let inv_hb = 1.0 / self.head_to_back;
        let a = ros / (2.0 * self.length_to_breadth) * (1.0 + inv_hb);
        let b = ros / 2.0 * (1.0 + inv_hb);
        let c = ros / 2.0 * (1.0 - inv_hb);

        Direction::ALL.map(|direction| {
            let theta = (direction.bearing_degrees() - azimuth).to_radians();
            Vector2::new(a * theta.sin(), c + b * theta.cos()).norm()
        })
    }
}

/// Spread rate of every node in each of the 8 directions
///
/// Stored as `node_count × 8`, direction-minor.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalSpreadField {
    rates: Vec<f64>,
}

impl DirectionalSpreadField {
    /// Evaluate the ellipse at every active cell
    ///
    /// Inactive cells get zero in every direction. Rows are evaluated in
    /// parallel; each cell depends only on its own inputs so the result is
    /// identical to a sequential pass.
    pub fn compute(field: &SpreadField, shape: &EllipseShape) -> Self {
        let node_count = field.ros().len();
        let mut rates = vec![0.0; node_count * 8];

        rates
            .par_chunks_mut(8)
            .enumerate()
            .for_each(|(node, cell)| {
                if let Some((ros, azimuth)) = field.sample(node) {
                    cell.copy_from_slice(&shape.directional_rates(ros, azimuth));
                }
            });

        Self { rates }
    }

    /// Spread rate of `node` towards `direction` (0 outside the field)
    #[inline]
    pub fn rate(&self, node: usize, direction: Direction) -> f64 {
        self.rates
            .get(node * 8 + direction.index())
            .copied()
            .unwrap_or(0.0)
    }

    /// All 8 rates of a node
    pub fn rates(&self, node: usize) -> Option<&[f64]> {
        self.rates.get(node * 8..node * 8 + 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_calm_wind_is_circular() {
        let shape = EllipseShape::from_wind_speed(0.0);
        assert_eq!(shape, EllipseShape::CIRCULAR);
        assert!(shape.is_circular());

        let rates = shape.directional_rates(12.0, 37.0);
        for rate in rates {
            assert_relative_eq!(rate, 12.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_negative_and_nan_wind_are_circular() {
        assert_eq!(EllipseShape::from_wind_speed(-4.0), EllipseShape::CIRCULAR);
        assert_eq!(EllipseShape::from_wind_speed(f64::NAN), EllipseShape::CIRCULAR);
    }

    #[test]
    fn test_light_wind_never_produces_nan() {
        for i in 0..200 {
            let u = f64::from(i) * 0.005;
            let shape = EllipseShape::from_wind_speed(u);
            assert!(shape.length_to_breadth >= 1.0);
            assert!(shape.head_to_back.is_finite());
            assert!(shape
                .directional_rates(3.0, 45.0)
                .iter()
                .all(|r| r.is_finite()));
        }
    }

    #[test]
    fn test_ratios_grow_with_wind() {
        let low = EllipseShape::from_wind_speed(2.0);
        let high = EllipseShape::from_wind_speed(10.0);
        assert!(low.length_to_breadth > 1.0);
        assert!(high.length_to_breadth > low.length_to_breadth);
        assert!(high.head_to_back > low.head_to_back);
    }

    #[test]
    fn test_head_and_back_rates() {
        let shape = EllipseShape::from_wind_speed(8.0);
        let ros = 20.0;
        // Head fire pushing east
        let rates = shape.directional_rates(ros, 90.0);

        assert_relative_eq!(rates[Direction::East.index()], ros, epsilon = 1e-9);
        assert_relative_eq!(
            rates[Direction::West.index()],
            ros / shape.head_to_back,
            epsilon = 1e-9
        );
        // Flanks are symmetric about the spread axis
        assert_relative_eq!(
            rates[Direction::North.index()],
            rates[Direction::South.index()],
            epsilon = 1e-9
        );
        assert_relative_eq!(
            rates[Direction::NorthEast.index()],
            rates[Direction::SouthEast.index()],
            epsilon = 1e-9
        );
        // Head is the fastest direction
        let max = rates.iter().copied().fold(0.0, f64::max);
        assert_relative_eq!(max, rates[Direction::East.index()], epsilon = 1e-9);
    }

    #[test]
    fn test_inactive_cells_get_zero_rates() {
        use crate::grid::{Raster, NO_DATA};

        let ros = Raster::from_vec(2, 1, vec![10.0, NO_DATA]).unwrap();
        let azimuth = Raster::from_vec(2, 1, vec![0.0, NO_DATA]).unwrap();
        let field = SpreadField::new(ros, azimuth).unwrap();
        let directional =
            DirectionalSpreadField::compute(&field, &EllipseShape::from_wind_speed(5.0));

        assert!(directional.rates(0).unwrap().iter().all(|&r| r > 0.0));
        assert!(directional.rates(1).unwrap().iter().all(|&r| r == 0.0));
        assert_eq!(directional.rate(7, Direction::North), 0.0);
    }

    #[test]
    fn test_inputs_unchanged_and_deterministic() {
        let field = SpreadField::uniform(16, 16, 4.0, 135.0);
        let before = field.ros().clone();
        let shape = EllipseShape::from_wind_speed(6.0);
        let first = DirectionalSpreadField::compute(&field, &shape);
        let second = DirectionalSpreadField::compute(&field, &shape);
        assert_eq!(first, second);
        assert_eq!(field.ros(), &before);
    }
}
