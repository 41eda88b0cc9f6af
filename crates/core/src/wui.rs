//! WUI projection onto the raster
//!
//! Turns a WUI outline into the seed nodes the boundary search starts from:
//!
//! 1. Polygon edges are drawn as digital lines (or the polygon is filled).
//! 2. Cells whose four axis neighbours are all WUI cells are dropped, leaving
//!    the perimeter. Interior cells can never be on a shortest path from the
//!    outside, so they are useless as seeds.
//! 3. Every remaining cell is checked against the raster extent (fatal if
//!    outside) and snapped to the nearest burning cell if fire never reached it.
//!
//! Coordinates are raster `(x, y)` = (column, row), origin top-left.

use crate::error::TriggerError;
use crate::grid::{Direction, GridTopology};
use crate::spread::SpreadField;
use nalgebra::Vector2;
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Raster coordinate as supplied by callers; signed so that bad input can be reported
pub type CellCoord = (i64, i64);

/// How the WUI is described
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WuiInput {
    /// Closed polygon; only its outline is rasterized
    Polygon(Vec<CellCoord>),
    /// Closed polygon, rasterized with its interior then reduced to the perimeter
    FilledPolygon(Vec<CellCoord>),
    /// Precomputed WUI cells (outline or filled)
    Cells(Vec<CellCoord>),
}

/// Result of validating one WUI cell against the spread field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedCorrection {
    /// The cell is active and usable as is
    Unchanged(usize),
    /// The cell was inactive and was moved to the nearest active cell
    Snapped {
        /// Original node
        from: usize,
        /// Replacement node
        to: usize,
    },
    /// No active cell qualifies as a replacement
    NoActiveCell,
}

/// Seeds derived from a WUI input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedProjection {
    /// Deduplicated seed nodes, in rasterization order
    pub seeds: Vec<usize>,
    /// `(from, to)` pairs for every snapped cell
    pub snapped: Vec<(usize, usize)>,
    /// Perimeter cells that could not be mapped to an active cell
    pub unmapped: Vec<usize>,
}

impl SeedProjection {
    /// True if no perimeter cell could be mapped onto burning ground
    pub fn is_unreachable(&self) -> bool {
        self.seeds.is_empty()
    }
}

/// Validates and projects WUI inputs onto a spread field
#[derive(Debug, Clone, Copy)]
pub struct WuiProjector<'a> {
    field: &'a SpreadField,
    topology: GridTopology,
    max_snap_distance: Option<f64>,
}

impl<'a> WuiProjector<'a> {
    /// Create a projector for `field`
    ///
    /// `max_snap_distance` bounds (in cells) how far an inactive WUI cell may be
    /// moved; `None` allows any distance.
    pub fn new(field: &'a SpreadField, max_snap_distance: Option<f64>) -> Self {
        Self {
            field,
            topology: field.topology(),
            max_snap_distance,
        }
    }

    /// Rasterize, reduce and correct a WUI input
    ///
    /// # Errors
    ///
    /// [`TriggerError::EmptyWui`] for an empty input and
    /// [`TriggerError::OutOfBoundsInput`] for any coordinate outside the raster.
    pub fn project(&self, input: &WuiInput) -> Result<SeedProjection, TriggerError> {
        let cells = match input {
            WuiInput::Polygon(vertices) => rasterize_polygon(vertices, &self.topology)?,
            WuiInput::FilledPolygon(vertices) => fill_polygon(vertices, &self.topology)?,
            WuiInput::Cells(cells) => {
                if cells.is_empty() {
                    return Err(TriggerError::EmptyWui);
                }
                let nodes = cells
                    .iter()
                    .map(|&cell| checked_node(cell, &self.topology))
                    .collect::<Result<Vec<_>, _>>()?;
                dedup_preserving_order(nodes)
            }
        };

        let perimeter = reduce_to_outer_boundary(&cells, &self.topology);
        debug!(
            "WUI rasterized to {} cells, {} on the perimeter",
            cells.len(),
            perimeter.len()
        );

        let mut projection = SeedProjection::default();
        let mut seen = FxHashSet::with_capacity_and_hasher(perimeter.len(), FxBuildHasher);
        for node in perimeter {
            let (x, y) = self.topology.delinearize(node);
            let coord = (x as i64, y as i64);
            match correct_out_of_bounds(coord, self.field, self.max_snap_distance)? {
                SeedCorrection::Unchanged(seed) => {
                    if seen.insert(seed) {
                        projection.seeds.push(seed);
                    }
                }
                SeedCorrection::Snapped { from, to } => {
                    projection.snapped.push((from, to));
                    if seen.insert(to) {
                        projection.seeds.push(to);
                    }
                }
                SeedCorrection::NoActiveCell => projection.unmapped.push(node),
            }
        }
        Ok(projection)
    }
}

/// Draw the outline of a closed polygon
///
/// Each edge (including last → first) is walked one cell at a time along its
/// major axis. At each step the minor coordinate may step down, stay or step
/// up; the candidate closest to the ideal line wins, ties going to "stay".
/// Segments are concatenated and duplicates removed, keeping first occurrence.
///
/// # Errors
///
/// [`TriggerError::EmptyWui`] for no vertices, [`TriggerError::OutOfBoundsInput`]
/// for a vertex outside the raster.
pub fn rasterize_polygon(
    vertices: &[CellCoord],
    topology: &GridTopology,
) -> Result<Vec<usize>, TriggerError> {
    if vertices.is_empty() {
        return Err(TriggerError::EmptyWui);
    }
    for &vertex in vertices {
        checked_node(vertex, topology)?;
    }

    let mut nodes = Vec::new();
    for (i, &start) in vertices.iter().enumerate() {
        let end = vertices[(i + 1) % vertices.len()];
        for cell in digital_line(start, end) {
            nodes.push(checked_node(cell, topology)?);
        }
    }
    Ok(dedup_preserving_order(nodes))
}

/// Cells of a line segment, both endpoints included
pub fn digital_line(start: CellCoord, end: CellCoord) -> Vec<CellCoord> {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let x_major = dx.abs() >= dy.abs();
    let (major_delta, minor_delta) = if x_major { (dx, dy) } else { (dy, dx) };
    let (major_start, minor_start) = if x_major {
        (start.0, start.1)
    } else {
        (start.1, start.0)
    };

    let steps = major_delta.abs();
    let major_step = major_delta.signum();
    let mut cells = Vec::with_capacity(steps as usize + 1);
    cells.push(start);

    let mut minor = minor_start;
    for i in 1..=steps {
        let ideal = minor_start as f64 + minor_delta as f64 * (i as f64 / steps as f64);
        // Order matters: "stay" wins ties
        minor = [minor, minor - 1, minor + 1]
            .into_iter()
            .fold((minor, f64::INFINITY), |best, candidate| {
                let deviation = (candidate as f64 - ideal).abs();
                if deviation < best.1 {
                    (candidate, deviation)
                } else {
                    best
                }
            })
            .0;
        let major = major_start + major_step * i;
        cells.push(if x_major { (major, minor) } else { (minor, major) });
    }
    cells
}

/// Rasterize a closed polygon including its interior
///
/// Interior cells are those whose centre passes the even-odd ray test; the
/// outline from [`rasterize_polygon`] is always included so thin polygons are
/// not lost. Outline cells come first, then interior cells in row-major order.
///
/// # Errors
///
/// Same as [`rasterize_polygon`].
pub fn fill_polygon(
    vertices: &[CellCoord],
    topology: &GridTopology,
) -> Result<Vec<usize>, TriggerError> {
    let mut nodes = rasterize_polygon(vertices, topology)?;

    let (min_x, max_x) = bounds(vertices.iter().map(|v| v.0));
    let (min_y, max_y) = bounds(vertices.iter().map(|v| v.1));
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if point_in_polygon((x as f64, y as f64), vertices) {
                nodes.push(checked_node((x, y), topology)?);
            }
        }
    }
    Ok(dedup_preserving_order(nodes))
}

/// Keep only nodes with at least one axis neighbour outside the set
///
/// Neighbours beyond the raster edge count as missing, so cells on the raster
/// border are always kept. Input order is preserved.
pub fn reduce_to_outer_boundary(nodes: &[usize], topology: &GridTopology) -> Vec<usize> {
    let members: FxHashSet<usize> = nodes.iter().copied().collect();
    let axis = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    nodes
        .iter()
        .copied()
        .filter(|&node| {
            axis.iter().any(|&direction| {
                match topology.offset_node(node, direction) {
                    Some(neighbor) => !members.contains(&neighbor),
                    None => true,
                }
            })
        })
        .collect()
}

/// Validate a WUI point and move it onto burning ground if needed
///
/// Active cells are returned unchanged. An inactive cell is replaced with the
/// nearest active cell by Euclidean distance (a linear scan of the whole
/// raster, earliest row-major index on ties). If no active cell exists, or the
/// nearest lies beyond `max_snap_distance` cells, [`SeedCorrection::NoActiveCell`]
/// is returned.
///
/// # Errors
///
/// [`TriggerError::OutOfBoundsInput`] if either coordinate is negative or
/// beyond the raster extent.
pub fn correct_out_of_bounds(
    point: CellCoord,
    field: &SpreadField,
    max_snap_distance: Option<f64>,
) -> Result<SeedCorrection, TriggerError> {
    let topology = field.topology();
    let node = checked_node(point, &topology)?;
    if field.is_active(node) {
        return Ok(SeedCorrection::Unchanged(node));
    }

    let origin = Vector2::new(point.0 as f64, point.1 as f64);
    let mut nearest: Option<(usize, f64)> = None;
    for candidate in 0..topology.node_count() {
        if !field.is_active(candidate) {
            continue;
        }
        let (x, y) = topology.delinearize(candidate);
        let distance_sq = (Vector2::new(x as f64, y as f64) - origin).norm_squared();
        let closer = match nearest {
            Some((_, best)) => distance_sq < best,
            None => true,
        };
        if closer {
            nearest = Some((candidate, distance_sq));
        }
    }

    let Some((to, distance_sq)) = nearest else {
        warn!(
            "WUI cell ({}, {}) is unburned and the raster has no active cells",
            point.0, point.1
        );
        return Ok(SeedCorrection::NoActiveCell);
    };

    let distance = distance_sq.sqrt();
    if max_snap_distance.is_some_and(|limit| distance > limit) {
        warn!(
            "WUI cell ({}, {}) is unburned; nearest active cell is {:.1} cells away",
            point.0, point.1, distance
        );
        return Ok(SeedCorrection::NoActiveCell);
    }

    let (to_x, to_y) = topology.delinearize(to);
    warn!(
        "WUI cell ({}, {}) is unburned, snapped to ({}, {}) {:.1} cells away",
        point.0, point.1, to_x, to_y, distance
    );
    Ok(SeedCorrection::Snapped { from: node, to })
}

/// Linear index of a coordinate, or an out-of-bounds error naming it
fn checked_node(cell: CellCoord, topology: &GridTopology) -> Result<usize, TriggerError> {
    let out_of_bounds = || TriggerError::OutOfBoundsInput {
        x: cell.0,
        y: cell.1,
        width: topology.width(),
        height: topology.height(),
    };
    let x = usize::try_from(cell.0).map_err(|_| out_of_bounds())?;
    let y = usize::try_from(cell.1).map_err(|_| out_of_bounds())?;
    topology.linearize(x, y).ok_or_else(out_of_bounds)
}

fn dedup_preserving_order(nodes: Vec<usize>) -> Vec<usize> {
    let mut seen = FxHashSet::with_capacity_and_hasher(nodes.len(), FxBuildHasher);
    nodes.into_iter().filter(|node| seen.insert(*node)).collect()
}

fn bounds(values: impl Iterator<Item = i64>) -> (i64, i64) {
    values.fold((i64::MAX, i64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Even-odd ray casting
fn point_in_polygon(point: (f64, f64), polygon: &[CellCoord]) -> bool {
    let (x, y) = point;
    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].0 as f64, polygon[i].1 as f64);
        let (xj, yj) = (polygon[j].0 as f64, polygon[j].1 as f64);

        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}
