//! Trigger boundary extraction
//!
//! Thresholds arrival-time fields at the trigger buffer and turns the result
//! into count rasters ("safety matrices") that can be overlaid across cases,
//! plus contour helpers for drawing one or more boundaries.

use crate::error::TriggerError;
use crate::grid::{Direction, GridTopology, Raster};
use crate::search::{within_buffer, DistanceField};
use serde::{Deserialize, Serialize};

/// Nodes whose arrival time lies in `(0, buffer]` in a single column, ascending
pub fn band_nodes(column: &DistanceField, buffer: f64) -> Vec<usize> {
    column
        .as_slice()
        .iter()
        .enumerate()
        .filter(|(_, &d)| d > 0.0 && within_buffer(d, buffer))
        .map(|(node, _)| node)
        .collect()
}

/// Union of the `(0, buffer]` bands of every column
///
/// Returns ascending, deduplicated node indices.
pub fn threshold_mask(columns: &[DistanceField], buffer: f64) -> Vec<usize> {
    let node_count = columns.iter().map(DistanceField::len).max().unwrap_or(0);
    let mut member = vec![false; node_count];
    for column in columns {
        for node in band_nodes(column, buffer) {
            member[node] = true;
        }
    }
    member
        .iter()
        .enumerate()
        .filter_map(|(node, &inside)| inside.then_some(node))
        .collect()
}

/// Per-cell count of boundary hits
///
/// Zero outside every trigger boundary; overlaying cases adds their counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyMatrix {
    counts: Raster<u32>,
}

impl SafetyMatrix {
    /// Empty matrix
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            counts: Raster::new(width, height),
        }
    }

    /// Increment every listed node once
    ///
    /// Nodes outside the matrix are ignored.
    pub fn accumulate(&mut self, nodes: &[usize]) {
        let (width, height) = self.counts.dimensions();
        let topology = GridTopology::new(width, height);
        for &node in nodes {
            if node >= topology.node_count() {
                continue;
            }
            let (x, y) = topology.delinearize(node);
            if let Some(count) = self.counts.get_mut(x, y) {
                *count += 1;
            }
        }
    }

    /// Add another matrix elementwise
    ///
    /// # Errors
    ///
    /// [`TriggerError::DimensionMismatch`] if the shapes differ.
    pub fn merge(&mut self, other: &SafetyMatrix) -> Result<(), TriggerError> {
        self.counts.ensure_same_shape(&other.counts, "safety_matrix")?;
        for (mine, theirs) in self
            .counts
            .as_mut_slice()
            .iter_mut()
            .zip(other.counts.as_slice())
        {
            *mine += theirs;
        }
        Ok(())
    }

    /// Count at `(x, y)`, 0 outside the matrix
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.counts.get(x, y).copied().unwrap_or(0)
    }

    /// True if `(x, y)` is inside some trigger boundary
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.get(x, y) > 0
    }

    /// Number of cells with a non-zero count
    pub fn covered_cells(&self) -> usize {
        self.counts.as_slice().iter().filter(|&&c| c > 0).count()
    }

    /// True if no cell has been counted
    pub fn is_empty(&self) -> bool {
        self.covered_cells() == 0
    }

    /// Counts as a raster
    pub fn as_raster(&self) -> &Raster<u32> {
        &self.counts
    }

    /// Consume into the count raster
    pub fn into_raster(self) -> Raster<u32> {
        self.counts
    }

    /// Fraction of `ensemble_size` runs that placed each cell inside the boundary
    pub fn to_probability(&self, ensemble_size: u32) -> Raster<f64> {
        let n = f64::from(ensemble_size.max(1));
        self.counts.map(|&c| f64::from(c) / n)
    }
}

/// Count raster of a set of boundary nodes
pub fn safety_matrix(nodes: &[usize], topology: &GridTopology) -> SafetyMatrix {
    let mut matrix = SafetyMatrix::new(topology.width(), topology.height());
    matrix.accumulate(nodes);
    matrix
}

/// Outer contour of a filled mask
///
/// Keeps non-zero cells with at least one zero N/E/S/W neighbour. Cells past
/// the raster edge count as zero, so regions touching the edge stay closed.
pub fn line_boundary(mask: &Raster<u32>) -> Vec<usize> {
    let topology = GridTopology::new(mask.width(), mask.height());
    let axis = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    (0..topology.node_count())
        .filter(|&node| *mask.at(node) != 0)
        .filter(|&node| {
            axis.iter()
                .any(|&direction| match topology.offset_node(node, direction) {
                    Some(neighbor) => *mask.at(neighbor) == 0,
                    None => true,
                })
        })
        .collect()
}

/// Nested contour lines of an ensemble count raster
///
/// For each threshold (processed in ascending order) the cells with
/// `count >= threshold` are reduced to their outer contour and labelled with
/// the threshold's 1-based rank. Where contours coincide the higher rank wins.
pub fn compound_boundary(counts: &Raster<u32>, thresholds: &[u32]) -> Raster<u32> {
    let mut sorted = thresholds.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut compound = Raster::new(counts.width(), counts.height());
    for (rank, &threshold) in sorted.iter().enumerate() {
        let band = counts.map(|&c| u32::from(c >= threshold && c > 0));
        for node in line_boundary(&band) {
            compound.as_mut_slice()[node] = rank as u32 + 1;
        }
    }
    compound
}

/// Filled probability bands
///
/// Each cell holds the number of `levels` its probability meets or exceeds,
/// so nested contour regions come out as dense integer bands. Zero-probability
/// cells are always 0.
pub fn dense_boundary_from_prob(probability: &Raster<f64>, levels: &[f64]) -> Raster<u32> {
    probability.map(|&p| {
        if p > 0.0 {
            levels.iter().filter(|&&level| p >= level).count() as u32
        } else {
            0
        }
    })
}
