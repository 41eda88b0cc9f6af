//! Weighted 8-connected propagation graph
//!
//! Edge weights are travel times in minutes. The search runs outward from the
//! WUI, but fire travels *inward* towards it, so the edge `n → neighbour(n, d)`
//! is weighted with the rate at which fire spreads back along the opposite
//! direction `(d + 4) mod 8`:
//!
//! ```text
//! w = (cell / 2) · (1 / R_n(d̄) + 1 / R_nb(d̄))      axis directions
//! w = √2 · (cell / 2) · (1 / R_n(d̄) + 1 / R_nb(d̄))  diagonal directions
//! ```
//!
//! i.e. the time to cross half the source cell and half the destination cell.
//! The edge only exists if both rates are non-zero, so every stored weight is
//! strictly positive.

use crate::grid::{Direction, GridTopology};
use crate::spread::DirectionalSpreadField;
use rayon::prelude::*;
use std::f64::consts::SQRT_2;
use tracing::debug;

/// Inverse-rate travel times between each interior node and its neighbours
#[derive(Debug, Clone)]
pub struct PropagationGraph {
    topology: GridTopology,
    // node_count × 8, 0.0 = no edge
    weights: Vec<f64>,
}

impl PropagationGraph {
    /// Build edge weights for every interior node
    ///
    /// # Arguments
    /// * `topology` - Grid shape, must match the spread field
    /// * `spread` - Directional spread rates (m/min)
    /// * `cell_size` - Cell edge length (m)
    pub fn build(topology: GridTopology, spread: &DirectionalSpreadField, cell_size: f64) -> Self {
        let half_cell = cell_size / 2.0;
        let mut weights = vec![0.0; topology.node_count() * 8];

        weights
            .par_chunks_mut(8)
            .enumerate()
            .for_each(|(node, cell)| {
                let Some(neighbors) = topology.neighbors(node) else {
                    return;
                };
                for direction in Direction::ALL {
                    let back = direction.opposite();
                    let rate_here = spread.rate(node, back);
                    let rate_there = spread.rate(neighbors[direction.index()], back);
                    if rate_here <= 0.0 || rate_there <= 0.0 {
                        continue;
                    }

                    let straight = half_cell * (1.0 / rate_here + 1.0 / rate_there);
                    cell[direction.index()] = if direction.is_diagonal() {
                        SQRT_2 * straight
                    } else {
                        straight
                    };
                }
            });

        let graph = Self { topology, weights };
        debug!(
            "Propagation graph: {}x{} nodes, {} edges",
            topology.width(),
            topology.height(),
            graph.edge_count()
        );
        graph
    }

    /// Grid topology the graph was built on
    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    /// Travel time from `node` to its neighbour in `direction`, if the edge exists
    #[inline]
    pub fn weight(&self, node: usize, direction: Direction) -> Option<f64> {
        self.weights
            .get(node * 8 + direction.index())
            .copied()
            .filter(|&w| w > 0.0)
    }

    /// Outgoing edges of a node as `(direction, neighbour, weight)`
    pub fn edges(&self, node: usize) -> impl Iterator<Item = (Direction, usize, f64)> + '_ {
        let neighbors = self.topology.neighbors(node);
        Direction::ALL.into_iter().filter_map(move |direction| {
            let neighbor = neighbors?[direction.index()];
            self.weight(node, direction)
                .map(|weight| (direction, neighbor, weight))
        })
    }

    /// Number of existing directed edges
    pub fn edge_count(&self) -> usize {
        self.weights.iter().filter(|&&w| w > 0.0).count()
    }
}
