//! Buffer-bounded arrival-time search
//!
//! Label-correcting relaxation (Bellman-Ford family) over the propagation
//! graph, driven by a FIFO worklist seeded with the WUI perimeter. Expansion
//! stops at the trigger buffer: a node is only queued while its tentative
//! arrival time is within the buffer, so the explored region is bounded by the
//! buffer radius rather than the raster size.
//!
//! # Algorithm
//! 1. Seeds start at the seed origin, every other node at +∞.
//! 2. Pop the front node. Nodes within [`EDGE_MARGIN`] cells of the raster
//!    edge are not expanded.
//! 3. For each edge `w`, lower the neighbour to `d + w` if that is smaller;
//!    queue it if it is not queued, active, within the buffer and (in
//!    [`RelaxationMode::SinglePass`]) not yet expanded.
//! 4. Stop when the queue is empty.
//!
//! In the default [`RelaxationMode::Converged`] an expanded node is queued
//! again whenever its distance drops, so the result is the exact shortest
//! arrival time within the buffer whatever the queue order. Symmetric inputs
//! give symmetric boundaries and a larger buffer never loses cells.
//! [`RelaxationMode::SinglePass`] keeps the classic never-re-expand rule and
//! gives neither guarantee.

use crate::config::{RelaxationMode, SeedOrigin, TriggerConfig};
use crate::graph::PropagationGraph;
use crate::grid::{GridTopology, Raster};
use crate::spread::SpreadField;
use rayon::prelude::*;
use std::collections::VecDeque;
use tracing::debug;

/// Nodes closer than this to the raster edge are never expanded
pub const EDGE_MARGIN: usize = 2;

/// Slack when comparing accumulated arrival times against the buffer
pub const BUFFER_TOLERANCE: f64 = 1e-9;

/// True if an arrival time lies within `buffer` minutes
#[inline]
pub fn within_buffer(distance: f64, buffer: f64) -> bool {
    distance <= buffer + BUFFER_TOLERANCE
}

/// Arrival time (minutes) of every node from the nearest seed
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceField {
    distances: Vec<f64>,
}

impl DistanceField {
    /// Field with every node unreached
    pub fn unreached(node_count: usize) -> Self {
        Self {
            distances: vec![f64::INFINITY; node_count],
        }
    }

    /// Wrap precomputed arrival times (row-major, +∞ for unreached)
    pub fn from_vec(distances: Vec<f64>) -> Self {
        Self { distances }
    }

    /// Arrival time at `node`, +∞ if unreached or out of range
    #[inline]
    pub fn get(&self, node: usize) -> f64 {
        self.distances.get(node).copied().unwrap_or(f64::INFINITY)
    }

    /// True if the search assigned a finite arrival time
    #[inline]
    pub fn is_reached(&self, node: usize) -> bool {
        self.get(node).is_finite()
    }

    /// Number of nodes covered
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// True if the field covers no nodes
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Number of nodes with a finite arrival time
    pub fn reached_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_finite()).count()
    }

    /// Raw arrival times, row-major
    pub fn as_slice(&self) -> &[f64] {
        &self.distances
    }

    /// Keep the elementwise minimum of `self` and `other`
    pub fn min_assign(&mut self, other: &DistanceField) {
        for (mine, theirs) in self.distances.iter_mut().zip(&other.distances) {
            *mine = mine.min(*theirs);
        }
    }

    /// Copy into a raster of the given shape
    pub fn to_raster(&self, topology: &GridTopology) -> Raster<f64> {
        let mut raster = Raster::filled(topology.width(), topology.height(), f64::INFINITY);
        let len = raster.len().min(self.distances.len());
        raster.as_mut_slice()[..len].copy_from_slice(&self.distances[..len]);
        raster
    }
}

/// Search over a propagation graph bounded by the trigger buffer
#[derive(Debug, Clone, Copy)]
pub struct BoundarySearch<'a> {
    graph: &'a PropagationGraph,
    field: &'a SpreadField,
    buffer: f64,
    seed_origin: SeedOrigin,
    relaxation: RelaxationMode,
}

impl<'a> BoundarySearch<'a> {
    /// Create a search using the buffer, seed origin and relaxation mode of `config`
    pub fn new(graph: &'a PropagationGraph, field: &'a SpreadField, config: &TriggerConfig) -> Self {
        Self {
            graph,
            field,
            buffer: config.buffer_minutes(),
            seed_origin: config.seed_origin,
            relaxation: config.relaxation,
        }
    }

    /// Trigger buffer in minutes
    pub fn buffer(&self) -> f64 {
        self.buffer
    }

    /// Multi-source search from all `seeds` at once
    ///
    /// Seeds outside the graph are ignored.
    pub fn run(&self, seeds: &[usize]) -> DistanceField {
        let topology = self.graph.topology();
        let node_count = topology.node_count();

        let mut distance = DistanceField::unreached(node_count);
        let mut visited = vec![false; node_count];
        let mut queued = vec![false; node_count];
        let mut queue = VecDeque::with_capacity(seeds.len());

        for &seed in seeds {
            if seed < node_count && !queued[seed] {
                distance.distances[seed] = self.seed_origin.minutes();
                queued[seed] = true;
                queue.push_back(seed);
            }
        }

        let mut expanded = 0_usize;
        while let Some(current) = queue.pop_front() {
            queued[current] = false;
            if topology.distance_to_edge(current) < EDGE_MARGIN {
                visited[current] = true;
                continue;
            }

            let base = distance.distances[current];
            for (_, neighbor, weight) in self.graph.edges(current) {
                let candidate = base + weight;
                if candidate >= distance.distances[neighbor] {
                    continue;
                }
                distance.distances[neighbor] = candidate;

                let expandable = match self.relaxation {
                    RelaxationMode::SinglePass => !visited[neighbor],
                    RelaxationMode::Converged => true,
                };
                if expandable
                    && !queued[neighbor]
                    && self.field.is_active(neighbor)
                    && within_buffer(candidate, self.buffer)
                {
                    queued[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
            visited[current] = true;
            expanded += 1;
        }

        debug!(
            "Boundary search from {} seeds: {} expansions, {} nodes reached",
            seeds.len(),
            expanded,
            distance.reached_count()
        );
        distance
    }

    /// One independent search per seed, columns in seed order
    pub fn run_per_seed(&self, seeds: &[usize]) -> Vec<DistanceField> {
        self.map_per_seed(seeds, |column| column)
    }

    /// One independent search per seed, reducing each column with `reduce`
    ///
    /// Seeds are searched in parallel; results are returned in seed order so
    /// the output does not depend on scheduling.
    pub fn map_per_seed<R, F>(&self, seeds: &[usize], reduce: F) -> Vec<R>
    where
        R: Send,
        F: Fn(DistanceField) -> R + Sync,
    {
        seeds
            .par_iter()
            .map(|&seed| reduce(self.run(&[seed])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Raster, NO_DATA};
    use crate::spread::{DirectionalSpreadField, EllipseShape};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::cmp::Ordering;
    use std::collections::BinaryHeap;
    use std::f64::consts::SQRT_2;

    fn build(field: &SpreadField, wind: f64, cell: f64) -> PropagationGraph {
        let spread = DirectionalSpreadField::compute(field, &EllipseShape::from_wind_speed(wind));
        PropagationGraph::build(field.topology(), &spread, cell)
    }

    fn config(buffer: u32, relaxation: RelaxationMode) -> TriggerConfig {
        TriggerConfig {
            cell_size: 10.0,
            trigger_buffer: buffer,
            relaxation,
            ..Default::default()
        }
    }

    #[test]
    fn test_uniform_distances() {
        let field = SpreadField::uniform(10, 10, 10.0, 0.0);
        let graph = build(&field, 0.0, 10.0);
        let topo = *graph.topology();
        let search = BoundarySearch::new(&graph, &field, &config(2, RelaxationMode::SinglePass));

        let seed = topo.linearize(5, 5).unwrap();
        let distance = search.run(&[seed]);

        assert_eq!(distance.get(seed), 0.0);
        assert_relative_eq!(distance.get(topo.linearize(5, 3).unwrap()), 2.0);
        assert_relative_eq!(distance.get(topo.linearize(7, 5).unwrap()), 2.0);
        assert_relative_eq!(
            distance.get(topo.linearize(6, 6).unwrap()),
            SQRT_2,
            epsilon = 1e-12
        );
        // Reached by relaxation but never expanded: beyond the buffer
        assert_relative_eq!(distance.get(topo.linearize(5, 2).unwrap()), 3.0);
        assert!(!distance.is_reached(topo.linearize(5, 1).unwrap()));
    }

    #[test]
    fn test_unit_offset_shifts_distances() {
        let field = SpreadField::uniform(10, 10, 10.0, 0.0);
        let graph = build(&field, 0.0, 10.0);
        let topo = *graph.topology();
        let config = TriggerConfig {
            seed_origin: SeedOrigin::UnitOffset,
            ..config(3, RelaxationMode::SinglePass)
        };
        let seed = topo.linearize(5, 5).unwrap();
        let distance = BoundarySearch::new(&graph, &field, &config).run(&[seed]);

        assert_eq!(distance.get(seed), 1.0);
        assert_relative_eq!(distance.get(topo.linearize(5, 4).unwrap()), 2.0);
    }

    #[test]
    fn test_seed_near_edge_is_not_expanded() {
        let field = SpreadField::uniform(10, 10, 10.0, 0.0);
        let graph = build(&field, 0.0, 10.0);
        let topo = *graph.topology();
        let search = BoundarySearch::new(&graph, &field, &config(5, RelaxationMode::SinglePass));

        let seed = topo.linearize(1, 5).unwrap();
        let distance = search.run(&[seed]);
        assert_eq!(distance.reached_count(), 1);
    }

    #[test]
    fn test_inactive_cells_block_spread() {
        // Vertical firebreak at x = 6
        let mut ros = vec![10.0; 144];
        for y in 0..12 {
            ros[y * 12 + 6] = NO_DATA;
        }
        let field = SpreadField::new(
            Raster::from_vec(12, 12, ros).unwrap(),
            Raster::filled(12, 12, 0.0),
        )
        .unwrap();
        let graph = build(&field, 0.0, 10.0);
        let topo = *graph.topology();
        let search = BoundarySearch::new(&graph, &field, &config(20, RelaxationMode::Converged));

        let distance = search.run(&[topo.linearize(4, 6).unwrap()]);
        assert!(distance.is_reached(topo.linearize(5, 6).unwrap()));
        assert!(!distance.is_reached(topo.linearize(6, 6).unwrap()));
        assert!(!distance.is_reached(topo.linearize(7, 6).unwrap()));
    }

    #[test]
    fn test_multi_source_is_min_of_per_seed() {
        let field = SpreadField::uniform(20, 20, 6.0, 30.0);
        let graph = build(&field, 4.0, 10.0);
        let topo = *graph.topology();
        let search = BoundarySearch::new(&graph, &field, &config(8, RelaxationMode::Converged));

        let seeds = [
            topo.linearize(6, 6).unwrap(),
            topo.linearize(12, 10).unwrap(),
        ];
        let combined = search.run(&seeds);
        let columns = search.run_per_seed(&seeds);
        assert_eq!(columns.len(), 2);

        let mut folded = columns[0].clone();
        folded.min_assign(&columns[1]);
        for node in 0..topo.node_count() {
            let (a, b) = (combined.get(node), folded.get(node));
            if within_buffer(a, search.buffer()) || within_buffer(b, search.buffer()) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
    }

    /// Reference Dijkstra with the same expansion rules as the search
    fn reference_distances(
        graph: &PropagationGraph,
        field: &SpreadField,
        seeds: &[usize],
        buffer: f64,
    ) -> Vec<f64> {
        #[derive(PartialEq)]
        struct Entry(f64, usize);
        impl Eq for Entry {}
        impl Ord for Entry {
            fn cmp(&self, other: &Self) -> Ordering {
                other.0.total_cmp(&self.0)
            }
        }
        impl PartialOrd for Entry {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let topo = graph.topology();
        let mut distance = vec![f64::INFINITY; topo.node_count()];
        let mut heap = BinaryHeap::new();
        for &seed in seeds {
            distance[seed] = 0.0;
            heap.push(Entry(0.0, seed));
        }
        while let Some(Entry(d, node)) = heap.pop() {
            if d > distance[node] || topo.distance_to_edge(node) < EDGE_MARGIN {
                continue;
            }
            for (_, neighbor, weight) in graph.edges(node) {
                let candidate = d + weight;
                if candidate < distance[neighbor] {
                    distance[neighbor] = candidate;
                    if field.is_active(neighbor) && within_buffer(candidate, buffer) {
                        heap.push(Entry(candidate, neighbor));
                    }
                }
            }
        }
        distance
    }

    fn random_field(rng: &mut StdRng, size: usize) -> SpreadField {
        let mut ros = Vec::with_capacity(size * size);
        let mut azimuth = Vec::with_capacity(size * size);
        for _ in 0..size * size {
            if rng.random_range(0.0..1.0) < 0.1 {
                ros.push(NO_DATA);
                azimuth.push(NO_DATA);
            } else {
                ros.push(rng.random_range(0.5..25.0));
                azimuth.push(rng.random_range(0.0..360.0));
            }
        }
        SpreadField::new(
            Raster::from_vec(size, size, ros).unwrap(),
            Raster::from_vec(size, size, azimuth).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_converged_matches_dijkstra() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..5 {
            let field = random_field(&mut rng, 24);
            let graph = build(&field, 6.0, 30.0);
            let topo = *graph.topology();
            let seeds: Vec<usize> = topo
                .interior_nodes()
                .filter(|&n| field.is_active(n) && topo.distance_to_edge(n) >= 8)
                .take(3)
                .collect();
            let config = config(30, RelaxationMode::Converged);
            let search = BoundarySearch::new(&graph, &field, &config);

            let found = search.run(&seeds);
            let expected = reference_distances(&graph, &field, &seeds, search.buffer());
            for node in 0..topo.node_count() {
                let (got, want) = (found.get(node), expected[node]);
                if want.is_infinite() {
                    assert!(got.is_infinite(), "node {node}: {got} vs unreached");
                } else {
                    assert_relative_eq!(got, want, epsilon = 1e-9, max_relative = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_single_pass_never_underestimates() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..5 {
            let field = random_field(&mut rng, 24);
            let graph = build(&field, 10.0, 30.0);
            let topo = *graph.topology();
            let seeds: Vec<usize> = topo
                .interior_nodes()
                .filter(|&n| field.is_active(n) && topo.distance_to_edge(n) >= 6)
                .step_by(37)
                .take(4)
                .collect();

            let single = BoundarySearch::new(&graph, &field, &config(25, RelaxationMode::SinglePass))
                .run(&seeds);
            let exact = BoundarySearch::new(&graph, &field, &config(25, RelaxationMode::Converged))
                .run(&seeds);
            for node in 0..topo.node_count() {
                assert!(single.get(node) + 1e-9 >= exact.get(node));
            }
        }
    }

    #[test]
    fn test_search_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = random_field(&mut rng, 20);
        let graph = build(&field, 3.0, 30.0);
        let seeds: Vec<usize> = graph
            .topology()
            .interior_nodes()
            .filter(|&n| field.is_active(n))
            .skip(60)
            .take(5)
            .collect();
        let search = BoundarySearch::new(&graph, &field, &config(40, RelaxationMode::SinglePass));

        assert_eq!(search.run(&seeds), search.run(&seeds));
        assert_eq!(search.run_per_seed(&seeds), search.run_per_seed(&seeds));
    }

    #[test]
    fn test_distance_field_to_raster() {
        let topo = GridTopology::new(3, 2);
        let mut field = DistanceField::unreached(6);
        field.distances[4] = 2.5;
        let raster = field.to_raster(&topo);
        assert_eq!(raster.get(1, 1), Some(&2.5));
        assert_eq!(raster.get(0, 0), Some(&f64::INFINITY));
    }
}
