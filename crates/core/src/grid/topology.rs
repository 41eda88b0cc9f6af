//! 8-connected grid topology
//!
//! Maps `(x, y)` raster coordinates to linear node indices and back, and
//! answers neighbour queries in fixed compass order.
//!
//! # Linearization
//!
//! Row-major, `node = y * width + x`, origin top-left, `y` increasing south.
//! North is therefore `y - 1`.
//!
//! # Interior nodes
//!
//! Only nodes with all 8 neighbours inside the raster are interior
//! (`1 ≤ x ≤ width-2`, `1 ≤ y ≤ height-2`). The outermost ring only ever
//! appears as somebody else's neighbour; asking for its neighbours yields
//! `None` rather than a placeholder index.

use serde::{Deserialize, Serialize};

/// Compass direction, index 0 = North stepping 45° clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// All directions in index order
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Index into per-direction arrays (0 = N, clockwise)
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for an index in `0..8`
    #[inline]
    pub const fn from_index(index: usize) -> Direction {
        Self::ALL[index % 8]
    }

    /// Direction pointing the other way
    #[inline]
    pub const fn opposite(self) -> Direction {
        Self::from_index(self.index() + 4)
    }

    /// Diagonal moves cost √2 cell lengths
    #[inline]
    pub const fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    /// Compass bearing in degrees clockwise from north
    #[inline]
    pub fn bearing_degrees(self) -> f64 {
        self.index() as f64 * 45.0
    }

    /// `(dx, dy)` grid offset; `dy = -1` is north
    #[inline]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }
}

/// Node indexing and neighbour lookup for a `width × height` raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTopology {
    width: usize,
    height: usize,
}

impl GridTopology {
    /// Create topology for a raster of `width` columns and `height` rows
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of nodes
    #[inline]
    pub fn node_count(&self) -> usize {
        self.width * self.height
    }

    /// True if `(x, y)` is inside the raster
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Linear index of `(x, y)`; `None` outside the raster
    #[inline]
    pub fn linearize(&self, x: usize, y: usize) -> Option<usize> {
        self.contains(x, y).then(|| y * self.width + x)
    }

    /// `(x, y)` of a linear index
    #[inline]
    pub fn delinearize(&self, node: usize) -> (usize, usize) {
        (node % self.width, node / self.width)
    }

    /// True if the node has all 8 neighbours inside the raster
    #[inline]
    pub fn is_interior(&self, node: usize) -> bool {
        node < self.node_count() && self.distance_to_edge(node) >= 1
    }

    /// Cells between the node and the nearest raster edge (0 on the outer ring)
    #[inline]
    pub fn distance_to_edge(&self, node: usize) -> usize {
        let (x, y) = self.delinearize(node);
        let right = self.width - 1 - x;
        let bottom = self.height - 1 - y;
        x.min(y).min(right).min(bottom)
    }

    /// Neighbour in `direction`, defined for interior nodes only
    #[inline]
    pub fn neighbor(&self, node: usize, direction: Direction) -> Option<usize> {
        if !self.is_interior(node) {
            return None;
        }
        Some(self.step(node, direction))
    }

    /// All 8 neighbours in direction order, defined for interior nodes only
    pub fn neighbors(&self, node: usize) -> Option<[usize; 8]> {
        if !self.is_interior(node) {
            return None;
        }
        Some(Direction::ALL.map(|direction| self.step(node, direction)))
    }

    /// Neighbour of any node that stays inside the raster
    ///
    /// Unlike [`Self::neighbor`] this also answers for the outer ring; it is
    /// used where raster-edge cells are legitimate (polygon rasterization,
    /// contour extraction).
    pub fn offset_node(&self, node: usize, direction: Direction) -> Option<usize> {
        let (x, y) = self.delinearize(node);
        let (dx, dy) = direction.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.linearize(nx, ny)
    }

    /// Iterate interior nodes in ascending index order
    pub fn interior_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        let x_range = 1..self.width.saturating_sub(1);
        (1..self.height.saturating_sub(1))
            .flat_map(move |y| x_range.clone().map(move |x| y * self.width + x))
    }

    // Caller guarantees the node is interior
    #[inline]
    fn step(&self, node: usize, direction: Direction) -> usize {
        let (dx, dy) = direction.offset();
        node.wrapping_add_signed(dy * self.width as isize + dx)
    }
}
