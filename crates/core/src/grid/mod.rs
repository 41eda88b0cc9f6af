//! Raster storage and grid topology

pub mod raster;
pub mod topology;

// Re-export main types
pub use raster::{Raster, NO_DATA};
pub use topology::{Direction, GridTopology};
