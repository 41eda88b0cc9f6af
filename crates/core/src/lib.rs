//! Evacuation Trigger Buffer Core
//!
//! Computes the *trigger buffer* around a wildland-urban interface (WUI): the
//! cells from which an advancing fire front would reach the WUI within a
//! prescribed evacuation lead time. When fire crosses that line, the
//! evacuation order has to go out.
//!
//! ## Pipeline
//!
//! - [`spread`]: Huygens ellipse interpolation of per-cell rate of spread and
//!   azimuth into 8 directional spread rates
//! - [`grid`]: raster storage and 8-connected topology (row-major, origin top-left)
//! - [`graph`]: inverse-rate travel times between neighbouring cells
//! - [`wui`]: WUI polygon rasterization, perimeter reduction and seed snapping
//! - [`search`]: buffer-bounded label-correcting arrival-time search
//! - [`boundary`]: thresholding into safety matrices and contour helpers
//! - [`pipeline`]: one case end to end
//!
//! ## Example
//!
//! ```
//! use trigger_buffer_core::{SpreadContext, SpreadField, TriggerConfig, WuiInput};
//!
//! let field = SpreadField::uniform(10, 10, 10.0, 0.0);
//! let config = TriggerConfig {
//!     cell_size: 10.0,
//!     trigger_buffer: 2,
//!     ..Default::default()
//! };
//! let context = SpreadContext::new(field, config).unwrap();
//! let outcome = context.evaluate(&WuiInput::Cells(vec![(5, 5)])).unwrap();
//! let boundary = outcome.boundary().unwrap();
//! assert!(boundary.safety_matrix.contains(5, 3));
//! assert!(!boundary.safety_matrix.contains(5, 1));
//! ```

pub mod boundary;
pub mod config;
pub mod error;
pub mod graph;
pub mod grid;
pub mod pipeline;
pub mod search;
pub mod spread;
pub mod wui;

// Re-export main types
pub use boundary::{
    compound_boundary, dense_boundary_from_prob, line_boundary, safety_matrix, threshold_mask,
    SafetyMatrix,
};
pub use config::{RelaxationMode, SeedOrigin, TriggerConfig};
pub use error::TriggerError;
pub use graph::PropagationGraph;
pub use grid::{Direction, GridTopology, Raster, NO_DATA};
pub use pipeline::{
    compute_trigger_buffer, CaseOutcome, SpreadContext, TriggerBoundary, UnreachableReason,
};
pub use search::{BoundarySearch, DistanceField};
pub use spread::{DirectionalSpreadField, EllipseShape, SpreadField};
pub use wui::{SeedCorrection, SeedProjection, WuiInput, WuiProjector};
