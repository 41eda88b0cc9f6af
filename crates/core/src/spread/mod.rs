//! Rate-of-spread inputs and their directional interpolation
//!
//! The raw input is a magnitude/azimuth pair per cell ([`SpreadField`]). The
//! Huygens ellipse turns that pair into spread rates along the 8 grid
//! directions ([`DirectionalSpreadField`]), which is what the propagation
//! graph consumes.

pub mod ellipse;
pub mod field;

// Re-exports
pub use ellipse::{DirectionalSpreadField, EllipseShape};
pub use field::SpreadField;
