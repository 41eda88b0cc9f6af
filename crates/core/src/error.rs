//! Errors raised while evaluating a trigger buffer case
//!
//! Every variant is fatal for the case that produced it. Recoverable
//! conditions (seed snapping, fire that never reaches the WUI) are not errors;
//! they surface through [`crate::wui::SeedProjection`] and
//! [`crate::pipeline::CaseOutcome`] so a caller running many cases can keep
//! going.

/// Errors that can occur while building or searching a trigger buffer case
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerError {
    /// A WUI coordinate lies outside the raster extent
    OutOfBoundsInput {
        /// Column of the offending coordinate
        x: i64,
        /// Row of the offending coordinate
        y: i64,
        /// Raster width in cells
        width: usize,
        /// Raster height in cells
        height: usize,
    },
    /// Two rasters that must share a shape do not
    DimensionMismatch {
        /// Which raster disagreed (e.g. `"azimuth"`)
        name: &'static str,
        /// Expected `(width, height)`
        expected: (usize, usize),
        /// Actual `(width, height)`
        actual: (usize, usize),
    },
    /// Raster shape is unusable (zero-sized, or data length disagrees with shape)
    InvalidDimensions {
        /// Raster width in cells
        width: usize,
        /// Raster height in cells
        height: usize,
        /// Length of the backing data
        len: usize,
    },
    /// A scalar parameter is out of its valid range
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Description of the violated constraint
        message: String,
    },
    /// The WUI input contained no vertices or nodes
    EmptyWui,
}

impl TriggerError {
    /// Create an `InvalidParameter` error for a non-finite or non-positive value
    pub(crate) fn not_positive(name: &'static str, value: f64) -> Self {
        Self::InvalidParameter {
            name,
            message: format!("must be finite and positive, got {value}"),
        }
    }
}

impl std::fmt::Display for TriggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerError::OutOfBoundsInput {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "WUI coordinate ({x}, {y}) lies outside the {width}x{height} raster"
            ),
            TriggerError::DimensionMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "Raster '{name}' is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            TriggerError::InvalidDimensions { width, height, len } => write!(
                f,
                "Invalid raster shape {width}x{height} for {len} values"
            ),
            TriggerError::InvalidParameter { name, message } => {
                write!(f, "Parameter {name}: {message}")
            }
            TriggerError::EmptyWui => write!(f, "WUI input contains no cells"),
        }
    }
}

impl std::error::Error for TriggerError {}
