//! One trigger buffer case, end to end
//!
//! [`SpreadContext`] owns everything derived from the spread field (ellipse
//! shape, directional rates, propagation graph) so several WUIs can be
//! evaluated against the same fire scenario. Each evaluation is a pure
//! function of the context and the WUI input; nothing is mutated, so
//! independent cases can run on separate threads.

use crate::boundary::{band_nodes, safety_matrix, SafetyMatrix};
use crate::config::TriggerConfig;
use crate::error::TriggerError;
use crate::graph::PropagationGraph;
use crate::grid::Raster;
use crate::search::{BoundarySearch, DistanceField};
use crate::spread::{DirectionalSpreadField, EllipseShape, SpreadField};
use crate::wui::{SeedProjection, WuiInput, WuiProjector};
use tracing::info;

/// Why a case contributes nothing to the trigger boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableReason {
    /// No WUI cell could be mapped onto a burning cell
    NoActiveSeed,
    /// Seeds exist but no cell lies within the buffer of any of them
    EmptyBoundary,
}

impl std::fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnreachableReason::NoActiveSeed => write!(f, "no burning cell near the WUI"),
            UnreachableReason::EmptyBoundary => {
                write!(f, "no cell reaches the WUI within the trigger buffer")
            }
        }
    }
}

/// Trigger boundary of one case
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerBoundary {
    /// 1 inside the boundary, 0 elsewhere
    pub safety_matrix: SafetyMatrix,
    /// Boundary nodes, ascending
    pub boundary_nodes: Vec<usize>,
    /// Seeds the search started from
    pub seeds: SeedProjection,
    /// Minimum arrival time over all seeds, when requested
    pub distances: Option<DistanceField>,
}

/// Result of evaluating one case
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    /// The fire reaches the WUI within the buffer from these cells
    Boundary(TriggerBoundary),
    /// The case should be skipped when overlaying results
    FireDoesNotReach {
        /// What went wrong
        reason: UnreachableReason,
        /// Seeds that were derived before giving up
        seeds: SeedProjection,
    },
}

impl CaseOutcome {
    /// The boundary, if the case contributes one
    pub fn boundary(&self) -> Option<&TriggerBoundary> {
        match self {
            CaseOutcome::Boundary(boundary) => Some(boundary),
            CaseOutcome::FireDoesNotReach { .. } => None,
        }
    }

    /// True if the case adds to an ensemble overlay
    pub fn is_contributing(&self) -> bool {
        self.boundary().is_some()
    }

    /// Add this case's boundary to an ensemble overlay
    ///
    /// Returns whether anything was added.
    ///
    /// # Errors
    ///
    /// [`TriggerError::DimensionMismatch`] if `overlay` has another shape.
    pub fn contribute_to(&self, overlay: &mut SafetyMatrix) -> Result<bool, TriggerError> {
        match self.boundary() {
            Some(boundary) => {
                overlay.merge(&boundary.safety_matrix)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Spread field plus everything derived from it for one configuration
#[derive(Debug, Clone)]
pub struct SpreadContext {
    field: SpreadField,
    shape: EllipseShape,
    spread: DirectionalSpreadField,
    graph: PropagationGraph,
    config: TriggerConfig,
}

impl SpreadContext {
    /// Build the directional spread field and propagation graph
    ///
    /// # Errors
    ///
    /// [`TriggerError::InvalidParameter`] if `config` fails validation.
    pub fn new(field: SpreadField, config: TriggerConfig) -> Result<Self, TriggerError> {
        config.validate()?;

        let shape = EllipseShape::from_wind_speed(config.mid_flame_wind_speed);
        let spread = DirectionalSpreadField::compute(&field, &shape);
        let graph = PropagationGraph::build(field.topology(), &spread, config.cell_size);

        let (width, height) = field.dimensions();
        info!(
            "Spread context ready: {}x{} cells, {} active, LB {:.3}, HB {:.3}",
            width,
            height,
            field.active_count(),
            shape.length_to_breadth,
            shape.head_to_back
        );

        Ok(Self {
            field,
            shape,
            spread,
            graph,
            config,
        })
    }

    /// Build from raw magnitude and azimuth rasters
    ///
    /// # Errors
    ///
    /// [`TriggerError::DimensionMismatch`] if the rasters differ in shape, or
    /// any error of [`SpreadContext::new`].
    pub fn from_rasters(
        ros: Raster<f64>,
        azimuth: Raster<f64>,
        config: TriggerConfig,
    ) -> Result<Self, TriggerError> {
        Self::new(SpreadField::new(ros, azimuth)?, config)
    }

    /// Input spread field
    pub fn field(&self) -> &SpreadField {
        &self.field
    }

    /// Ellipse shape used for the directional rates
    pub fn shape(&self) -> &EllipseShape {
        &self.shape
    }

    /// Directional spread rates
    pub fn directional_spread(&self) -> &DirectionalSpreadField {
        &self.spread
    }

    /// Propagation graph
    pub fn graph(&self) -> &PropagationGraph {
        &self.graph
    }

    /// Configuration
    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Boundary search over this context
    pub fn search(&self) -> BoundarySearch<'_> {
        BoundarySearch::new(&self.graph, &self.field, &self.config)
    }

    /// Project a WUI onto the spread field
    ///
    /// # Errors
    ///
    /// See [`WuiProjector::project`].
    pub fn project_wui(&self, wui: &WuiInput) -> Result<SeedProjection, TriggerError> {
        WuiProjector::new(&self.field, self.config.max_snap_distance).project(wui)
    }

    /// Compute the trigger boundary of one WUI
    ///
    /// Every seed is searched independently and the `(0, buffer]` bands are
    /// unioned, so the boundary is the set of cells from which fire reaches
    /// *some* WUI perimeter cell within the buffer.
    ///
    /// # Errors
    ///
    /// [`TriggerError::EmptyWui`] or [`TriggerError::OutOfBoundsInput`] for bad
    /// WUI input. A WUI the fire never reaches is not an error but
    /// [`CaseOutcome::FireDoesNotReach`].
    pub fn evaluate(&self, wui: &WuiInput) -> Result<CaseOutcome, TriggerError> {
        let seeds = self.project_wui(wui)?;
        if seeds.is_unreachable() {
            info!(
                "Fire does not reach WUI: {} perimeter cells, none on burning ground",
                seeds.unmapped.len()
            );
            return Ok(CaseOutcome::FireDoesNotReach {
                reason: UnreachableReason::NoActiveSeed,
                seeds,
            });
        }

        let search = self.search();
        let buffer = search.buffer();
        let keep_distances = self.config.keep_distances;
        let columns = search.map_per_seed(&seeds.seeds, |column| {
            let band = band_nodes(&column, buffer);
            (band, keep_distances.then_some(column))
        });

        let topology = self.graph.topology();
        let mut member = vec![false; topology.node_count()];
        let mut distances: Option<DistanceField> = None;
        for (band, column) in columns {
            for node in band {
                member[node] = true;
            }
            if let Some(column) = column {
                match distances.as_mut() {
                    Some(combined) => combined.min_assign(&column),
                    None => distances = Some(column),
                }
            }
        }
        let boundary_nodes: Vec<usize> = member
            .iter()
            .enumerate()
            .filter_map(|(node, &inside)| inside.then_some(node))
            .collect();

        if boundary_nodes.is_empty() {
            info!(
                "Fire does not reach WUI within {} minutes from any of {} seeds",
                self.config.trigger_buffer,
                seeds.seeds.len()
            );
            return Ok(CaseOutcome::FireDoesNotReach {
                reason: UnreachableReason::EmptyBoundary,
                seeds,
            });
        }

        info!(
            "Trigger boundary: {} cells within {} minutes of {} seeds ({} snapped)",
            boundary_nodes.len(),
            self.config.trigger_buffer,
            seeds.seeds.len(),
            seeds.snapped.len()
        );

        Ok(CaseOutcome::Boundary(TriggerBoundary {
            safety_matrix: safety_matrix(&boundary_nodes, topology),
            boundary_nodes,
            seeds,
            distances,
        }))
    }
}

/// Evaluate a single case from raw inputs
///
/// # Errors
///
/// Any error of [`SpreadContext::from_rasters`] or [`SpreadContext::evaluate`].
pub fn compute_trigger_buffer(
    ros: Raster<f64>,
    azimuth: Raster<f64>,
    wui: &WuiInput,
    config: TriggerConfig,
) -> Result<CaseOutcome, TriggerError> {
    SpreadContext::from_rasters(ros, azimuth, config)?.evaluate(wui)
}
