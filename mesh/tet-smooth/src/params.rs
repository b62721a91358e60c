//! Parameters for node smoothing.

/// Which cost the linear-program smoothers optimize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostFunction {
    /// Shape quality: face mean-ratio on surfaces, cell aspect ratio in the
    /// volume.
    #[default]
    MeanRatio,
    /// Metric conformity: surface nodes also optimize the adjacent cell
    /// aspect ratio instead of the face mean-ratio.
    MetricConformity,
}

/// Parameters for node smoothing.
#[derive(Debug, Clone)]
pub struct SmoothParams {
    /// Minimum cell aspect ratio a surface smoother must maintain while it
    /// optimizes a boundary node. Default: 1e-3
    pub min_surface_cost: f64,

    /// Cost the linear-program smoothers optimize. Default: mean ratio
    pub cost_function: CostFunction,

    /// Whether boundary (surface) nodes may be smoothed at all.
    /// Default: true
    pub smooth_on_surface: bool,

    /// Whether the untanglers may move nodes whose neighborhood touches a
    /// ghost node from another partition. Default: false
    pub allow_near_ghost: bool,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            min_surface_cost: 1.0e-3,
            cost_function: CostFunction::default(),
            smooth_on_surface: true,
            allow_near_ghost: false,
        }
    }
}

impl SmoothParams {
    /// Params with a specific surface cost floor.
    #[must_use]
    pub fn with_min_surface_cost(cost: f64) -> Self {
        Self {
            min_surface_cost: cost,
            ..Default::default()
        }
    }

    /// Params optimizing metric conformity instead of shape.
    #[must_use]
    pub fn with_metric_conformity() -> Self {
        Self {
            cost_function: CostFunction::MetricConformity,
            ..Default::default()
        }
    }

    /// Params that leave every boundary node in place.
    #[must_use]
    pub fn volume_only() -> Self {
        Self {
            smooth_on_surface: false,
            ..Default::default()
        }
    }
}
