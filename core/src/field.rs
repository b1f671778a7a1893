//! Vector-field sampling and heatmap refresh state.

use ndarray::Array2;

use crate::model::BazykinModel;
use crate::prelude::FieldConfig;
use crate::telemetry::LogManager;

/// Vector field sampled over the configured domain at t = 0. Component
/// arrays are indexed `[x index, y index]`; axis vectors hold the node
/// coordinates with inclusive endpoints.
#[derive(Debug, Clone)]
pub struct FieldGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub u: Array2<f64>,
    pub v: Array2<f64>,
    pub magnitude: Array2<f64>,
    pub mag_min: f64,
    pub mag_max: f64,
}

fn axis_nodes(min: f64, max: f64, steps: usize) -> Vec<f64> {
    if steps < 2 {
        return vec![min];
    }
    let span = max - min;
    (0..steps)
        .map(|i| min + span * i as f64 / (steps - 1) as f64)
        .collect()
}

impl FieldGrid {
    /// Evaluates the model derivative at every grid node and derives the
    /// magnitude surface plus its range for the color legend.
    pub fn sample(model: &BazykinModel, config: &FieldConfig) -> Self {
        let steps = config.steps.max(2);
        let xs = axis_nodes(config.xmin, config.xmax, steps);
        let ys = axis_nodes(config.ymin, config.ymax, steps);

        let mut u = Array2::zeros((steps, steps));
        let mut v = Array2::zeros((steps, steps));
        let mut magnitude = Array2::zeros((steps, steps));
        let mut mag_min = f64::INFINITY;
        let mut mag_max = f64::NEG_INFINITY;

        for (i, &x) in xs.iter().enumerate() {
            for (j, &y) in ys.iter().enumerate() {
                let (du, dv) = model.evaluate(0.0, (x, y));
                let z = du.hypot(dv);
                u[[i, j]] = du;
                v[[i, j]] = dv;
                magnitude[[i, j]] = z;
                mag_min = mag_min.min(z);
                mag_max = mag_max.max(z);
            }
        }

        Self {
            xs,
            ys,
            u,
            v,
            magnitude,
            mag_min,
            mag_max,
        }
    }

    pub fn steps(&self) -> usize {
        self.xs.len()
    }

    /// Magnitude normalized into [0, 1] for colormap lookup.
    pub fn normalized_magnitude(&self, i: usize, j: usize) -> f64 {
        let span = self.mag_max - self.mag_min;
        if span <= 0.0 {
            return 0.0;
        }
        (self.magnitude[[i, j]] - self.mag_min) / span
    }
}

/// Owns the current sample grid and the re-entrancy guard for refreshes.
///
/// The guard is not a lock: everything runs on the event thread. It turns a
/// nested refresh request (an event cascade re-entering while a refresh is
/// underway) into a logged no-op instead of undefined recursion.
pub struct Heatmap {
    config: FieldConfig,
    grid: Option<FieldGrid>,
    refreshing: bool,
    logger: LogManager,
}

impl Heatmap {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            config,
            grid: None,
            refreshing: false,
            logger: LogManager::new(),
        }
    }

    /// Unconditional first refresh; safe before any grid exists.
    pub fn init(&mut self, model: &BazykinModel) {
        self.refresh(model);
    }

    /// Recomputes the grid wholesale. Returns `false` when a refresh is
    /// already marked in progress; the request is dropped, not queued.
    pub fn refresh(&mut self, model: &BazykinModel) -> bool {
        if self.refreshing {
            self.logger
                .caution("heatmap refresh already in progress, dropping request");
            return false;
        }

        self.refreshing = true;
        self.logger.trace("heatmap refresh: calculating...");
        // Old grid is replaced in one assignment so no stale layers survive.
        self.grid = Some(FieldGrid::sample(model, &self.config));
        self.logger.trace("heatmap refresh: done");
        self.refreshing = false;
        true
    }

    pub fn grid(&self) -> Option<&FieldGrid> {
        self.grid.as_ref()
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn set_refreshing(&mut self, value: bool) {
        self.refreshing = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_domain_with_inclusive_endpoints() {
        let model = BazykinModel::default();
        let config = FieldConfig::default();
        let grid = FieldGrid::sample(&model, &config);

        assert_eq!(grid.steps(), 20);
        assert_eq!(grid.xs[0], 0.0);
        assert_eq!(*grid.xs.last().unwrap(), 5.0);
        assert_eq!(grid.ys[0], 0.0);
        assert_eq!(*grid.ys.last().unwrap(), 5.0);
        assert_eq!(grid.u.dim(), (20, 20));
        assert_eq!(grid.magnitude.dim(), (20, 20));
    }

    #[test]
    fn magnitude_is_component_hypotenuse() {
        let model = BazykinModel::default();
        let grid = FieldGrid::sample(&model, &FieldConfig::default());

        for i in 0..grid.steps() {
            for j in 0..grid.steps() {
                let expected = grid.u[[i, j]].hypot(grid.v[[i, j]]);
                assert!((grid.magnitude[[i, j]] - expected).abs() < 1e-12);
                assert!(grid.magnitude[[i, j]] >= grid.mag_min);
                assert!(grid.magnitude[[i, j]] <= grid.mag_max);
            }
        }
    }

    #[test]
    fn nodes_hold_model_derivative_at_time_zero() {
        let model = BazykinModel::default();
        let config = FieldConfig {
            xmin: 0.0,
            xmax: 2.0,
            ymin: 0.0,
            ymax: 2.0,
            steps: 3,
        };
        let grid = FieldGrid::sample(&model, &config);

        // Node (1, 1) sits at the middle of a 3-step [0, 2] axis.
        assert_eq!(grid.xs[1], 1.0);
        assert_eq!(grid.ys[1], 1.0);
        assert!((grid.u[[1, 1]] - (-0.5)).abs() < 1e-12);
        assert!((grid.v[[1, 1]] - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn refresh_populates_and_replaces_grid() {
        let model = BazykinModel::default();
        let mut heatmap = Heatmap::new(FieldConfig::default());
        assert!(heatmap.grid().is_none());

        heatmap.init(&model);
        assert!(heatmap.grid().is_some());

        let before = heatmap.grid().unwrap().magnitude.clone();
        let mut shifted = model.clone();
        shifted.set_param(crate::model::ParamId::Gamma, 3.0);
        assert!(heatmap.refresh(&shifted));
        assert_ne!(heatmap.grid().unwrap().magnitude, before);
    }

    #[test]
    fn refresh_while_guard_is_set_is_a_dropped_no_op() {
        let model = BazykinModel::default();
        let mut heatmap = Heatmap::new(FieldConfig::default());
        heatmap.init(&model);
        let before = heatmap.grid().unwrap().magnitude.clone();

        heatmap.set_refreshing(true);
        let mut shifted = model.clone();
        shifted.set_param(crate::model::ParamId::Alpha, 9.0);
        assert!(!heatmap.refresh(&shifted));
        assert_eq!(heatmap.grid().unwrap().magnitude, before);
    }
}
