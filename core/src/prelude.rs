use serde::{Deserialize, Serialize};

/// Rectangular sampling domain and per-axis resolution for the vector-field
/// grid. Endpoints are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub steps: usize,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            xmin: 0.0,
            xmax: 5.0,
            ymin: 0.0,
            ymax: 5.0,
            steps: 20,
        }
    }
}

/// Time span and seed step for a single trajectory integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveConfig {
    pub t_end: f64,
    pub first_step: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            t_end: 10.0,
            first_step: 0.1,
        }
    }
}

/// Identifier of a clickable canvas area. Handlers are bound to one region
/// and ignore events originating elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u32);

/// A pointer click translated into data-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    pub region: RegionId,
    pub x: f64,
    pub y: f64,
}

impl ClickEvent {
    pub fn new(region: RegionId, x: f64, y: f64) -> Self {
        Self { region, x, y }
    }
}

/// Reported failure of a user-supplied click action. Callbacks return this
/// instead of panicking; the set-point handler catches and logs it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("action callback failed: {reason}")]
pub struct ActionError {
    pub reason: String,
}

impl ActionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
