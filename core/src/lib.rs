//! Headless core of the Bazykin phase-plane explorer.
//!
//! The modules mirror the click → integrate → draw pipeline of the original
//! tool while staying independent of any GUI runtime: the model and solver
//! are pure, the field grid is plain data, and the click handlers react to
//! already-translated data-space events.

pub mod field;
pub mod interact;
pub mod model;
pub mod prelude;
pub mod solver;
pub mod telemetry;

pub use prelude::{ActionError, ClickEvent, FieldConfig, RegionId, SolveConfig};
