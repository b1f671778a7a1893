//! Adaptive trajectory integration for the phase-plane model.
//!
//! A hand-rolled Runge-Kutta-Fehlberg 4(5) stepper: the embedded 4th/5th
//! order pair gives a per-step error estimate that drives the step size.
//! Failures surface as [`SolverError`] values; nothing panics on stiff or
//! runaway trajectories.

use crate::model::BazykinModel;
use crate::prelude::{ActionError, SolveConfig};

/// Absolute per-step error tolerance.
const TOLERANCE: f64 = 1e-6;
/// Below this step size the integration is declared stuck.
const MIN_STEP: f64 = 1e-10;
/// Hard cap on accepted + rejected steps.
const MAX_STEPS: usize = 100_000;
/// States beyond this magnitude count as divergence.
const STATE_LIMIT: f64 = 1e6;

/// Time-ordered sequence of visited phase-plane states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub points: Vec<(f64, f64)>,
}

impl Trajectory {
    pub fn start(&self) -> Option<(f64, f64)> {
        self.points.first().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum SolverError {
    /// The state left the finite envelope. Carries the trajectory up to the
    /// last healthy state so the caller may plot a partial trace.
    #[error("trajectory diverged at t={t:.3}")]
    Diverged { t: f64, partial: Trajectory },
    #[error("step size underflow at t={t:.3}")]
    StepSizeUnderflow { t: f64 },
    #[error("exceeded {0} integration steps")]
    MaxStepsExceeded(usize),
    #[error("invalid integration span {0}")]
    InvalidSpan(f64),
}

impl From<SolverError> for ActionError {
    fn from(err: SolverError) -> Self {
        ActionError::new(err.to_string())
    }
}

fn state_is_healthy(state: (f64, f64)) -> bool {
    state.0.is_finite()
        && state.1.is_finite()
        && state.0.abs() <= STATE_LIMIT
        && state.1.abs() <= STATE_LIMIT
}

/// Integrates the model from `(x0, y0)` over `[0, t_end]`, seeded with
/// `first_step`. Returns the accepted states in time order, starting at the
/// initial condition.
pub fn solve(
    model: &BazykinModel,
    x0: f64,
    y0: f64,
    config: &SolveConfig,
) -> Result<Trajectory, SolverError> {
    if !config.t_end.is_finite() || config.t_end <= 0.0 {
        return Err(SolverError::InvalidSpan(config.t_end));
    }

    let mut trajectory = Trajectory {
        points: vec![(x0, y0)],
    };
    let mut t = 0.0_f64;
    let mut state = (x0, y0);
    let mut h = if config.first_step.is_finite() && config.first_step > 0.0 {
        config.first_step.min(config.t_end)
    } else {
        config.t_end / 100.0
    };

    if !state_is_healthy(state) {
        return Err(SolverError::Diverged {
            t,
            partial: trajectory,
        });
    }

    // Stop just shy of t_end so a float-residue final step cannot stall
    // the loop without advancing t.
    let span_floor = config.t_end * 1e-12;
    let mut steps = 0usize;
    while config.t_end - t > span_floor {
        if steps >= MAX_STEPS {
            return Err(SolverError::MaxStepsExceeded(MAX_STEPS));
        }
        steps += 1;

        if h < MIN_STEP {
            return Err(SolverError::StepSizeUnderflow { t });
        }
        h = h.min(config.t_end - t);

        let (y0x, y0y) = state;

        // Fehlberg tableau, six stages.
        let k1 = model.evaluate(t, state);
        let k2 = model.evaluate(
            t + 0.25 * h,
            (y0x + h * 0.25 * k1.0, y0y + h * 0.25 * k1.1),
        );
        let k3 = model.evaluate(
            t + 3.0 / 8.0 * h,
            (
                y0x + h * (3.0 / 32.0 * k1.0 + 9.0 / 32.0 * k2.0),
                y0y + h * (3.0 / 32.0 * k1.1 + 9.0 / 32.0 * k2.1),
            ),
        );
        let k4 = model.evaluate(
            t + 12.0 / 13.0 * h,
            (
                y0x + h
                    * (1932.0 / 2197.0 * k1.0 - 7200.0 / 2197.0 * k2.0
                        + 7296.0 / 2197.0 * k3.0),
                y0y + h
                    * (1932.0 / 2197.0 * k1.1 - 7200.0 / 2197.0 * k2.1
                        + 7296.0 / 2197.0 * k3.1),
            ),
        );
        let k5 = model.evaluate(
            t + h,
            (
                y0x + h
                    * (439.0 / 216.0 * k1.0 - 8.0 * k2.0 + 3680.0 / 513.0 * k3.0
                        - 845.0 / 4104.0 * k4.0),
                y0y + h
                    * (439.0 / 216.0 * k1.1 - 8.0 * k2.1 + 3680.0 / 513.0 * k3.1
                        - 845.0 / 4104.0 * k4.1),
            ),
        );
        let k6 = model.evaluate(
            t + 0.5 * h,
            (
                y0x + h
                    * (-8.0 / 27.0 * k1.0 + 2.0 * k2.0 - 3544.0 / 2565.0 * k3.0
                        + 1859.0 / 4104.0 * k4.0
                        - 11.0 / 40.0 * k5.0),
                y0y + h
                    * (-8.0 / 27.0 * k1.1 + 2.0 * k2.1 - 3544.0 / 2565.0 * k3.1
                        + 1859.0 / 4104.0 * k4.1
                        - 11.0 / 40.0 * k5.1),
            ),
        );

        // 4th-order solution and the 5th-order error reference.
        let fourth = (
            y0x + h
                * (25.0 / 216.0 * k1.0 + 1408.0 / 2565.0 * k3.0 + 2197.0 / 4104.0 * k4.0
                    - 0.2 * k5.0),
            y0y + h
                * (25.0 / 216.0 * k1.1 + 1408.0 / 2565.0 * k3.1 + 2197.0 / 4104.0 * k4.1
                    - 0.2 * k5.1),
        );
        let fifth = (
            y0x + h
                * (16.0 / 135.0 * k1.0 + 6656.0 / 12825.0 * k3.0
                    + 28561.0 / 56430.0 * k4.0
                    - 9.0 / 50.0 * k5.0
                    + 2.0 / 55.0 * k6.0),
            y0y + h
                * (16.0 / 135.0 * k1.1 + 6656.0 / 12825.0 * k3.1
                    + 28561.0 / 56430.0 * k4.1
                    - 9.0 / 50.0 * k5.1
                    + 2.0 / 55.0 * k6.1),
        );

        let err = ((fifth.0 - fourth.0).powi(2) + (fifth.1 - fourth.1).powi(2)).sqrt();

        if !err.is_finite() {
            return Err(SolverError::Diverged {
                t,
                partial: trajectory,
            });
        }

        if err <= TOLERANCE {
            t += h;
            state = fifth;
            if !state_is_healthy(state) {
                return Err(SolverError::Diverged {
                    t,
                    partial: trajectory,
                });
            }
            trajectory.points.push(state);
        }

        // Standard PI-free step update with a safety factor, bounded so a
        // single estimate cannot explode or collapse the step.
        let factor = if err > 0.0 {
            (0.9 * (TOLERANCE / err).powf(0.2)).clamp(0.2, 4.0)
        } else {
            4.0
        };
        h *= factor;
    }

    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trajectory_starts_at_initial_condition() {
        let model = BazykinModel::default();
        let config = SolveConfig {
            t_end: 5.0,
            first_step: 0.1,
        };
        let trajectory = solve(&model, 1.0, 1.0, &config).unwrap();
        assert_eq!(trajectory.start(), Some((1.0, 1.0)));
        assert!(trajectory.len() > 2);
    }

    #[test]
    fn default_model_trajectory_stays_finite_and_decays() {
        let model = BazykinModel::default();
        let config = SolveConfig {
            t_end: 5.0,
            first_step: 0.1,
        };
        let trajectory = solve(&model, 1.0, 1.0, &config).unwrap();
        for &(x, y) in &trajectory.points {
            assert!(x.is_finite() && y.is_finite());
        }
        // Derivative at (1, 1) is (-0.5, -0.5): both populations shrink at
        // first, so an early state must sit below the start.
        let (x1, y1) = trajectory.points[1];
        assert!(x1 < 1.0);
        assert!(y1 < 1.0);
    }

    #[test]
    fn runaway_growth_surfaces_divergence_with_partial_trace() {
        // With γ = ε = μ = 0 and no predators, x' = x: pure exponential
        // growth that crosses the state limit well before t_end.
        let model = BazykinModel::new(1.0, 0.0, 0.0, 0.0);
        let config = SolveConfig {
            t_end: 40.0,
            first_step: 0.1,
        };
        match solve(&model, 1.0, 0.0, &config) {
            Err(SolverError::Diverged { t, partial }) => {
                assert!(t > 0.0);
                assert!(!partial.is_empty());
                assert_eq!(partial.start(), Some((1.0, 0.0)));
            }
            other => panic!("expected divergence, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn non_positive_span_is_rejected() {
        let model = BazykinModel::default();
        let config = SolveConfig {
            t_end: 0.0,
            first_step: 0.1,
        };
        assert!(matches!(
            solve(&model, 1.0, 1.0, &config),
            Err(SolverError::InvalidSpan(_))
        ));
    }

    #[test]
    fn solver_error_converts_to_action_error() {
        let err = SolverError::StepSizeUnderflow { t: 1.0 };
        let action: ActionError = err.into();
        assert!(action.reason.contains("underflow"));
    }
}
