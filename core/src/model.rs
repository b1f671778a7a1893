use std::fmt;

use serde::{Deserialize, Serialize};

/// Error raised when a string label does not name a model parameter.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown model parameter '{0}'")]
    UnknownParameter(String),
}

/// Enumerated model parameter identifier. Exhaustive matching replaces the
/// original string-keyed dispatch; label lookup stays fallible for
/// string-driven callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    Alpha,
    Gamma,
    Mu,
    Eps,
}

impl ParamId {
    /// Display/enumeration order of the original model.
    pub const ALL: [ParamId; 4] = [ParamId::Alpha, ParamId::Gamma, ParamId::Mu, ParamId::Eps];

    pub fn label(self) -> &'static str {
        match self {
            ParamId::Alpha => "α",
            ParamId::Gamma => "γ",
            ParamId::Mu => "μ",
            ParamId::Eps => "ε",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, ModelError> {
        match label {
            "α" | "alpha" => Ok(ParamId::Alpha),
            "γ" | "gamma" => Ok(ParamId::Gamma),
            "μ" | "mu" => Ok(ParamId::Mu),
            "ε" | "eps" | "epsilon" => Ok(ParamId::Eps),
            other => Err(ModelError::UnknownParameter(other.to_string())),
        }
    }

    /// Every coefficient of variant A is clamped to the same interval.
    pub fn bounds(self) -> (f64, f64) {
        (0.0, 10.0)
    }
}

/// Current value of a parameter together with its slider bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Bazykin predator-prey model, variant A:
///
/// ```text
/// x' = x − x·y/(1 + α·x) − ε·x²
/// y' = −γ·y + x·y/(1 + α·x) − μ·y²
/// ```
///
/// with x the prey and y the predator population.
#[derive(Debug, Clone)]
pub struct BazykinModel {
    alpha: f64,
    gamma: f64,
    eps: f64,
    mu: f64,
}

impl Default for BazykinModel {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

impl BazykinModel {
    pub fn new(alpha: f64, gamma: f64, eps: f64, mu: f64) -> Self {
        Self {
            alpha,
            gamma,
            eps,
            mu,
        }
    }

    /// Right-hand side of the system. Pure; the time argument is accepted
    /// for solver compatibility but the system is autonomous.
    pub fn evaluate(&self, _t: f64, state: (f64, f64)) -> (f64, f64) {
        let (x, y) = state;
        let interaction = x * y / (1.0 + self.alpha * x);
        (
            x - interaction - self.eps * x * x,
            -self.gamma * y + interaction - self.mu * y * y,
        )
    }

    pub fn param(&self, id: ParamId) -> f64 {
        match id {
            ParamId::Alpha => self.alpha,
            ParamId::Gamma => self.gamma,
            ParamId::Mu => self.mu,
            ParamId::Eps => self.eps,
        }
    }

    /// Stores the value as given. Clamping is deferred to
    /// [`validate_parameters`](Self::validate_parameters).
    pub fn set_param(&mut self, id: ParamId, value: f64) {
        match id {
            ParamId::Alpha => self.alpha = value,
            ParamId::Gamma => self.gamma = value,
            ParamId::Mu => self.mu = value,
            ParamId::Eps => self.eps = value,
        }
    }

    /// Clamps every parameter into its declared bounds. Idempotent.
    pub fn validate_parameters(&mut self) {
        for id in ParamId::ALL {
            let (min, max) = id.bounds();
            let value = self.param(id);
            self.set_param(id, value.clamp(min, max));
        }
    }

    /// Ordered parameter listing used to build the slider controls.
    pub fn parameters(&self) -> Vec<(ParamId, ParamSpec)> {
        ParamId::ALL
            .into_iter()
            .map(|id| {
                let (min, max) = id.bounds();
                (
                    id,
                    ParamSpec {
                        value: self.param(id),
                        min,
                        max,
                    },
                )
            })
            .collect()
    }
}

impl fmt::Display for BazykinModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "x' = x - xy/(1 + {:.3}x) - {:.3}x²",
            self.alpha, self.eps
        )?;
        write!(
            f,
            "y' = {:.3}y + xy/(1 + {:.3}x) - {:.3}y²",
            -self.gamma, self.alpha, self.mu
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_derivative_at_unit_point() {
        let model = BazykinModel::default();
        let (dx, dy) = model.evaluate(0.0, (1.0, 1.0));
        assert!((dx - (-0.5)).abs() < 1e-12);
        assert!((dy - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn set_then_get_returns_exact_value_before_clamping() {
        let mut model = BazykinModel::default();
        model.set_param(ParamId::Gamma, 42.5);
        assert_eq!(model.param(ParamId::Gamma), 42.5);
    }

    #[test]
    fn validate_clamps_to_exact_bounds_and_is_idempotent() {
        let mut model = BazykinModel::default();
        model.set_param(ParamId::Alpha, -3.0);
        model.set_param(ParamId::Mu, 17.0);
        model.set_param(ParamId::Eps, 4.25);

        model.validate_parameters();
        assert_eq!(model.param(ParamId::Alpha), 0.0);
        assert_eq!(model.param(ParamId::Mu), 10.0);
        assert_eq!(model.param(ParamId::Eps), 4.25);

        let snapshot = model.parameters();
        model.validate_parameters();
        assert_eq!(model.parameters(), snapshot);
    }

    #[test]
    fn labels_round_trip_through_lookup() {
        for id in ParamId::ALL {
            assert_eq!(ParamId::from_label(id.label()).unwrap(), id);
        }
        assert_eq!(ParamId::from_label("gamma").unwrap(), ParamId::Gamma);
    }

    #[test]
    fn unknown_label_is_an_error() {
        let err = ParamId::from_label("sigma").unwrap_err();
        assert_eq!(err, ModelError::UnknownParameter("sigma".into()));
    }

    #[test]
    fn parameters_follow_display_order() {
        let model = BazykinModel::default();
        let ids: Vec<ParamId> = model.parameters().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ParamId::ALL.to_vec());
        for (_, spec) in model.parameters() {
            assert_eq!(spec.min, 0.0);
            assert_eq!(spec.max, 10.0);
            assert_eq!(spec.value, 1.0);
        }
    }

    #[test]
    fn display_substitutes_current_coefficients() {
        let model = BazykinModel::new(2.0, 1.0, 0.5, 1.0);
        let rendered = model.to_string();
        assert!(rendered.contains("1 + 2.000x"));
        assert!(rendered.contains("0.500x²"));
        assert!(rendered.contains("-1.000y"));
    }
}
