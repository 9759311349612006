//! severity distributions and the quantile functions they expose.
//!
//! every leaf's severity is, at evaluation time, just something that maps a
//! uniform draw in `[0, 1)` to a loss amount. the two required families
//! (`metalog`, `lognormal`) are unified behind [`Quantile`] so the
//! evaluator never needs to match on distribution kind.

mod linalg;
mod lognormal;
mod metalog;
mod normal;

pub use lognormal::Lognormal;
pub use metalog::Metalog;
pub use normal::inverse_standard_normal_cdf;

use crate::error::CoreResult;
use serde::{Deserialize, Serialize};

/// a severity distribution's quantile (inverse CDF) function.
pub trait Quantile {
    fn quantile(&self, u: f64) -> f64;
}

/// configuration for a leaf's severity distribution, as supplied by a risk
/// register entry. kept serde-derived since it doubles as the
/// payload recorded in [`crate::provenance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SeverityParams {
    Metalog {
        percentiles: Vec<f64>,
        quantiles: Vec<f64>,
        terms: usize,
        lower: Option<f64>,
        upper: Option<f64>,
    },
    Lognormal { min_loss: f64, max_loss: f64 },
}

/// a fitted severity distribution, ready to be sampled.
#[derive(Debug, Clone)]
pub enum Severity {
    Metalog(Metalog),
    Lognormal(Lognormal),
}

impl Quantile for Severity {
    fn quantile(&self, u: f64) -> f64 {
        match self {
            Severity::Metalog(m) => m.quantile(u),
            Severity::Lognormal(l) => l.quantile(u),
        }
    }
}

/// build a fitted [`Severity`] from its configuration, surfacing any
/// validation failure tagged with `node`'s id.
pub fn build_severity(node: &str, params: &SeverityParams) -> CoreResult<Severity> {
    match params {
        SeverityParams::Metalog {
            percentiles,
            quantiles,
            terms,
            lower,
            upper,
        } => Ok(Severity::Metalog(Metalog::fit(
            node, percentiles, quantiles, *terms, *lower, *upper,
        )?)),
        SeverityParams::Lognormal { min_loss, max_loss } => Ok(Severity::Lognormal(
            Lognormal::new(node, *min_loss, *max_loss)?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_lognormal_from_params() {
        let params = SeverityParams::Lognormal {
            min_loss: 100.0,
            max_loss: 10_000.0,
        };
        let severity = build_severity("leaf-1", &params).unwrap();
        assert!(severity.quantile(0.5) > 0.0);
    }

    #[test]
    fn builds_metalog_from_params() {
        let params = SeverityParams::Metalog {
            percentiles: vec![0.1, 0.5, 0.9],
            quantiles: vec![10.0, 50.0, 90.0],
            terms: 3,
            lower: None,
            upper: None,
        };
        let severity = build_severity("leaf-1", &params).unwrap();
        assert!((severity.quantile(0.5) - 50.0).abs() < 1e-6);
    }

    #[test]
    fn propagates_node_id_on_failure() {
        let params = SeverityParams::Lognormal {
            min_loss: -1.0,
            max_loss: 10.0,
        };
        let err = build_severity("leaf-broken", &params).unwrap_err();
        assert!(err.to_string().contains("leaf-broken"));
    }
}
