use super::normal::inverse_standard_normal_cdf;
use super::Quantile;
use crate::error::{CoreError, CoreResult};

/// a lognormal severity distribution parameterized by a 90% confidence
/// interval, rather than by `mu`/`sigma` directly.
#[derive(Debug, Clone, Copy)]
pub struct Lognormal {
    mu: f64,
    sigma: f64,
}

impl Lognormal {
    /// `min_loss`/`max_loss` are the 5th/95th percentile loss values. the
    /// 3.29 divisor is `2 * Φ⁻¹(0.95)`, the standard-normal spread between
    /// those two percentiles.
    pub fn new(node: &str, min_loss: f64, max_loss: f64) -> CoreResult<Self> {
        if !(min_loss > 0.0 && min_loss < max_loss) {
            return Err(CoreError::DistributionConstruction {
                node: node.to_string(),
                detail: format!(
                    "min_loss={min_loss} must be > 0 and < max_loss={max_loss}"
                ),
            });
        }
        let mu = (max_loss.ln() + min_loss.ln()) / 2.0;
        let sigma = (max_loss.ln() - min_loss.ln()) / 3.29;
        Ok(Self { mu, sigma })
    }
}

impl Quantile for Lognormal {
    fn quantile(&self, u: f64) -> f64 {
        let u = u.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);
        (self.mu + self.sigma * inverse_standard_normal_cdf(u)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_is_geometric_mean() {
        let d = Lognormal::new("n", 100.0, 10_000.0).unwrap();
        let expected = (100.0_f64 * 10_000.0).sqrt();
        assert!((d.quantile(0.5) - expected).abs() < 1e-6);
    }

    #[test]
    fn roughly_reproduces_the_interval_bounds() {
        let d = Lognormal::new("n", 100.0, 10_000.0).unwrap();
        assert!((d.quantile(0.05) - 100.0).abs() / 100.0 < 0.01);
        assert!((d.quantile(0.95) - 10_000.0).abs() / 10_000.0 < 0.01);
    }

    #[test]
    fn rejects_non_positive_min() {
        assert!(Lognormal::new("n", 0.0, 10.0).is_err());
        assert!(Lognormal::new("n", -5.0, 10.0).is_err());
    }

    #[test]
    fn rejects_min_ge_max() {
        assert!(Lognormal::new("n", 100.0, 100.0).is_err());
        assert!(Lognormal::new("n", 200.0, 100.0).is_err());
    }

    #[test]
    fn is_monotonically_increasing() {
        let d = Lognormal::new("n", 50.0, 5_000.0).unwrap();
        let mut prev = d.quantile(0.001);
        let mut u = 0.01;
        while u < 1.0 {
            let cur = d.quantile(u);
            assert!(cur > prev);
            prev = cur;
            u += 0.01;
        }
    }
}
