use super::linalg;
use super::Quantile;
use crate::error::{CoreError, CoreResult};

/// a Metalog quantile function fitted from `(percentile, quantile)` pairs
/// immutable after construction; `quantile` is a pure
/// function of `u`, so sharing a fitted `Metalog` across threads is safe.
#[derive(Debug, Clone)]
pub struct Metalog {
    coefficients: Vec<f64>,
    lower: Option<f64>,
    upper: Option<f64>,
}

impl Metalog {
    /// fit a metalog quantile function with `terms` basis terms from `k`
    /// `(percentiles, quantiles)` pairs. `terms <= k` is required; when
    /// `terms < k` the fit is least-squares rather than exact.
    pub fn fit(
        node: &str,
        percentiles: &[f64],
        quantiles: &[f64],
        terms: usize,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> CoreResult<Self> {
        let fail = |detail: String| CoreError::DistributionConstruction {
            node: node.to_string(),
            detail,
        };

        let k = percentiles.len();
        if k != quantiles.len() {
            return Err(fail(format!(
                "percentiles length {k} does not match quantiles length {}",
                quantiles.len()
            )));
        }
        if k == 0 {
            return Err(fail("at least one percentile/quantile pair is required".into()));
        }
        if terms == 0 || terms > k {
            return Err(fail(format!("terms={terms} must be in 1..={k}")));
        }
        if let (Some(lo), Some(hi)) = (lower, upper) {
            if lo >= hi {
                return Err(fail(format!("lower={lo} must be < upper={hi}")));
            }
        }
        for p in percentiles {
            if !(*p > 0.0 && *p < 1.0) {
                return Err(fail(format!("percentile {p} must be in (0, 1)")));
            }
        }
        for w in percentiles.windows(2) {
            if w[0] >= w[1] {
                return Err(fail("percentiles must be strictly increasing".into()));
            }
        }

        // transform observed quantiles into "y-space" per the boundedness
        // mode, then fit the unbounded metalog basis against that target.
        let y: Vec<f64> = quantiles
            .iter()
            .map(|&q| to_y_space(q, lower, upper))
            .collect::<CoreResult<Vec<_>>>().map_err(|_| {
                fail("quantile value incompatible with configured bounds".into())
            })?;

        let design: Vec<Vec<f64>> = percentiles
            .iter()
            .map(|&p| basis_row(p, terms))
            .collect();

        // normal equations: (X^T X) a = X^T y
        let mut xtx = vec![vec![0.0; terms]; terms];
        let mut xty = vec![0.0; terms];
        for (row, &target) in design.iter().zip(y.iter()) {
            for i in 0..terms {
                xty[i] += row[i] * target;
                for j in 0..terms {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }

        let coefficients = linalg::solve(&xtx, &xty)
            .ok_or_else(|| fail("percentile/quantile pairs are collinear for requested terms".into()))?;

        Ok(Self {
            coefficients,
            lower,
            upper,
        })
    }

    fn y(&self, u: f64) -> f64 {
        basis_row(u, self.coefficients.len())
            .iter()
            .zip(self.coefficients.iter())
            .map(|(b, a)| b * a)
            .sum()
    }
}

impl Quantile for Metalog {
    fn quantile(&self, u: f64) -> f64 {
        let u = u.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);
        let y = self.y(u);
        match (self.lower, self.upper) {
            (None, None) => y,
            (Some(lo), None) => lo + y.exp(),
            (None, Some(hi)) => hi - (-y).exp(),
            (Some(lo), Some(hi)) => lo + (hi - lo) / (1.0 + (-y).exp()),
        }
    }
}

/// invert the boundedness transform to recover the "y-space" target for a
/// fitted quantile, so observed `(p, q)` pairs can be regressed directly.
fn to_y_space(q: f64, lower: Option<f64>, upper: Option<f64>) -> CoreResult<f64> {
    match (lower, upper) {
        (None, None) => Ok(q),
        (Some(lo), None) => {
            if q <= lo {
                return Err(CoreError::InvariantViolation("quantile below lower bound".into()));
            }
            Ok((q - lo).ln())
        }
        (None, Some(hi)) => {
            if q >= hi {
                return Err(CoreError::InvariantViolation("quantile above upper bound".into()));
            }
            Ok(-((hi - q).ln()))
        }
        (Some(lo), Some(hi)) => {
            if !(q > lo && q < hi) {
                return Err(CoreError::InvariantViolation("quantile outside [lower, upper]".into()));
            }
            let frac = (q - lo) / (hi - lo);
            Ok((frac / (1.0 - frac)).ln())
        }
    }
}

/// Keelin's metalog basis functions m_1..m_terms evaluated at `p`.
fn basis_row(p: f64, terms: usize) -> Vec<f64> {
    let logit = (p / (1.0 - p)).ln();
    let centered = p - 0.5;
    let mut row = Vec::with_capacity(terms);
    if terms >= 1 {
        row.push(1.0);
    }
    if terms >= 2 {
        row.push(logit);
    }
    if terms >= 3 {
        row.push(centered * logit);
    }
    if terms >= 4 {
        row.push(centered);
    }
    for j in 5..=terms {
        if j % 2 == 1 {
            let power = (j - 1) / 2;
            row.push(centered.powi(power as i32));
        } else {
            let power = (j - 2) / 2;
            row.push(logit * centered.powi(power as i32));
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_reproduces_inputs() {
        let percentiles = vec![0.1, 0.5, 0.9];
        let quantiles = vec![10.0, 50.0, 90.0];
        let metalog = Metalog::fit("test", &percentiles, &quantiles, 3, None, None).unwrap();
        for (p, q) in percentiles.iter().zip(quantiles.iter()) {
            assert!((metalog.quantile(*p) - q).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_unsorted_percentiles() {
        let err = Metalog::fit("n", &[0.5, 0.1], &[10.0, 20.0], 2, None, None);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_terms_exceeding_k() {
        let err = Metalog::fit("n", &[0.1, 0.9], &[1.0, 2.0], 3, None, None);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_lower_ge_upper() {
        let err = Metalog::fit("n", &[0.1, 0.5, 0.9], &[1.0, 2.0, 3.0], 3, Some(5.0), Some(5.0));
        assert!(err.is_err());
    }

    #[test]
    fn bounded_quantile_respects_bounds() {
        let percentiles = vec![0.1, 0.3, 0.5, 0.7, 0.9];
        let quantiles = vec![105.0, 150.0, 200.0, 260.0, 340.0];
        let metalog = Metalog::fit("n", &percentiles, &quantiles, 3, Some(100.0), None).unwrap();
        for u in [0.01, 0.3, 0.5, 0.7, 0.99] {
            assert!(metalog.quantile(u) > 100.0);
        }
    }

    #[test]
    fn is_monotone_non_decreasing_on_a_sample() {
        let percentiles = vec![0.05, 0.25, 0.5, 0.75, 0.95];
        let quantiles = vec![1_000.0, 5_000.0, 12_000.0, 28_000.0, 60_000.0];
        let metalog = Metalog::fit("n", &percentiles, &quantiles, 5, None, None).unwrap();
        let mut prev = metalog.quantile(0.001);
        let mut u = 0.01;
        while u < 1.0 {
            let cur = metalog.quantile(u);
            assert!(cur >= prev - 1e-6, "non-monotone at u={u}: {cur} < {prev}");
            prev = cur;
            u += 0.01;
        }
    }
}
