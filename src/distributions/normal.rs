//! standard normal inverse CDF (probit function), used by `Lognormal` and by
//! the metalog basis's logit transform.
//!
//! hand-rolled rather than pulled from a stats crate: nothing else in this
//! crate needs a linear-algebra/stats dependency, and self-contained
//! floating point math keeps the footprint small.

/// Acklam's rational approximation to `Φ⁻¹`, refined with one step of
/// Halley's method. Accurate to better than 1.15e-9 absolute error across
/// `(0, 1)`, which is more than sufficient for monetary-unit rounding.
pub fn inverse_standard_normal_cdf(p: f64) -> f64 {
    assert!(p > 0.0 && p < 1.0, "p={p} must be in (0, 1)");

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    let p_high = 1.0 - P_LOW;

    let x = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= p_high {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    // one step of Halley's rational method refinement against the error
    // function, bringing relative error down near machine precision.
    let e = 0.5 * erfc(-x / std::f64::consts::SQRT_2) - p;
    let u = e * (2.0 * std::f64::consts::PI).sqrt() * (x * x / 2.0).exp();
    x - u / (1.0 + x * u / 2.0)
}

/// complementary error function via Abramowitz & Stegun 7.1.26.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let tau = t
        * (-z * z - 1.26551223
            + t * (1.00002368
                + t * (0.37409196
                    + t * (0.09678418
                        + t * (-0.18628806
                            + t * (0.27886807
                                + t * (-1.13520398
                                    + t * (1.48851587
                                        + t * (-0.82215223 + t * 0.17087277)))))))))
        .exp();
    if x >= 0.0 {
        tau
    } else {
        2.0 - tau
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_is_zero() {
        assert!(inverse_standard_normal_cdf(0.5).abs() < 1e-9);
    }

    #[test]
    fn matches_known_quantiles() {
        // Φ⁻¹(0.975) ≈ 1.959964
        assert!((inverse_standard_normal_cdf(0.975) - 1.959964).abs() < 1e-5);
        // Φ⁻¹(0.025) ≈ -1.959964
        assert!((inverse_standard_normal_cdf(0.025) + 1.959964).abs() < 1e-5);
        // Φ⁻¹(0.95) ≈ 1.644854
        assert!((inverse_standard_normal_cdf(0.95) - 1.644854).abs() < 1e-5);
    }

    #[test]
    fn is_monotonically_increasing() {
        let mut prev = inverse_standard_normal_cdf(0.001);
        let mut p = 0.01;
        while p < 1.0 {
            let cur = inverse_standard_normal_cdf(p);
            assert!(cur > prev);
            prev = cur;
            p += 0.01;
        }
    }
}
