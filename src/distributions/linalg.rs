//! tiny dense linear solver, just enough to fit metalog coefficients.
//!
//! no external linear-algebra crate is pulled in for this: the matrices
//! involved are at most a few dozen rows/columns (bounded by the number of
//! percentile/quantile pairs a risk owner would ever configure), so Gaussian
//! elimination with partial pivoting is plenty.

/// solve `a * x = b` for square `a` (row-major, `n*n`) via Gaussian
/// elimination with partial pivoting. returns `None` if `a` is singular (or
/// numerically indistinguishable from singular).
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    debug_assert_eq!(a.len(), n);
    debug_assert!(a.iter().all(|row| row.len() == n));

    // augmented matrix, mutated in place.
    let mut m: Vec<Vec<f64>> = a
        .iter()
        .zip(b.iter())
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| {
            m[i][col]
                .abs()
                .partial_cmp(&m[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if m[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        for k in col..=n {
            m[col][k] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    Some((0..n).map(|i| m[i][n]).collect())
}
