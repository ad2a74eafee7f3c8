//! No-intercept cubic least squares and fit diagnostics.

use crate::error::BiasCorrError;

/// Coefficients of the no-intercept cubic `a·x³ + b·x² + c·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cubic {
    /// Cubic coefficient.
    pub a: f64,
    /// Quadratic coefficient.
    pub b: f64,
    /// Linear coefficient.
    pub c: f64,
}

impl Cubic {
    /// Evaluates the polynomial at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        ((self.a * x + self.b) * x + self.c) * x
    }

    /// Returns the coefficients in `[cubic, quadratic, linear]` order.
    pub fn coefficients(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }
}

/// Fits the no-intercept cubic to `(xs, ys)` by least squares.
///
/// The model is linear in its coefficients, so the fit reduces to the 3×3
/// normal equations over the basis `[x³, x², x]`, solved by Gaussian
/// elimination with partial pivoting.
///
/// # Errors
///
/// Returns [`BiasCorrError::InsufficientPairs`] for fewer than 3 points and
/// [`BiasCorrError::PolyFitFailed`] when the normal matrix is singular
/// (e.g. all x identical).
pub(crate) fn fit_cubic(xs: &[f64], ys: &[f64]) -> Result<Cubic, BiasCorrError> {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.len() < 3 {
        return Err(BiasCorrError::InsufficientPairs { got: xs.len() });
    }

    // Normal equations A·h = b with A = XᵀX, b = Xᵀy over [x³, x², x].
    let mut a = [[0.0f64; 3]; 3];
    let mut b = [0.0f64; 3];
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let basis = [x.powi(3), x.powi(2), x];
        for i in 0..3 {
            for j in 0..3 {
                a[i][j] += basis[i] * basis[j];
            }
            b[i] += basis[i] * y;
        }
    }

    let h = solve_3x3(a, b).ok_or_else(|| BiasCorrError::PolyFitFailed {
        reason: "normal equations are singular".to_string(),
    })?;

    if h.iter().any(|v| !v.is_finite()) {
        return Err(BiasCorrError::PolyFitFailed {
            reason: "solution contains non-finite coefficients".to_string(),
        });
    }

    Ok(Cubic {
        a: h[0],
        b: h[1],
        c: h[2],
    })
}

/// Solves a 3×3 linear system by Gaussian elimination with partial pivoting.
///
/// Returns `None` if a pivot is effectively zero.
fn solve_3x3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot_row = (col..3)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("non-empty row range");
        if a[pivot_row][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..3 {
            let factor = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; 3];
    for row in (0..3).rev() {
        let mut acc = b[row];
        for k in (row + 1)..3 {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    Some(x)
}

/// Coefficient of determination of `predictions` against `targets`
/// (1 − SSres / SStot).
pub(crate) fn r_squared(targets: &[f64], predictions: &[f64]) -> f64 {
    debug_assert_eq!(targets.len(), predictions.len());
    let n = targets.len() as f64;
    let mean = targets.iter().sum::<f64>() / n;
    let ss_tot: f64 = targets.iter().map(|&y| (y - mean).powi(2)).sum();
    let ss_res: f64 = targets
        .iter()
        .zip(predictions.iter())
        .map(|(&y, &p)| (y - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
