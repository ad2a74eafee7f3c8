//! Result type for a fitted quantile-mapping correction.

use crate::poly::Cubic;

/// The output of fitting a quantile-mapping correction.
///
/// Holds the fitted no-intercept cubic mapping source-distribution quantiles
/// onto reference-distribution quantiles, together with fit diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionFit {
    cubic: Cubic,
    r_squared: f64,
    n_pairs: usize,
}

impl CorrectionFit {
    pub(crate) fn new(cubic: Cubic, r_squared: f64, n_pairs: usize) -> Self {
        Self {
            cubic,
            r_squared,
            n_pairs,
        }
    }

    /// Returns the fitted cubic.
    pub fn cubic(&self) -> &Cubic {
        &self.cubic
    }

    /// Returns the coefficients in `[cubic, quadratic, linear]` order.
    pub fn coefficients(&self) -> [f64; 3] {
        self.cubic.coefficients()
    }

    /// Coefficient of determination of the cubic against the filtered
    /// quantile pairs. Diagnostic only.
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Number of strictly positive quantile pairs the cubic was fitted to.
    pub fn n_pairs(&self) -> usize {
        self.n_pairs
    }

    /// Applies the correction to every value of `series`.
    pub fn correct(&self, series: &[f64]) -> Vec<f64> {
        series.iter().map(|&x| self.cubic.eval(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn correct_applies_cubic_elementwise() {
        let fit = CorrectionFit::new(
            Cubic {
                a: 0.0,
                b: 0.0,
                c: 2.0,
            },
            1.0,
            10,
        );
        let out = fit.correct(&[1.0, 2.5, -3.0]);
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[0], 2.0);
        assert_relative_eq!(out[1], 5.0);
        assert_relative_eq!(out[2], -6.0);
    }

    #[test]
    fn accessors() {
        let fit = CorrectionFit::new(
            Cubic {
                a: 1.0,
                b: 2.0,
                c: 3.0,
            },
            0.95,
            42,
        );
        assert_eq!(fit.coefficients(), [1.0, 2.0, 3.0]);
        assert_relative_eq!(fit.r_squared(), 0.95);
        assert_eq!(fit.n_pairs(), 42);
    }
}
