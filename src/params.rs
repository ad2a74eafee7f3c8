//! Fitted distribution parameter types and statrs bridge.

use statrs::distribution::{ContinuousCDF, Gamma, Normal};

/// Validated parameters for a Gamma distribution with location fixed at zero
/// (shape/scale convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaParams {
    shape: f64,
    scale: f64,
}

impl GammaParams {
    /// Create new gamma parameters after validating that both `shape` and
    /// `scale` are finite and strictly positive.
    pub fn new(shape: f64, scale: f64) -> Option<Self> {
        if shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0 {
            Some(Self { shape, scale })
        } else {
            None
        }
    }

    /// Shape parameter (k).
    pub fn shape(&self) -> f64 {
        self.shape
    }

    /// Scale parameter (theta).
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Rate parameter (1 / scale); statrs parameterises Gamma by
    /// (shape, rate) rather than (shape, scale).
    pub(crate) fn rate(&self) -> f64 {
        1.0 / self.scale
    }
}

/// Validated parameters for a Normal distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalParams {
    mean: f64,
    sd: f64,
}

impl NormalParams {
    /// Create new normal parameters after validating that the mean is finite
    /// and the standard deviation is finite and strictly positive.
    pub fn new(mean: f64, sd: f64) -> Option<Self> {
        if mean.is_finite() && sd.is_finite() && sd > 0.0 {
            Some(Self { mean, sd })
        } else {
            None
        }
    }

    /// Distribution mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation.
    pub fn sd(&self) -> f64 {
        self.sd
    }
}

/// Fitted parameters for either supported family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistParams {
    /// Gamma parameters (location fixed at zero).
    Gamma(GammaParams),
    /// Normal parameters.
    Normal(NormalParams),
}

impl DistParams {
    /// Build the concrete statrs distribution for these parameters.
    ///
    /// Returns the statrs construction error message on failure so the
    /// caller can attach sample and family context.
    pub(crate) fn dist(&self) -> Result<Dist, String> {
        match self {
            DistParams::Gamma(p) => Gamma::new(p.shape(), p.rate())
                .map(Dist::Gamma)
                .map_err(|e| e.to_string()),
            DistParams::Normal(p) => Normal::new(p.mean(), p.sd())
                .map(Dist::Normal)
                .map_err(|e| e.to_string()),
        }
    }
}

/// A constructed statrs distribution, dispatching CDF and quantile
/// evaluation to the concrete family.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Dist {
    Gamma(Gamma),
    Normal(Normal),
}

impl Dist {
    /// Cumulative distribution function at `x`.
    pub(crate) fn cdf(&self, x: f64) -> f64 {
        match self {
            Dist::Gamma(d) => d.cdf(x),
            Dist::Normal(d) => d.cdf(x),
        }
    }

    /// Quantile function (inverse CDF) at probability `p`.
    pub(crate) fn inverse_cdf(&self, p: f64) -> f64 {
        match self {
            Dist::Gamma(d) => d.inverse_cdf(p),
            Dist::Normal(d) => d.inverse_cdf(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gamma_new_valid() {
        let p = GammaParams::new(2.0, 3.0).unwrap();
        assert_relative_eq!(p.shape(), 2.0);
        assert_relative_eq!(p.scale(), 3.0);
        assert_relative_eq!(p.rate(), 1.0 / 3.0);
    }

    #[test]
    fn gamma_new_invalid() {
        assert!(GammaParams::new(0.0, 1.0).is_none());
        assert!(GammaParams::new(1.0, -1.0).is_none());
        assert!(GammaParams::new(f64::NAN, 1.0).is_none());
        assert!(GammaParams::new(f64::INFINITY, 1.0).is_none());
    }

    #[test]
    fn normal_new_valid() {
        let p = NormalParams::new(-1.5, 2.0).unwrap();
        assert_relative_eq!(p.mean(), -1.5);
        assert_relative_eq!(p.sd(), 2.0);
    }

    #[test]
    fn normal_new_invalid() {
        assert!(NormalParams::new(0.0, 0.0).is_none());
        assert!(NormalParams::new(0.0, -1.0).is_none());
        assert!(NormalParams::new(f64::NAN, 1.0).is_none());
    }

    #[test]
    fn gamma_cdf_inverse_round_trip() {
        let params = DistParams::Gamma(GammaParams::new(2.5, 4.0).unwrap());
        let dist = params.dist().unwrap();
        for &x in &[0.5, 1.0, 3.0, 10.0, 50.0] {
            let p = dist.cdf(x);
            assert_relative_eq!(dist.inverse_cdf(p), x, epsilon = 1e-8);
        }
    }

    #[test]
    fn normal_inverse_cdf_at_zero_is_neg_infinity() {
        let params = DistParams::Normal(NormalParams::new(0.0, 1.0).unwrap());
        let dist = params.dist().unwrap();
        assert_eq!(dist.inverse_cdf(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn gamma_inverse_cdf_at_zero_is_zero() {
        let params = DistParams::Gamma(GammaParams::new(2.0, 3.0).unwrap());
        let dist = params.dist().unwrap();
        assert_relative_eq!(dist.inverse_cdf(0.0), 0.0);
    }

    #[test]
    fn normal_cdf_at_mean_is_half() {
        let params = DistParams::Normal(NormalParams::new(5.0, 2.0).unwrap());
        let dist = params.dist().unwrap();
        assert_relative_eq!(dist.cdf(5.0), 0.5, epsilon = 1e-12);
    }
}
