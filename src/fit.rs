//! Per-sample distribution fitting and grid evaluation.
//!
//! Fits the chosen family to a sample by maximum likelihood, then evaluates
//! the CDF on a family-specific support grid and the quantile function on a
//! shared 100-point probability grid. The gamma shape is estimated by
//! minimizing the negative concentrated log-likelihood (scale concentrated
//! out as mean / shape) over ln(shape) with Nelder-Mead; the normal fit is
//! closed form.

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use statrs::function::gamma::ln_gamma;
use tracing::debug;

use crate::error::BiasCorrError;
use crate::family::Family;
use crate::params::{DistParams, GammaParams, NormalParams};

/// Number of points in both the support and probability grids.
pub(crate) const GRID_POINTS: usize = 100;

/// Variance below which a sample is treated as degenerate.
const DEGENERATE_VARIANCE: f64 = 1e-10;

/// A distribution fitted to one sample, with its CDF sampled on the support
/// grid and its quantile function sampled on the shared probability grid.
#[derive(Debug, Clone)]
pub struct DistFit {
    params: DistParams,
    support: Vec<f64>,
    cdf: Vec<f64>,
    quantiles: Vec<f64>,
}

impl DistFit {
    /// Returns the fitted parameters.
    pub fn params(&self) -> &DistParams {
        &self.params
    }

    /// Returns the support grid the CDF was evaluated on.
    pub fn support(&self) -> &[f64] {
        &self.support
    }

    /// Returns the CDF values over the support grid.
    pub fn cdf(&self) -> &[f64] {
        &self.cdf
    }

    /// Returns the quantile values over the probability grid.
    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }
}

/// The shared probability grid: 100 evenly spaced points in \[0, 1).
///
/// The endpoint 1.0 is excluded so the quantile function is never evaluated
/// at its singularity.
pub(crate) fn probability_grid() -> Vec<f64> {
    (0..GRID_POINTS).map(|i| i as f64 / GRID_POINTS as f64).collect()
}

/// `n` evenly spaced points in \[lo, hi), endpoint excluded.
fn linspace_open(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / n as f64;
    (0..n).map(|i| lo + i as f64 * step).collect()
}

/// Support grid for a gamma fit: \[0, floor(max/100)·100 + 100).
fn gamma_support(max: f64) -> Vec<f64> {
    let hi = (max / 100.0).floor() * 100.0 + 100.0;
    linspace_open(0.0, hi, GRID_POINTS)
}

/// Support grid for a normal fit:
/// \[floor(min/2)·2 − 2, floor(max/2)·2 + 2).
fn normal_support(min: f64, max: f64) -> Vec<f64> {
    let lo = (min / 2.0).floor() * 2.0 - 2.0;
    let hi = (max / 2.0).floor() * 2.0 + 2.0;
    linspace_open(lo, hi, GRID_POINTS)
}

/// Fits `family` to `sample` and evaluates its CDF and quantile grids.
///
/// # Errors
///
/// Returns [`BiasCorrError::FitFailed`] for empty or degenerate samples,
/// non-positive values under the gamma family, or optimizer non-convergence.
pub fn fit_distribution(family: Family, sample: &[f64]) -> Result<DistFit, BiasCorrError> {
    fit_named(family, sample, "sample")
}

/// Like [`fit_distribution`], but tags errors with the sample's role.
pub(crate) fn fit_named(
    family: Family,
    sample: &[f64],
    name: &'static str,
) -> Result<DistFit, BiasCorrError> {
    let fail = |reason: String| BiasCorrError::FitFailed {
        family,
        name,
        reason,
    };

    if sample.len() < 2 {
        return Err(fail(format!(
            "need at least 2 observations, got {}",
            sample.len()
        )));
    }
    if sample.iter().any(|x| !x.is_finite()) {
        return Err(fail("sample contains non-finite values".to_string()));
    }

    let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (params, support) = match family {
        Family::Gamma => {
            let params = fit_gamma_mle(sample).map_err(&fail)?;
            debug!(
                shape = params.shape(),
                scale = params.scale(),
                name,
                "fitted gamma distribution"
            );
            (DistParams::Gamma(params), gamma_support(max))
        }
        Family::Normal => {
            let params = fit_normal_mle(sample).map_err(&fail)?;
            debug!(
                mean = params.mean(),
                sd = params.sd(),
                name,
                "fitted normal distribution"
            );
            (DistParams::Normal(params), normal_support(min, max))
        }
    };

    let dist = params.dist().map_err(&fail)?;
    let cdf = support.iter().map(|&x| dist.cdf(x)).collect();
    let quantiles = probability_grid()
        .iter()
        .map(|&p| dist.inverse_cdf(p))
        .collect();

    Ok(DistFit {
        params,
        support,
        cdf,
        quantiles,
    })
}

/// Closed-form maximum-likelihood normal fit (population standard deviation).
fn fit_normal_mle(sample: &[f64]) -> Result<NormalParams, String> {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let variance = sample.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    if variance <= DEGENERATE_VARIANCE {
        return Err("degenerate sample: variance is near zero".to_string());
    }
    NormalParams::new(mean, variance.sqrt())
        .ok_or_else(|| "estimated parameters are not finite".to_string())
}

/// Maximum-likelihood gamma fit with location fixed at zero.
///
/// The scale is concentrated out as mean / shape, leaving a one-dimensional
/// minimization of the negative log-likelihood over ln(shape). The Thom
/// approximation provides the starting point.
fn fit_gamma_mle(sample: &[f64]) -> Result<GammaParams, String> {
    if sample.iter().any(|&x| x <= 0.0) {
        return Err("sample contains non-positive values".to_string());
    }

    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let mean_ln = sample.iter().map(|&x| x.ln()).sum::<f64>() / n;

    // s = ln(mean) - mean(ln x) is zero only for a constant sample.
    let s = mean.ln() - mean_ln;
    if !s.is_finite() || s <= DEGENERATE_VARIANCE {
        return Err("degenerate sample: variance is near zero".to_string());
    }

    let k0 = (3.0 - s + ((s - 3.0).powi(2) + 24.0 * s).sqrt()) / (12.0 * s);

    let cost = GammaNll { mean, mean_ln };
    let simplex = vec![vec![k0.ln()], vec![k0.ln() + 0.2]];
    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(1e-12)
        .map_err(|e| format!("optimizer setup failed: {e}"))?;
    let result = Executor::new(cost, solver)
        .configure(|state| state.max_iters(500))
        .run()
        .map_err(|e| format!("shape optimization failed: {e}"))?;

    let best = result
        .state()
        .best_param
        .as_ref()
        .ok_or_else(|| "shape optimization produced no solution".to_string())?;

    let shape = best[0].exp();
    let scale = mean / shape;
    GammaParams::new(shape, scale)
        .ok_or_else(|| format!("estimated parameters are invalid (shape={shape}, scale={scale})"))
}

/// Cost function for argmin: per-observation negative log-likelihood of a
/// zero-location gamma distribution with the scale concentrated out.
struct GammaNll {
    mean: f64,
    mean_ln: f64,
}

impl CostFunction for GammaNll {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let shape = param[0].exp();
        if !shape.is_finite() || shape <= 0.0 {
            return Ok(f64::INFINITY);
        }
        let scale = self.mean / shape;
        // -logL / n with sum(x) / scale = n * shape.
        let nll = ln_gamma(shape) + shape * scale.ln() - (shape - 1.0) * self.mean_ln + shape;
        Ok(nll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Gamma as GammaDist, Normal as NormalDist};

    fn gamma_sample(shape: f64, scale: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let dist = GammaDist::new(shape, scale).unwrap();
        (0..n).map(|_| dist.sample(&mut rng)).collect()
    }

    #[test]
    fn probability_grid_has_100_points_below_one() {
        let grid = probability_grid();
        assert_eq!(grid.len(), 100);
        assert_relative_eq!(grid[0], 0.0);
        assert!(grid.iter().all(|&p| p < 1.0));
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn gamma_support_bounds() {
        // max = 250 -> upper bound 300, endpoint excluded.
        let grid = gamma_support(250.0);
        assert_eq!(grid.len(), 100);
        assert_relative_eq!(grid[0], 0.0);
        assert_relative_eq!(grid[99], 300.0 - 3.0);
    }

    #[test]
    fn normal_support_bounds() {
        // min = -3.5 -> lower -6, max = 7.1 -> upper 8.
        let grid = normal_support(-3.5, 7.1);
        assert_eq!(grid.len(), 100);
        assert_relative_eq!(grid[0], -6.0);
        assert!(grid[99] < 8.0);
    }

    #[test]
    fn gamma_mle_recovers_parameters() {
        let sample = gamma_sample(2.0, 3.0, 4000, 42);
        let params = fit_gamma_mle(&sample).unwrap();
        assert_relative_eq!(params.shape(), 2.0, epsilon = 0.2);
        assert_relative_eq!(params.scale(), 3.0, epsilon = 0.3);
    }

    #[test]
    fn gamma_mle_matches_sample_mean() {
        // With the scale concentrated out, the fitted mean equals the
        // sample mean exactly.
        let sample = gamma_sample(1.5, 10.0, 500, 7);
        let sample_mean = sample.iter().sum::<f64>() / sample.len() as f64;
        let params = fit_gamma_mle(&sample).unwrap();
        assert_relative_eq!(
            params.shape() * params.scale(),
            sample_mean,
            epsilon = 1e-9
        );
    }

    #[test]
    fn gamma_rejects_non_positive_values() {
        let err = fit_gamma_mle(&[1.0, 2.0, 0.0, 3.0]).unwrap_err();
        assert!(err.contains("non-positive"));
    }

    #[test]
    fn gamma_rejects_constant_sample() {
        let err = fit_gamma_mle(&[5.0; 50]).unwrap_err();
        assert!(err.contains("degenerate"));
    }

    #[test]
    fn normal_mle_exact() {
        // MLE uses the population (n-denominator) standard deviation.
        let sample = [1.0, 2.0, 3.0, 4.0];
        let params = fit_normal_mle(&sample).unwrap();
        assert_relative_eq!(params.mean(), 2.5);
        assert_relative_eq!(params.sd(), (1.25f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn normal_mle_recovers_parameters() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = NormalDist::new(10.0, 4.0).unwrap();
        let sample: Vec<f64> = (0..4000).map(|_| dist.sample(&mut rng)).collect();
        let params = fit_normal_mle(&sample).unwrap();
        assert_relative_eq!(params.mean(), 10.0, epsilon = 0.3);
        assert_relative_eq!(params.sd(), 4.0, epsilon = 0.3);
    }

    #[test]
    fn normal_rejects_constant_sample() {
        let err = fit_normal_mle(&[3.0; 20]).unwrap_err();
        assert!(err.contains("degenerate"));
    }

    #[test]
    fn fit_distribution_gamma_grids() {
        let sample = gamma_sample(2.0, 30.0, 800, 3);
        let fit = fit_distribution(Family::Gamma, &sample).unwrap();

        assert_eq!(fit.support().len(), 100);
        assert_eq!(fit.cdf().len(), 100);
        assert_eq!(fit.quantiles().len(), 100);

        // Gamma support starts at zero, where CDF and quantile are zero.
        assert_relative_eq!(fit.support()[0], 0.0);
        assert_relative_eq!(fit.cdf()[0], 0.0);
        assert_relative_eq!(fit.quantiles()[0], 0.0);

        // CDF and quantiles are non-decreasing.
        assert!(fit.cdf().windows(2).all(|w| w[1] >= w[0]));
        assert!(fit.quantiles().windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn fit_distribution_normal_first_quantile_is_neg_infinity() {
        let mut rng = StdRng::seed_from_u64(5);
        let dist = NormalDist::new(0.0, 1.0).unwrap();
        let sample: Vec<f64> = (0..500).map(|_| dist.sample(&mut rng)).collect();
        let fit = fit_distribution(Family::Normal, &sample).unwrap();
        assert_eq!(fit.quantiles()[0], f64::NEG_INFINITY);
        assert!(fit.quantiles()[1].is_finite());
    }

    #[test]
    fn fit_distribution_degenerate_is_typed_error() {
        let err = fit_distribution(Family::Normal, &[2.0; 10]).unwrap_err();
        assert!(matches!(err, BiasCorrError::FitFailed { .. }));
    }

    #[test]
    fn fit_distribution_too_short() {
        let err = fit_distribution(Family::Gamma, &[1.0]).unwrap_err();
        assert!(matches!(err, BiasCorrError::FitFailed { .. }));
    }
}
