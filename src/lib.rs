//! Parametric quantile-mapping bias correction.
//!
//! This crate relates a "to-correct" series (typically model output) to a
//! reference series (typically observations) by fitting the same parametric
//! distribution to both and matching their quantiles.
//!
//! # Pipeline
//!
//! 1. **Fit** a gamma (location fixed at zero) or normal distribution to
//!    each sample by maximum likelihood
//! 2. **Pair** the two quantile functions on a shared 100-point probability
//!    grid in \[0, 1), keeping only strictly positive pairs
//! 3. **Map** the pairs with a no-intercept cubic `a·x³ + b·x² + c·x`
//!    fitted by least squares
//!
//! The three coefficients transform any value of the to-correct series into
//! the reference series' scale. An optional six-panel diagnostic figure and
//! CF-style NetCDF grid writers round out the pipeline.
//!
//! # Quick start
//!
//! ```
//! use biascorr::{fit_correction, Family};
//!
//! # fn main() -> Result<(), biascorr::BiasCorrError> {
//! // Model output to correct, and the observed reference (e.g. mm/month).
//! let model = vec![12.0, 5.5, 20.1, 8.2, 15.0, 3.3, 9.9, 30.2, 7.1, 11.4];
//! let observed = vec![10.0, 4.0, 18.5, 7.0, 13.2, 2.1, 8.8, 26.0, 6.3, 10.1];
//!
//! let fit = fit_correction(&model, &observed, Family::Gamma, 0.92, None)?;
//! let [a, b, c] = fit.coefficients();
//! let corrected = fit.correct(&model);
//! # assert_eq!(corrected.len(), model.len());
//! # let _ = (a, b, c);
//! # Ok(())
//! # }
//! ```

mod error;
mod family;
mod fit;
mod netcdf_write;
mod params;
mod plot;
mod poly;
mod result;

pub use error::BiasCorrError;
pub use family::Family;
pub use fit::{DistFit, fit_distribution};
pub use netcdf_write::{TimeStep, write_grid, write_grid_series};
pub use params::{DistParams, GammaParams, NormalParams};
pub use plot::PlotSpec;
pub use poly::Cubic;
pub use result::CorrectionFit;

use tracing::debug;

/// Fits a quantile-mapping correction from `source` onto `reference`.
///
/// Both samples are fitted independently with `family`, their quantile
/// functions are paired on a shared probability grid, and a no-intercept
/// cubic is fitted through the strictly positive pairs. `correlation` is a
/// precomputed statistic passed through to the diagnostic figure only.
///
/// When `plot` is given, the six-panel figure is rendered to its path; the
/// corrected series drawn in the overlay panel is computed only in that
/// case.
///
/// # Errors
///
/// Returns [`BiasCorrError::EmptySample`] for an empty input,
/// [`BiasCorrError::FitFailed`] when either distribution fit fails,
/// [`BiasCorrError::InsufficientPairs`] or [`BiasCorrError::PolyFitFailed`]
/// when the cubic cannot be fitted, and [`BiasCorrError::Plot`] when
/// rendering fails.
pub fn fit_correction(
    source: &[f64],
    reference: &[f64],
    family: Family,
    correlation: f64,
    plot: Option<&PlotSpec>,
) -> Result<CorrectionFit, BiasCorrError> {
    if source.is_empty() {
        return Err(BiasCorrError::EmptySample { name: "source" });
    }
    if reference.is_empty() {
        return Err(BiasCorrError::EmptySample { name: "reference" });
    }

    let source_fit = fit::fit_named(family, source, "source")?;
    let reference_fit = fit::fit_named(family, reference, "reference")?;

    // Element-wise pairing is valid because both quantile functions were
    // evaluated on the same probability grid. The cubic has no intercept,
    // so only strictly positive pairs are usable.
    let (pair_xs, pair_ys): (Vec<f64>, Vec<f64>) = source_fit
        .quantiles()
        .iter()
        .zip(reference_fit.quantiles().iter())
        .filter(|&(&x, &y)| x > 0.0 && y > 0.0)
        .map(|(&x, &y)| (x, y))
        .unzip();

    let cubic = poly::fit_cubic(&pair_xs, &pair_ys)?;
    let predictions: Vec<f64> = pair_xs.iter().map(|&x| cubic.eval(x)).collect();
    let r_squared = poly::r_squared(&pair_ys, &predictions);

    debug!(
        %family,
        n_pairs = pair_xs.len(),
        r_squared,
        "fitted quantile-mapping cubic"
    );

    if let Some(spec) = plot {
        let corrected: Vec<f64> = source.iter().map(|&x| cubic.eval(x)).collect();
        let diag = plot::Diagnostics {
            source,
            reference,
            source_fit: &source_fit,
            reference_fit: &reference_fit,
            pair_xs: &pair_xs,
            pair_ys: &pair_ys,
            predictions: &predictions,
            corrected: &corrected,
            correlation,
            cubic,
        };
        plot::render(spec, &diag)?;
    }

    Ok(CorrectionFit::new(cubic, r_squared, pair_xs.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_error() {
        let result = fit_correction(&[], &[1.0, 2.0], Family::Gamma, 0.0, None);
        assert!(matches!(
            result,
            Err(BiasCorrError::EmptySample { name: "source" })
        ));
    }

    #[test]
    fn empty_reference_is_error() {
        let result = fit_correction(&[1.0, 2.0], &[], Family::Normal, 0.0, None);
        assert!(matches!(
            result,
            Err(BiasCorrError::EmptySample { name: "reference" })
        ));
    }

    #[test]
    fn degenerate_source_is_fit_failure() {
        let constant = vec![5.0; 30];
        let varied: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let result = fit_correction(&constant, &varied, Family::Gamma, 0.0, None);
        assert!(matches!(
            result,
            Err(BiasCorrError::FitFailed { name: "source", .. })
        ));
    }
}
