//! Six-panel diagnostic figure for a fitted correction.
//!
//! Layout (three rows): scatter / source histogram / reference histogram,
//! overlaid CDF curves / quantile-pair fit, and the full-width
//! original-vs-corrected series overlay. Rendered with the plotters bitmap
//! backend; the image format follows the path's extension.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::debug;

use crate::error::BiasCorrError;
use crate::fit::DistFit;
use crate::poly::Cubic;

const FIGURE_SIZE: (u32, u32) = (1500, 1500);
const HIST_BINS: usize = 20;

const SERIES_BLUE: RGBColor = RGBColor(31, 119, 180);
const SERIES_ORANGE: RGBColor = RGBColor(255, 127, 14);
const SERIES_PURPLE: RGBColor = RGBColor(148, 103, 189);
const FIT_RED: RGBColor = RGBColor(255, 99, 71);
const PAIR_GRAY: RGBColor = RGBColor(105, 105, 105);

/// Destination and display labels for the diagnostic figure.
#[derive(Debug, Clone)]
pub struct PlotSpec {
    path: PathBuf,
    source_label: String,
    reference_label: String,
}

impl PlotSpec {
    /// Creates a plot specification. The image format is chosen by the
    /// plotting backend from the path's extension.
    pub fn new(
        path: impl Into<PathBuf>,
        source_label: impl Into<String>,
        reference_label: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            source_label: source_label.into(),
            reference_label: reference_label.into(),
        }
    }

    /// Returns the destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Everything the figure needs from the fitting pipeline.
pub(crate) struct Diagnostics<'a> {
    pub source: &'a [f64],
    pub reference: &'a [f64],
    pub source_fit: &'a DistFit,
    pub reference_fit: &'a DistFit,
    pub pair_xs: &'a [f64],
    pub pair_ys: &'a [f64],
    pub predictions: &'a [f64],
    pub corrected: &'a [f64],
    pub correlation: f64,
    pub cubic: Cubic,
}

/// Renders the six-panel figure to `spec.path()`.
pub(crate) fn render(spec: &PlotSpec, diag: &Diagnostics<'_>) -> Result<(), BiasCorrError> {
    render_inner(spec, diag).map_err(|e| BiasCorrError::Plot {
        path: spec.path.clone(),
        reason: e.to_string(),
    })?;
    debug!(path = %spec.path.display(), "wrote diagnostic figure");
    Ok(())
}

fn render_inner(
    spec: &PlotSpec,
    diag: &Diagnostics<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(&spec.path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let rows = root.split_evenly((3, 1));
    let top = rows[0].split_evenly((1, 3));
    let (cdf_area, pair_area) = rows[1].split_horizontally((FIGURE_SIZE.0 * 2 / 3) as i32);

    draw_scatter(&top[0], diag, spec)?;
    draw_histogram(
        &top[1],
        diag.source,
        diag.source_fit.support(),
        &format!("Histogram {}", spec.source_label),
        SERIES_BLUE,
    )?;
    draw_histogram(
        &top[2],
        diag.reference,
        diag.reference_fit.support(),
        &format!("Histogram {}", spec.reference_label),
        SERIES_ORANGE,
    )?;
    draw_cdf(&cdf_area, diag, spec)?;
    draw_pair_fit(&pair_area, diag)?;
    draw_correction(&rows[2], diag, spec)?;

    root.present()?;
    Ok(())
}

/// Range of a slice, padded so plotters never sees an empty axis.
fn padded_range(values: &[f64]) -> (f64, f64) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if max > min {
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    } else {
        (min - 1.0, max + 1.0)
    }
}

fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    diag: &Diagnostics<'_>,
    spec: &PlotSpec,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = padded_range(diag.source);
    let (y_min, y_max) = padded_range(diag.reference);

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(spec.source_label.as_str())
        .y_desc(spec.reference_label.as_str())
        .draw()?;

    chart
        .draw_series(
            diag.source
                .iter()
                .zip(diag.reference.iter())
                .map(|(&x, &y)| Circle::new((x, y), 3, BLACK.filled())),
        )?
        .label(format!("corr: {:.2}", diag.correlation))
        .legend(|(x, y)| Circle::new((x, y), 3, BLACK.filled()));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    values: &[f64],
    support: &[f64],
    title: &str,
    color: RGBColor,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    // Bin over the support-grid range, matching the fitted distribution's
    // domain rather than the raw sample range.
    let lo = support[0];
    let hi = support[support.len() - 1];
    let width = (hi - lo).max(f64::EPSILON) / HIST_BINS as f64;

    let mut counts = vec![0usize; HIST_BINS];
    for &v in values {
        if v >= lo && v <= hi {
            let bin = (((v - lo) / width) as usize).min(HIST_BINS - 1);
            counts[bin] += 1;
        }
    }
    let max_count = counts.iter().copied().max().unwrap_or(0).max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, 0.0..max_count * 1.05)?;

    chart.configure_mesh().draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = lo + i as f64 * width;
        let x1 = x0 + width;
        Rectangle::new([(x0, 0.0), (x1, count as f64)], color.filled())
    }))?;
    Ok(())
}

fn draw_cdf<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    diag: &Diagnostics<'_>,
    spec: &PlotSpec,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    // Both curves share the wider of the two support grids, so the CDFs are
    // directly comparable on one axis.
    let src_support = diag.source_fit.support();
    let ref_support = diag.reference_fit.support();
    let shared = if src_support[src_support.len() - 1] > ref_support[ref_support.len() - 1] {
        src_support
    } else {
        ref_support
    };

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .caption("CDF", ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(shared[0]..shared[shared.len() - 1], 0.0..1.05)?;

    chart.configure_mesh().draw()?;

    chart
        .draw_series(LineSeries::new(
            shared
                .iter()
                .zip(diag.source_fit.cdf().iter())
                .map(|(&x, &p)| (x, p)),
            SERIES_BLUE.stroke_width(2),
        ))?
        .label(spec.source_label.as_str())
        .legend(|(x, y)| PathElement::new([(x, y), (x + 15, y)], SERIES_BLUE.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            shared
                .iter()
                .zip(diag.reference_fit.cdf().iter())
                .map(|(&x, &p)| (x, p)),
            SERIES_ORANGE.stroke_width(2),
        ))?
        .label(spec.reference_label.as_str())
        .legend(|(x, y)| PathElement::new([(x, y), (x + 15, y)], SERIES_ORANGE.stroke_width(2)));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn draw_pair_fit<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    diag: &Diagnostics<'_>,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = padded_range(diag.pair_xs);
    let mut y_all: Vec<f64> = diag.pair_ys.to_vec();
    y_all.extend_from_slice(diag.predictions);
    let (y_min, y_max) = padded_range(&y_all);

    let [a, b, c] = diag.cubic.coefficients();
    let equation = format!("{a:.5}x^3 + {b:.5}x^2 + {c:.5}x");

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart.configure_mesh().draw()?;

    chart
        .draw_series(
            diag.pair_xs
                .iter()
                .zip(diag.pair_ys.iter())
                .map(|(&x, &y)| Circle::new((x, y), 3, PAIR_GRAY.filled())),
        )?
        .label("inv cdf")
        .legend(|(x, y)| Circle::new((x, y), 3, PAIR_GRAY.filled()));

    chart
        .draw_series(LineSeries::new(
            diag.pair_xs
                .iter()
                .zip(diag.predictions.iter())
                .map(|(&x, &y)| (x, y)),
            FIT_RED.stroke_width(2),
        ))?
        .label(equation)
        .legend(|(x, y)| PathElement::new([(x, y), (x + 15, y)], FIT_RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn draw_correction<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    diag: &Diagnostics<'_>,
    spec: &PlotSpec,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let mut y_all: Vec<f64> = diag.source.to_vec();
    y_all.extend_from_slice(diag.corrected);
    let (y_min, y_max) = padded_range(&y_all);
    let n = diag.source.len().max(1);

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .caption("Correction", ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..n as f64, y_min..y_max)?;

    chart.configure_mesh().draw()?;

    chart
        .draw_series(LineSeries::new(
            diag.source
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, v)),
            SERIES_BLUE.stroke_width(2),
        ))?
        .label(spec.source_label.as_str())
        .legend(|(x, y)| PathElement::new([(x, y), (x + 15, y)], SERIES_BLUE.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            diag.corrected
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, v)),
            SERIES_PURPLE.stroke_width(2),
        ))?
        .label(format!("{} (out)", spec.source_label))
        .legend(|(x, y)| PathElement::new([(x, y), (x + 15, y)], SERIES_PURPLE.stroke_width(2)));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;
    Ok(())
}
