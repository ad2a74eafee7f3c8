//! Gridded NetCDF output with CF-convention coordinate metadata.
//!
//! `write_grid` persists a single lat × lon field; `write_grid_series` adds
//! an unlimited time dimension with daily or monthly stepping, encoded as
//! days since 1900-01-01. Each call creates the file anew, overwriting any
//! existing file at the path.

use std::path::Path;

use chrono::{Datelike, Days, NaiveDate};
use tracing::debug;

use crate::error::BiasCorrError;

/// CF time epoch used for the `time` coordinate.
const TIME_UNITS: &str = "days since 1900-01-01 00:00:00";

/// Granularity of the derived time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    /// Advance one day per index.
    Days,
    /// Advance one month per index, holding the day-of-month fixed and
    /// wrapping the year.
    Months,
}

/// Writes a 2-D (latitude × longitude) field to a new NetCDF file.
///
/// `values` is row-major `[lat, lon]`. The data variable is named `name`
/// with the given `units` and `missing_value` attributes and is written
/// with deflate compression.
///
/// # Errors
///
/// Returns [`BiasCorrError::GridShapeMismatch`] when `values.len()` is not
/// `lats.len() * lons.len()`, or [`BiasCorrError::Netcdf`] on file errors.
pub fn write_grid(
    path: &Path,
    lons: &[f64],
    lats: &[f64],
    values: &[f64],
    name: &str,
    units: &str,
    missing_value: f64,
) -> Result<(), BiasCorrError> {
    let expected = lats.len() * lons.len();
    if values.len() != expected {
        return Err(BiasCorrError::GridShapeMismatch {
            name: name.to_string(),
            expected,
            got: values.len(),
        });
    }

    let mut file = netcdf::create(path)?;
    file.add_dimension("latitude", lats.len())?;
    file.add_dimension("longitude", lons.len())?;

    {
        let mut var = file.add_variable::<f64>("latitude", &["latitude"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_attribute("axis", "Y")?;
        var.put_attribute("standard_name", "latitude")?;
        var.put_values(lats, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("longitude", &["longitude"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_attribute("axis", "X")?;
        var.put_attribute("standard_name", "longitude")?;
        var.put_values(lons, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>(name, &["latitude", "longitude"])?;
        var.set_compression(5, false)?;
        var.put_attribute("units", units)?;
        var.put_attribute("missing_value", missing_value)?;
        var.put_values(values, ..)?;
    }

    debug!(path = %path.display(), name, "wrote 2-D grid");
    Ok(())
}

/// Writes a 3-D (time × latitude × longitude) field to a new NetCDF file.
///
/// `values` is row-major `[time, lat, lon]` with `n_steps` time slices. The
/// time axis starts at `start` and advances by `step` per index; it is
/// stored as `f32` day offsets from 1900-01-01 with a `standard` calendar.
///
/// # Errors
///
/// Returns [`BiasCorrError::InvalidTimeAxis`] when monthly stepping lands on
/// a day that does not exist in the target month (e.g. day 31 into a 30-day
/// month), [`BiasCorrError::GridShapeMismatch`] on length mismatch, or
/// [`BiasCorrError::Netcdf`] on file errors.
#[allow(clippy::too_many_arguments)]
pub fn write_grid_series(
    path: &Path,
    lons: &[f64],
    lats: &[f64],
    values: &[f64],
    name: &str,
    units: &str,
    missing_value: f64,
    start: NaiveDate,
    step: TimeStep,
    n_steps: usize,
) -> Result<(), BiasCorrError> {
    let expected = n_steps * lats.len() * lons.len();
    if values.len() != expected {
        return Err(BiasCorrError::GridShapeMismatch {
            name: name.to_string(),
            expected,
            got: values.len(),
        });
    }

    let dates = time_axis(start, step, n_steps)?;
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1).expect("1900-01-01 is a valid date");
    let offsets: Vec<f32> = dates
        .iter()
        .map(|d| d.signed_duration_since(epoch).num_days() as f32)
        .collect();

    let lats_f32: Vec<f32> = lats.iter().map(|&v| v as f32).collect();
    let lons_f32: Vec<f32> = lons.iter().map(|&v| v as f32).collect();

    let mut file = netcdf::create(path)?;
    file.add_unlimited_dimension("time")?;
    file.add_dimension("latitude", lats.len())?;
    file.add_dimension("longitude", lons.len())?;

    {
        let mut var = file.add_variable::<f32>("time", &["time"])?;
        var.put_attribute("units", TIME_UNITS)?;
        var.put_attribute("calendar", "standard")?;
        var.put_values(&offsets, (0..n_steps,))?;
    }
    {
        let mut var = file.add_variable::<f32>("latitude", &["latitude"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_attribute("axis", "Y")?;
        var.put_attribute("standard_name", "latitude")?;
        var.put_values(&lats_f32, ..)?;
    }
    {
        let mut var = file.add_variable::<f32>("longitude", &["longitude"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_attribute("axis", "X")?;
        var.put_attribute("standard_name", "longitude")?;
        var.put_values(&lons_f32, ..)?;
    }
    {
        let mut var =
            file.add_variable::<f64>(name, &["time", "latitude", "longitude"])?;
        var.set_compression(5, false)?;
        var.put_attribute("units", units)?;
        var.put_attribute("missing_value", missing_value)?;
        var.put_values(values, (0..n_steps, 0..lats.len(), 0..lons.len()))?;
    }

    debug!(path = %path.display(), name, n_steps, "wrote 3-D grid series");
    Ok(())
}

/// Derives the time axis dates for `n_steps` steps from `start`.
fn time_axis(
    start: NaiveDate,
    step: TimeStep,
    n_steps: usize,
) -> Result<Vec<NaiveDate>, BiasCorrError> {
    match step {
        TimeStep::Days => (0..n_steps)
            .map(|i| {
                start
                    .checked_add_days(Days::new(i as u64))
                    .ok_or(BiasCorrError::InvalidTimeAxis {
                        year: start.year(),
                        month: start.month(),
                        day: start.day(),
                    })
            })
            .collect(),
        TimeStep::Months => (0..n_steps)
            .map(|i| {
                let month0 = start.month0() + i as u32;
                let year = start.year() + (month0 / 12) as i32;
                let month = month0 % 12 + 1;
                NaiveDate::from_ymd_opt(year, month, start.day()).ok_or(
                    BiasCorrError::InvalidTimeAxis {
                        year,
                        month,
                        day: start.day(),
                    },
                )
            })
            .collect(),
    }
}
