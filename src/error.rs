//! Error types for the biascorr crate.

use std::path::PathBuf;

use crate::family::Family;

/// Error type for all fallible operations in the biascorr crate.
///
/// Distribution-fit and polynomial-fit failures are expected outcomes for
/// degenerate inputs and are reported as dedicated variants so callers can
/// distinguish them from plotting and file I/O failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BiasCorrError {
    /// Returned when an input sample is empty.
    #[error("sample '{name}' is empty")]
    EmptySample {
        /// Which sample was empty (`"source"` or `"reference"`).
        name: &'static str,
    },

    /// Returned when a distribution-family string is not recognized.
    #[error("unknown distribution family: '{name}' (expected 'gamma' or 'normal')")]
    UnknownFamily {
        /// The unrecognized selector.
        name: String,
    },

    /// Returned when a distribution cannot be fitted to a sample.
    #[error("{family} fit failed for sample '{name}': {reason}")]
    FitFailed {
        /// The distribution family that was being fitted.
        family: Family,
        /// Which sample failed (`"source"` or `"reference"`).
        name: &'static str,
        /// Description of the failure.
        reason: String,
    },

    /// Returned when fewer than 3 strictly positive quantile pairs remain
    /// after filtering, so the cubic is underdetermined.
    #[error("insufficient quantile pairs for cubic fit: got {got}, need at least 3")]
    InsufficientPairs {
        /// Number of usable pairs.
        got: usize,
    },

    /// Returned when the cubic least-squares system cannot be solved.
    #[error("cubic fit failed: {reason}")]
    PolyFitFailed {
        /// Description of the failure.
        reason: String,
    },

    /// Wraps an error from the plotting backend.
    #[error("plot rendering failed for {}: {reason}", path.display())]
    Plot {
        /// Destination path of the figure.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Returned when coordinate or value array lengths do not agree.
    #[error("grid shape mismatch for '{name}': expected {expected} values, got {got}")]
    GridShapeMismatch {
        /// Name of the data variable being written.
        name: String,
        /// Expected flat length from the coordinate arrays.
        expected: usize,
        /// Actual length of the value slice.
        got: usize,
    },

    /// Returned when a time axis entry does not form a valid calendar date,
    /// e.g. monthly stepping from day 31 into a 30-day month.
    #[error("invalid time axis entry: {year:04}-{month:02}-{day:02} is not a valid date")]
    InvalidTimeAxis {
        /// Year of the offending entry.
        year: i32,
        /// Month of the offending entry.
        month: u32,
        /// Fixed day-of-month that does not exist in that month.
        day: u32,
    },
}

impl From<netcdf::Error> for BiasCorrError {
    fn from(e: netcdf::Error) -> Self {
        BiasCorrError::Netcdf {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_empty_sample() {
        let e = BiasCorrError::EmptySample { name: "source" };
        assert_eq!(e.to_string(), "sample 'source' is empty");
    }

    #[test]
    fn error_unknown_family() {
        let e = BiasCorrError::UnknownFamily {
            name: "lognormal".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "unknown distribution family: 'lognormal' (expected 'gamma' or 'normal')"
        );
    }

    #[test]
    fn error_fit_failed() {
        let e = BiasCorrError::FitFailed {
            family: Family::Gamma,
            name: "reference",
            reason: "sample contains non-positive values".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "gamma fit failed for sample 'reference': sample contains non-positive values"
        );
    }

    #[test]
    fn error_insufficient_pairs() {
        let e = BiasCorrError::InsufficientPairs { got: 2 };
        assert_eq!(
            e.to_string(),
            "insufficient quantile pairs for cubic fit: got 2, need at least 3"
        );
    }

    #[test]
    fn error_invalid_time_axis() {
        let e = BiasCorrError::InvalidTimeAxis {
            year: 2001,
            month: 2,
            day: 31,
        };
        assert_eq!(
            e.to_string(),
            "invalid time axis entry: 2001-02-31 is not a valid date"
        );
    }

    #[test]
    fn error_grid_shape_mismatch() {
        let e = BiasCorrError::GridShapeMismatch {
            name: "precip".to_string(),
            expected: 12,
            got: 10,
        };
        assert_eq!(
            e.to_string(),
            "grid shape mismatch for 'precip': expected 12 values, got 10"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<BiasCorrError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<BiasCorrError>();
    }
}
