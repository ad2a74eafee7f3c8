//! Distribution family selection.

use std::fmt;
use std::str::FromStr;

use crate::error::BiasCorrError;

/// Parametric distribution family used to model both samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Gamma distribution with location fixed at zero (shape and scale free).
    Gamma,
    /// Normal distribution (mean and standard deviation).
    Normal,
}

impl Family {
    /// Returns the lowercase selector string for this family.
    pub fn as_str(self) -> &'static str {
        match self {
            Family::Gamma => "gamma",
            Family::Normal => "normal",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = BiasCorrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gamma" => Ok(Family::Gamma),
            "normal" => Ok(Family::Normal),
            other => Err(BiasCorrError::UnknownFamily {
                name: other.to_string(),
            }),
        }
    }
}
