//! Configuration for series transformations.

use std::fmt;
use std::str::FromStr;

use narr_common::NarrError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Kernel used to resample NARR grids onto a finer or coarser lattice.
///
/// Every kernel treats missing-value cells as holes; see
/// [`GridView`](crate::resample::GridView).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Copy the closest cell; cloud cover percentages stay exact.
    Nearest,
    /// Blend the four surrounding cells.
    #[default]
    Bilinear,
    /// Catmull-Rom over a 4x4 neighbourhood, for smooth fields like 2m air.
    Cubic,
}

impl InterpolationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Cubic => "cubic",
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMethod {
    type Err = NarrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" | "linear" => Ok(Self::Bilinear),
            "cubic" | "bicubic" => Ok(Self::Cubic),
            other => Err(NarrError::invalid_parameter(
                "interpolation",
                format!("unknown kernel '{}'", other),
            )),
        }
    }
}

/// Configuration for an observation series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Kernel used by `resample`.
    pub interpolation: InterpolationMethod,
}

impl SeriesConfig {
    /// Load configuration from environment variables.
    ///
    /// An unrecognised `GRID_INTERPOLATION` keeps the default and logs a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRID_INTERPOLATION") {
            match val.parse() {
                Ok(method) => config.interpolation = method,
                Err(e) => warn!(error = %e, default = %config.interpolation, "Ignoring GRID_INTERPOLATION"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_parsing() {
        assert_eq!("Nearest".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Nearest);
        assert_eq!(" bicubic ".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Cubic);
        assert!(matches!(
            "lanczos".parse::<InterpolationMethod>(),
            Err(NarrError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_display_parses_back() {
        for method in [
            InterpolationMethod::Nearest,
            InterpolationMethod::Bilinear,
            InterpolationMethod::Cubic,
        ] {
            assert_eq!(method.to_string().parse::<InterpolationMethod>().unwrap(), method);
        }
    }
}
