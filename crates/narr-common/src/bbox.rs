//! Geographic box types and operations.

use crate::error::{NarrError, NarrResult};
use serde::{Deserialize, Serialize};

/// A rectangular latitude/longitude region of interest, in degrees.
///
/// Bounds are ordered the way NARR requests list them:
/// `[lat_min, lat_max, lon_min, lon_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl GeoBox {
    /// Contiguous United States.
    pub const USA: GeoBox = GeoBox {
        lat_min: 24.0,
        lat_max: 50.0,
        lon_min: -133.0,
        lon_max: -65.0,
    };

    /// Washington state.
    pub const WASHINGTON: GeoBox = GeoBox {
        lat_min: 45.0,
        lat_max: 51.0,
        lon_min: -125.0,
        lon_max: -116.0,
    };

    /// Ten-degree box over the Great Basin.
    pub const DEFAULT: GeoBox = GeoBox {
        lat_min: 35.0,
        lat_max: 45.0,
        lon_min: -117.0,
        lon_max: -107.0,
    };

    /// Create a geo box, rejecting inverted or non-finite bounds.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> NarrResult<Self> {
        let bbox = Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Parse a comma separated box: "lat_min,lat_max,lon_min,lon_max"
    pub fn from_csv_string(s: &str) -> NarrResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(NarrError::InvalidBbox(format!(
                "{}. Expected 'lat_min,lat_max,lon_min,lon_max'",
                s
            )));
        }

        let mut bounds = [0.0f64; 4];
        for (slot, part) in bounds.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| NarrError::InvalidBbox(format!("invalid number '{}'", part)))?;
        }

        Self::new(bounds[0], bounds[1], bounds[2], bounds[3])
    }

    /// Check the ordering invariant: lat_min < lat_max and lon_min < lon_max.
    pub fn validate(&self) -> NarrResult<()> {
        let all_finite = [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(NarrError::InvalidBbox(format!("non-finite bound in {:?}", self)));
        }
        if self.lat_min >= self.lat_max {
            return Err(NarrError::InvalidBbox(format!(
                "lat_min {} must be below lat_max {}",
                self.lat_min, self.lat_max
            )));
        }
        if self.lon_min >= self.lon_max {
            return Err(NarrError::InvalidBbox(format!(
                "lon_min {} must be below lon_max {}",
                self.lon_min, self.lon_max
            )));
        }
        Ok(())
    }

    /// Extent in longitude degrees.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Extent in latitude degrees.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Check if a point is contained within this box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// Grow the box by `pad` degrees on every side.
    pub fn expand(&self, pad: f64) -> Self {
        Self {
            lat_min: self.lat_min - pad,
            lat_max: self.lat_max + pad,
            lon_min: self.lon_min - pad,
            lon_max: self.lon_max + pad,
        }
    }

    /// Bounds as `[lat_min, lat_max, lon_min, lon_max]`.
    pub fn as_array(&self) -> [f64; 4] {
        [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
    }

    /// Name fragment for cache keys: "lat_min,lon_min_lat_max,lon_max".
    ///
    /// Bounds are truncated toward zero so names stay compatible with
    /// existing cached queries.
    pub fn name_fragment(&self) -> String {
        format!(
            "{},{}_{},{}",
            self.lat_min.trunc() as i64,
            self.lon_min.trunc() as i64,
            self.lat_max.trunc() as i64,
            self.lon_max.trunc() as i64
        )
    }
}

impl Default for GeoBox {
    fn default() -> Self {
        GeoBox::WASHINGTON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_box() {
        let bbox = GeoBox::from_csv_string("24, 50, -133, -65").unwrap();
        assert_eq!(bbox, GeoBox::USA);
    }

    #[test]
    fn test_name_fragment_truncates() {
        let bbox = GeoBox::new(45.9, 51.2, -125.7, -116.1).unwrap();
        assert_eq!(bbox.name_fragment(), "45,-125_51,-116");
    }
}
