//! Default request parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bbox::GeoBox;
use crate::time::{TimeResolution, NARR_EPOCH};

/// End of the default request range.
pub const DEFAULT_TIME_END: NaiveDate = match NaiveDate::from_ymd_opt(1989, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default end date"),
};

/// Defaults applied to requests that leave fields unspecified.
///
/// Constructed once by the caller and passed explicitly; nothing in the
/// workspace reads these from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// First day of the default time range.
    pub time_start: NaiveDate,

    /// Last day of the default time range.
    pub time_end: NaiveDate,

    /// Default temporal resolution.
    pub time_resolution: TimeResolution,

    /// Default region of interest.
    pub geo_box: GeoBox,

    /// Default measurement code (total cloud cover).
    pub measure: String,

    /// Default region tag used in plan names.
    pub region: String,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            time_start: NARR_EPOCH,
            time_end: DEFAULT_TIME_END,
            time_resolution: TimeResolution::Monthly,
            geo_box: GeoBox::WASHINGTON,
            measure: "tcdc".to_string(),
            region: "NA".to_string(),
        }
    }
}

impl QueryDefaults {
    /// Load defaults, overriding from environment variables when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NARR_DEFAULT_START") {
            if let Ok(date) = NaiveDate::parse_from_str(&val, "%Y%m%d") {
                config.time_start = date;
            }
        }

        if let Ok(val) = std::env::var("NARR_DEFAULT_END") {
            if let Ok(date) = NaiveDate::parse_from_str(&val, "%Y%m%d") {
                config.time_end = date;
            }
        }

        if let Ok(val) = std::env::var("NARR_DEFAULT_RESOLUTION") {
            if let Ok(res) = val.parse() {
                config.time_resolution = res;
            }
        }

        if let Ok(val) = std::env::var("NARR_DEFAULT_BOX") {
            if let Ok(bbox) = GeoBox::from_csv_string(&val) {
                config.geo_box = bbox;
            }
        }

        if let Ok(val) = std::env::var("NARR_DEFAULT_MEASURE") {
            config.measure = val;
        }

        config
    }

    /// Validate the defaults.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_end < self.time_start {
            return Err("time_end must not precede time_start".to_string());
        }

        if self.measure.is_empty() {
            return Err("measure must not be empty".to_string());
        }

        self.geo_box.validate().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let defaults = QueryDefaults::default();
        assert!(defaults.validate().is_ok());
        assert_eq!(defaults.geo_box, GeoBox::WASHINGTON);
        assert_eq!(defaults.measure, "tcdc");
        assert_eq!(defaults.time_start, NaiveDate::from_ymd_opt(1979, 1, 1).unwrap());
        assert_eq!(defaults.time_end, NaiveDate::from_ymd_opt(1989, 1, 1).unwrap());
    }
}
