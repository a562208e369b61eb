//! Query request types.
//!
//! A request is what a caller asks for; the resolver turns it into a
//! [`QueryPlan`](crate::QueryPlan). The canonical name is available on the
//! request itself so caches can be consulted before any axes are fetched.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use narr_common::{GeoBox, QueryDefaults, TimeResolution};
//! use query_resolver::QueryRequest;
//!
//! let request = QueryRequest::from_defaults(&QueryDefaults::default())
//!     .between(
//!         NaiveDate::from_ymd_opt(1980, 1, 15).unwrap(),
//!         NaiveDate::from_ymd_opt(1980, 3, 15).unwrap(),
//!     )
//!     .at_resolution(TimeResolution::Daily)
//!     .within(GeoBox::USA);
//!
//! assert_eq!(request.canonical_name(), "19800115_19800315_tcdc_daily_NA_24,-133_50,-65");
//! ```

use chrono::NaiveDate;
use narr_common::{month_span, GeoBox, NarrError, NarrResult, QueryDefaults, TimeResolution};
use serde::{Deserialize, Serialize};

/// Separator between canonical name components.
pub const NAME_SEPARATOR: char = '_';

/// A request for one measurement over a time range and geo box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// First day requested (inclusive).
    pub time_start: NaiveDate,

    /// Last day requested.
    pub time_end: NaiveDate,

    /// Temporal granularity.
    pub time_resolution: TimeResolution,

    /// Region of interest.
    pub geo_box: GeoBox,

    /// NARR variable code (e.g., "tcdc", "air2m").
    pub measure: String,

    /// Region tag carried into the canonical name (e.g., a state code).
    pub region: String,
}

impl QueryRequest {
    pub fn new(
        time_start: NaiveDate,
        time_end: NaiveDate,
        time_resolution: TimeResolution,
        geo_box: GeoBox,
        measure: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            time_start,
            time_end,
            time_resolution,
            geo_box,
            measure: measure.into(),
            region: region.into(),
        }
    }

    /// Start from a set of defaults.
    pub fn from_defaults(defaults: &QueryDefaults) -> Self {
        Self {
            time_start: defaults.time_start,
            time_end: defaults.time_end,
            time_resolution: defaults.time_resolution,
            geo_box: defaults.geo_box,
            measure: defaults.measure.clone(),
            region: defaults.region.clone(),
        }
    }

    /// Set the time range.
    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.time_start = start;
        self.time_end = end;
        self
    }

    /// Set the temporal resolution.
    pub fn at_resolution(mut self, resolution: TimeResolution) -> Self {
        self.time_resolution = resolution;
        self
    }

    /// Set the geo box.
    pub fn within(mut self, geo_box: GeoBox) -> Self {
        self.geo_box = geo_box;
        self
    }

    /// Set the measurement code.
    pub fn measuring(mut self, measure: impl Into<String>) -> Self {
        self.measure = measure.into();
        self
    }

    /// Set the region tag.
    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Calendar months between start and end.
    pub fn month_span(&self) -> i64 {
        month_span(self.time_start, self.time_end)
    }

    /// Check the request before resolution.
    pub fn validate(&self) -> NarrResult<()> {
        if self.time_end < self.time_start {
            return Err(NarrError::InvalidTime(format!(
                "time_end {} precedes time_start {}",
                self.time_end, self.time_start
            )));
        }

        self.geo_box.validate()?;

        check_name_component("measure", &self.measure)?;
        check_name_component("region", &self.region)?;
        Ok(())
    }

    /// Deterministic cache key for this request.
    ///
    /// Format: `YYYYMMDD_YYYYMMDD_measure_resolution_region_latmin,lonmin_latmax,lonmax`.
    /// Pure function of the request; safe to call before resolution.
    pub fn canonical_name(&self) -> String {
        let parts = [
            self.time_start.format("%Y%m%d").to_string(),
            self.time_end.format("%Y%m%d").to_string(),
            self.measure.clone(),
            self.time_resolution.as_str().to_string(),
            self.region.clone(),
            self.geo_box.name_fragment(),
        ];
        parts.join(&NAME_SEPARATOR.to_string())
    }
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self::from_defaults(&QueryDefaults::default())
    }
}

fn check_name_component(param: &str, value: &str) -> NarrResult<()> {
    if value.is_empty() {
        return Err(NarrError::invalid_parameter(param, "must not be empty"));
    }
    // A separator inside a component would let two requests share a name.
    if value.contains(NAME_SEPARATOR) || value.contains('/') {
        return Err(NarrError::invalid_parameter(
            param,
            format!("'{}' contains a reserved character", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_request_name() {
        let request = QueryRequest::default();
        assert_eq!(
            request.canonical_name(),
            "19790101_19890101_tcdc_monthly_NA_45,-125_51,-116"
        );
    }

    #[test]
    fn test_builder() {
        let request = QueryRequest::default()
            .between(ymd(2000, 1, 1), ymd(2000, 2, 1))
            .at_resolution(TimeResolution::Hourly)
            .measuring("air2m")
            .in_region("WA");

        assert_eq!(request.month_span(), 1);
        assert_eq!(request.measure, "air2m");
        assert_eq!(request.region, "WA");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let request = QueryRequest::default().between(ymd(1980, 3, 1), ymd(1980, 1, 1));
        assert!(matches!(request.validate(), Err(NarrError::InvalidTime(_))));
    }

    #[test]
    fn test_separator_in_measure_is_rejected() {
        let request = QueryRequest::default().measuring("air_2m");
        assert!(matches!(
            request.validate(),
            Err(NarrError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_distinct_requests_have_distinct_names() {
        let a = QueryRequest::default();
        let b = a.clone().at_resolution(TimeResolution::Daily);
        let c = a.clone().in_region("WA");
        let d = a.clone().within(GeoBox::USA);
        let names = [a, b, c, d].map(|r| r.canonical_name());
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                assert_ne!(names[i], names[j]);
            }
        }
    }
}
