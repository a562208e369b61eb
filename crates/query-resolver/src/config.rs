//! Configuration for the query resolver.

use chrono::NaiveDate;
use narr_common::NARR_EPOCH;
use serde::{Deserialize, Serialize};

/// Which day bounds the last domain of a multi-month hourly/daily request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinalDayRule {
    /// Bound the final month with the start date's day of month.
    ///
    /// Reproduces the slices of previously cached queries.
    StartDay,
    /// Bound the final month with the end date's day of month.
    #[default]
    EndDay,
}

impl FinalDayRule {
    /// Parse from string, defaulting to EndDay.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "start_day" | "start" | "legacy" => FinalDayRule::StartDay,
            _ => FinalDayRule::EndDay,
        }
    }
}

/// What to do when a geo box or its margin leaves a domain's axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// Clamp index ranges to the axis extent and log a warning.
    #[default]
    Clamp,
    /// Fail with `OutOfCoverage`.
    Strict,
}

impl CoveragePolicy {
    /// Parse from string, defaulting to Clamp.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "strict" | "reject" => CoveragePolicy::Strict,
            _ => CoveragePolicy::Clamp,
        }
    }
}

/// Configuration for the query resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Root of the NARR OPeNDAP catalog.
    pub base_url: String,

    /// Month that index 0 of the monthly aggregation refers to.
    pub epoch: NaiveDate,

    /// Samples per day in the three-hourly files.
    pub samples_per_day: usize,

    /// Cells added outside the nearest index on every side of the box.
    pub geo_margin: usize,

    /// Bound used for the last month of a multi-month request.
    pub final_day_rule: FinalDayRule,

    /// Handling of boxes that reach past a domain's axes.
    pub coverage_policy: CoveragePolicy,

    /// Mark daily slices so the retrieval layer averages each day's samples.
    pub mark_daily_aggregate: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://nomads.ncdc.noaa.gov/dods/NCEP_NARR".to_string(),
            epoch: NARR_EPOCH,
            samples_per_day: 8,
            geo_margin: 4,
            final_day_rule: FinalDayRule::EndDay,
            coverage_policy: CoveragePolicy::Clamp,
            mark_daily_aggregate: false,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NARR_BASE_URL") {
            config.base_url = val.trim_end_matches('/').to_string();
        }

        if let Ok(val) = std::env::var("NARR_FINAL_DAY_RULE") {
            config.final_day_rule = FinalDayRule::from_str(&val);
        }

        if let Ok(val) = std::env::var("NARR_COVERAGE_POLICY") {
            config.coverage_policy = CoveragePolicy::from_str(&val);
        }

        if let Ok(val) = std::env::var("NARR_GEO_MARGIN") {
            if let Ok(margin) = val.parse() {
                config.geo_margin = margin;
            }
        }

        if let Ok(val) = std::env::var("NARR_DAILY_AGGREGATE") {
            config.mark_daily_aggregate = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Reproduce the slice formulas of the original cached queries.
    pub fn legacy() -> Self {
        Self {
            final_day_rule: FinalDayRule::StartDay,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.samples_per_day == 0 {
            return Err("samples_per_day must be > 0".to_string());
        }

        Ok(())
    }

    /// Locator of the three-hourly file covering the month of `month`.
    pub fn daily_locator(&self, month: NaiveDate) -> String {
        format!(
            "{}_DAILY/{}",
            self.base_url,
            month.format("%Y%m/%Y%m/narr-a_221_%Y%mdd_hh00_000")
        )
    }

    /// Locator of the monthly aggregation.
    pub fn monthly_locator(&self) -> String {
        format!("{}_MONTHLY_AGGREGATIONS/narrmon-a_221_complete", self.base_url)
    }
}
