//! Time partitioning and geo index resolution.

use chrono::{Datelike, NaiveDate};
use narr_common::{add_months, first_of_month, month_span, GeoBox, NarrError, NarrResult, TimeResolution};
use tracing::{debug, info, warn};

use crate::axes::{nearest_index, AxisSource, CoordinateAxes};
use crate::config::{CoveragePolicy, FinalDayRule, ResolverConfig};
use crate::plan::{DomainSlice, IndexRange, QueryPlan, TimeSlice};
use crate::request::QueryRequest;

/// A domain and its time slice, before geo indices are known.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainWindow {
    pub domain_id: String,
    pub month: NaiveDate,
    pub time: TimeSlice,
}

/// Resolves requests into query plans against the axes of each domain.
#[derive(Debug, Clone)]
pub struct QueryResolver<A> {
    config: ResolverConfig,
    axes: A,
}

impl<A: AxisSource> QueryResolver<A> {
    pub fn new(config: ResolverConfig, axes: A) -> Self {
        Self { config, axes }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a request into an ordered plan.
    ///
    /// Fails fast: the first domain whose axes are unusable aborts the
    /// whole resolution.
    pub fn resolve(&self, request: &QueryRequest) -> NarrResult<QueryPlan> {
        request.validate()?;

        let windows = partition_time(&self.config, request)?;
        let mut domains = Vec::with_capacity(windows.len());

        for window in windows {
            let axes = self.axes.axes(&window.domain_id)?;
            let (lat, lon) = resolve_geo_indices(&self.config, &axes, &request.geo_box)?;

            debug!(
                domain = %window.domain_id,
                time = ?window.time,
                lat = ?lat,
                lon = ?lon,
                "Resolved domain slice"
            );

            domains.push(DomainSlice {
                domain_id: window.domain_id,
                month: window.month,
                measurement: request.measure.clone(),
                time_resolution: request.time_resolution,
                geo_box: request.geo_box,
                time: window.time,
                lat,
                lon,
            });
        }

        let plan = QueryPlan::new(request.clone(), domains);
        info!(name = %plan.name(), domains = plan.len(), "Resolved query plan");
        Ok(plan)
    }
}

/// Split a request's time range into domains with their time slices.
///
/// Monthly requests read one aggregated dataset; hourly and daily
/// requests read one three-hourly file per calendar month spanned.
pub fn partition_time(
    config: &ResolverConfig,
    request: &QueryRequest,
) -> NarrResult<Vec<DomainWindow>> {
    if request.time_end < request.time_start {
        return Err(NarrError::InvalidTime(format!(
            "time_end {} precedes time_start {}",
            request.time_end, request.time_start
        )));
    }

    match request.time_resolution {
        TimeResolution::Monthly => Ok(vec![monthly_window(config, request)?]),
        TimeResolution::Hourly | TimeResolution::Daily => monthly_files(config, request),
    }
}

fn monthly_window(config: &ResolverConfig, request: &QueryRequest) -> NarrResult<DomainWindow> {
    let offset = month_span(config.epoch, request.time_start);
    if offset < 0 {
        return Err(NarrError::InvalidTime(format!(
            "time_start {} precedes the monthly record starting {}",
            request.time_start, config.epoch
        )));
    }

    let start = offset as usize;
    let end = start + request.month_span() as usize + 1;

    Ok(DomainWindow {
        domain_id: config.monthly_locator(),
        month: first_of_month(request.time_start),
        time: TimeSlice::bounded(start, end),
    })
}

fn monthly_files(config: &ResolverConfig, request: &QueryRequest) -> NarrResult<Vec<DomainWindow>> {
    let spd = config.samples_per_day;
    let months = request.month_span() as u32;
    let first = first_of_month(request.time_start);
    let day_offset = |date: NaiveDate| (date.day() as usize - 1) * spd;

    let first_index = day_offset(request.time_start);
    let final_index = match config.final_day_rule {
        FinalDayRule::StartDay => day_offset(request.time_start),
        FinalDayRule::EndDay => day_offset(request.time_end),
    };

    let mut windows = Vec::with_capacity(months as usize + 1);
    for i in 0..=months {
        let month = add_months(first, i).ok_or_else(|| {
            NarrError::InvalidTime(format!("month {} after {} is out of range", i, first))
        })?;

        let mut time = if months == 0 {
            TimeSlice::bounded(first_index, day_offset(request.time_end))
        } else if i == 0 {
            TimeSlice::starting_at(first_index)
        } else if i == months {
            TimeSlice::ending_at(final_index)
        } else {
            TimeSlice::full()
        };

        if config.mark_daily_aggregate && request.time_resolution == TimeResolution::Daily {
            time = time.aggregated(spd);
        }

        windows.push(DomainWindow {
            domain_id: config.daily_locator(month),
            month,
            time,
        });
    }

    Ok(windows)
}

/// Map a geo box onto (lat, lon) index ranges of one domain.
///
/// Each bound snaps to its nearest coordinate, then the range grows by
/// `config.geo_margin` cells on each side.
pub fn resolve_geo_indices(
    config: &ResolverConfig,
    axes: &CoordinateAxes,
    geo_box: &GeoBox,
) -> NarrResult<(IndexRange, IndexRange)> {
    if config.coverage_policy == CoveragePolicy::Strict {
        check_coverage(axes, geo_box)?;
    }

    let lat = axis_range(config, "lat", axes.lat(), geo_box.lat_min, geo_box.lat_max)?;
    let lon = axis_range(config, "lon", axes.lon(), geo_box.lon_min, geo_box.lon_max)?;
    Ok((lat, lon))
}

fn axis_range(
    config: &ResolverConfig,
    name: &str,
    axis: &[f64],
    low: f64,
    high: f64,
) -> NarrResult<IndexRange> {
    let a = nearest_index(axis, low)?;
    let b = nearest_index(axis, high)?;
    // Descending axes put the low bound at the higher index.
    let (lo, hi) = (a.min(b), a.max(b));
    let margin = config.geo_margin;

    let raw_end = hi + margin;
    if lo < margin || raw_end > axis.len() {
        match config.coverage_policy {
            CoveragePolicy::Strict => {
                return Err(NarrError::out_of_coverage(
                    format!("{} [{}, {}] with margin {}", name, low, high, margin),
                    format!("{} indices [0, {})", name, axis.len()),
                ));
            }
            CoveragePolicy::Clamp => {
                warn!(
                    axis = name,
                    nearest = ?(lo, hi),
                    len = axis.len(),
                    "Geo margin clamped to axis extent"
                );
            }
        }
    }

    Ok(IndexRange::new(lo.saturating_sub(margin), raw_end.min(axis.len())))
}

fn check_coverage(axes: &CoordinateAxes, geo_box: &GeoBox) -> NarrResult<()> {
    let (lat_min, lat_max) = axes.lat_extent();
    let (lon_min, lon_max) = axes.lon_extent();

    let covered = geo_box.lat_min >= lat_min
        && geo_box.lat_max <= lat_max
        && geo_box.lon_min >= lon_min
        && geo_box.lon_max <= lon_max;

    if covered {
        Ok(())
    } else {
        Err(NarrError::out_of_coverage(
            format!("{:?}", geo_box.as_array()),
            axes.coverage(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn regular_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn test_same_month_is_fully_bounded() {
        let request = QueryRequest::default()
            .between(ymd(1980, 1, 3), ymd(1980, 1, 20))
            .at_resolution(TimeResolution::Hourly);
        let windows = partition_time(&ResolverConfig::default(), &request).unwrap();

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].time, TimeSlice::bounded(16, 152));
    }

    #[test]
    fn test_final_day_rule_switch() {
        let request = QueryRequest::default()
            .between(ymd(1980, 1, 5), ymd(1980, 2, 20))
            .at_resolution(TimeResolution::Daily);

        let corrected = partition_time(&ResolverConfig::default(), &request).unwrap();
        assert_eq!(corrected[1].time, TimeSlice::ending_at(19 * 8));

        let legacy = partition_time(&ResolverConfig::legacy(), &request).unwrap();
        assert_eq!(legacy[1].time, TimeSlice::ending_at(4 * 8));
    }

    #[test]
    fn test_daily_aggregate_marker() {
        let config = ResolverConfig {
            mark_daily_aggregate: true,
            ..Default::default()
        };
        let daily = QueryRequest::default()
            .between(ymd(1980, 1, 1), ymd(1980, 1, 2))
            .at_resolution(TimeResolution::Daily);
        let hourly = daily.clone().at_resolution(TimeResolution::Hourly);

        assert_eq!(partition_time(&config, &daily).unwrap()[0].time.aggregate, Some(8));
        assert_eq!(partition_time(&config, &hourly).unwrap()[0].time.aggregate, None);
    }

    #[test]
    fn test_monthly_before_epoch_is_rejected() {
        let request = QueryRequest::default().between(ymd(1978, 6, 1), ymd(1979, 6, 1));
        let err = partition_time(&ResolverConfig::default(), &request).unwrap_err();
        assert!(matches!(err, NarrError::InvalidTime(_)));
    }

    #[test]
    fn test_geo_margin() {
        let axes = CoordinateAxes::new(
            regular_axis(0.0, 1.0, 100),
            regular_axis(-150.0, 1.0, 120),
        )
        .unwrap();
        let geo_box = GeoBox::new(10.0, 20.0, -130.0, -120.0).unwrap();

        let (lat, lon) = resolve_geo_indices(&ResolverConfig::default(), &axes, &geo_box).unwrap();
        assert_eq!(lat, IndexRange::new(6, 24));
        assert_eq!(lon, IndexRange::new(16, 34));
    }

    #[test]
    fn test_clamp_policy_clamps_at_edges() {
        let axes = CoordinateAxes::new(regular_axis(0.0, 1.0, 10), regular_axis(0.0, 1.0, 10)).unwrap();
        let geo_box = GeoBox::new(1.0, 8.0, 2.0, 5.0).unwrap();

        let (lat, lon) = resolve_geo_indices(&ResolverConfig::default(), &axes, &geo_box).unwrap();
        assert_eq!(lat, IndexRange::new(0, 10));
        assert_eq!(lon, IndexRange::new(0, 9));
    }

    #[test]
    fn test_strict_policy_rejects_overflowing_margin() {
        let config = ResolverConfig {
            coverage_policy: CoveragePolicy::Strict,
            ..Default::default()
        };
        let axes = CoordinateAxes::new(regular_axis(0.0, 1.0, 10), regular_axis(0.0, 1.0, 10)).unwrap();
        let geo_box = GeoBox::new(1.0, 8.0, 2.0, 5.0).unwrap();

        let err = resolve_geo_indices(&config, &axes, &geo_box).unwrap_err();
        assert!(matches!(err, NarrError::OutOfCoverage { .. }));
    }

    #[test]
    fn test_descending_latitude_axis() {
        let axes = CoordinateAxes::new(
            regular_axis(99.0, -1.0, 100),
            regular_axis(0.0, 1.0, 100),
        )
        .unwrap();
        let geo_box = GeoBox::new(40.0, 50.0, 40.0, 50.0).unwrap();

        let (lat, _) = resolve_geo_indices(&ResolverConfig::default(), &axes, &geo_box).unwrap();
        // lat 50 sits at index 49, lat 40 at index 59
        assert_eq!(lat, IndexRange::new(45, 63));
    }
}
