//! Ordered observation sequences and their transformations.
//!
//! Every operation is defined by sequence position; chronological order is
//! never reshuffled. Operations either mutate snapshots in place
//! (`fix_nans`, `resample`, `convert_units`) or replace the sequence
//! wholesale (`interpolate`, `aggregate`, `truncate`). Wholesale
//! replacement recomputes the statistics cache; in-place mutation only
//! marks it stale until [`ObservationSeries::extrema`] is called.

use chrono::Duration;
use narr_common::{GeoBox, NarrError, NarrResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SeriesConfig;
use crate::snapshot::{check_factor, ObservationSnapshot};

/// Series-wide statistics used to calibrate shared display scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Smallest non-NaN value over all snapshots.
    pub value_min: f32,
    /// Largest non-NaN value over all snapshots.
    pub value_max: f32,
    /// Geo box of the first snapshot.
    pub display_box: GeoBox,
    /// Series revision these statistics were computed at.
    pub revision: u64,
}

impl SeriesStats {
    /// Whether any non-NaN value contributed.
    pub fn has_values(&self) -> bool {
        self.value_min <= self.value_max
    }
}

/// An ordered, non-empty sequence of snapshots of one measurement.
///
/// Deserialization goes through [`ObservationSeries::with_config`]; the
/// statistics are recomputed rather than trusted from the stored form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredSeries")]
pub struct ObservationSeries {
    snapshots: Vec<ObservationSnapshot>,
    stats: SeriesStats,
    revision: u64,
    config: SeriesConfig,
}

#[derive(Deserialize)]
struct StoredSeries {
    snapshots: Vec<ObservationSnapshot>,
    #[serde(default)]
    revision: u64,
    #[serde(default)]
    config: SeriesConfig,
}

impl TryFrom<StoredSeries> for ObservationSeries {
    type Error = NarrError;

    fn try_from(stored: StoredSeries) -> NarrResult<Self> {
        let mut series = Self::with_config(stored.snapshots, stored.config)?;
        series.revision = stored.revision;
        series.recompute_stats();
        Ok(series)
    }
}

impl ObservationSeries {
    /// Build a series with the default configuration.
    pub fn new(snapshots: Vec<ObservationSnapshot>) -> NarrResult<Self> {
        Self::with_config(snapshots, SeriesConfig::default())
    }

    /// Build a series, checking that every snapshot shares the first
    /// snapshot's measurement and time resolution.
    pub fn with_config(snapshots: Vec<ObservationSnapshot>, config: SeriesConfig) -> NarrResult<Self> {
        let first = snapshots.first().ok_or(NarrError::EmptySeries)?.metadata();

        for (i, snap) in snapshots.iter().enumerate().skip(1) {
            let meta = snap.metadata();
            if meta.measurement != first.measurement || meta.time_resolution != first.time_resolution {
                return Err(NarrError::InconsistentSeries(format!(
                    "snapshot {} is {} ({}), expected {} ({})",
                    i,
                    meta.measurement,
                    meta.time_resolution,
                    first.measurement,
                    first.time_resolution
                )));
            }
        }

        let stats = compute_stats(&snapshots, 0);
        Ok(Self {
            snapshots,
            stats,
            revision: 0,
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a series holds at least one snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[ObservationSnapshot] {
        &self.snapshots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ObservationSnapshot> {
        self.snapshots.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ObservationSnapshot> {
        self.snapshots.get(index)
    }

    pub fn into_snapshots(self) -> Vec<ObservationSnapshot> {
        self.snapshots
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    /// Counter bumped by every operation that changes the snapshots.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Cached statistics; may be stale, see [`Self::is_stats_stale`].
    pub fn stats(&self) -> &SeriesStats {
        &self.stats
    }

    /// True when snapshots changed in place since the statistics were computed.
    pub fn is_stats_stale(&self) -> bool {
        self.stats.revision != self.revision
    }

    /// Series-wide display box (the first snapshot's geo box).
    pub fn display_box(&self) -> GeoBox {
        self.stats.display_box
    }

    /// Latitude axis of the first snapshot.
    pub fn lat(&self) -> &[f64] {
        self.snapshots[0].lat()
    }

    /// Longitude axis of the first snapshot.
    pub fn lon(&self) -> &[f64] {
        self.snapshots[0].lon()
    }

    /// Rescan every snapshot and return the global (min, max).
    ///
    /// Fails with `ComputationError` if no snapshot holds a non-NaN value.
    pub fn extrema(&mut self) -> NarrResult<(f32, f32)> {
        self.recompute_stats();
        if !self.stats.has_values() {
            return Err(NarrError::computation("no valid samples in series"));
        }
        Ok((self.stats.value_min, self.stats.value_max))
    }

    /// Replace missing values in every snapshot with that snapshot's mean.
    ///
    /// Checked up front: if any snapshot has no valid values the series is
    /// left untouched and `ComputationError` is returned. Marks the
    /// statistics stale. Returns the total number of cells replaced.
    pub fn fix_nans(&mut self) -> NarrResult<usize> {
        if let Some(i) = self.snapshots.iter().position(|s| s.valid_mean().is_none()) {
            return Err(NarrError::computation(format!(
                "no valid samples in snapshot {} ({})",
                i,
                self.snapshots[i].date_label()
            )));
        }

        let mut replaced = 0;
        for snap in self.snapshots.iter_mut() {
            replaced += snap.fix_nans()?;
        }
        self.touch();

        debug!(replaced, snapshots = self.len(), "Repaired missing values");
        Ok(replaced)
    }

    /// Scale every grid and its axes by `factor` using the configured kernel.
    ///
    /// A factor of 1 is a no-op. Marks the statistics stale.
    pub fn resample(&mut self, factor: f64) -> NarrResult<()> {
        check_factor(factor)?;
        if factor == 1.0 {
            return Ok(());
        }

        let method = self.config.interpolation;
        for snap in self.snapshots.iter_mut() {
            snap.resample(factor, method)?;
        }
        self.touch();

        debug!(factor, %method, shape = ?self.snapshots[0].shape(), "Resampled series");
        Ok(())
    }

    /// Convert Kelvin snapshots to Fahrenheit; returns how many changed.
    pub fn convert_units(&mut self) -> usize {
        let converted = self
            .snapshots
            .iter_mut()
            .map(|s| s.convert_units())
            .filter(|&changed| changed)
            .count();
        if converted > 0 {
            self.touch();
        }
        converted
    }

    /// Insert `factor - 1` linearly interpolated snapshots between each
    /// adjacent pair.
    ///
    /// Precondition: timestamps are strictly increasing and evenly spaced.
    /// This is not checked; use [`Self::interpolate_checked`] to enforce it.
    /// A factor of 0 or 1 is a no-op. An `n`-snapshot series becomes
    /// `factor * (n - 1) + 1` snapshots with the first and last unchanged.
    pub fn interpolate(&mut self, factor: usize) -> NarrResult<()> {
        if factor <= 1 || self.snapshots.len() < 2 {
            return Ok(());
        }
        let steps = i32::try_from(factor)
            .map_err(|_| NarrError::invalid_parameter("factor", format!("{} too large", factor)))?;

        let before = self.snapshots.len();
        let mut output = Vec::with_capacity(factor * (before - 1) + 1);

        for pair in self.snapshots.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if current.shape() != next.shape() {
                return Err(NarrError::dimension_mismatch(
                    format!("{:?}", current.shape()),
                    format!("{:?}", next.shape()),
                ));
            }

            let time_step: Duration = (next.observed_at() - current.observed_at()) / steps;
            let value_steps: Vec<f32> = current
                .values()
                .iter()
                .zip(next.values())
                .map(|(a, b)| (b - a) / factor as f32)
                .collect();

            output.push(current.clone());
            for j in 1..steps {
                let values = current
                    .values()
                    .iter()
                    .zip(&value_steps)
                    .map(|(v, dv)| v + dv * j as f32)
                    .collect();
                let mut synthesized = current.with_values(values)?;
                synthesized.set_observed_at(current.observed_at() + time_step * j);
                output.push(synthesized);
            }
        }

        if let Some(last) = self.snapshots.last() {
            output.push(last.clone());
        }

        self.replace(output);
        debug!(factor, before, after = self.len(), "Interpolated series");
        Ok(())
    }

    /// [`Self::interpolate`], after checking that timestamps are strictly
    /// increasing and evenly spaced.
    pub fn interpolate_checked(&mut self, factor: usize) -> NarrResult<()> {
        let gaps: Vec<Duration> = self
            .snapshots
            .windows(2)
            .map(|pair| pair[1].observed_at() - pair[0].observed_at())
            .collect();

        if let Some(first) = gaps.first() {
            if *first <= Duration::zero() {
                return Err(NarrError::computation("snapshots are not strictly increasing"));
            }
            if let Some(i) = gaps.iter().position(|gap| gap != first) {
                return Err(NarrError::computation(format!(
                    "uneven spacing between snapshots {} and {}",
                    i,
                    i + 1
                )));
            }
        }

        self.interpolate(factor)
    }

    /// Replace each run of `step` snapshots with their element-wise mean.
    ///
    /// Metadata and timestamp come from the first snapshot of each run; a
    /// trailing shorter run is averaged over what is available. An
    /// `n`-snapshot series becomes `ceil(n / step)` snapshots.
    pub fn aggregate(&mut self, step: usize) -> NarrResult<()> {
        if step == 0 {
            return Err(NarrError::invalid_parameter("step", "must be at least 1"));
        }
        if step == 1 {
            return Ok(());
        }

        let before = self.snapshots.len();
        let mut output = Vec::with_capacity(before.div_ceil(step));

        for chunk in self.snapshots.chunks(step) {
            let head = &chunk[0];
            let mut sums = vec![0.0f64; head.values().len()];

            for snap in chunk {
                if snap.shape() != head.shape() {
                    return Err(NarrError::dimension_mismatch(
                        format!("{:?}", head.shape()),
                        format!("{:?}", snap.shape()),
                    ));
                }
                for (sum, &v) in sums.iter_mut().zip(snap.values()) {
                    *sum += v as f64;
                }
            }

            let n = chunk.len() as f64;
            let means = sums.into_iter().map(|s| (s / n) as f32).collect();
            output.push(head.with_values(means)?);
        }

        self.replace(output);
        debug!(step, before, after = self.len(), "Aggregated series");
        Ok(())
    }

    /// Keep only the first `n` snapshots.
    ///
    /// A series is never empty, so `n == 0` fails with `InvalidParameter`
    /// and leaves the series untouched. `n >= len` is a no-op.
    pub fn truncate(&mut self, n: usize) -> NarrResult<()> {
        if n == 0 {
            return Err(NarrError::invalid_parameter("n", "a series cannot be truncated to zero"));
        }
        if n >= self.snapshots.len() {
            return Ok(());
        }

        let mut output = std::mem::take(&mut self.snapshots);
        output.truncate(n);
        self.replace(output);
        Ok(())
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn replace(&mut self, snapshots: Vec<ObservationSnapshot>) {
        self.snapshots = snapshots;
        self.touch();
        self.recompute_stats();
    }

    fn recompute_stats(&mut self) {
        self.stats = compute_stats(&self.snapshots, self.revision);
    }
}

impl<'a> IntoIterator for &'a ObservationSeries {
    type Item = &'a ObservationSnapshot;
    type IntoIter = std::slice::Iter<'a, ObservationSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

fn compute_stats(snapshots: &[ObservationSnapshot], revision: u64) -> SeriesStats {
    let (value_min, value_max) = snapshots
        .iter()
        .filter_map(ObservationSnapshot::extrema)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), (a, b)| {
            (lo.min(a), hi.max(b))
        });

    SeriesStats {
        value_min,
        value_max,
        display_box: snapshots
            .first()
            .map(|s| s.metadata().geo_box)
            .unwrap_or_default(),
        revision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MeasurementMetadata;
    use chrono::{TimeZone, Utc};
    use narr_common::TimeResolution;

    fn metadata(measurement: &str) -> MeasurementMetadata {
        MeasurementMetadata {
            measurement: measurement.to_string(),
            time_resolution: TimeResolution::Hourly,
            unit: "%".to_string(),
            long_name: "total cloud cover".to_string(),
            missing_value: 9.999e20,
            geo_box: GeoBox::WASHINGTON,
        }
    }

    fn snap(hour: u32, value: f32) -> ObservationSnapshot {
        ObservationSnapshot::new(
            vec![value; 4],
            vec![45.0, 46.0],
            vec![-120.0, -119.0],
            metadata("tcdc"),
            Utc.with_ymd_and_hms(1980, 1, 1, hour, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_series_rejected() {
        assert!(matches!(ObservationSeries::new(vec![]), Err(NarrError::EmptySeries)));
    }

    #[test]
    fn test_mixed_measurements_rejected() {
        let mut other = snap(3, 1.0);
        other = ObservationSnapshot::new(
            other.values().to_vec(),
            other.lat().to_vec(),
            other.lon().to_vec(),
            metadata("air2m"),
            other.observed_at(),
        )
        .unwrap();
        let err = ObservationSeries::new(vec![snap(0, 1.0), other]).unwrap_err();
        assert!(matches!(err, NarrError::InconsistentSeries(_)));
    }

    #[test]
    fn test_stats_go_stale_after_in_place_mutation() {
        let mut series = ObservationSeries::new(vec![snap(0, 1.0), snap(3, 9.999e20)]).unwrap();
        assert!(!series.is_stats_stale());
        assert_eq!(series.stats().value_max, 9.999e20);

        // The second snapshot is entirely missing
        assert!(series.fix_nans().is_err());
        assert!(!series.is_stats_stale());

        series.resample(2.0).unwrap();
        assert!(series.is_stats_stale());
        assert_eq!(series.stats().value_max, 9.999e20);

        series.extrema().unwrap();
        assert!(!series.is_stats_stale());
    }

    #[test]
    fn test_interpolate_timestamps_and_labels() {
        let mut series = ObservationSeries::new(vec![snap(0, 0.0), snap(3, 3.0)]).unwrap();
        series.interpolate(3).unwrap();

        let hours: Vec<String> = series.iter().map(|s| s.date_label().to_string()).collect();
        assert_eq!(
            hours,
            vec![
                "1980-01-01 12:00 AM",
                "1980-01-01 01:00 AM",
                "1980-01-01 02:00 AM",
                "1980-01-01 03:00 AM",
            ]
        );
        assert_eq!(series.get(2).unwrap().values()[0], 2.0);
    }

    #[test]
    fn test_interpolate_checked_rejects_uneven_spacing() {
        let mut series =
            ObservationSeries::new(vec![snap(0, 0.0), snap(3, 1.0), snap(9, 2.0)]).unwrap();
        assert!(matches!(
            series.interpolate_checked(2),
            Err(NarrError::ComputationError(_))
        ));
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_interpolate_checked_rejects_repeated_timestamps() {
        let mut series = ObservationSeries::new(vec![snap(3, 0.0), snap(3, 1.0)]).unwrap();
        assert!(matches!(
            series.interpolate_checked(2),
            Err(NarrError::ComputationError(_))
        ));

        let mut backwards = ObservationSeries::new(vec![snap(6, 0.0), snap(3, 1.0)]).unwrap();
        assert!(backwards.interpolate_checked(2).is_err());
        assert_eq!(backwards.len(), 2);
    }

    #[test]
    fn test_interpolate_checked_accepts_even_spacing() {
        let mut series =
            ObservationSeries::new(vec![snap(0, 0.0), snap(3, 3.0), snap(6, 6.0)]).unwrap();
        series.interpolate_checked(3).unwrap();

        assert_eq!(series.len(), 7);
        let values: Vec<f32> = series.iter().map(|s| s.values()[0]).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_interpolate_checked_single_snapshot_passes_through() {
        let mut series = ObservationSeries::new(vec![snap(0, 5.0)]).unwrap();
        let revision = series.revision();
        series.interpolate_checked(4).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.revision(), revision);
    }

    #[test]
    fn test_json_round_trip() {
        let mut series = ObservationSeries::new(vec![snap(0, 1.0), snap(3, 2.0)]).unwrap();
        series.fix_nans().unwrap();
        assert!(series.is_stats_stale());

        let json = serde_json::to_string(&series).unwrap();
        let restored: ObservationSeries = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.snapshots(), series.snapshots());
        assert_eq!(restored.revision(), series.revision());
        assert!(!restored.is_stats_stale());
        assert_eq!(restored.stats().value_max, 2.0);
    }

    #[test]
    fn test_json_rejects_truncated_values() {
        let series = ObservationSeries::new(vec![snap(0, 1.0)]).unwrap();
        let mut value = serde_json::to_value(&series).unwrap();
        value["snapshots"][0]["values"] = serde_json::json!([1.0]);

        let err = serde_json::from_value::<ObservationSeries>(value).unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));
    }

    #[test]
    fn test_json_rejects_empty_series() {
        let series = ObservationSeries::new(vec![snap(0, 1.0)]).unwrap();
        let mut value = serde_json::to_value(&series).unwrap();
        value["snapshots"] = serde_json::json!([]);

        let err = serde_json::from_value::<ObservationSeries>(value).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_truncate() {
        let mut series =
            ObservationSeries::new(vec![snap(0, 0.0), snap(3, 1.0), snap(6, 2.0)]).unwrap();
        series.truncate(2).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.stats().value_max, 1.0);
        assert!(matches!(
            series.truncate(0),
            Err(NarrError::InvalidParameter { .. })
        ));
        assert_eq!(series.len(), 2);
        series.truncate(10).unwrap();
        assert_eq!(series.len(), 2);
    }
}
