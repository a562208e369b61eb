//! Single-instant observation grids.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use narr_common::{GeoBox, NarrError, NarrResult, TimeResolution};
use serde::{Deserialize, Serialize};

use crate::config::InterpolationMethod;
use crate::resample::{resample_axis, resample_grid, zoomed_len, GridView};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Format of the human readable timestamp in labels.
pub const DATE_LABEL_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// Metadata shared by every snapshot of one measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementMetadata {
    /// NARR variable code (e.g., "tcdc").
    pub measurement: String,
    pub time_resolution: TimeResolution,
    /// Physical unit, "NA" when the source omits it.
    pub unit: String,
    /// Human readable variable name.
    pub long_name: String,
    /// Values at or above this sentinel are missing.
    pub missing_value: f32,
    /// Box the data was requested for.
    pub geo_box: GeoBox,
}

/// Decode a GrADS time value into a timestamp.
///
/// The integer part `d` is the proleptic Gregorian ordinal `d - 1`
/// (ordinal 1 is 0001-01-01); the fraction is the time of day.
pub fn decode_grads_time(raw: f64) -> NarrResult<DateTime<Utc>> {
    if !raw.is_finite() || raw < 2.0 {
        return Err(NarrError::invalid_parameter(
            "time",
            format!("{} is not a GrADS day value", raw),
        ));
    }

    let days = raw.trunc();
    let ordinal = i32::try_from(days as i64 - 1)
        .map_err(|_| NarrError::invalid_parameter("time", format!("{} out of range", raw)))?;
    let date = NaiveDate::from_num_days_from_ce_opt(ordinal)
        .ok_or_else(|| NarrError::invalid_parameter("time", format!("{} out of range", raw)))?;

    let millis = ((raw - days) * MILLIS_PER_DAY).round() as i64;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| NarrError::invalid_parameter("time", format!("{} out of range", raw)))?;
    Ok(Utc.from_utc_datetime(&midnight) + Duration::milliseconds(millis))
}

/// One time instant's value grid with its coordinates.
///
/// Values are row-major: `values[row * lon.len() + col]` sits at
/// `(lat[row], lon[col])`. Deserialization goes through
/// [`ObservationSnapshot::new`], so persisted grids are shape-checked and
/// their labels regenerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredSnapshot")]
pub struct ObservationSnapshot {
    values: Vec<f32>,
    lat: Vec<f64>,
    lon: Vec<f64>,
    metadata: MeasurementMetadata,
    observed_at: DateTime<Utc>,
    date_label: String,
    title: String,
}

/// Persisted form of a snapshot; labels are derived, not stored.
#[derive(Deserialize)]
struct StoredSnapshot {
    values: Vec<f32>,
    lat: Vec<f64>,
    lon: Vec<f64>,
    metadata: MeasurementMetadata,
    observed_at: DateTime<Utc>,
}

impl TryFrom<StoredSnapshot> for ObservationSnapshot {
    type Error = NarrError;

    fn try_from(stored: StoredSnapshot) -> NarrResult<Self> {
        Self::new(
            stored.values,
            stored.lat,
            stored.lon,
            stored.metadata,
            stored.observed_at,
        )
    }
}

impl ObservationSnapshot {
    /// Create a snapshot, checking the grid against its coordinates.
    pub fn new(
        values: Vec<f32>,
        lat: Vec<f64>,
        lon: Vec<f64>,
        metadata: MeasurementMetadata,
        observed_at: DateTime<Utc>,
    ) -> NarrResult<Self> {
        check_shape(values.len(), lat.len(), lon.len())?;

        let mut snapshot = Self {
            values,
            lat,
            lon,
            metadata,
            observed_at,
            date_label: String::new(),
            title: String::new(),
        };
        snapshot.update_labels();
        Ok(snapshot)
    }

    /// Create a snapshot from a raw GrADS time value.
    pub fn from_grads_time(
        values: Vec<f32>,
        lat: Vec<f64>,
        lon: Vec<f64>,
        metadata: MeasurementMetadata,
        raw_time: f64,
    ) -> NarrResult<Self> {
        Self::new(values, lat, lon, metadata, decode_grads_time(raw_time)?)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn metadata(&self) -> &MeasurementMetadata {
        &self.metadata
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Timestamp rendered as e.g. "1979-01-01 09:00 AM".
    pub fn date_label(&self) -> &str {
        &self.date_label
    }

    /// "{long_name} {date_label} ({unit})"
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Grid shape as (rows, cols) = (lat.len(), lon.len()).
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// Value at (row, col), if in bounds.
    pub fn value_at(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.lat.len() || col >= self.lon.len() {
            return None;
        }
        self.values.get(row * self.lon.len() + col).copied()
    }

    /// Whether `v` counts as missing for this snapshot.
    pub fn is_missing(&self, v: f32) -> bool {
        v.is_nan() || v >= self.metadata.missing_value
    }

    /// Mean of the non-missing values, or None if every value is missing.
    pub fn valid_mean(&self) -> Option<f64> {
        let (sum, count) = self
            .values
            .iter()
            .filter(|&&v| !self.is_missing(v))
            .fold((0.0f64, 0usize), |(sum, count), &v| (sum + v as f64, count + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Replace missing values with the mean of the valid ones.
    ///
    /// Mutates in place and returns the number of cells replaced. Fails with
    /// `ComputationError` when no valid value exists.
    pub fn fix_nans(&mut self) -> NarrResult<usize> {
        let mean = self.valid_mean().ok_or_else(|| {
            NarrError::computation(format!(
                "no valid samples in snapshot at {}",
                self.date_label
            ))
        })? as f32;

        let missing_value = self.metadata.missing_value;
        let mut replaced = 0;
        for v in self.values.iter_mut() {
            if v.is_nan() || *v >= missing_value {
                *v = mean;
                replaced += 1;
            }
        }
        Ok(replaced)
    }

    /// Convert Kelvin values to Fahrenheit. Returns false for other units.
    pub fn convert_units(&mut self) -> bool {
        if self.metadata.unit != "K" {
            return false;
        }

        for v in self.values.iter_mut() {
            *v = (*v - 273.15) * 1.8 + 32.0;
        }
        self.metadata.unit = "F".to_string();
        self.update_labels();
        true
    }

    /// Scale the grid and both axes by `factor`.
    ///
    /// A factor of 1 leaves the snapshot untouched.
    pub fn resample(&mut self, factor: f64, method: InterpolationMethod) -> NarrResult<()> {
        check_factor(factor)?;
        if factor == 1.0 {
            return Ok(());
        }

        let (rows, cols) = self.shape();
        let new_rows = zoomed_len(rows, factor);
        let new_cols = zoomed_len(cols, factor);

        let grid = GridView::new(&self.values, cols, rows, self.metadata.missing_value)?;
        let values = resample_grid(&grid, new_cols, new_rows, method);
        let lat = resample_axis(&self.lat, new_rows);
        let lon = resample_axis(&self.lon, new_cols);
        check_shape(values.len(), lat.len(), lon.len())?;

        self.values = values;
        self.lat = lat;
        self.lon = lon;
        Ok(())
    }

    /// (min, max) of the non-NaN values.
    pub fn extrema(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Copy with a new value grid of the same shape.
    pub(crate) fn with_values(&self, values: Vec<f32>) -> NarrResult<Self> {
        check_shape(values.len(), self.lat.len(), self.lon.len())?;
        Ok(Self {
            values,
            ..self.clone()
        })
    }

    /// Move the timestamp and regenerate labels.
    pub(crate) fn set_observed_at(&mut self, observed_at: DateTime<Utc>) {
        self.observed_at = observed_at;
        self.update_labels();
    }

    fn update_labels(&mut self) {
        self.date_label = self.observed_at.format(DATE_LABEL_FORMAT).to_string();
        self.title = format!(
            "{} {} ({})",
            self.metadata.long_name, self.date_label, self.metadata.unit
        );
    }
}

pub(crate) fn check_factor(factor: f64) -> NarrResult<()> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(NarrError::invalid_parameter(
            "factor",
            format!("{} must be a positive finite number", factor),
        ));
    }
    Ok(())
}

fn check_shape(values: usize, rows: usize, cols: usize) -> NarrResult<()> {
    if rows == 0 || cols == 0 || values != rows * cols {
        return Err(NarrError::dimension_mismatch(
            format!("{} values for ({}, {})", rows * cols, rows, cols),
            format!("{} values", values),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: f32 = 9.999e20;

    fn metadata(unit: &str) -> MeasurementMetadata {
        MeasurementMetadata {
            measurement: "air2m".to_string(),
            time_resolution: TimeResolution::Daily,
            unit: unit.to_string(),
            long_name: "2m air temperature".to_string(),
            missing_value: MISSING,
            geo_box: GeoBox::DEFAULT,
        }
    }

    fn snapshot(values: Vec<f32>) -> ObservationSnapshot {
        ObservationSnapshot::from_grads_time(
            values,
            vec![40.0, 41.0],
            vec![-112.0, -111.0],
            metadata("K"),
            722451.375,
        )
        .unwrap()
    }

    #[test]
    fn test_decode_grads_time() {
        let t = decode_grads_time(722451.375).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(1979, 1, 1, 9, 0, 0).unwrap());
        assert!(decode_grads_time(f64::NAN).is_err());
        assert!(decode_grads_time(0.5).is_err());
    }

    #[test]
    fn test_labels() {
        let snap = snapshot(vec![1.0; 4]);
        assert_eq!(snap.date_label(), "1979-01-01 09:00 AM");
        assert_eq!(snap.title(), "2m air temperature 1979-01-01 09:00 AM (K)");
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = ObservationSnapshot::new(
            vec![1.0; 5],
            vec![40.0, 41.0],
            vec![-112.0, -111.0],
            metadata("K"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, NarrError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_fix_nans_uses_snapshot_mean() {
        let mut snap = snapshot(vec![1.0, MISSING, 3.0, f32::NAN]);
        assert_eq!(snap.fix_nans().unwrap(), 2);
        assert_eq!(snap.values(), &[1.0, 2.0, 3.0, 2.0]);
    }

    #[test]
    fn test_fix_nans_all_missing() {
        let mut snap = snapshot(vec![MISSING; 4]);
        assert!(matches!(snap.fix_nans(), Err(NarrError::ComputationError(_))));
    }

    #[test]
    fn test_convert_units() {
        let mut snap = snapshot(vec![273.15; 4]);
        assert!(snap.convert_units());
        assert!(snap.values().iter().all(|v| (v - 32.0).abs() < 1e-3));
        assert_eq!(snap.metadata().unit, "F");
        assert!(snap.title().ends_with("(F)"));
        assert!(!snap.convert_units());
    }

    #[test]
    fn test_resample_doubles_shape() {
        let mut snap = snapshot(vec![1.0, 2.0, 3.0, 4.0]);
        snap.resample(2.0, InterpolationMethod::Bilinear).unwrap();
        assert_eq!(snap.shape(), (4, 4));
        assert_eq!(snap.values().len(), 16);
        assert_eq!(snap.lat().first(), Some(&40.0));
        assert_eq!(snap.lat().last(), Some(&41.0));
        assert_eq!(snap.value_at(3, 3), Some(4.0));
    }

    #[test]
    fn test_resample_keeps_missing_cells_missing() {
        let mut snap = snapshot(vec![1.0, MISSING, 3.0, 4.0]);
        snap.resample(2.0, InterpolationMethod::Bilinear).unwrap();

        assert!(snap.values().iter().all(|&v| v <= 4.0 || v == MISSING));
        assert_eq!(snap.value_at(3, 0), Some(3.0));
        assert_eq!(snap.value_at(0, 3), Some(MISSING));

        snap.fix_nans().unwrap();
        assert!(snap.values().iter().all(|&v| v <= 4.0));
    }

    #[test]
    fn test_resample_rejects_bad_factor() {
        let mut snap = snapshot(vec![1.0; 4]);
        assert!(snap.resample(0.0, InterpolationMethod::Nearest).is_err());
        assert!(snap.resample(f64::NAN, InterpolationMethod::Nearest).is_err());
    }

    #[test]
    fn test_json_regenerates_labels_and_checks_shape() {
        let snap = snapshot(vec![1.0, 2.0, 3.0, 4.0]);
        let mut value = serde_json::to_value(&snap).unwrap();
        value["title"] = serde_json::json!("stale");

        let restored: ObservationSnapshot = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(restored, snap);

        value["lon"] = serde_json::json!([-112.0]);
        assert!(serde_json::from_value::<ObservationSnapshot>(value).is_err());
    }

    #[test]
    fn test_extrema_skips_nan() {
        let snap = snapshot(vec![5.0, f32::NAN, -1.0, 2.0]);
        assert_eq!(snap.extrema(), Some((-1.0, 5.0)));
    }
}
