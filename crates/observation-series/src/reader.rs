//! Seam to the retrieval layer.
//!
//! The retrieval layer opens each remote domain named by a
//! [`QueryPlan`] and returns its raw grids; this module turns those into an
//! [`ObservationSeries`] in plan order.

use narr_common::{NarrError, NarrResult};
use query_resolver::{DomainSlice, QueryPlan};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SeriesConfig;
use crate::series::ObservationSeries;
use crate::snapshot::{MeasurementMetadata, ObservationSnapshot};

/// Unit recorded when the source omits one.
pub const UNKNOWN_UNIT: &str = "NA";

/// Raw data read from one domain slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDomainGrid {
    /// GrADS time value of each sample.
    pub times: Vec<f64>,
    /// One row-major grid per time value.
    pub grids: Vec<Vec<f32>>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub unit: Option<String>,
    pub long_name: String,
    pub missing_value: f32,
}

/// Reads the values selected by a domain slice.
///
/// Slices are independent, so implementations may fetch domains in
/// parallel; [`ObservationSeries::collect`] only needs results back in
/// plan order.
pub trait DomainReader {
    fn read(&self, slice: &DomainSlice) -> NarrResult<RawDomainGrid>;
}

impl<R: DomainReader + ?Sized> DomainReader for &R {
    fn read(&self, slice: &DomainSlice) -> NarrResult<RawDomainGrid> {
        (**self).read(slice)
    }
}

impl ObservationSeries {
    /// Read every domain of `plan` in order and build a series.
    pub fn collect<R: DomainReader>(
        plan: &QueryPlan,
        reader: &R,
        config: SeriesConfig,
    ) -> NarrResult<Self> {
        let mut snapshots = Vec::new();

        for slice in plan.domains() {
            let raw = reader.read(slice)?;
            if raw.times.len() != raw.grids.len() {
                return Err(NarrError::dimension_mismatch(
                    format!("{} grids", raw.times.len()),
                    format!("{} grids from {}", raw.grids.len(), slice.domain_id),
                ));
            }

            let metadata = MeasurementMetadata {
                measurement: slice.measurement.clone(),
                time_resolution: slice.time_resolution,
                unit: raw.unit.clone().unwrap_or_else(|| UNKNOWN_UNIT.to_string()),
                long_name: raw.long_name.clone(),
                missing_value: raw.missing_value,
                geo_box: slice.geo_box,
            };

            debug!(domain = %slice.domain_id, samples = raw.times.len(), "Read domain");

            for (&time, values) in raw.times.iter().zip(raw.grids) {
                snapshots.push(ObservationSnapshot::from_grads_time(
                    values,
                    raw.lat.clone(),
                    raw.lon.clone(),
                    metadata.clone(),
                    time,
                )?);
            }
        }

        let series = Self::with_config(snapshots, config)?;
        info!(plan = %plan.name(), snapshots = series.len(), "Collected observation series");
        Ok(series)
    }
}
