//! Domain coordinate axes and nearest-cell lookup.

use std::collections::BTreeMap;

use narr_common::{NarrError, NarrResult};
use serde::{Deserialize, Serialize};

/// Latitude and longitude vectors of one remote domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateAxes {
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl CoordinateAxes {
    /// Create axes, rejecting empty or non-finite vectors.
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> NarrResult<Self> {
        check_axis("latitude", &lat)?;
        check_axis("longitude", &lon)?;
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    /// Extent of the latitude axis as (min, max).
    pub fn lat_extent(&self) -> (f64, f64) {
        extent(&self.lat)
    }

    /// Extent of the longitude axis as (min, max).
    pub fn lon_extent(&self) -> (f64, f64) {
        extent(&self.lon)
    }

    /// Human readable coverage, used in error messages.
    pub fn coverage(&self) -> String {
        let (lat_min, lat_max) = self.lat_extent();
        let (lon_min, lon_max) = self.lon_extent();
        format!(
            "lat [{}, {}], lon [{}, {}]",
            lat_min, lat_max, lon_min, lon_max
        )
    }
}

fn check_axis(name: &str, axis: &[f64]) -> NarrResult<()> {
    if axis.is_empty() {
        return Err(NarrError::invalid_domain(format!("empty {} axis", name)));
    }
    if let Some(pos) = axis.iter().position(|v| !v.is_finite()) {
        return Err(NarrError::invalid_domain(format!(
            "non-finite {} coordinate at index {}",
            name, pos
        )));
    }
    Ok(())
}

fn extent(axis: &[f64]) -> (f64, f64) {
    axis.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Index of the coordinate closest to `target`.
///
/// Ties resolve to the lowest index. Fails with `InvalidDomain` on an
/// empty axis or one containing non-finite values.
pub fn nearest_index(axis: &[f64], target: f64) -> NarrResult<usize> {
    check_axis("coordinate", axis)?;
    if !target.is_finite() {
        return Err(NarrError::invalid_domain(format!(
            "cannot locate non-finite target {}",
            target
        )));
    }

    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &v) in axis.iter().enumerate() {
        let dist = (v - target).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    Ok(best)
}

/// Supplies the coordinate axes of a remote domain.
///
/// Implemented by the retrieval layer; resolution only needs the axes,
/// never the data values.
pub trait AxisSource {
    /// Axes of the domain identified by `domain_id`.
    fn axes(&self, domain_id: &str) -> NarrResult<CoordinateAxes>;
}

/// Serves one fixed grid for every domain.
///
/// All NARR-A 221 files share a grid, so one fetch covers a whole request.
#[derive(Debug, Clone)]
pub struct StaticAxes {
    axes: CoordinateAxes,
}

impl StaticAxes {
    pub fn new(axes: CoordinateAxes) -> Self {
        Self { axes }
    }
}

impl AxisSource for StaticAxes {
    fn axes(&self, _domain_id: &str) -> NarrResult<CoordinateAxes> {
        Ok(self.axes.clone())
    }
}

impl AxisSource for BTreeMap<String, CoordinateAxes> {
    fn axes(&self, domain_id: &str) -> NarrResult<CoordinateAxes> {
        self.get(domain_id)
            .cloned()
            .ok_or_else(|| NarrError::invalid_domain(format!("no axes for {}", domain_id)))
    }
}

impl<A: AxisSource + ?Sized> AxisSource for &A {
    fn axes(&self, domain_id: &str) -> NarrResult<CoordinateAxes> {
        (**self).axes(domain_id)
    }
}
