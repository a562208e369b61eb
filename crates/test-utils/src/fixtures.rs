//! Common test fixtures for NARR tests.
//!
//! This module provides pre-defined axes and constants that represent
//! common scenarios in reanalysis processing.

use crate::generators::regular_axis;

/// Missing-value sentinel used by the NARR OPeNDAP service.
pub const NARR_MISSING_VALUE: f32 = 9.999e20;

/// Common bounding box definitions as (lat_min, lat_max, lon_min, lon_max).
pub mod boxes {
    /// Box entirely south of the NARR domain
    pub const SOUTH_PACIFIC: (f64, f64, f64, f64) = (-40.0, -30.0, -150.0, -140.0);
}

/// Shape of a regular lat/lon grid.
#[derive(Debug, Clone, Copy)]
pub struct AxisSpec {
    pub lat_start: f64,
    pub lat_step: f64,
    pub lat_count: usize,
    pub lon_start: f64,
    pub lon_step: f64,
    pub lon_count: usize,
}

impl AxisSpec {
    pub fn lat(&self) -> Vec<f64> {
        regular_axis(self.lat_start, self.lat_step, self.lat_count)
    }

    pub fn lon(&self) -> Vec<f64> {
        regular_axis(self.lon_start, self.lon_step, self.lon_count)
    }
}

/// Regular one-degree grid roughly covering the NARR North American domain.
pub const NARR_LIKE: AxisSpec = AxisSpec {
    lat_start: 1.0,
    lat_step: 1.0,
    lat_count: 85,
    lon_start: -220.0,
    lon_step: 1.0,
    lon_count: 220,
};

/// Small 5x4 grid for series tests.
pub const TINY: AxisSpec = AxisSpec {
    lat_start: 40.0,
    lat_step: 1.0,
    lat_count: 4,
    lon_start: -120.0,
    lon_step: 1.0,
    lon_count: 5,
};
