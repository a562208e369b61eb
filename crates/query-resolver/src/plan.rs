//! Resolved query plans.

use chrono::NaiveDate;
use narr_common::{GeoBox, NarrResult, TimeResolution};
use serde::{Deserialize, Serialize};

use crate::request::QueryRequest;

/// Slice along a domain's time axis.
///
/// `None` bounds are open: they run to the domain's natural edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimeSlice {
    /// First index, inclusive.
    pub start: Option<usize>,
    /// Last index, exclusive.
    pub end: Option<usize>,
    /// Step between indices; `None` reads every sample.
    pub stride: Option<usize>,
    /// Samples per aggregate when the retrieval layer should average
    /// consecutive samples (daily means of three-hourly data).
    pub aggregate: Option<usize>,
}

impl TimeSlice {
    /// `[start, end)`
    pub fn bounded(start: usize, end: usize) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    /// `[start, ..)`
    pub fn starting_at(start: usize) -> Self {
        Self {
            start: Some(start),
            ..Default::default()
        }
    }

    /// `[.., end)`
    pub fn ending_at(end: usize) -> Self {
        Self {
            end: Some(end),
            ..Default::default()
        }
    }

    /// The whole axis.
    pub fn full() -> Self {
        Self::default()
    }

    /// Mark the slice for per-day aggregation.
    pub fn aggregated(mut self, samples: usize) -> Self {
        self.aggregate = Some(samples);
        self
    }

    /// Whether both ends are open.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Number of indices selected from an axis of `axis_len` samples.
    pub fn len_within(&self, axis_len: usize) -> usize {
        let start = self.start.unwrap_or(0).min(axis_len);
        let end = self.end.unwrap_or(axis_len).min(axis_len);
        let span = end.saturating_sub(start);
        let stride = self.stride.unwrap_or(1).max(1);
        span.div_ceil(stride)
    }
}

/// Half-open index range `[start, end)` along a spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// What to read from one remote domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSlice {
    /// Date-qualified locator of the remote dataset.
    pub domain_id: String,
    /// First day of the month this domain covers.
    pub month: NaiveDate,
    /// Variable to read.
    pub measurement: String,
    pub time_resolution: TimeResolution,
    /// Box the indices were resolved from.
    pub geo_box: GeoBox,
    pub time: TimeSlice,
    pub lat: IndexRange,
    pub lon: IndexRange,
}

/// Ordered, immutable mapping from domain identifier to slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    name: String,
    request: QueryRequest,
    domains: Vec<DomainSlice>,
}

impl QueryPlan {
    pub(crate) fn new(request: QueryRequest, domains: Vec<DomainSlice>) -> Self {
        Self {
            name: request.canonical_name(),
            request,
            domains,
        }
    }

    /// Canonical name, for use as a cache key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    /// Domains in chronological order.
    pub fn domains(&self) -> &[DomainSlice] {
        &self.domains
    }

    pub fn domain_ids(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(|d| d.domain_id.as_str())
    }

    /// Look up a domain's slice by identifier.
    pub fn get(&self, domain_id: &str) -> Option<&DomainSlice> {
        self.domains.iter().find(|d| d.domain_id == domain_id)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Serialize for the cache collaborator.
    pub fn to_json(&self) -> NarrResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a plan persisted with [`QueryPlan::to_json`].
    pub fn from_json(json: &str) -> NarrResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
