//! Query resolution for NARR reanalysis requests.
//!
//! Turns a human request (time range, geo box, resolution) into the exact
//! slices to read from each remote NARR domain:
//!
//! ```text
//! QueryRequest
//!      │
//!      ▼
//! QueryResolver::resolve(request)
//!      │
//!      ├─► Partition the time range into domains (one per month, or the
//!      │   single monthly aggregation) with a time slice for each
//!      │
//!      ├─► For each domain, fetch its lat/lon axes from the AxisSource
//!      │   and map the geo box onto index ranges (nearest cell ± margin)
//!      │
//!      └─► Assemble an ordered, immutable QueryPlan with a canonical name
//! ```
//!
//! # Example
//!
//! ```ignore
//! use query_resolver::{QueryRequest, QueryResolver, ResolverConfig, StaticAxes};
//!
//! let resolver = QueryResolver::new(ResolverConfig::default(), StaticAxes::new(axes));
//! let plan = resolver.resolve(&request)?;
//! for slice in plan.domains() {
//!     // hand each slice to the retrieval layer
//! }
//! ```

pub mod axes;
pub mod config;
pub mod plan;
pub mod request;
pub mod resolver;

pub use axes::{nearest_index, AxisSource, CoordinateAxes, StaticAxes};
pub use config::{CoveragePolicy, FinalDayRule, ResolverConfig};
pub use plan::{DomainSlice, IndexRange, QueryPlan, TimeSlice};
pub use request::QueryRequest;
pub use resolver::{partition_time, resolve_geo_indices, DomainWindow, QueryResolver};
