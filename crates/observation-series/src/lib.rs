//! Observation series for NARR reanalysis grids.
//!
//! Raw grids read for a [`query_resolver::QueryPlan`] become an ordered
//! [`ObservationSeries`] that can be cleaned and reshaped before rendering:
//!
//! ```text
//! QueryPlan ──► DomainReader ──► ObservationSeries::collect
//!                                      │
//!                                      ├─► fix_nans()        missing -> snapshot mean
//!                                      ├─► resample(f)       spatial zoom
//!                                      ├─► interpolate(k)    extra time steps
//!                                      ├─► aggregate(step)   chunk means
//!                                      ├─► truncate(n)
//!                                      └─► extrema()         global min/max
//! ```

pub mod config;
pub mod reader;
pub mod resample;
pub mod series;
pub mod snapshot;

pub use config::{InterpolationMethod, SeriesConfig};
pub use reader::{DomainReader, RawDomainGrid};
pub use resample::{resample_axis, resample_grid, zoomed_len, GridView};
pub use series::{ObservationSeries, SeriesStats};
pub use snapshot::{decode_grads_time, MeasurementMetadata, ObservationSnapshot};
