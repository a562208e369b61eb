//! Common types and utilities shared across the NARR query and series crates.

pub mod bbox;
pub mod config;
pub mod error;
pub mod time;

pub use bbox::GeoBox;
pub use config::QueryDefaults;
pub use error::{NarrError, NarrResult};
pub use time::{add_months, first_of_month, month_span, TimeResolution, NARR_EPOCH};
