//! Common types and utilities shared across the qpf-charts crates.

pub mod error;
pub mod extent;
pub mod field;
pub mod time;

pub use error::{ChartError, ChartResult};
pub use extent::MapExtent;
pub use field::{FieldKind, FieldMeta, GriddedField};
pub use time::{DateStyle, ForecastTime};
