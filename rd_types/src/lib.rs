//! rd_types
//!
//! Argument, UI state and column types shared by the repertoire distance block.
// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

#[macro_use]
mod macros;

pub mod args;
pub mod column;
pub mod errors;
pub mod metric;
pub mod serde_helpers;

pub use args::{BlockArgs, GraphState, PlRef, TableState, UiState};
pub use column::{PColumn, PColumnId, PColumnIdAndSpec, PColumnSpec, ValueType};
pub use errors::ParseVariantError;
pub use metric::{
    DistanceType, Downsampling, DownsamplingType, IntersectionType, Metric, MetricId, MetricUi,
    ValueChooser,
};
