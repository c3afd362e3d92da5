//! Query backend for a given-name registration dashboard.
//!
//! The registration table is loaded once ([`data::loader::load_file`]) into an
//! immutable [`NamesDataset`] and then answers four views: a ranked name table,
//! a per-year trend, a district rarity scatterplot and a per-district map.

pub mod config;
pub mod data;
pub mod dispatch;
pub mod query;
pub mod worker;

pub use data::filter::{DistrictCountBounds, FilterSpec, MaxBounds, YearRange};
pub use data::model::{Gender, NamesDataset, Record};
pub use dispatch::{call_fn, DispatchError, QueryRequest, QueryResponse};
