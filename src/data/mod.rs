/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, rename columns → NamesDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ NamesDataset  │  Vec<Record>, district / year index (immutable)
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year / district / name / maxes / district-count stages
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  grouped sums, distinct counts, left joins
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
