/// Data layer: trip types, loading, and filtering.
///
/// Architecture:
/// ```text
///  city.csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<TripRecord>, optional column flags
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  month / weekday predicates → FilteredView
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
