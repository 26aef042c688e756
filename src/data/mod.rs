/// Data layer: core types, loading, derived views and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → AdmissionDataset (validated)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ AdmissionDataset  │  Vec<AdmissionRecord>, immutable
///   └──────────────────┘
///        │                     │
///        ▼                     ▼
///   ┌──────────┐          ┌──────────┐
///   │  query    │ views    │  export   │ full table → .csv
///   └──────────┘          └──────────┘
/// ```

pub mod error;
pub mod export;
pub mod loader;
pub mod model;
pub mod query;
