/// Data layer: core types, parsing, and loading.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .data / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → format-specific records
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  parse    │  TableSchema + skip policy → ParseReport
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Row>, group index
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
mod parse;
pub mod schema;
