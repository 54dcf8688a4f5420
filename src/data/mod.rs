/// Data layer: header, loading, and date filtering.
///
/// Architecture:
/// ```text
///   logger .dat file
///        │
///        ▼
///   ┌──────────┐
///   │  header   │  4 lines → ColumnNames
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  csv body + timestamp strategies → ObservationTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  DateRange → FilteredTable
///   └──────────┘
/// ```
pub mod filter;
pub mod header;
pub mod loader;
pub mod model;
pub mod timestamp;
