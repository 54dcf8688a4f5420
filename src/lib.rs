//! Charts for environmental data logger files.
//!
//! A logger file has a 4-line header (column names on line 2) followed by
//! comma-separated records. The library reads it into an
//! [`ObservationTable`](data::model::ObservationTable), narrows it to a date
//! range and renders either a multi-axis time-series overlay or a scatter
//! plot with a least-squares line.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod stats;

pub use config::AppConfig;
pub use error::{PipelineError, Stage};
pub use pipeline::{describe_failure, run_regression, run_timeseries, RunOutcome, RunReport};
