//! Batch enrichment for the four-pillar calendar.
//!
//! Takes caller-normalised local timestamps and a reference instant, and
//! produces one row of pillar, life-cycle and branch-relation features per
//! timestamp on a bounded worker pool.

mod batch;
mod config;
mod row;
mod table;

pub use batch::{BatchControl, BatchEnricher, BatchError, BatchReport, RowComputationError};
pub use config::WorkerConfig;
pub use row::EnrichmentRow;
pub use table::{Cell, EnrichmentTable, TIMESTAMP_FORMAT};
