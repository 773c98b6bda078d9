//! # signet-sinks: Output sinks
//!
//! Everything the tracker writes once (or while) the audit stream is
//! processed:
//!
//! - [`SigningDb`]: SQLite writeback of signings and their covered values
//! - [`write_drf`]: the Data Resolution File of obligations to revisit
//! - [`report`]: the colour-coded report row model and delimited writer
//!
//! Sinks follow local-recovery rules: a failed row is logged and
//! abandoned, a failed file open aborts the run.

use thiserror::Error;

mod db;
mod drf;
pub mod report;

pub use db::SigningDb;
pub use drf::write_drf;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
