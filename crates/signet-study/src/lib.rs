//! # signet-study: Study-directory lookups
//!
//! Read-only side tables loaded from `|`-delimited files:
//!
//! - [`ExclusionTable`]: administratively exempted changes
//! - [`Centers`]: patient-to-centre assignment (`<studydir>/lib/DFcenters`)
//! - [`Countries`]: centre-to-country/region assignment
//!   (`<studydir>/lib/DFcountries`)
//!
//! Malformed rows are logged and skipped; only failure to read a file at
//! all surfaces as an error.

use std::path::PathBuf;

use thiserror::Error;

mod exclusions;
mod sites;

pub use exclusions::ExclusionTable;
pub use sites::{Center, Centers, Countries, Country};

#[derive(Debug, Error)]
pub enum StudyError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
