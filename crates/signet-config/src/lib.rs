//! # signet-config: The signature-definition language
//!
//! A study's signature obligations are described declaratively:
//!
//! ```text
//! signature "Investigator" plate 10 visit * fields 5-6 {
//!     plate 10;
//!     plate 11 ignore fields 20-29;
//!     plate 12;
//! }
//! ```
//!
//! Each `signature` block names the plate carrying the signature fields,
//! the visits in scope, and the covered plates (with per-plate ignore
//! lists of non-material fields). Parsing flattens every covered-plate
//! entry into its own [`SignatureConfig`] record, duplicating the header
//! fields across siblings, in declaration order.
//!
//! Syntax errors do not stop the parse: the parser resynchronises at the
//! closing `}` of the offending block and continues, and the caller
//! aborts the run when any error was recorded.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use signet_types::{Plate, RangeSet};
use thiserror::Error;

mod lexer;
mod parser;
mod priority;

pub use parser::{ParseOutcome, SyntaxError, parse};
pub use priority::write_priority;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{count} error(s) in configuration")]
    Syntax { count: usize },
}

/// One flattened configuration record: a single covered plate together
/// with a copy of its signature header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// Signature description, e.g. `"Investigator"`.
    pub name: String,
    /// Plate carrying the signature fields.
    pub sig_plate: Plate,
    /// Visits in scope for this obligation.
    pub visits: RangeSet,
    /// Field positions that capture the signer's mark.
    pub sig_fields: RangeSet,
    /// Cardinality of `sig_fields`.
    pub n_sig_fields: usize,
    /// The covered plate this record tracks.
    pub plate: Plate,
    /// Fields on the covered plate whose changes are not material.
    pub ignore_fields: RangeSet,
    /// Monotonic record identity, assigned in declaration order.
    pub serial: u32,
}

impl Display for SignatureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "signature {:?} for plate {}, visits {} ",
            self.name, self.plate, self.visits
        )?;
        if !self.ignore_fields.is_empty() {
            write!(f, "(ignore fields {}) ", self.ignore_fields)?;
        }
        write!(
            f,
            "is on plate {} fields {}",
            self.sig_plate, self.sig_fields
        )
    }
}
