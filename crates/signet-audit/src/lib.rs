//! # signet-audit: Audit-trail input
//!
//! The audit trail arrives as `|`-delimited, newline-terminated lines on
//! standard input, one field-level change per line. This crate provides:
//!
//! - [`AuditRecord`]: the tokenised, positionally-addressed view of one line
//! - [`TransactionGrouper`]: assignment of monotonic transaction ids from
//!   the `(date, time, user, patient, visit, plate)` key
//!
//! Input is tolerated rather than validated: a missing column reads as the
//! empty string and a non-numeric value where a number is expected reads
//! as zero. Shape anomalies never abort a run.

mod record;
mod txn;

pub use record::AuditRecord;
pub use txn::TransactionGrouper;
