//! # signet-types: Core types for `signet`
//!
//! This crate contains shared types used across the signature tracker:
//! - Record keys ([`Patient`], [`Plate`], [`Visit`], [`Field`])
//! - Transaction identity ([`TransactionId`])
//! - Signature state ([`SignatureStatus`], [`RecordStatus`], [`ChangeStatus`], [`Status`])
//! - Inclusive integer range sets ([`RangeSet`])

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

mod rangeset;

pub use rangeset::{Range, RangeSet, RangeSetError};

// ============================================================================
// Record Keys - All Copy (cheap integer values)
// ============================================================================

/// Patient identifier as recorded in the audit trail.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Patient(u64);

impl Patient {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Patient as a signed value for [`RangeSet`] membership tests.
    pub fn as_i64(self) -> i64 {
        self.0 as i64
    }
}

impl Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Patient {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Case-report-form plate number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Plate(u32);

impl Plate {
    pub fn new(plate: u32) -> Self {
        Self(plate)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Plate {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Visit (sequence) number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Visit(u32);

impl Visit {
    pub fn new(visit: u32) -> Self {
        Self(visit)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }
}

impl Display for Visit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Visit {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Field position on a plate.
///
/// Positions 1..=7 carry record-level metadata (raster, study and keys);
/// data fields proper start at 8.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Field(i32);

impl Field {
    pub fn new(field: i32) -> Self {
        Self(field)
    }

    pub fn as_i32(self) -> i32 {
        self.0
    }

    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Monotonic identifier of one audit transaction (a maximal run of audit
/// events sharing date, time, user, patient, visit and plate).
///
/// Zero means "no transaction": a node whose `txn_id` is zero has no
/// signing transaction on record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TransactionId(u64);

impl TransactionId {
    pub const NONE: TransactionId = TransactionId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// The next transaction identity in input order.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Signature State
// ============================================================================

/// Whether a signature obligation has ever been executed and still stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SignatureStatus {
    /// Never had a signature.
    #[default]
    None,
    /// Signature complete.
    Complete,
    /// Signature cleared or record deleted after signing.
    Invalidated,
}

/// Record-level state of a plate as carried by the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RecordStatus {
    #[default]
    Normal,
    Error,
    Lost,
    Deleted,
}

/// Disposition of data changes made after signing.
///
/// The derived ordering is the propagation lattice: when statuses are
/// combined, the larger value wins
/// (`None < Accepted < Declined < DeclinedAtFinal`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ChangeStatus {
    /// No data changes.
    #[default]
    None,
    /// Changes deemed OK.
    Accepted,
    /// Changes not deemed OK.
    Declined,
    /// Changes not OK once the record is final.
    DeclinedAtFinal,
}

/// The three-dimensional status carried by every tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Status {
    pub signature: SignatureStatus,
    pub record: RecordStatus,
    pub change: ChangeStatus,
}
