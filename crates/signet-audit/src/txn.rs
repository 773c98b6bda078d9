//! Transaction grouping over the audit stream.

use signet_types::TransactionId;

use crate::AuditRecord;
use crate::record::{POS_DATE, POS_TIME, POS_USER};

/// Assigns a monotonic transaction id to each audit line.
///
/// Events sharing a `(date, time, user, patient, visit, plate)` tuple form
/// a contiguous run in the input; each change of that key starts a new
/// transaction. Out-of-order input reorders id assignment but cannot
/// corrupt downstream state.
#[derive(Debug, Default)]
pub struct TransactionGrouper {
    last_key: String,
    current: TransactionId,
}

impl TransactionGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transaction id for `rec`, advancing when the grouping
    /// key differs from the previous record's.
    pub fn assign(&mut self, rec: &AuditRecord) -> TransactionId {
        let key = format!(
            "{}|{}|{}|{}|{}|{}",
            rec.value(POS_DATE),
            rec.value(POS_TIME),
            rec.value(POS_USER),
            rec.patient(),
            rec.visit(),
            rec.plate(),
        );
        if key != self.last_key {
            self.current = self.current.next();
            self.last_key = key;
        }
        self.current
    }

    /// The most recently assigned id.
    pub fn current(&self) -> TransactionId {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, time: &str, user: &str, patient: &str, plate: &str) -> AuditRecord {
        AuditRecord::parse(
            &format!("d|{date}|{time}|{user}|{patient}|1|{plate}"),
            '|',
        )
    }

    #[test]
    fn same_key_shares_a_transaction() {
        let mut grouper = TransactionGrouper::new();
        let a = grouper.assign(&record("20250101", "1200", "u1", "1001", "10"));
        let b = grouper.assign(&record("20250101", "1200", "u1", "1001", "10"));
        assert_eq!(a, b);
    }

    #[test]
    fn key_change_advances_the_id() {
        let mut grouper = TransactionGrouper::new();
        let a = grouper.assign(&record("20250101", "1200", "u1", "1001", "10"));
        let b = grouper.assign(&record("20250101", "1200", "u2", "1001", "10"));
        let c = grouper.assign(&record("20250101", "1201", "u2", "1001", "10"));
        assert!(a < b && b < c);
    }

    #[test]
    fn ids_are_strictly_monotonic_in_input_order() {
        let mut grouper = TransactionGrouper::new();
        let mut last = TransactionId::NONE;
        for (time, plate) in [("1200", "10"), ("1200", "11"), ("1201", "10"), ("1202", "12")] {
            let id = grouper.assign(&record("20250101", time, "u1", "1001", plate));
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn returning_to_an_earlier_key_still_advances() {
        // The grouper only remembers the previous key; an interleaved
        // stream splits into more transactions, never fewer.
        let mut grouper = TransactionGrouper::new();
        let a = grouper.assign(&record("20250101", "1200", "u1", "1001", "10"));
        let _ = grouper.assign(&record("20250101", "1200", "u1", "1001", "11"));
        let c = grouper.assign(&record("20250101", "1200", "u1", "1001", "10"));
        assert!(c > a);
    }

    #[test]
    fn first_assignment_starts_at_one() {
        let mut grouper = TransactionGrouper::new();
        let id = grouper.assign(&record("20250101", "1200", "u1", "1001", "10"));
        assert_eq!(id, TransactionId::new(1));
    }
}
