//! Administratively exempted changes.
//!
//! An exclusion row names a `(plate, field, user, date)` tuple. A data
//! change matches only when all four compare equal **and** the change's
//! old value is empty, restricting exemptions to first-time entry of a
//! previously blank field.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use signet_audit::AuditRecord;
use signet_types::{Field, Plate};
use tracing::warn;

use crate::StudyError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Exclusion {
    plate: Plate,
    field: Field,
    user: String,
    date: String,
}

/// The loaded exclusion table.
#[derive(Debug, Default)]
pub struct ExclusionTable {
    entries: Vec<Exclusion>,
}

impl ExclusionTable {
    /// An empty table; nothing is ever excluded.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads `plate|field|user|date[|...]` rows. Rows with missing keys
    /// are skipped silently; rows with an unusable date are skipped with
    /// a warning.
    pub fn load(path: &Path) -> Result<Self, StudyError> {
        let file = File::open(path).map_err(|source| StudyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Self {
        let mut table = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "exclusion file read stopped early");
                    break;
                }
            };
            table.add_row(&line, index + 1);
        }
        table
    }

    fn add_row(&mut self, line: &str, lineno: usize) {
        let rec = AuditRecord::parse(line, '|');
        if rec.len() < 4 {
            return;
        }
        let plate = Plate::new(rec.value(0).trim().parse().unwrap_or(0));
        let field = Field::new(rec.value(1).trim().parse().unwrap_or(0));
        let user = rec.value(2);
        let date = rec.value(3);
        if plate.as_u32() == 0 || field.as_i32() == 0 || user.is_empty() || date.is_empty() {
            return;
        }

        let date: String = date.chars().filter(|&c| c != '/' && c != '\r').collect();
        if date.len() != 8 || !date.starts_with("20") {
            warn!(line = lineno, "exclusion file: bad date, row skipped");
            return;
        }

        self.entries.push(Exclusion {
            plate,
            field,
            user: user.to_string(),
            date,
        });
    }

    /// True when `rec` matches an exclusion row exactly and its old value
    /// is empty.
    pub fn is_excluded(&self, rec: &AuditRecord) -> bool {
        if !rec.old_value().is_empty() {
            return false;
        }
        let plate = rec.plate();
        let field = rec.field_pos();
        self.entries.iter().any(|e| {
            e.plate == plate && e.field == field && e.user == rec.user() && e.date == rec.date()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &str) -> ExclusionTable {
        ExclusionTable::from_reader(rows.as_bytes())
    }

    /// Audit line with the probe columns in their real positions.
    fn probe(plate: u32, field: i32, user: &str, date: &str, old_value: &str) -> AuditRecord {
        let mut fields = vec![String::new(); 20];
        fields[1] = date.to_string();
        fields[3] = user.to_string();
        fields[6] = plate.to_string();
        fields[14] = old_value.to_string();
        fields[16] = field.to_string();
        AuditRecord::parse(&fields.join("|"), '|')
    }

    #[test]
    fn matches_on_all_four_keys_with_blank_old_value() {
        let table = table("11|12|u2|20250101\n");
        assert_eq!(table.len(), 1);
        assert!(table.is_excluded(&probe(11, 12, "u2", "20250101", "")));
    }

    #[test]
    fn non_empty_old_value_never_matches() {
        let table = table("11|12|u2|20250101\n");
        assert!(!table.is_excluded(&probe(11, 12, "u2", "20250101", "previous")));
    }

    #[test]
    fn any_key_mismatch_misses() {
        let table = table("11|12|u2|20250101\n");
        assert!(!table.is_excluded(&probe(99, 12, "u2", "20250101", "")));
        assert!(!table.is_excluded(&probe(11, 13, "u2", "20250101", "")));
        assert!(!table.is_excluded(&probe(11, 12, "u3", "20250101", "")));
        assert!(!table.is_excluded(&probe(11, 12, "u2", "20250102", "")));
    }

    #[test]
    fn slashes_are_stripped_from_dates() {
        let table = table("11|12|u2|2025/01/01\n");
        assert!(table.is_excluded(&probe(11, 12, "u2", "20250101", "")));
    }

    #[test]
    fn bad_dates_are_skipped() {
        let table = table("11|12|u2|19991231\n11|12|u2|202501\n11|12|u3|20250101\n");
        assert_eq!(table.len(), 1);
        assert!(table.is_excluded(&probe(11, 12, "u3", "20250101", "")));
    }

    #[test]
    fn short_or_keyless_rows_are_skipped() {
        let table = table("11|12|u2\n0|12|u2|20250101\n11|0|u2|20250101\n11|12||20250101\n");
        assert!(table.is_empty());
    }

    #[test]
    fn trailing_columns_are_tolerated() {
        let table = table("11|12|u2|20250101|comment here|more\n");
        assert_eq!(table.len(), 1);
    }
}
