//! Tokenised view of one audit-trail line.
//!
//! # Positional schema
//!
//! ```text
//! 0:rectype 1:date 2:time 3:user 4:patient 5:visit 6:plate 7:fieldref
//! 8:uniqueid 9:status 10:level 11:maxlevel 14:old value 15:new value
//! 16:field position 17:field description 18:old decode 19:new decode
//! ```

use signet_types::{Field, Patient, Plate, Visit};

// Well-known column positions.
pub(crate) const POS_DATE: usize = 1;
pub(crate) const POS_TIME: usize = 2;
pub(crate) const POS_USER: usize = 3;
pub(crate) const POS_PATIENT: usize = 4;
pub(crate) const POS_VISIT: usize = 5;
pub(crate) const POS_PLATE: usize = 6;
pub(crate) const POS_FIELDREF: usize = 7;
pub(crate) const POS_STATUS: usize = 9;
pub(crate) const POS_LEVEL: usize = 10;
pub(crate) const POS_OLD_VALUE: usize = 14;
pub(crate) const POS_NEW_VALUE: usize = 15;
pub(crate) const POS_FIELD_POS: usize = 16;
pub(crate) const POS_FIELD_DESC: usize = 17;
pub(crate) const POS_OLD_DECODE: usize = 18;
pub(crate) const POS_NEW_DECODE: usize = 19;

/// One audit-trail line, split on its delimiter.
///
/// Accessors never fail: out-of-range columns read as `""` and numeric
/// columns parse their leading digits, defaulting to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    fields: Vec<String>,
}

impl AuditRecord {
    /// Splits one line on `delimiter`. A trailing carriage return is
    /// stripped before tokenising.
    pub fn parse(line: &str, delimiter: char) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        Self {
            fields: line.split(delimiter).map(str::to_string).collect(),
        }
    }

    /// The number of columns present on this line.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the column at `pos`, or `""` when the line is too short.
    pub fn value(&self, pos: usize) -> &str {
        self.fields.get(pos).map_or("", String::as_str)
    }

    /// Leading-digits numeric read with a zero default, the discipline the
    /// rest of the pipeline assumes for malformed numeric columns.
    fn num(&self, pos: usize) -> i64 {
        parse_leading_i64(self.value(pos))
    }

    pub fn date(&self) -> &str {
        self.value(POS_DATE)
    }

    pub fn time(&self) -> &str {
        self.value(POS_TIME)
    }

    pub fn user(&self) -> &str {
        self.value(POS_USER)
    }

    pub fn patient(&self) -> Patient {
        Patient::new(self.num(POS_PATIENT).max(0) as u64)
    }

    pub fn visit(&self) -> Visit {
        Visit::new(self.num(POS_VISIT).max(0) as u32)
    }

    pub fn plate(&self) -> Plate {
        Plate::new(self.num(POS_PLATE).max(0) as u32)
    }

    /// Non-zero for query and reason rows, which the engine skips.
    pub fn field_ref(&self) -> i64 {
        self.num(POS_FIELDREF)
    }

    pub fn status(&self) -> i64 {
        self.num(POS_STATUS)
    }

    pub fn level(&self) -> i64 {
        self.num(POS_LEVEL)
    }

    pub fn field_pos(&self) -> Field {
        Field::new(self.num(POS_FIELD_POS) as i32)
    }

    pub fn old_value(&self) -> &str {
        self.value(POS_OLD_VALUE)
    }

    pub fn new_value(&self) -> &str {
        self.value(POS_NEW_VALUE)
    }

    pub fn field_desc(&self) -> &str {
        self.value(POS_FIELD_DESC)
    }

    /// Old value joined with its coding label (`value=decode`) when a
    /// decode is present.
    pub fn decoded_old(&self) -> String {
        decode_value(self.value(POS_OLD_VALUE), self.value(POS_OLD_DECODE))
    }

    /// New value joined with its coding label when a decode is present.
    pub fn decoded_new(&self) -> String {
        decode_value(self.value(POS_NEW_VALUE), self.value(POS_NEW_DECODE))
    }
}

fn decode_value(value: &str, decode: &str) -> String {
    if decode.is_empty() {
        value.to_string()
    } else {
        format!("{value}={decode}")
    }
}

/// Parses an optional sign and leading digit run, ignoring leading
/// whitespace; anything else reads as zero.
fn parse_leading_i64(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let mut v: i64 = 0;
    for c in digits.chars() {
        match c.to_digit(10) {
            Some(d) => v = v.saturating_mul(10).saturating_add(i64::from(d)),
            None => break,
        }
    }
    sign * v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> AuditRecord {
        AuditRecord::parse(line, '|')
    }

    #[test]
    fn splits_on_delimiter() {
        let rec = record("d|20250101|101500|alice|1001|2|10");
        assert_eq!(rec.len(), 7);
        assert_eq!(rec.date(), "20250101");
        assert_eq!(rec.time(), "101500");
        assert_eq!(rec.user(), "alice");
        assert_eq!(rec.patient(), Patient::new(1001));
        assert_eq!(rec.visit(), Visit::new(2));
        assert_eq!(rec.plate(), Plate::new(10));
    }

    #[test]
    fn missing_columns_read_as_empty() {
        let rec = record("d|20250101");
        assert_eq!(rec.user(), "");
        assert_eq!(rec.new_value(), "");
        assert_eq!(rec.patient(), Patient::new(0));
        assert_eq!(rec.field_pos(), Field::new(0));
    }

    #[test]
    fn non_numeric_columns_read_as_zero() {
        let rec = record("d|x|x|u|abc|?|12z");
        assert_eq!(rec.patient(), Patient::new(0));
        assert_eq!(rec.visit(), Visit::new(0));
        // Leading digits still count.
        assert_eq!(rec.plate(), Plate::new(12));
    }

    #[test]
    fn trailing_carriage_return_is_stripped() {
        let rec = record("d|20250101|101500\r");
        assert_eq!(rec.time(), "101500");
    }

    #[test]
    fn decoded_values_join_on_equals() {
        let mut fields = vec![String::new(); 20];
        fields[POS_OLD_VALUE] = "1".into();
        fields[POS_NEW_VALUE] = "2".into();
        fields[POS_OLD_DECODE] = "No".into();
        fields[POS_NEW_DECODE] = "Yes".into();
        let rec = record(&fields.join("|"));
        assert_eq!(rec.decoded_old(), "1=No");
        assert_eq!(rec.decoded_new(), "2=Yes");
    }

    #[test]
    fn decoded_values_without_decode_pass_through() {
        let mut fields = vec![String::new(); 20];
        fields[POS_NEW_VALUE] = "42".into();
        let rec = record(&fields.join("|"));
        assert_eq!(rec.decoded_new(), "42");
        assert_eq!(rec.decoded_old(), "");
    }

    #[test]
    fn empty_fields_between_delimiters_are_kept() {
        let rec = record("a||c");
        assert_eq!(rec.len(), 3);
        assert_eq!(rec.value(1), "");
        assert_eq!(rec.value(2), "c");
    }
}
