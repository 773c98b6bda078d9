//! Ordered sequences of inclusive integer ranges.
//!
//! Configuration entries describe visits and field positions as lists of
//! closed intervals (`"1-3,5,7-10"`, or `"*"` for everything). Ranges are
//! kept in construction order and never merged; membership is a linear
//! scan over a handful of elements.

use std::fmt::{self, Display, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound substituted for the `*` wildcard.
pub const WILDCARD_MAX: i64 = 0x7FFF_FFFF;

#[derive(Debug, Error)]
pub enum RangeSetError {
    #[error("invalid range expression '{0}'")]
    InvalidRange(String),
}

/// One inclusive closed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

/// An ordered sequence of inclusive `[min, max]` intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RangeSet {
    ranges: Vec<Range>,
}

impl RangeSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set covering a single interval.
    pub fn single(min: i64, max: i64) -> Self {
        let mut set = Self::new();
        set.prepend(min, max);
        set
    }

    /// Creates the wildcard set `[0, 2^31 - 1]`.
    pub fn wildcard() -> Self {
        Self::single(0, WILDCARD_MAX)
    }

    /// Inserts a new interval at the head, swapping inverted bounds.
    pub fn prepend(&mut self, min: i64, max: i64) {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        self.ranges.insert(0, Range { min, max });
    }

    /// Appends a new interval at the tail, swapping inverted bounds.
    pub fn push(&mut self, min: i64, max: i64) {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        self.ranges.push(Range { min, max });
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// True if some interval satisfies `min <= v <= max`.
    pub fn contains(&self, v: i64) -> bool {
        self.ranges.iter().any(|r| v >= r.min && v <= r.max)
    }

    /// Smallest interval minimum, or 0 for the empty set.
    pub fn min(&self) -> i64 {
        self.ranges.iter().map(|r| r.min).min().unwrap_or(0)
    }

    /// Largest interval maximum, or 0 for the empty set.
    pub fn max(&self) -> i64 {
        self.ranges.iter().map(|r| r.max).max().unwrap_or(0)
    }

    /// Number of values covered, counting overlaps twice.
    pub fn width(&self) -> i64 {
        self.ranges.iter().map(|r| r.max - r.min + 1).sum()
    }

    /// Iterates intervals head-first, then every value inside each interval.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.ranges.iter().flat_map(|r| r.min..=r.max)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Range> {
        self.ranges.iter()
    }
}

impl Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write!(out, "{}", r.min)?;
            if r.min != r.max {
                write!(out, "-{}", r.max)?;
            }
        }
        f.write_str(&out)
    }
}

impl FromStr for RangeSet {
    type Err = RangeSetError;

    /// Parses `<elem>(,<elem>)*` where `<elem>` is `N` or `N-N`.
    ///
    /// Whitespace is ignored. The empty string is the empty set; the exact
    /// string `*` is the wildcard. A trailing `-` or `,`, a dash with no
    /// preceding element, or any stray character is an error. Inverted
    /// bounds (`10-3`) are swapped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = RangeSet::new();

        if s.is_empty() {
            return Ok(set);
        }
        if s == "*" {
            return Ok(Self::wildcard());
        }

        #[derive(PartialEq, Clone, Copy)]
        enum Token {
            Number,
            Comma,
            Dash,
        }

        // `open` tracks whether the most recent element may still receive a
        // dash-separated maximum.
        let mut last = Token::Number;
        let mut open = false;
        let mut chars = s.chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }
            if c.is_ascii_digit() {
                let mut v: i64 = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    v = v.saturating_mul(10).saturating_add(i64::from(d));
                    chars.next();
                }
                if last == Token::Dash {
                    match set.ranges.last_mut() {
                        Some(r) if open => {
                            r.max = v;
                            if r.min > r.max {
                                std::mem::swap(&mut r.min, &mut r.max);
                            }
                        }
                        _ => return Err(RangeSetError::InvalidRange(s.to_string())),
                    }
                    open = false;
                } else {
                    set.push(v, v);
                    open = true;
                }
                last = Token::Number;
            } else if c == ',' {
                chars.next();
                open = false;
                last = Token::Comma;
            } else if c == '-' {
                chars.next();
                last = Token::Dash;
            } else {
                return Err(RangeSetError::InvalidRange(s.to_string()));
            }
        }

        if last != Token::Number {
            return Err(RangeSetError::InvalidRange(s.to_string()));
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ranges_and_round_trips() {
        let set: RangeSet = "1-3,5,7-10".parse().expect("valid range list");
        assert_eq!(set.iter().count(), 3);
        assert_eq!(set.to_string(), "1-3,5,7-10");
        assert_eq!(set.width(), 8);
        assert!(!set.contains(4));
        assert!(set.contains(8));
    }

    #[test]
    fn canonical_round_trip_preserves_structure() {
        for text in ["7", "1-2", "5,9", "1-3,5,7-10", "100-200,5,1-10"] {
            let set: RangeSet = text.parse().expect("valid range list");
            let again: RangeSet = set.to_string().parse().expect("round trip");
            assert_eq!(set, again);
            assert_eq!(set.to_string(), text);
        }
    }

    #[test]
    fn empty_string_is_empty_set() {
        let set: RangeSet = "".parse().expect("empty is not an error");
        assert!(set.is_empty());
        assert_eq!(set.width(), 0);
        assert!(!set.contains(0));
    }

    #[test]
    fn wildcard_covers_the_full_field_space() {
        let set: RangeSet = "*".parse().expect("wildcard");
        assert_eq!(set.min(), 0);
        assert_eq!(set.max(), WILDCARD_MAX);
        assert!(set.contains(0));
        assert!(set.contains(123_456));
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let set: RangeSet = "10-3".parse().expect("inverted range");
        assert_eq!(set.to_string(), "3-10");

        let mut prepended = RangeSet::new();
        prepended.prepend(10, 3);
        assert_eq!(prepended.to_string(), "3-10");
    }

    #[test]
    fn trailing_dash_or_comma_is_an_error() {
        assert!("5-".parse::<RangeSet>().is_err());
        assert!("5,".parse::<RangeSet>().is_err());
        assert!("-5".parse::<RangeSet>().is_err());
        assert!("5,x".parse::<RangeSet>().is_err());
    }

    #[test]
    fn whitespace_is_ignored() {
        let set: RangeSet = " 1 - 3 , 5 ".parse().expect("spaced range list");
        assert_eq!(set.to_string(), "1-3,5");
    }

    #[test]
    fn prepend_inserts_at_the_head() {
        let mut set = RangeSet::new();
        set.prepend(1, 10);
        set.prepend(5, 5);
        set.prepend(100, 200);
        assert_eq!(set.to_string(), "100-200,5,1-10");
        assert_eq!(set.min(), 1);
        assert_eq!(set.max(), 200);
        assert_eq!(set.width(), 112);
    }

    #[test]
    fn width_counts_cardinality() {
        let set: RangeSet = "1-3,5,7-10".parse().expect("valid");
        assert_eq!(set.width(), set.values().count() as i64);
    }

    #[test]
    fn values_enumerates_in_order() {
        let set: RangeSet = "7-9,3".parse().expect("valid");
        let values: Vec<i64> = set.values().collect();
        assert_eq!(values, vec![7, 8, 9, 3]);
    }
}
