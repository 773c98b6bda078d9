//! Recursive-descent parser for the signature-definition language.
//!
//! ```text
//! config       := signature*
//! signature    := "signature" STRING "plate" N "visit" visitRange
//!                 "fields" range "{" plateDefn+ "}"
//! plateDefn    := "plate" N ignoreFields ";"
//! ignoreFields := ("ignore" "fields" range)?
//! visitRange   := "*" | range
//! range        := element ("," element)*
//! element      := N | N "-" N
//! ```

use std::fmt::{self, Display};

use signet_types::{Plate, RangeSet};

use crate::SignatureConfig;
use crate::lexer::{Spanned, Token, tokenize};

/// One recorded syntax error with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: u32,
    pub message: String,
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// The result of a parse: every record that survived, plus every error.
///
/// A signature block containing an error contributes no records; the
/// parser resynchronises at the block's closing `}` and continues with
/// the next block. Callers abort the run when `errors` is non-empty.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub configs: Vec<SignatureConfig>,
    pub errors: Vec<SyntaxError>,
}

/// Parses a complete configuration source.
pub fn parse(src: &str) -> ParseOutcome {
    let mut parser = Parser {
        tokens: tokenize(src),
        pos: 0,
        serial: 0,
        outcome: ParseOutcome::default(),
    };
    parser.config();
    parser.outcome
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    serial: u32,
    outcome: ParseOutcome,
}

struct Unexpected {
    line: u32,
    message: String,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn fail(&self, expected: &str) -> Unexpected {
        let found = match self.peek() {
            Some(token) => format!("'{token}'"),
            None => "end of input".to_string(),
        };
        Unexpected {
            line: self.line(),
            message: format!("expected {expected}, found {found}"),
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), Unexpected> {
        match self.peek() {
            Some(Token::Ident(ident)) if ident == word => {
                self.advance();
                Ok(())
            }
            _ => Err(self.fail(&format!("'{word}'"))),
        }
    }

    fn expect_number(&mut self, what: &str) -> Result<i64, Unexpected> {
        match self.peek() {
            Some(Token::Number(v)) => {
                let v = *v;
                self.advance();
                Ok(v)
            }
            _ => Err(self.fail(what)),
        }
    }

    fn expect_string(&mut self, what: &str) -> Result<String, Unexpected> {
        match self.peek() {
            Some(Token::Str(text)) => {
                let text = text.clone();
                self.advance();
                Ok(text)
            }
            _ => Err(self.fail(what)),
        }
    }

    fn expect_token(&mut self, token: Token, what: &str) -> Result<(), Unexpected> {
        if self.peek() == Some(&token) {
            self.advance();
            Ok(())
        } else {
            Err(self.fail(what))
        }
    }

    // config := signature*
    fn config(&mut self) {
        while self.peek().is_some() {
            if let Err(err) = self.signature() {
                self.outcome.errors.push(SyntaxError {
                    line: err.line,
                    message: err.message,
                });
                self.resync();
            }
        }
    }

    /// Skips past the next `}`, the resynchronisation point after an
    /// error, so later blocks still parse.
    fn resync(&mut self) {
        while let Some(token) = self.advance() {
            if token == Token::RBrace {
                break;
            }
        }
    }

    // signature := "signature" STRING "plate" N "visit" visitRange
    //              "fields" range "{" plateDefn+ "}"
    fn signature(&mut self) -> Result<(), Unexpected> {
        self.expect_keyword("signature")?;
        let name = self.expect_string("signature description")?;
        self.expect_keyword("plate")?;
        let sig_plate = Plate::new(self.expect_number("signature plate number")? as u32);
        self.expect_keyword("visit")?;
        let visits = self.visit_range()?;
        self.expect_keyword("fields")?;
        let sig_fields = self.range()?;
        self.expect_token(Token::LBrace, "'{'")?;

        // Records only land in the outcome once the whole block parses;
        // an error discards the block. At least one covered plate is
        // required.
        let mut records = vec![self.plate_defn()?];
        while self.peek() != Some(&Token::RBrace) {
            records.push(self.plate_defn()?);
        }
        self.advance();

        let n_sig_fields = sig_fields.width() as usize;
        for (plate, ignore_fields) in records {
            self.serial += 1;
            self.outcome.configs.push(SignatureConfig {
                name: name.clone(),
                sig_plate,
                visits: visits.clone(),
                sig_fields: sig_fields.clone(),
                n_sig_fields,
                plate,
                ignore_fields,
                serial: self.serial,
            });
        }
        Ok(())
    }

    // plateDefn := "plate" N ("ignore" "fields" range)? ";"
    fn plate_defn(&mut self) -> Result<(Plate, RangeSet), Unexpected> {
        self.expect_keyword("plate")?;
        let plate = Plate::new(self.expect_number("covered plate number")? as u32);
        let ignore_fields = match self.peek() {
            Some(Token::Ident(ident)) if ident == "ignore" => {
                self.advance();
                self.expect_keyword("fields")?;
                self.range()?
            }
            _ => RangeSet::new(),
        };
        self.expect_token(Token::Semi, "';'")?;
        Ok((plate, ignore_fields))
    }

    // visitRange := "*" | range
    fn visit_range(&mut self) -> Result<RangeSet, Unexpected> {
        if self.peek() == Some(&Token::Star) {
            self.advance();
            return Ok(RangeSet::wildcard());
        }
        self.range()
    }

    // range := element ("," element)*
    fn range(&mut self) -> Result<RangeSet, Unexpected> {
        let mut set = RangeSet::new();
        self.element(&mut set)?;
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            self.element(&mut set)?;
        }
        Ok(set)
    }

    // element := N | N "-" N
    fn element(&mut self, set: &mut RangeSet) -> Result<(), Unexpected> {
        let min = self.expect_number("number")?;
        if self.peek() == Some(&Token::Dash) {
            self.advance();
            let max = self.expect_number("number after '-'")?;
            set.push(min, max);
        } else {
            set.push(min, min);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
        signature "Investigator" plate 10 visit * fields 5-6 {
            plate 10;
            plate 11 ignore fields 20-29;
            plate 12;
        }
    "#;

    #[test]
    fn flattens_one_record_per_covered_plate() {
        let outcome = parse(BASIC);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.configs.len(), 3);

        let plates: Vec<u32> = outcome.configs.iter().map(|c| c.plate.as_u32()).collect();
        assert_eq!(plates, vec![10, 11, 12]);
        for config in &outcome.configs {
            assert_eq!(config.name, "Investigator");
            assert_eq!(config.sig_plate, Plate::new(10));
            assert_eq!(config.sig_fields.to_string(), "5-6");
            assert_eq!(config.n_sig_fields, 2);
            assert!(config.visits.contains(999));
        }
    }

    #[test]
    fn header_fields_are_deep_copied_across_siblings() {
        let outcome = parse(BASIC);
        let a = &outcome.configs[0];
        let b = &outcome.configs[1];
        assert_eq!(a.visits, b.visits);
        assert_eq!(a.sig_fields, b.sig_fields);
        // Distinct ignore lists per plate.
        assert!(a.ignore_fields.is_empty());
        assert_eq!(b.ignore_fields.to_string(), "20-29");
    }

    #[test]
    fn serials_are_monotonic_in_declaration_order() {
        let outcome = parse(concat!(
            r#"signature "A" plate 1 visit * fields 5 { plate 1; plate 2; }"#,
            "\n",
            r#"signature "B" plate 3 visit 1-4 fields 6 { plate 3; }"#,
        ));
        assert!(outcome.errors.is_empty());
        let serials: Vec<u32> = outcome.configs.iter().map(|c| c.serial).collect();
        assert_eq!(serials, vec![1, 2, 3]);
        assert_eq!(outcome.configs[2].name, "B");
        assert_eq!(outcome.configs[2].visits.to_string(), "1-4");
    }

    #[test]
    fn explicit_visit_ranges_parse() {
        let outcome = parse(r#"signature "A" plate 1 visit 1-3,7 fields 5 { plate 1; }"#);
        assert!(outcome.errors.is_empty());
        let visits = &outcome.configs[0].visits;
        assert!(visits.contains(2));
        assert!(visits.contains(7));
        assert!(!visits.contains(5));
    }

    #[test]
    fn error_discards_the_block_and_resynchronises() {
        let outcome = parse(concat!(
            r#"signature "Bad" plate 1 visit * fields 5 { plate oops; }"#,
            "\n",
            r#"signature "Good" plate 2 visit * fields 6 { plate 2; }"#,
        ));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line, 1);
        assert_eq!(outcome.configs.len(), 1);
        assert_eq!(outcome.configs[0].name, "Good");
        assert_eq!(outcome.configs[0].serial, 1);
    }

    #[test]
    fn missing_semicolon_is_reported_with_line_context() {
        let outcome = parse("signature \"A\" plate 1 visit * fields 5 {\n    plate 1\n}\n");
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line, 3);
        assert!(outcome.configs.is_empty());
    }

    #[test]
    fn a_block_requires_at_least_one_covered_plate() {
        let outcome = parse(r#"signature "A" plate 1 visit * fields 5 { }"#);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.configs.is_empty());
    }

    #[test]
    fn empty_source_parses_to_nothing() {
        let outcome = parse("");
        assert!(outcome.configs.is_empty());
        assert!(outcome.errors.is_empty());
    }
}
