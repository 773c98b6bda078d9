//! Token stream for the signature-definition language.

use std::fmt::{self, Display};

/// One lexical token with the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Number(i64),
    Ident(String),
    Str(String),
    LBrace,
    RBrace,
    Semi,
    Comma,
    Dash,
    Star,
    /// A character the language has no use for; reported at parse time so
    /// the parser can resynchronise like any other syntax error.
    Unexpected(char),
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::LBrace => f.write_str("{"),
            Token::RBrace => f.write_str("}"),
            Token::Semi => f.write_str(";"),
            Token::Comma => f.write_str(","),
            Token::Dash => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Unexpected(c) => write!(f, "{c:?}"),
        }
    }
}

/// Tokenises the whole source up front. Strings are double-quoted with no
/// escapes; `#` starts a comment running to end of line.
pub(crate) fn tokenize(src: &str) -> Vec<Spanned> {
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let mut chars = src.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            _ if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '{' | '}' | ';' | ',' | '-' | '*' => {
                chars.next();
                let token = match c {
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    ';' => Token::Semi,
                    ',' => Token::Comma,
                    '-' => Token::Dash,
                    _ => Token::Star,
                };
                tokens.push(Spanned { token, line });
            }
            '"' => {
                chars.next();
                let start = line;
                let mut text = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    if c == '\n' {
                        line += 1;
                    }
                    text.push(c);
                }
                let token = if closed {
                    Token::Str(text)
                } else {
                    Token::Unexpected('"')
                };
                tokens.push(Spanned { token, line: start });
            }
            _ if c.is_ascii_digit() => {
                let mut v: i64 = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    v = v.saturating_mul(10).saturating_add(i64::from(d));
                    chars.next();
                }
                tokens.push(Spanned {
                    token: Token::Number(v),
                    line,
                });
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Spanned {
                    token: Token::Ident(word),
                    line,
                });
            }
            _ => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Unexpected(c),
                    line,
                });
            }
        }
    }

    tokens
}
