//! Path expression parser
//!
//! Grammar, after the leading `$`:
//!
//! ```text
//! path     := [".." | "."] segments? ["[]"]
//! segments := segment (("." segment) | bracket)*
//! segment  := identifier | bracket
//! bracket  := "[" (digits | quoted) "]"
//! ```
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::ast::{PathExpression, Scope, Segment};
use super::error::PathError;
use std::iter::Peekable;
use std::str::Chars;

/// Recursive descent parser for path expressions
pub struct Parser<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::parse("Empty path expression", 0, input));
        }

        Ok(Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        })
    }

    /// Parse the path expression into an AST
    pub fn parse(mut self) -> Result<PathExpression, PathError> {
        self.expect_char('$')?;

        let scope = if self.input[self.position..].starts_with("..") {
            self.advance();
            self.advance();
            Scope::Accumulator
        } else {
            if self.current_char() == Some('.') {
                self.advance();
            }
            Scope::Value
        };

        let (body_end, is_collection) = match self.input.strip_suffix("[]") {
            Some(body) if body.len() >= self.position => (body.len(), true),
            _ => (self.input.len(), false),
        };

        let mut segments = Vec::new();
        while self.position < body_end {
            segments.push(self.parse_segment()?);

            if self.position >= body_end {
                break;
            }

            match self.current_char() {
                Some('.') => {
                    self.advance();
                    if self.position >= body_end {
                        return Err(self.syntax_error("Path cannot end with '.'", vec!["identifier"]));
                    }
                }
                Some('[') => {}
                _ => {
                    return Err(self.syntax_error("Unexpected character after segment", vec![".", "["]));
                }
            }
        }

        Ok(PathExpression::new(scope, segments, is_collection, self.input))
    }

    fn parse_segment(&mut self) -> Result<Segment, PathError> {
        match self.current_char() {
            Some('[') => self.parse_bracket(),
            Some('.') => Err(self.syntax_error("Empty path segment", vec!["identifier", "["])),
            Some(_) => self.parse_identifier().map(Segment::Key),
            None => Err(PathError::parse("Unexpected end of input", self.position, self.input)),
        }
    }

    fn parse_identifier(&mut self) -> Result<String, PathError> {
        let mut identifier = String::new();
        while let Some(ch) = self.current_char() {
            if matches!(ch, '.' | '[' | ']') {
                break;
            }
            identifier.push(ch);
            self.advance();
        }

        if identifier.is_empty() {
            return Err(self.syntax_error("Expected identifier", vec!["identifier"]));
        }
        Ok(identifier)
    }

    fn parse_bracket(&mut self) -> Result<Segment, PathError> {
        self.expect_char('[')?;

        let segment = match self.current_char() {
            Some(quote @ ('\'' | '"')) => {
                self.advance();
                let mut key = String::new();
                loop {
                    match self.advance() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => key.push(ch),
                        None => {
                            return Err(PathError::parse(
                                "Unterminated quoted key",
                                self.position,
                                self.input,
                            ))
                        }
                    }
                }
                Segment::Key(key)
            }
            Some(ch) if ch.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(ch) = self.current_char().filter(char::is_ascii_digit) {
                    digits.push(ch);
                    self.advance();
                }
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| PathError::parse("Index out of range", self.position, self.input))?;
                Segment::Index(index)
            }
            _ => return Err(self.syntax_error("Invalid bracket selector", vec!["index", "quoted key"])),
        };

        self.expect_char(']')?;
        Ok(segment)
    }

    fn current_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn expect_char(&mut self, expected: char) -> Result<(), PathError> {
        match self.current_char() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            _ => Err(self.syntax_error(
                &format!("Expected '{}'", expected),
                vec![expected.to_string().as_str()],
            )),
        }
    }

    fn syntax_error(&mut self, message: &str, expected: Vec<&str>) -> PathError {
        let found = self
            .current_char()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "EOF".to_string());
        PathError::syntax(
            message,
            self.position,
            self.input,
            expected.into_iter().map(String::from).collect(),
            found,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<PathExpression, PathError> {
        Parser::new(input)?.parse()
    }

    fn keys(names: &[&str]) -> Vec<Segment> {
        names.iter().map(|n| Segment::Key(n.to_string())).collect()
    }

    #[test]
    fn test_parse_whole_value() {
        for input in ["$", "$."] {
            let expr = parse(input).unwrap();
            assert_eq!(expr.scope, Scope::Value);
            assert!(expr.segments.is_empty());
            assert!(!expr.is_collection);
        }
    }

    #[test]
    fn test_parse_dotted_path() {
        let expr = parse("$a.b.c").unwrap();
        assert_eq!(expr.segments, keys(&["a", "b", "c"]));
        assert_eq!(parse("$.a.b").unwrap().segments, keys(&["a", "b"]));
    }

    #[test]
    fn test_parse_brackets() {
        let expr = parse("$a.b[0]['c d'][\"e\"]").unwrap();
        assert_eq!(
            expr.segments,
            vec![
                Segment::Key("a".into()),
                Segment::Key("b".into()),
                Segment::Index(0),
                Segment::Key("c d".into()),
                Segment::Key("e".into()),
            ]
        );
    }

    #[test]
    fn test_parse_collection_suffix() {
        let expr = parse("$a.b[]").unwrap();
        assert!(expr.is_collection);
        assert_eq!(expr.segments, keys(&["a", "b"]));

        let all = parse("$[]").unwrap();
        assert!(all.is_collection);
        assert!(all.segments.is_empty());
    }

    #[test]
    fn test_parse_accumulator_scope() {
        let expr = parse("$..locals.user[1]").unwrap();
        assert_eq!(expr.scope, Scope::Accumulator);
        assert_eq!(
            expr.segments,
            vec![Segment::Key("locals".into()), Segment::Key("user".into()), Segment::Index(1)]
        );

        let whole = parse("$..").unwrap();
        assert_eq!(whole.scope, Scope::Accumulator);
        assert!(whole.segments.is_empty());
    }

    #[test]
    fn test_parse_errors_carry_position() {
        let err = parse("$a..b").unwrap_err();
        assert_eq!(err.position(), 3);

        assert!(matches!(parse("$a."), Err(PathError::Syntax { .. })));
        assert!(matches!(parse("$a[x]"), Err(PathError::Syntax { .. })));
        assert!(matches!(parse("$a['x"), Err(PathError::Parse { .. })));
        assert!(matches!(parse("a.b"), Err(PathError::Syntax { .. })));
        assert!(parse("").is_err());
    }
}
