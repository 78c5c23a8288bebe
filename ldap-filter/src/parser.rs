//! RFC 2254/4515 filter grammar parser
//!
//! Recursive descent over a scanning cursor:
//!
//! ```text
//! expr       := '(' ( conjunction | disjunction | negation | comparison ) ')'
//! conjunction:= '&' expr+
//! disjunction:= '|' expr+
//! negation   := '!' expr
//! comparison := attribute op value
//! op         := '<=' | '>=' | '!=' | ':=' | '=' | '<' | '>'
//! attribute  := [-\w:.]+
//! value      := (printable-char | '\' hex hex)+
//! ```
//!
//! Whitespace is permissively skipped between tokens; values are stored
//! verbatim (escapes and `*` wildcards intact — their interpretation
//! belongs to the BER bridge and the evaluator) after trimming
//! leading/trailing whitespace.

use crate::filter::Filter;
use ldap_core::{WireError, WireResult};
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

fn attribute_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Must end on a word character so that the ':' of a ':=' operator is
    // not swallowed into the attribute token.
    RE.get_or_init(|| Regex::new(r"^[-\w:.]*\w").expect("attribute pattern is valid"))
}

fn value_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Any run of non-paren, non-backslash bytes, or a hex-pair escape.
    RE.get_or_init(|| {
        Regex::new(r"^(?:[^()\\]|\\[0-9A-Fa-f]{2})+").expect("value pattern is valid")
    })
}

/// Parse a complete filter string
pub(crate) fn parse_text(input: &str) -> WireResult<Filter> {
    let mut scanner = Scanner::new(input);
    scanner.skip_whitespace();
    let filter = scanner.parse_expr()?;
    scanner.skip_whitespace();
    if scanner.has_remaining() {
        debug!("filter parse failed: trailing input at byte {}", scanner.position);
        return Err(WireError::parse_at(
            scanner.position,
            "trailing characters after filter",
        ));
    }
    Ok(filter)
}

struct Scanner<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn has_remaining(&self) -> bool {
        self.position < self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.position = self.input.len() - trimmed.len();
    }

    fn expect(&mut self, expected: char) -> WireResult<()> {
        if self.peek() == Some(expected) {
            self.position += expected.len_utf8();
            Ok(())
        } else {
            Err(WireError::parse_at(
                self.position,
                format!("expected {:?}", expected),
            ))
        }
    }

    /// `expr := '(' body ')'`
    fn parse_expr(&mut self) -> WireResult<Filter> {
        self.expect('(')?;
        self.skip_whitespace();

        let filter = match self.peek() {
            Some('&') => {
                self.position += 1;
                self.parse_branches(Filter::and)?
            }
            Some('|') => {
                self.position += 1;
                self.parse_branches(Filter::or)?
            }
            Some('!') => {
                self.position += 1;
                self.skip_whitespace();
                Filter::not(self.parse_expr()?)
            }
            _ => self.parse_comparison()?,
        };

        self.skip_whitespace();
        self.expect(')')?;
        Ok(filter)
    }

    /// One or more parenthesized branches, folded left-to-right
    fn parse_branches(&mut self, combine: fn(Filter, Filter) -> Filter) -> WireResult<Filter> {
        self.skip_whitespace();
        let mut result = self.parse_expr()?;
        loop {
            self.skip_whitespace();
            if self.peek() == Some('(') {
                let next = self.parse_expr()?;
                result = combine(result, next);
            } else {
                return Ok(result);
            }
        }
    }

    /// `comparison := attribute op value`
    fn parse_comparison(&mut self) -> WireResult<Filter> {
        let attribute = self.scan_attribute()?;
        self.skip_whitespace();
        let op = self.scan_operator()?;
        let value = self.scan_value()?;

        Ok(match op {
            "=" => Filter::eq(attribute, value),
            "!=" => Filter::ne(attribute, value),
            ">=" | ">" => Filter::ge(attribute, value),
            "<=" | "<" => Filter::le(attribute, value),
            ":=" => Filter::ex(attribute, value),
            _ => unreachable!(), // scan_operator only yields the tokens above
        })
    }

    fn scan_attribute(&mut self) -> WireResult<&'a str> {
        match attribute_pattern().find(self.rest()) {
            Some(found) => {
                let token = found.as_str();
                self.position += token.len();
                Ok(token)
            }
            None => Err(WireError::parse_at(self.position, "expected attribute name")),
        }
    }

    fn scan_operator(&mut self) -> WireResult<&'static str> {
        for token in ["<=", ">=", "!=", ":="] {
            if self.rest().starts_with(token) {
                self.position += 2;
                return Ok(token);
            }
        }
        match self.peek() {
            Some('=') => {
                self.position += 1;
                Ok("=")
            }
            // Lenient aliases: bare '<' and '>' read as the ordering ops
            Some('<') => {
                self.position += 1;
                Ok("<")
            }
            Some('>') => {
                self.position += 1;
                Ok(">")
            }
            // A two-character token ending in '=' that is not in the fixed
            // operator set, e.g. "~=" approximate match
            Some(other) if self.rest()[other.len_utf8()..].starts_with('=') => {
                Err(WireError::InvalidFilterOperator(format!("{other}=")))
            }
            _ => Err(WireError::parse_at(self.position, "expected comparison operator")),
        }
    }

    fn scan_value(&mut self) -> WireResult<String> {
        match value_pattern().find(self.rest()) {
            Some(found) => {
                let token = found.as_str();
                self.position += token.len();
                let trimmed = token.trim();
                if trimmed.is_empty() {
                    return Err(WireError::parse_at(self.position, "empty comparison value"));
                }
                Ok(trimmed.to_string())
            }
            None => {
                // Distinguish a bad escape from a plain missing value
                if self.peek() == Some('\\') {
                    Err(WireError::parse_at(
                        self.position,
                        "invalid escape sequence: expected backslash and two hex digits",
                    ))
                } else {
                    Err(WireError::parse_at(self.position, "expected comparison value"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_equality() {
        assert_eq!(Filter::parse("(foo=bar)").unwrap(), Filter::eq("foo", "bar"));
    }

    #[test]
    fn test_parse_all_operators() {
        assert_eq!(Filter::parse("(a!=b)").unwrap(), Filter::ne("a", "b"));
        assert_eq!(Filter::parse("(a>=b)").unwrap(), Filter::ge("a", "b"));
        assert_eq!(Filter::parse("(a<=b)").unwrap(), Filter::le("a", "b"));
        assert_eq!(Filter::parse("(a:=b)").unwrap(), Filter::ex("a", "b"));
        // Bare < and > are lenient aliases
        assert_eq!(Filter::parse("(a<b)").unwrap(), Filter::le("a", "b"));
        assert_eq!(Filter::parse("(a>b)").unwrap(), Filter::ge("a", "b"));
    }

    #[test]
    fn test_parse_conjunction_and_disjunction() {
        assert_eq!(
            Filter::parse("(&(cn=a)(sn=b))").unwrap(),
            Filter::and(Filter::eq("cn", "a"), Filter::eq("sn", "b"))
        );
        assert_eq!(
            Filter::parse("(|(cn=a)(sn=b))").unwrap(),
            Filter::or(Filter::eq("cn", "a"), Filter::eq("sn", "b"))
        );
    }

    #[test]
    fn test_parse_three_way_chain_folds_left() {
        assert_eq!(
            Filter::parse("(&(a=1)(b=2)(c=3))").unwrap(),
            Filter::and(
                Filter::and(Filter::eq("a", "1"), Filter::eq("b", "2")),
                Filter::eq("c", "3")
            )
        );
    }

    #[test]
    fn test_parse_negation() {
        assert_eq!(
            Filter::parse("(!(cn=a))").unwrap(),
            Filter::not(Filter::eq("cn", "a"))
        );
    }

    #[test]
    fn test_parse_nested_composite() {
        assert_eq!(
            Filter::parse("(&(objectClass=person)(|(cn=a*)(!(sn=b))))").unwrap(),
            Filter::and(
                Filter::eq("objectClass", "person"),
                Filter::or(
                    Filter::eq("cn", "a*"),
                    Filter::not(Filter::eq("sn", "b"))
                )
            )
        );
    }

    #[test]
    fn test_parse_whitespace_tolerance() {
        assert_eq!(
            Filter::parse("( & (cn=a) ( sn = b ) )").unwrap(),
            Filter::and(Filter::eq("cn", "a"), Filter::eq("sn", "b"))
        );
    }

    #[test]
    fn test_value_keeps_wildcards_and_escapes_verbatim() {
        assert_eq!(Filter::parse("(cn=a*b*)").unwrap(), Filter::eq("cn", "a*b*"));
        assert_eq!(
            Filter::parse(r"(cn=a\2Ab)").unwrap(),
            Filter::eq("cn", r"a\2Ab")
        );
    }

    #[test]
    fn test_parse_extensible_forms() {
        assert_eq!(
            Filter::parse("(o:dn:=Ace Industry)").unwrap(),
            Filter::ex("o:dn", "Ace Industry")
        );
        assert_eq!(
            Filter::parse("(cn:dn:1.2.3.4.5:=John Smith)").unwrap(),
            Filter::ex("cn:dn:1.2.3.4.5", "John Smith")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Filter::parse("(cn=a"),
            Err(WireError::FilterParse { .. })
        ));
        assert!(matches!(
            Filter::parse("cn=a)"),
            Err(WireError::FilterParse { .. })
        ));
        assert!(matches!(
            Filter::parse("(cn)"),
            Err(WireError::FilterParse { .. })
        ));
        assert!(matches!(
            Filter::parse("(cn=a))"),
            Err(WireError::FilterParse { .. })
        ));
        assert!(matches!(
            Filter::parse(r"(cn=a\2)"),
            Err(WireError::FilterParse { .. })
        ));
        assert!(matches!(
            Filter::parse("(cn~=a)"),
            Err(WireError::InvalidFilterOperator(_))
        ));
    }

    #[test]
    fn test_round_trip_render_then_parse() {
        let filters = [
            Filter::eq("foo", "bar"),
            Filter::present("cn"),
            Filter::ex("foo", "bar"),
            Filter::and(Filter::eq("a", "1"), Filter::eq("b", "2")),
            Filter::and(
                Filter::and(Filter::eq("a", "1"), Filter::eq("b", "2")),
                Filter::eq("c", "3"),
            ),
            Filter::not(Filter::or(Filter::ge("n", "5"), Filter::le("n", "1"))),
        ];
        for filter in filters {
            assert_eq!(Filter::parse(&filter.to_text()).unwrap(), filter);
        }
    }
}
