//! LDAP search filter expression tree
//!
//! A [`Filter`] is an immutable algebraic expression: comparison leaves
//! (equality, inequality, ordering, extensible match) combined with
//! and/or/not. Filters are built through the factory functions and
//! combinators only; the node representation is private, which keeps the
//! operator set closed at compile time.
//!
//! Trees are never mutated after construction and share no state, so they
//! can be cloned, compared and evaluated freely from any thread.

use crate::parser;
use ldap_core::{WireError, WireResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a leaf node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Ge,
    Le,
    Ex,
}

impl CompareOp {
    /// The RFC 4515 operator token
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Ex => ":=",
        }
    }

    /// Symbolic operator name, used in diagnostics
    pub(crate) fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Ge => "ge",
            CompareOp::Le => "le",
            CompareOp::Ex => "ex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Node {
    Compare {
        op: CompareOp,
        attribute: String,
        value: String,
    },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

/// An LDAP search filter
///
/// # Usage Example
/// ```rust
/// use ldap_filter::Filter;
///
/// let f = Filter::eq("cn", "John Smith") & Filter::present("mail");
/// assert_eq!(f.to_string(), "(&(cn=John Smith)(mail=*))");
/// ```
///
/// Equality is structural: two filters compare equal when their operators
/// and children match recursively, regardless of how they were built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub(crate) node: Node,
}

impl Filter {
    fn compare(op: CompareOp, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter {
            node: Node::Compare {
                op,
                attribute: attribute.into(),
                value: value.into(),
            },
        }
    }

    /// Equality match: `(attribute=value)`
    ///
    /// A value of `"*"` means presence; a value containing `*` is a
    /// substring match. The wildcard interpretation happens at BER
    /// emission and match time, not here.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(CompareOp::Eq, attribute, value)
    }

    /// Inequality: `(attribute!=value)`, emitted over BER as not(eq)
    pub fn ne(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(CompareOp::Ne, attribute, value)
    }

    /// Greater-or-equal ordering match: `(attribute>=value)`
    pub fn ge(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(CompareOp::Ge, attribute, value)
    }

    /// Less-or-equal ordering match: `(attribute<=value)`
    pub fn le(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(CompareOp::Le, attribute, value)
    }

    /// Extensible match: `(attribute:=value)`
    ///
    /// The attribute part may carry a DN flag and a matching rule:
    /// `attr`, `attr:dn`, `attr:rule`, `attr:dn:rule` (the rule may be a
    /// name or a dotted OID).
    pub fn ex(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(CompareOp::Ex, attribute, value)
    }

    /// Presence test: `(attribute=*)`
    pub fn present(attribute: impl Into<String>) -> Self {
        Self::eq(attribute, "*")
    }

    /// Conjunction of two filters
    pub fn and(left: Filter, right: Filter) -> Self {
        Filter {
            node: Node::And(Box::new(left), Box::new(right)),
        }
    }

    /// Disjunction of two filters
    pub fn or(left: Filter, right: Filter) -> Self {
        Filter {
            node: Node::Or(Box::new(left), Box::new(right)),
        }
    }

    /// Negation of a filter
    pub fn not(child: Filter) -> Self {
        Filter {
            node: Node::Not(Box::new(child)),
        }
    }

    /// Combine with another filter under AND, producing a new node
    pub fn and_with(self, other: Filter) -> Self {
        Filter::and(self, other)
    }

    /// Combine with another filter under OR, producing a new node
    pub fn or_with(self, other: Filter) -> Self {
        Filter::or(self, other)
    }

    /// Negate this filter, producing a new node
    pub fn negate(self) -> Self {
        Filter::not(self)
    }

    /// Parse an RFC 2254/4515 filter string
    ///
    /// # Error Handling
    /// Malformed syntax (unbalanced parens, missing operator, bad escape)
    /// is reported as `FilterParse` with the failing byte position; an
    /// unrecognized comparison operator as `InvalidFilterOperator`.
    pub fn parse(input: &str) -> WireResult<Filter> {
        parser::parse_text(input)
    }

    /// Render this filter in the RFC 2254/4515 text grammar
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Evaluate this filter against an attribute lookup
    ///
    /// Only equality nodes are supported: presence (`value == "*"`) is
    /// true iff the attribute has at least one value, and equality is true
    /// iff the multi-valued attribute contains the exact target value.
    /// Every other operator — including and/or/not — returns
    /// `UnsupportedMatchOperator`. This is a deliberate, known limitation:
    /// downstream callers depend on the error being raised for composite
    /// filters rather than a recursive evaluation being invented here.
    pub fn matches<'a>(
        &self,
        lookup: impl Fn(&str) -> Option<&'a [String]>,
    ) -> WireResult<bool> {
        match &self.node {
            Node::Compare {
                op: CompareOp::Eq,
                attribute,
                value,
            } => {
                let values = lookup(attribute);
                if value == "*" {
                    Ok(values.is_some_and(|v| !v.is_empty()))
                } else {
                    Ok(values.is_some_and(|v| v.iter().any(|candidate| candidate == value)))
                }
            }
            Node::Compare { op, .. } => Err(WireError::UnsupportedMatchOperator(op.name())),
            Node::And(..) => Err(WireError::UnsupportedMatchOperator("and")),
            Node::Or(..) => Err(WireError::UnsupportedMatchOperator("or")),
            Node::Not(..) => Err(WireError::UnsupportedMatchOperator("not")),
        }
    }

    /// Walk the tree, letting the visitor supply the evaluation semantics
    ///
    /// Each leaf invokes the visitor method matching its operation
    /// (`equality_match`, `substrings`, `present`, `greater_or_equal`,
    /// `less_or_equal`); composites visit their children first and pass
    /// the child outputs to `and`/`or`/`not`. The ne and ex operators have
    /// no visitor method (mirroring the evaluator gap) and return
    /// `UnsupportedMatchOperator`.
    pub fn visit<V: FilterVisitor>(&self, visitor: &mut V) -> WireResult<V::Output> {
        match &self.node {
            Node::Compare {
                op: CompareOp::Eq,
                attribute,
                value,
            } => {
                if value == "*" {
                    Ok(visitor.present(attribute))
                } else if value.contains('*') {
                    Ok(visitor.substrings(attribute, value))
                } else {
                    Ok(visitor.equality_match(attribute, value))
                }
            }
            Node::Compare {
                op: CompareOp::Ge,
                attribute,
                value,
            } => Ok(visitor.greater_or_equal(attribute, value)),
            Node::Compare {
                op: CompareOp::Le,
                attribute,
                value,
            } => Ok(visitor.less_or_equal(attribute, value)),
            Node::Compare { op, .. } => Err(WireError::UnsupportedMatchOperator(op.name())),
            Node::And(left, right) => {
                let left = left.visit(visitor)?;
                let right = right.visit(visitor)?;
                Ok(visitor.and(left, right))
            }
            Node::Or(left, right) => {
                let left = left.visit(visitor)?;
                let right = right.visit(visitor)?;
                Ok(visitor.or(left, right))
            }
            Node::Not(child) => {
                let child = child.visit(visitor)?;
                Ok(visitor.not(child))
            }
        }
    }
}

/// Evaluation contract for [`Filter::visit`]
///
/// Implementors provide their own semantics for each filter operation; the
/// walk threads child outputs up into the composite methods. A directory
/// server can build an index scan plan with one visitor and a boolean
/// evaluator with another, without the filter type knowing either.
pub trait FilterVisitor {
    type Output;

    fn equality_match(&mut self, attribute: &str, value: &str) -> Self::Output;
    fn substrings(&mut self, attribute: &str, value: &str) -> Self::Output;
    fn present(&mut self, attribute: &str) -> Self::Output;
    fn greater_or_equal(&mut self, attribute: &str, value: &str) -> Self::Output;
    fn less_or_equal(&mut self, attribute: &str, value: &str) -> Self::Output;
    fn and(&mut self, left: Self::Output, right: Self::Output) -> Self::Output;
    fn or(&mut self, left: Self::Output, right: Self::Output) -> Self::Output;
    fn not(&mut self, child: Self::Output) -> Self::Output;
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Node::Compare {
                op,
                attribute,
                value,
            } => write!(f, "({}{}{})", attribute, op.symbol(), value),
            Node::And(left, right) => write!(f, "(&{}{})", left, right),
            Node::Or(left, right) => write!(f, "(|{}{})", left, right),
            Node::Not(child) => write!(f, "(!{})", child),
        }
    }
}

impl std::ops::BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        Filter::and(self, rhs)
    }
}

impl std::ops::BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Filter) -> Filter {
        Filter::or(self, rhs)
    }
}

impl std::ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        Filter::not(self)
    }
}
