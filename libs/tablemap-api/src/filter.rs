use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Comparison operator of a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl Operator {
    /// Look up an operator token: a symbol (`=`, `!=`, `<>`, `<`, `>`, `>=`,
    /// `=>`, `<=`, `=<`) or a store keyword (`eq`, `ne`, `lt`, `gt`, `ge`,
    /// `le`, any case).
    pub fn lookup(token: &str) -> Option<Self> {
        let op = match token {
            "=" => Operator::Equal,
            "!=" | "<>" => Operator::NotEqual,
            "<" => Operator::LessThan,
            ">" => Operator::GreaterThan,
            ">=" | "=>" => Operator::GreaterThanOrEqual,
            "<=" | "=<" => Operator::LessThanOrEqual,
            word => match word.to_ascii_lowercase().as_str() {
                "eq" => Operator::Equal,
                "ne" => Operator::NotEqual,
                "lt" => Operator::LessThan,
                "gt" => Operator::GreaterThan,
                "ge" => Operator::GreaterThanOrEqual,
                "le" => Operator::LessThanOrEqual,
                _ => return None,
            },
        };
        Some(op)
    }

    /// Keyword in the store's filter syntax.
    pub fn keyword(self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::NotEqual => "ne",
            Operator::LessThan => "lt",
            Operator::GreaterThan => "gt",
            Operator::GreaterThanOrEqual => "ge",
            Operator::LessThanOrEqual => "le",
        }
    }

    /// Whether `stored.cmp(literal)` satisfies the operator.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::NotEqual => ordering != Ordering::Equal,
            Operator::LessThan => ordering == Ordering::Less,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::GreaterThanOrEqual => ordering != Ordering::Less,
            Operator::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

impl FromStr for Operator {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, MapError> {
        Operator::lookup(s).ok_or_else(|| MapError::InvalidOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// `property operator value`. Values are kept as literal text; the store
/// interprets them against the stored cell kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub property: String,
    pub operator: Operator,
    pub value: String,
}

impl FilterPredicate {
    pub fn new(property: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.property, self.operator, self.value)
    }
}

fn is_symbolic(token: &str) -> bool {
    token.chars().all(|c| matches!(c, '<' | '>' | '=' | '!'))
}

/// Parse a filter string.
///
/// Accepted shapes:
/// - `property operator value`: three whitespace-separated tokens
/// - `property=value`: fewer than three tokens and exactly one `=`
///
/// Anything else yields `Ok(None)`: the text is not a filter. A three-token
/// filter whose middle token is made of operator symbols but is not a known
/// operator fails with `InvalidOperator`; a middle word that is not an
/// operator keyword (`not a filter`) is just not a filter.
///
/// The `=` split is literal: `Age>=30` is an equality on the property `Age>`.
/// Comparisons need the spaced three-token form.
pub fn parse(text: &str) -> Result<Option<FilterPredicate>, MapError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    if let [property, op, value] = tokens.as_slice() {
        return match Operator::lookup(op) {
            Some(operator) => Ok(Some(FilterPredicate::new(*property, operator, *value))),
            None if is_symbolic(op) => Err(MapError::InvalidOperator(op.to_string())),
            None => Ok(None),
        };
    }

    if tokens.len() < 3 {
        let mut parts = text.split('=');
        if let (Some(property), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
            let (property, value) = (property.trim(), value.trim());
            if !property.is_empty() && !value.is_empty() {
                return Ok(Some(FilterPredicate::new(property, Operator::Equal, value)));
            }
        }
    }

    Ok(None)
}
