//! The filter model (C1): a typed representation of `where`/`include`/
//! `limit`/`skip`/`order`/`distinct`, built once by the parser and consumed
//! by everything downstream.

use gateway_ql::OrderDirection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators a `where` leaf can use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Nlike,
    Ilike,
    Nilike,
    In,
    Nin,
    Between,
    Regexp,
    Text,
}

impl Operator {
    /// Parse the operator keyword used in the filter grammar.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "like" => Self::Like,
            "nlike" => Self::Nlike,
            "ilike" => Self::Ilike,
            "nilike" => Self::Nilike,
            "in" => Self::In,
            "nin" => Self::Nin,
            "between" => Self::Between,
            "regexp" => Self::Regexp,
            "text" => Self::Text,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Nlike => "nlike",
            Self::Ilike => "ilike",
            Self::Nilike => "nilike",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Between => "between",
            Self::Regexp => "regexp",
            Self::Text => "text",
        }
    }

    /// Whether this operator requires an array literal operand.
    pub fn requires_array(&self) -> bool {
        matches!(self, Self::In | Self::Nin | Self::Between)
    }

    /// Whether this operator requires a string literal operand.
    pub fn requires_string(&self) -> bool {
        matches!(
            self,
            Self::Like | Self::Nlike | Self::Ilike | Self::Nilike | Self::Regexp | Self::Text
        )
    }
}

/// A boolean expression tree over `where` leaves, built by the parser (C2)
/// and total over by everything that walks it afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Cmp {
        field: String,
        op: Operator,
        value: Value,
    },
}

/// A single `order` term.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderTerm {
    pub field: String,
    pub direction: OrderDirection,
}

/// A relation expansion named in `include`, with an optional recursive
/// scoped filter over the related rows.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct IncludeExpr {
    pub relation: String,
    pub scope: Option<Box<Filter>>,
}

/// The full filter: five optional parts, all backend-agnostic.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Filter {
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<IncludeExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<OrderTerm>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distinct: Vec<String>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.where_.is_none()
            && self.include.is_empty()
            && self.limit.is_none()
            && self.skip.is_none()
            && self.order.is_empty()
            && self.distinct.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse_roundtrip() {
        for s in [
            "eq", "neq", "gt", "gte", "lt", "lte", "like", "nlike", "ilike", "nilike", "in",
            "nin", "between", "regexp", "text",
        ] {
            let op = Operator::parse(s).unwrap();
            assert_eq!(op.as_str(), s);
        }
        assert!(Operator::parse("bogus").is_none());
    }

    #[test]
    fn test_operator_requires_array() {
        assert!(Operator::In.requires_array());
        assert!(Operator::Between.requires_array());
        assert!(!Operator::Eq.requires_array());
    }

    #[test]
    fn test_empty_filter() {
        assert!(Filter::default().is_empty());
    }
}
