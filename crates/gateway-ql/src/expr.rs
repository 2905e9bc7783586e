//! Condition rendering: the operator table from the query builder's
//! rendering rules (`eq`, `neq`, `gt/gte/lt/lte`, `in`, `nin`, `between`,
//! `like/ilike`, `nlike/nilike`, `regexp`, `text`).

use crate::builder::QlFragment;
use crate::error::{QlError, Result};
use crate::identifier::{quote_literal, render_ident, render_number};
use serde_json::Value;

/// Render a literal JSON value as a catalogue query-language literal.
fn render_literal(value: &Value) -> Result<String> {
    Ok(match value {
        Value::String(s) => quote_literal(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => render_number(n.as_f64().unwrap_or_default()),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "NULL".to_string(),
        other => quote_literal(&other.to_string()),
    })
}

/// A single comparison, built against an already-resolved column reference
/// (e.g. `o.name` or `o1.title`).
pub struct Condition {
    column: String,
}

impl Condition {
    pub fn column(qualified_column: impl Into<String>) -> Result<Self> {
        Ok(Self {
            column: qualified_column.into(),
        })
    }

    fn cmp(&self, op: &str, value: &Value) -> Result<QlFragment> {
        let mut frag = QlFragment::raw(format!("{} {} ", self.column, op));
        frag.push(&render_literal(value)?);
        Ok(frag)
    }

    pub fn eq(&self, value: &Value) -> Result<QlFragment> {
        self.cmp("=", value)
    }

    pub fn neq(&self, value: &Value) -> Result<QlFragment> {
        self.cmp("!=", value)
    }

    pub fn gt(&self, value: &Value) -> Result<QlFragment> {
        self.cmp(">", value)
    }

    pub fn gte(&self, value: &Value) -> Result<QlFragment> {
        self.cmp(">=", value)
    }

    pub fn lt(&self, value: &Value) -> Result<QlFragment> {
        self.cmp("<", value)
    }

    pub fn lte(&self, value: &Value) -> Result<QlFragment> {
        self.cmp("<=", value)
    }

    /// `like`: honours SQL-style `%` wildcards as supplied by the caller.
    pub fn like(&self, value: &Value) -> Result<QlFragment> {
        let s = as_str(value, "like")?;
        Ok(QlFragment::raw(format!(
            "{} LIKE {}",
            self.column,
            quote_literal(s)
        )))
    }

    pub fn nlike(&self, value: &Value) -> Result<QlFragment> {
        let s = as_str(value, "nlike")?;
        Ok(QlFragment::raw(format!(
            "{} NOT LIKE {}",
            self.column,
            quote_literal(s)
        )))
    }

    /// `ilike`: lowercases both sides, matching the specified case-insensitive
    /// comparison semantics since the catalogue query language has no ILIKE.
    pub fn ilike(&self, value: &Value) -> Result<QlFragment> {
        let s = as_str(value, "ilike")?;
        Ok(QlFragment::raw(format!(
            "LOWER({}) LIKE LOWER({})",
            self.column,
            quote_literal(s)
        )))
    }

    pub fn nilike(&self, value: &Value) -> Result<QlFragment> {
        let s = as_str(value, "nilike")?;
        Ok(QlFragment::raw(format!(
            "LOWER({}) NOT LIKE LOWER({})",
            self.column,
            quote_literal(s)
        )))
    }

    pub fn in_list(&self, values: &Value) -> Result<QlFragment> {
        let items = as_array(values, "in")?;
        let rendered: Result<Vec<String>> = items.iter().map(render_literal).collect();
        Ok(QlFragment::raw(format!(
            "{} IN ({})",
            self.column,
            rendered?.join(", ")
        )))
    }

    pub fn nin_list(&self, values: &Value) -> Result<QlFragment> {
        let items = as_array(values, "nin")?;
        let rendered: Result<Vec<String>> = items.iter().map(render_literal).collect();
        Ok(QlFragment::raw(format!(
            "{} NOT IN ({})",
            self.column,
            rendered?.join(", ")
        )))
    }

    pub fn between(&self, values: &Value) -> Result<QlFragment> {
        let items = as_array(values, "between")?;
        if items.len() != 2 {
            return Err(QlError::BetweenArity(items.len()));
        }
        let lo = render_literal(&items[0])?;
        let hi = render_literal(&items[1])?;
        Ok(QlFragment::raw(format!(
            "{} BETWEEN {} AND {}",
            self.column, lo, hi
        )))
    }

    pub fn regexp(&self, value: &Value) -> Result<QlFragment> {
        let s = as_str(value, "regexp")?;
        Ok(QlFragment::raw(format!(
            "{} REGEXP {}",
            self.column,
            quote_literal(s)
        )))
    }

    /// `text`: applied across the entity's declared text-searchable fields,
    /// OR'd together. `fields` are already-resolved, qualified columns.
    pub fn text_across(fields: &[String], value: &Value) -> Result<QlFragment> {
        let s = as_str(value, "text")?;
        let pattern = quote_literal(&format!("%{}%", s));
        let clauses: Vec<String> = fields
            .iter()
            .map(|f| format!("{} LIKE {}", f, pattern))
            .collect();
        Ok(QlFragment::raw(clauses.join(" OR ")).parens())
    }
}

fn as_str<'a>(value: &'a Value, op: &'static str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or(QlError::StringLiteralRequired { op })
}

fn as_array<'a>(value: &'a Value, op: &'static str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or(QlError::ArrayLiteralRequired { op })
}

/// Render a qualified column reference (`alias.attribute`), validating both
/// segments are safe bare identifiers.
pub fn qualified_column(alias: &str, attribute: &str) -> Result<String> {
    Ok(format!(
        "{}.{}",
        render_ident(alias)?,
        render_ident(attribute)?
    ))
}

/// An `ORDER BY` term: a qualified column plus direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

pub struct OrderExpr {
    column: String,
    direction: OrderDirection,
}

impl OrderExpr {
    pub fn new(column: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn render(&self) -> String {
        match self.direction {
            OrderDirection::Asc => format!("{} ASC", self.column),
            OrderDirection::Desc => format!("{} DESC", self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq() {
        let c = Condition::column("o.name").unwrap();
        assert_eq!(c.eq(&json!("dog")).unwrap().as_str(), "o.name = 'dog'");
    }

    #[test]
    fn test_in_list() {
        let c = Condition::column("o.id").unwrap();
        assert_eq!(
            c.in_list(&json!([1, 2, 3])).unwrap().as_str(),
            "o.id IN (1, 2, 3)"
        );
    }

    #[test]
    fn test_between_arity_error() {
        let c = Condition::column("o.size").unwrap();
        assert!(c.between(&json!([5])).is_err());
    }

    #[test]
    fn test_between_ok() {
        let c = Condition::column("o.size").unwrap();
        assert_eq!(
            c.between(&json!([1, 10])).unwrap().as_str(),
            "o.size BETWEEN 1 AND 10"
        );
    }

    #[test]
    fn test_like() {
        let c = Condition::column("o.title").unwrap();
        assert_eq!(
            c.like(&json!("dog%")).unwrap().as_str(),
            "o.title LIKE 'dog%'"
        );
    }

    #[test]
    fn test_ilike_lowercases_both_sides() {
        let c = Condition::column("o.title").unwrap();
        assert_eq!(
            c.ilike(&json!("DOG%")).unwrap().as_str(),
            "LOWER(o.title) LIKE LOWER('DOG%')"
        );
    }

    #[test]
    fn test_text_across_fields() {
        let fields = vec!["o.name".to_string(), "o.description".to_string()];
        let frag = Condition::text_across(&fields, &json!("dog")).unwrap();
        assert_eq!(
            frag.as_str(),
            "(o.name LIKE '%dog%' OR o.description LIKE '%dog%')"
        );
    }

    #[test]
    fn test_order_expr() {
        let o = OrderExpr::new("o.name", OrderDirection::Desc);
        assert_eq!(o.render(), "o.name DESC");
    }

    #[test]
    fn test_qualified_column_rejects_bad_identifier() {
        assert!(qualified_column("o", "bad name").is_err());
    }
}
