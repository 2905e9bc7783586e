//! Filter rewrite: translate a Search-schema [`Filter`] into the equivalent
//! catalogue-schema [`Filter`] using a [`ProjectionMapping`] — field paths
//! resolve to catalogue relation chains, `include` relations expand into
//! (possibly nested) catalogue `IncludeExpr` chains, and date-shaped string
//! literals are normalized to the catalogue's ISO-8601 form.
//!
//! Reuses the same [`Filter`]/[`Expr`]/[`IncludeExpr`] types C2 builds for
//! the catalogue grammar, since the Search and catalogue filter grammars are
//! structurally identical and only field-path resolution differs between
//! them.

use crate::mapping::{EntityMapping, FieldMapping, ProjectionMapping};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gateway_core::error::{Error, Result};
use gateway_core::filter::{Expr, Filter, IncludeExpr};
use serde_json::Value;

/// Rewrite a whole Search-level filter against `entity` into its catalogue
/// equivalent.
pub fn rewrite_filter(
    mapping: &ProjectionMapping,
    entity: &EntityMapping,
    filter: &Filter,
) -> Result<Filter> {
    let where_ = filter
        .where_
        .as_ref()
        .map(|expr| rewrite_expr(mapping, entity, expr, "where"))
        .transpose()?;

    let include = filter
        .include
        .iter()
        .map(|inc| rewrite_include(mapping, entity, inc))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    let order = filter
        .order
        .iter()
        .map(|term| {
            let path = rewrite_field_path(mapping, entity, &term.field, "order")?;
            Ok(gateway_core::filter::OrderTerm {
                field: path.join("."),
                direction: term.direction,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let distinct = filter
        .distinct
        .iter()
        .map(|f| rewrite_field_path(mapping, entity, f, "distinct").map(|p| p.join(".")))
        .collect::<Result<Vec<_>>>()?;

    Ok(Filter {
        where_,
        include,
        limit: filter.limit,
        skip: filter.skip,
        order,
        distinct,
    })
}

fn rewrite_expr(
    mapping: &ProjectionMapping,
    entity: &EntityMapping,
    expr: &Expr,
    path: &str,
) -> Result<Expr> {
    Ok(match expr {
        Expr::And(children) => Expr::And(
            children
                .iter()
                .map(|c| rewrite_expr(mapping, entity, c, path))
                .collect::<Result<Vec<_>>>()?,
        ),
        Expr::Or(children) => Expr::Or(
            children
                .iter()
                .map(|c| rewrite_expr(mapping, entity, c, path))
                .collect::<Result<Vec<_>>>()?,
        ),
        Expr::Cmp { field, op, value } => {
            let catalogue_field = rewrite_field_path(mapping, entity, field, path)?;
            Expr::Cmp {
                field: catalogue_field.join("."),
                op: *op,
                value: normalize_literal(value),
            }
        }
    })
}

/// Resolve one dotted Search field path (e.g. `"instrument.name"`) into the
/// equivalent dotted catalogue path, crossing relation hops named in the
/// mapping's `relations` table as needed.
pub fn rewrite_field_path(
    mapping: &ProjectionMapping,
    entity: &EntityMapping,
    field: &str,
    path: &str,
) -> Result<Vec<String>> {
    let mut segments = field.splitn(2, '.');
    let head = segments.next().unwrap();
    let rest = segments.next();

    match rest {
        None => match entity.field(head) {
            Some(FieldMapping::Path(catalogue_path)) => Ok(catalogue_path.clone()),
            Some(FieldMapping::All) => Ok(vec![head.to_string()]),
            Some(FieldMapping::Const(_)) => Err(Error::bad_filter(
                path,
                format!("field \"{head}\" is a constant and cannot be filtered or ordered on"),
            )),
            None => Err(Error::bad_filter(path, format!("unknown field: {head}"))),
        },
        Some(rest) => {
            let relation = entity.relation(head).ok_or_else(|| {
                Error::bad_filter(path, format!("unknown relation: {head}"))
            })?;
            let target = mapping.entity(&relation.target)?;
            let mut catalogue_path = relation.catalogue_segments();
            let nested_path = format!("{path}.{head}");
            catalogue_path.extend(rewrite_field_path(mapping, target, rest, &nested_path)?);
            Ok(catalogue_path)
        }
    }
}

/// Expand one Search `include` entry into the catalogue `IncludeExpr` chain
/// that reaches it, possibly several entries deep when the mapping's
/// relation path spans more than one catalogue hop.
fn rewrite_include(
    mapping: &ProjectionMapping,
    entity: &EntityMapping,
    include: &IncludeExpr,
) -> Result<Vec<IncludeExpr>> {
    let relation = entity.relation(&include.relation).ok_or_else(|| {
        Error::bad_filter("include", format!("unknown relation: {}", include.relation))
    })?;
    let target = mapping.entity(&relation.target)?;

    let scope = include
        .scope
        .as_deref()
        .map(|scope| rewrite_filter(mapping, target, scope))
        .transpose()?
        .map(Box::new);

    Ok(build_chain(&relation.catalogue_segments(), scope))
}

/// Build a nested `IncludeExpr` chain over `segments`, attaching `scope` to
/// the final (innermost) hop only — intermediate hops carry an empty scope.
fn build_chain(segments: &[String], scope: Option<Box<Filter>>) -> Vec<IncludeExpr> {
    match segments.split_first() {
        None => Vec::new(),
        Some((head, [])) => vec![IncludeExpr {
            relation: head.clone(),
            scope,
        }],
        Some((head, rest)) => {
            let inner = build_chain(rest, scope);
            vec![IncludeExpr {
                relation: head.clone(),
                scope: Some(Box::new(Filter {
                    include: inner,
                    ..Filter::default()
                })),
            }]
        }
    }
}

/// Literal values pass through unchanged except date-shaped strings, which
/// are normalized to the catalogue's accepted ISO-8601 form. Recurses into
/// array literals for `in`/`nin`/`between`.
pub fn normalize_literal(value: &Value) -> Value {
    match value {
        Value::String(s) => normalize_date_string(s).map(Value::String).unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(normalize_literal).collect()),
        other => other.clone(),
    }
}

fn normalize_date_string(s: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc().to_rfc3339());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0).unwrap().and_utc().to_rfc3339());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ProjectionMapping;
    use gateway_core::filter::Operator;

    fn mapping() -> ProjectionMapping {
        ProjectionMapping::load_from_str(
            r#"{
                "dataset": {
                    "catalogueEntity": "Dataset",
                    "fields": { "pid": "pid", "title": "name" },
                    "relations": {
                        "instrument": {
                            "target": "instrument",
                            "path": "investigation.investigationInstruments.instrument"
                        }
                    }
                },
                "instrument": {
                    "catalogueEntity": "Instrument",
                    "fields": { "name": "fullName" }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_rewrite_simple_field() {
        let mapping = mapping();
        let dataset = mapping.entity("dataset").unwrap();
        let filter = Filter {
            where_: Some(Expr::Cmp {
                field: "title".into(),
                op: Operator::Eq,
                value: Value::String("x".into()),
            }),
            ..Filter::default()
        };
        let rewritten = rewrite_filter(&mapping, dataset, &filter).unwrap();
        match rewritten.where_.unwrap() {
            Expr::Cmp { field, .. } => assert_eq!(field, "name"),
            other => panic!("expected Cmp, got {other:?}"),
        }
    }

    #[test]
    fn test_rewrite_crosses_multi_hop_relation() {
        let mapping = mapping();
        let dataset = mapping.entity("dataset").unwrap();
        let path = rewrite_field_path(&mapping, dataset, "instrument.name", "where").unwrap();
        assert_eq!(
            path,
            vec!["investigation", "investigationInstruments", "instrument", "fullName"]
        );
    }

    #[test]
    fn test_rewrite_include_builds_nested_chain() {
        let mapping = mapping();
        let dataset = mapping.entity("dataset").unwrap();
        let filter = Filter {
            include: vec![IncludeExpr {
                relation: "instrument".into(),
                scope: None,
            }],
            ..Filter::default()
        };
        let rewritten = rewrite_filter(&mapping, dataset, &filter).unwrap();
        assert_eq!(rewritten.include.len(), 1);
        assert_eq!(rewritten.include[0].relation, "investigation");
        let nested = rewritten.include[0].scope.as_ref().unwrap();
        assert_eq!(nested.include[0].relation, "investigationInstruments");
    }

    #[test]
    fn test_normalize_date_string_literal() {
        let normalized = normalize_literal(&Value::String("2024-01-15".into()));
        assert_eq!(normalized, Value::String("2024-01-15T00:00:00+00:00".into()));
    }

    #[test]
    fn test_normalize_leaves_non_date_strings_alone() {
        let normalized = normalize_literal(&Value::String("hello".into()));
        assert_eq!(normalized, Value::String("hello".into()));
    }

    #[test]
    fn test_normalize_recurses_into_arrays() {
        let normalized = normalize_literal(&Value::Array(vec![
            Value::String("2024-01-15".into()),
            Value::String("2024-01-16".into()),
        ]));
        assert_eq!(
            normalized,
            Value::Array(vec![
                Value::String("2024-01-15T00:00:00+00:00".into()),
                Value::String("2024-01-16T00:00:00+00:00".into()),
            ])
        );
    }

    #[test]
    fn test_rewrite_unknown_field_errors() {
        let mapping = mapping();
        let dataset = mapping.entity("dataset").unwrap();
        let err = rewrite_field_path(&mapping, dataset, "bogus", "where").unwrap_err();
        assert!(matches!(err, Error::BadFilter { .. }));
    }
}
