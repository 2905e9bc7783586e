//! The filter parser (C2): decodes the stringified-JSON filter grammar into
//! the C1 model, and merges individual query parameters over a JSON-string
//! `filter` per the resolved override precedence.

use super::model::{Expr, Filter, IncludeExpr, OrderTerm, Operator};
use crate::error::{Error, Result};
use gateway_ql::OrderDirection;
use serde_json::Value;

const TOP_LEVEL_KEYS: &[&str] = &["where", "include", "limit", "skip", "order", "distinct"];

/// Parse a `filter` query parameter given as a raw JSON string.
pub fn parse_from_str(input: &str) -> Result<Filter> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| Error::bad_filter("filter", format!("invalid JSON: {e}")))?;
    parse(&value)
}

/// Parse a `filter` value already decoded into a [`Value`] (the structured-object form).
pub fn parse(value: &Value) -> Result<Filter> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::bad_filter("filter", "expected a JSON object"))?;

    for key in obj.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(Error::UnknownFilterKey(key.clone()));
        }
    }

    let mut filter = Filter::default();

    if let Some(w) = obj.get("where") {
        filter.where_ = Some(parse_where_node(w, "where")?);
    }
    if let Some(i) = obj.get("include") {
        filter.include = parse_include(i, "include")?;
    }
    if let Some(l) = obj.get("limit") {
        filter.limit = Some(parse_non_negative_int(l, "limit")?);
    }
    if let Some(s) = obj.get("skip") {
        filter.skip = Some(parse_non_negative_int(s, "skip")?);
    }
    if let Some(o) = obj.get("order") {
        filter.order = parse_order(o, "order")?;
    }
    if let Some(d) = obj.get("distinct") {
        filter.distinct = parse_distinct(d, "distinct")?;
    }

    Ok(filter)
}

/// Individual query parameters accepted alongside (or instead of) a
/// JSON-string `filter` parameter. Each, when present, overrides the
/// corresponding key of the base filter.
#[derive(Default)]
pub struct FilterOverrides {
    pub where_: Option<Value>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub include: Option<Value>,
    pub order: Option<Value>,
    pub distinct: Option<Value>,
}

/// Parse the JSON-string `filter` parameter (if any) and merge individual
/// overrides on top, key by key.
pub fn parse_with_overrides(filter_param: Option<&str>, overrides: FilterOverrides) -> Result<Filter> {
    let mut base = match filter_param {
        Some(s) if !s.is_empty() => parse_from_str(s)?,
        _ => Filter::default(),
    };

    if let Some(w) = overrides.where_ {
        base.where_ = Some(parse_where_node(&w, "where")?);
    }
    if let Some(l) = overrides.limit {
        base.limit = Some(l);
    }
    if let Some(s) = overrides.skip {
        base.skip = Some(s);
    }
    if let Some(i) = overrides.include {
        base.include = parse_include(&i, "include")?;
    }
    if let Some(o) = overrides.order {
        base.order = parse_order(&o, "order")?;
    }
    if let Some(d) = overrides.distinct {
        base.distinct = parse_distinct(&d, "distinct")?;
    }

    Ok(base)
}

fn parse_where_node(value: &Value, path: &str) -> Result<Expr> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(Error::bad_filter(path, "implicit and array must not be empty"));
            }
            let children = items
                .iter()
                .enumerate()
                .map(|(i, item)| parse_where_node(item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expr::And(children))
        }
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some((key, inner)) = map.iter().next() {
                    if key == "and" || key == "or" {
                        let items = inner.as_array().ok_or_else(|| {
                            Error::bad_filter(format!("{path}.{key}"), "expected an array")
                        })?;
                        if items.is_empty() {
                            return Err(Error::bad_filter(
                                format!("{path}.{key}"),
                                "compound array must not be empty",
                            ));
                        }
                        let child_path = format!("{path}.{key}");
                        let children = items
                            .iter()
                            .enumerate()
                            .map(|(i, item)| parse_where_node(item, &format!("{child_path}[{i}]")))
                            .collect::<Result<Vec<_>>>()?;
                        return Ok(if key == "and" {
                            Expr::And(children)
                        } else {
                            Expr::Or(children)
                        });
                    }
                }
            }

            // Conjunction of per-field clauses.
            let clauses = map
                .iter()
                .map(|(field, clause)| parse_field_clause(field, clause, path))
                .collect::<Result<Vec<_>>>()?;

            Ok(match clauses.len() {
                1 => clauses.into_iter().next().unwrap(),
                _ => Expr::And(clauses),
            })
        }
        _ => Err(Error::bad_filter(path, "expected an object or array")),
    }
}

fn parse_field_clause(field: &str, clause: &Value, path: &str) -> Result<Expr> {
    let field_path = format!("{path}.{field}");

    match clause {
        Value::Object(map) if map.len() == 1 => {
            let (op_name, operand) = map.iter().next().unwrap();
            let op = Operator::parse(op_name).ok_or_else(|| {
                Error::bad_filter(format!("{field_path}.{op_name}"), "unknown operator")
            })?;
            validate_operand(op, operand, &format!("{field_path}.{op_name}"))?;
            Ok(Expr::Cmp {
                field: field.to_string(),
                op,
                value: operand.clone(),
            })
        }
        Value::Object(_) => Err(Error::bad_filter(
            field_path,
            "operator clause must have exactly one key",
        )),
        scalar => Ok(Expr::Cmp {
            field: field.to_string(),
            op: Operator::Eq,
            value: scalar.clone(),
        }),
    }
}

fn validate_operand(op: Operator, operand: &Value, path: &str) -> Result<()> {
    if op.requires_array() {
        let items = operand
            .as_array()
            .ok_or_else(|| Error::bad_filter(path, format!("{} requires an array", op.as_str())))?;
        if op == Operator::Between && items.len() != 2 {
            return Err(Error::bad_filter(
                path,
                format!("between requires exactly two elements, got {}", items.len()),
            ));
        }
        if items.is_empty() {
            return Err(Error::bad_filter(path, format!("{} requires a non-empty array", op.as_str())));
        }
    }

    if op.requires_string() && !operand.is_string() {
        return Err(Error::bad_filter(path, format!("{} requires a string", op.as_str())));
    }

    Ok(())
}

fn parse_include(value: &Value, path: &str) -> Result<Vec<IncludeExpr>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::bad_filter(path, "expected an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_include_item(item, &format!("{path}[{i}]")))
        .collect()
}

fn parse_include_item(value: &Value, path: &str) -> Result<IncludeExpr> {
    match value {
        Value::String(relation) => Ok(IncludeExpr {
            relation: relation.clone(),
            scope: None,
        }),
        Value::Object(map) => {
            let relation = map
                .get("relation")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::bad_filter(path, "missing \"relation\""))?
                .to_string();

            let scope = match map.get("scope") {
                Some(scope_value) => Some(Box::new(parse(scope_value)?)),
                None => None,
            };

            Ok(IncludeExpr { relation, scope })
        }
        _ => Err(Error::bad_filter(path, "expected a string or object")),
    }
}

fn parse_order(value: &Value, path: &str) -> Result<Vec<OrderTerm>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::bad_filter(path, "expected an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_order_term(item, &format!("{path}[{i}]")))
        .collect()
}

fn parse_order_term(value: &Value, path: &str) -> Result<OrderTerm> {
    match value {
        Value::String(field) => Ok(OrderTerm {
            field: field.clone(),
            direction: OrderDirection::Asc,
        }),
        Value::Object(map) => {
            let field = map
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::bad_filter(path, "missing \"field\""))?
                .to_string();
            let direction = match map.get("direction").and_then(Value::as_str) {
                Some("desc") => OrderDirection::Desc,
                Some("asc") | None => OrderDirection::Asc,
                Some(other) => {
                    return Err(Error::bad_filter(
                        path,
                        format!("unknown order direction: {other}"),
                    ))
                }
            };
            Ok(OrderTerm { field, direction })
        }
        _ => Err(Error::bad_filter(path, "expected a string or object")),
    }
}

fn parse_distinct(value: &Value, path: &str) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::bad_filter(path, "expected an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::bad_filter(format!("{path}[{i}]"), "expected a string"))
        })
        .collect()
}

fn parse_non_negative_int(value: &Value, path: &str) -> Result<i64> {
    let n = value
        .as_i64()
        .ok_or_else(|| Error::bad_filter(path, "expected an integer"))?;
    if n < 0 {
        return Err(Error::bad_filter(path, "must be non-negative"));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_simple_eq() {
        let filter = parse(&json!({"where": {"title": "dog"}})).unwrap();
        match filter.where_.unwrap() {
            Expr::Cmp { field, op, value } => {
                assert_eq!(field, "title");
                assert_eq!(op, Operator::Eq);
                assert_eq!(value, json!("dog"));
            }
            other => panic!("expected Cmp, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_operator_clause() {
        let filter = parse(&json!({"where": {"title": {"like": "dog%"}}})).unwrap();
        match filter.where_.unwrap() {
            Expr::Cmp { op, value, .. } => {
                assert_eq!(op, Operator::Like);
                assert_eq!(value, json!("dog%"));
            }
            other => panic!("expected Cmp, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_compound_and() {
        let filter = parse(&json!({
            "where": {"and": [{"title": "dog"}, {"size": {"gt": 5}}]}
        }))
        .unwrap();
        match filter.where_.unwrap() {
            Expr::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_legacy_array_implicit_and() {
        let filter = parse(&json!({
            "where": [{"title": "dog"}, {"size": {"gt": 5}}]
        }))
        .unwrap();
        match filter.where_.unwrap() {
            Expr::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_implicit_and_over_multi_key_object() {
        let filter = parse(&json!({"where": {"title": "dog", "size": {"gt": 5}}})).unwrap();
        match filter.where_.unwrap() {
            Expr::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let err = parse(&json!({"bogus": 1})).unwrap_err();
        assert!(matches!(err, Error::UnknownFilterKey(k) if k == "bogus"));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = parse(&json!({"where": {"title": {"bogus": "x"}}})).unwrap_err();
        match err {
            Error::BadFilter { path, .. } => assert_eq!(path, "where.title.bogus"),
            other => panic!("expected BadFilter, got {other:?}"),
        }
    }

    #[test]
    fn test_scenario_5_between_arity() {
        // Concrete scenario from the external interfaces: malformed filter
        // {"where":{"size":{"between":[5]}}} -> 400 BadFilter identifying
        // where.size.between.
        let err = parse(&json!({"where": {"size": {"between": [5]}}})).unwrap_err();
        match err {
            Error::BadFilter { path, message } => {
                assert_eq!(path, "where.size.between");
                assert!(message.contains("exactly two elements"));
            }
            other => panic!("expected BadFilter, got {other:?}"),
        }
    }

    #[test]
    fn test_between_ok() {
        let filter = parse(&json!({"where": {"size": {"between": [1, 5]}}})).unwrap();
        match filter.where_.unwrap() {
            Expr::Cmp { op, value, .. } => {
                assert_eq!(op, Operator::Between);
                assert_eq!(value.as_array().unwrap().len(), 2);
            }
            other => panic!("expected Cmp, got {other:?}"),
        }
    }

    #[test]
    fn test_text_requires_string() {
        let err = parse(&json!({"where": {"title": {"text": 5}}})).unwrap_err();
        assert!(matches!(err, Error::BadFilter { .. }));
    }

    #[test]
    fn test_include_with_scope() {
        // Concrete scenario 4: nested include scope filter.
        let filter = parse(&json!({
            "include": [{"relation": "datasets", "scope": {"where": {"isPublic": true}}}]
        }))
        .unwrap();
        assert_eq!(filter.include.len(), 1);
        assert_eq!(filter.include[0].relation, "datasets");
        assert!(filter.include[0].scope.is_some());
    }

    #[test]
    fn test_include_bare_string() {
        let filter = parse(&json!({"include": ["investigation"]})).unwrap();
        assert_eq!(filter.include[0].relation, "investigation");
        assert!(filter.include[0].scope.is_none());
    }

    #[test]
    fn test_order_default_asc() {
        let filter = parse(&json!({"order": ["title"]})).unwrap();
        assert_eq!(filter.order[0].direction, OrderDirection::Asc);
    }

    #[test]
    fn test_order_explicit_desc() {
        let filter = parse(&json!({"order": [{"field": "title", "direction": "desc"}]})).unwrap();
        assert_eq!(filter.order[0].direction, OrderDirection::Desc);
    }

    #[test]
    fn test_negative_limit_rejected() {
        let err = parse(&json!({"limit": -1})).unwrap_err();
        assert!(matches!(err, Error::BadFilter { .. }));
    }

    #[test]
    fn test_merge_precedence_individual_overrides_json_string() {
        // Resolved Open Question: individual params win, key by key; keys
        // absent from the individual params fall through to the JSON string.
        let filter = parse_with_overrides(
            Some(r#"{"where": {"title": "dog"}, "limit": 10}"#),
            FilterOverrides {
                limit: Some(2),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(filter.limit, Some(2));
        match filter.where_.unwrap() {
            Expr::Cmp { field, .. } => assert_eq!(field, "title"),
            other => panic!("expected Cmp, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_no_json_string_individual_only() {
        let filter = parse_with_overrides(
            None,
            FilterOverrides {
                skip: Some(5),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(filter.skip, Some(5));
        assert!(filter.where_.is_none());
    }
}
