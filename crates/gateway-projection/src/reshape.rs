//! Result reshape: turn one catalogue JSON row back into the Search-schema
//! shape a client requested, walking the same [`ProjectionMapping`] the
//! rewrite side used to get there.
//!
//! To-many relations crossed partway through a dotted catalogue path (e.g.
//! a Sample's parameters reached via `investigation.samples.parameters`)
//! flatten into an array at whatever depth they occur — [`walk_path`]
//! handles that generically for both scalar field lookups and relation
//! subtree lookups, rather than duplicating the walk for each case.

use crate::mapping::{EntityMapping, FieldMapping, ProjectionMapping};
use gateway_core::error::{Error, Result};
use serde_json::{Map, Value};

/// Result of walking a dotted path through a JSON row: either a single
/// scalar/object, an array gathered by flattening a to-many relation
/// encountered along the way, or nothing (a null/missing hop).
enum Walked<'a> {
    Scalar(&'a Value),
    Array(Vec<&'a Value>),
    Null,
}

/// Walk `segments` through `row`. Whenever a segment's value is a JSON
/// array, the rest of the path is walked independently through every
/// element and the results are flattened — this is what lets one dotted
/// catalogue path cross an arbitrary number of to-many relations.
fn walk_path<'a>(row: &'a Value, segments: &[String]) -> Walked<'a> {
    let Some((head, rest)) = segments.split_first() else {
        return Walked::Scalar(row);
    };

    let next = match row {
        Value::Object(map) => map.get(head.as_str()),
        _ => None,
    };

    match next {
        None | Some(Value::Null) => Walked::Null,
        Some(Value::Array(items)) => {
            let mut out = Vec::new();
            for item in items {
                match walk_path(item, rest) {
                    Walked::Scalar(v) => out.push(v),
                    Walked::Array(vs) => out.extend(vs),
                    Walked::Null => {}
                }
            }
            Walked::Array(out)
        }
        Some(value) => walk_path(value, rest),
    }
}

/// Reshape one catalogue row into the Search-schema JSON object for
/// `entity`, honoring `include` (which Search relations to expand) and
/// dropping the whole record if a `required` field resolves to null.
pub fn reshape_row(
    mapping: &ProjectionMapping,
    entity: &EntityMapping,
    row: &Value,
    include: &[String],
) -> Result<Option<Value>> {
    reshape_row_inner(mapping, entity, row, include, &mut Vec::new())
}

fn reshape_row_inner(
    mapping: &ProjectionMapping,
    entity: &EntityMapping,
    row: &Value,
    include: &[String],
    path_stack: &mut Vec<String>,
) -> Result<Option<Value>> {
    let mut out = Map::new();

    for (name, field) in &entity.fields {
        let value = match field {
            FieldMapping::Const(v) => Some(v.clone()),
            FieldMapping::All => row.as_object().and_then(|m| m.get(name.as_str())).cloned(),
            FieldMapping::Path(segments) => match walk_path(row, segments) {
                Walked::Scalar(v) => Some(v.clone()),
                Walked::Array(vs) => Some(Value::Array(vs.into_iter().cloned().collect())),
                Walked::Null => None,
            },
        };

        match value {
            None if entity.is_required(name) => return Ok(None),
            None => {}
            Some(v) if v.is_null() && entity.is_required(name) => {
                return Ok(None);
            }
            Some(v) => {
                out.insert(name.clone(), v);
            }
        }
    }

    for relation_name in include {
        let relation = entity
            .relation(relation_name)
            .ok_or_else(|| Error::bad_filter("include", format!("unknown relation: {relation_name}")))?;

        if path_stack.contains(&relation.target) {
            return Err(Error::bad_filter(
                "include",
                format!("circular relation reference through \"{}\"", relation.target),
            ));
        }

        let target = mapping.entity(&relation.target)?;
        let segments = relation.catalogue_segments();

        let reshaped = match walk_path(row, &segments) {
            Walked::Null => None,
            Walked::Scalar(v) => {
                path_stack.push(relation.target.clone());
                let result = reshape_row_inner(mapping, target, v, &[], path_stack)?;
                path_stack.pop();
                result
            }
            Walked::Array(vs) => {
                path_stack.push(relation.target.clone());
                let mut items = Vec::with_capacity(vs.len());
                for v in vs {
                    if let Some(reshaped) = reshape_row_inner(mapping, target, v, &[], path_stack)? {
                        items.push(reshaped);
                    }
                }
                path_stack.pop();
                Some(Value::Array(items))
            }
        };

        if let Some(reshaped) = reshaped {
            out.insert(relation_name.clone(), reshaped);
        }
    }

    Ok(Some(Value::Object(out)))
}
