//! One-off Search API routes that don't fit the generic per-entity
//! dispatch: `GET /datasets/{pid}/files` and its `/count` sibling, which
//! query the File entity with an implicit `dataset.pid = {pid}` clause
//! ANDed onto whatever filter the caller supplied.

use gateway_core::filter::{Expr, Filter, Operator};
use serde_json::Value;

/// AND an implicit `dataset.pid = {pid}` clause onto `filter`'s `where`,
/// for the `GET /datasets/{pid}/files` family of routes.
pub fn with_dataset_pid_filter(filter: Filter, pid: &str) -> Filter {
    let implicit = Expr::Cmp {
        field: "dataset.pid".to_string(),
        op: Operator::Eq,
        value: Value::String(pid.to_string()),
    };

    let where_ = match filter.where_ {
        Some(existing) => Some(Expr::And(vec![implicit, existing])),
        None => Some(implicit),
    };

    Filter { where_, ..filter }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injects_pid_clause_when_filter_is_otherwise_empty() {
        let filter = with_dataset_pid_filter(Filter::default(), "inv-001:1");
        match filter.where_.unwrap() {
            Expr::Cmp { field, op, value } => {
                assert_eq!(field, "dataset.pid");
                assert_eq!(op, Operator::Eq);
                assert_eq!(value, Value::String("inv-001:1".into()));
            }
            other => panic!("expected Cmp, got {other:?}"),
        }
    }

    #[test]
    fn test_ands_pid_clause_onto_existing_where() {
        let existing = Filter {
            where_: Some(Expr::Cmp {
                field: "name".into(),
                op: Operator::Like,
                value: Value::String("foo%".into()),
            }),
            ..Filter::default()
        };
        let filter = with_dataset_pid_filter(existing, "inv-001:1");
        match filter.where_.unwrap() {
            Expr::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }
}
