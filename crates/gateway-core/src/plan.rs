//! Resolves a [`Filter`](crate::filter::Filter) against the entity
//! descriptor: walks dotted field paths, assigns depth-first join aliases
//! (`o1`, `o2`, ...), and reuses an alias when two paths resolve to the same
//! underlying join. Read by the query builder to render the final string.

use crate::descriptor::{self, Cardinality, EntityDescriptor};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Hands out alias names in the depth-first order relations are first
/// encountered: `o1`, `o2`, ...
#[derive(Default)]
pub struct AliasAllocator {
    next: usize,
}

impl AliasAllocator {
    pub fn next_alias(&mut self) -> String {
        self.next += 1;
        format!("o{}", self.next)
    }
}

/// A single rendered `JOIN parent.relation alias` clause, deduplicated by
/// `(parent_alias, relation)` so two paths through the same join share an
/// alias instead of joining twice.
#[derive(Default)]
pub struct JoinRegistry {
    clauses: Vec<String>,
    index: HashMap<(String, String), String>,
}

impl JoinRegistry {
    /// Resolve, allocating a new alias and join clause only the first time
    /// `(parent_alias, relation)` is seen.
    pub fn join_for(
        &mut self,
        parent_alias: &str,
        relation: &str,
        allocator: &mut AliasAllocator,
    ) -> String {
        let key = (parent_alias.to_string(), relation.to_string());
        if let Some(alias) = self.index.get(&key) {
            return alias.clone();
        }
        let alias = allocator.next_alias();
        self.clauses
            .push(format!("JOIN {}.{} {}", parent_alias, relation, alias));
        self.index.insert(key, alias.clone());
        alias
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }
}

/// The outcome of resolving a dotted field path: the rendered qualified
/// column, the entity the final segment belongs to, and whether the path
/// crossed a to-many relation (the projection engine and C4 both care about
/// this — it decides array vs scalar result shape).
pub struct ResolvedField {
    pub qualified_column: String,
    pub entity: &'static EntityDescriptor,
    pub crossed_to_many: bool,
}

/// Walk a dotted field path (e.g. `investigation.title`) from `root_entity`,
/// joining through each relation segment and validating the final segment
/// is a scalar attribute of the entity it lands on.
pub fn resolve_field(
    root_entity: &'static EntityDescriptor,
    root_alias: &str,
    field_path: &str,
    path_ctx: &str,
    joins: &mut JoinRegistry,
    allocator: &mut AliasAllocator,
) -> Result<ResolvedField> {
    let segments: Vec<&str> = field_path.split('.').collect();
    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(Error::bad_filter(path_ctx, "empty field path segment"));
    }

    let mut entity = root_entity;
    let mut alias = root_alias.to_string();
    let mut crossed_to_many = false;

    for segment in &segments[..segments.len() - 1] {
        let relation = descriptor::resolve_relation(entity, segment, path_ctx)?;
        if relation.cardinality == Cardinality::Many {
            crossed_to_many = true;
        }
        alias = joins.join_for(&alias, segment, allocator);
        entity = descriptor::entity(relation.target)?;
    }

    let attribute = segments[segments.len() - 1];
    if !entity.has_attribute(attribute) {
        return Err(Error::bad_filter(
            path_ctx,
            format!("{} has no attribute \"{attribute}\"", entity.name),
        ));
    }

    let qualified_column = gateway_ql::qualified_column(&alias, attribute)?;
    Ok(ResolvedField {
        qualified_column,
        entity,
        crossed_to_many,
    })
}

/// Resolve a relation path ending in a relation itself (used by `include`),
/// returning the alias assigned to the final relation and the entity it
/// targets.
pub fn resolve_relation_path(
    root_entity: &'static EntityDescriptor,
    root_alias: &str,
    relation_name: &str,
    path_ctx: &str,
    joins: &mut JoinRegistry,
    allocator: &mut AliasAllocator,
) -> Result<(String, &'static EntityDescriptor)> {
    let relation = descriptor::resolve_relation(root_entity, relation_name, path_ctx)?;
    let alias = joins.join_for(root_alias, relation_name, allocator);
    let target = descriptor::entity(relation.target)?;
    Ok((alias, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_simple_attribute() {
        let dataset = descriptor::entity("Dataset").unwrap();
        let mut joins = JoinRegistry::default();
        let mut allocator = AliasAllocator::default();
        let resolved = resolve_field(dataset, "o", "name", "where.name", &mut joins, &mut allocator).unwrap();
        assert_eq!(resolved.qualified_column, "o.name");
        assert!(!resolved.crossed_to_many);
        assert!(joins.clauses().is_empty());
    }

    #[test]
    fn test_resolve_crosses_relation() {
        let dataset = descriptor::entity("Dataset").unwrap();
        let mut joins = JoinRegistry::default();
        let mut allocator = AliasAllocator::default();
        let resolved = resolve_field(
            dataset,
            "o",
            "investigation.title",
            "where.investigation.title",
            &mut joins,
            &mut allocator,
        )
        .unwrap();
        assert_eq!(resolved.qualified_column, "o1.title");
        assert_eq!(joins.clauses(), &["JOIN o.investigation o1".to_string()]);
    }

    #[test]
    fn test_duplicate_join_reuses_alias() {
        let dataset = descriptor::entity("Dataset").unwrap();
        let mut joins = JoinRegistry::default();
        let mut allocator = AliasAllocator::default();
        resolve_field(dataset, "o", "investigation.title", "p1", &mut joins, &mut allocator).unwrap();
        let second = resolve_field(dataset, "o", "investigation.name", "p2", &mut joins, &mut allocator).unwrap();
        assert_eq!(second.qualified_column, "o1.name");
        assert_eq!(joins.clauses().len(), 1);
    }

    #[test]
    fn test_unknown_attribute_names_segment() {
        let dataset = descriptor::entity("Dataset").unwrap();
        let mut joins = JoinRegistry::default();
        let mut allocator = AliasAllocator::default();
        let err = resolve_field(dataset, "o", "bogus", "where.bogus", &mut joins, &mut allocator).unwrap_err();
        match err {
            Error::BadFilter { path, .. } => assert_eq!(path, "where.bogus"),
            other => panic!("expected BadFilter, got {other:?}"),
        }
    }

    #[test]
    fn test_to_many_crossing_flag() {
        let investigation = descriptor::entity("Investigation").unwrap();
        let mut joins = JoinRegistry::default();
        let mut allocator = AliasAllocator::default();
        let resolved = resolve_field(
            investigation,
            "o",
            "datasets.name",
            "where.datasets.name",
            &mut joins,
            &mut allocator,
        )
        .unwrap();
        assert!(resolved.crossed_to_many);
    }
}
