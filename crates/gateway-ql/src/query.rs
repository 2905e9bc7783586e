//! Assembly of a complete catalogue query string:
//! `SELECT <projection> FROM <Entity> o <joins> <where> <order> <limit> <include>`.

use crate::builder::QlFragment;
use crate::identifier::render_ident;
use crate::error::Result;

pub const MAX_INT: i64 = i32::MAX as i64;

/// Fluent builder for a single catalogue query, mirroring the shape of a
/// SQL `SELECT` builder: fields are appended in the order they're wanted,
/// `build()` assembles the clauses in the catalogue's fixed clause order.
#[derive(Default)]
pub struct IcatQueryBuilder {
    distinct: Vec<String>,
    entity: String,
    root_alias: String,
    joins: Vec<String>,
    where_clauses: Vec<QlFragment>,
    order_by: Vec<String>,
    includes: Vec<String>,
    limit: Option<i64>,
    skip: i64,
}

impl IcatQueryBuilder {
    pub fn new(entity: impl Into<String>, root_alias: impl Into<String>) -> Result<Self> {
        let entity = entity.into();
        let root_alias = root_alias.into();
        render_ident(&entity)?;
        render_ident(&root_alias)?;
        Ok(Self {
            entity,
            root_alias,
            ..Default::default()
        })
    }

    /// `distinct` forces `SELECT DISTINCT` over the named (already-qualified)
    /// fields, replacing the default projection of the bare root alias.
    pub fn distinct(mut self, fields: Vec<String>) -> Self {
        self.distinct = fields;
        self
    }

    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    pub fn where_clause(mut self, frag: QlFragment) -> Self {
        if !frag.is_empty() {
            self.where_clauses.push(frag);
        }
        self
    }

    pub fn order_by(mut self, term: impl Into<String>) -> Self {
        self.order_by.push(term.into());
        self
    }

    pub fn include(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !self.includes.contains(&alias) {
            self.includes.push(alias);
        }
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = skip;
        self
    }

    pub fn build(self) -> String {
        let mut q = String::new();

        if self.distinct.is_empty() {
            q.push_str(&format!("SELECT {} FROM {} {}", self.root_alias, self.entity, self.root_alias));
        } else {
            q.push_str(&format!(
                "SELECT DISTINCT {} FROM {} {}",
                self.distinct.join(", "),
                self.entity,
                self.root_alias
            ));
        }

        for join in &self.joins {
            q.push(' ');
            q.push_str(join);
        }

        if !self.where_clauses.is_empty() {
            let combined = QlFragment::join(" AND ", self.where_clauses);
            q.push_str(" WHERE ");
            q.push_str(combined.as_str());
        }

        if !self.order_by.is_empty() {
            q.push_str(" ORDER BY ");
            q.push_str(&self.order_by.join(", "));
        }

        match self.limit {
            Some(limit) => {
                q.push_str(&format!(" LIMIT {}, {}", self.skip, limit));
            }
            None if self.skip > 0 => {
                q.push_str(&format!(" LIMIT {}, {}", self.skip, MAX_INT));
            }
            None => {}
        }

        if !self.includes.is_empty() {
            q.push_str(" INCLUDE ");
            q.push_str(&self.includes.join(", "));
        }

        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let q = IcatQueryBuilder::new("Investigation", "o").unwrap().build();
        assert_eq!(q, "SELECT o FROM Investigation o");
    }

    #[test]
    fn test_where_and_limit() {
        let q = IcatQueryBuilder::new("Investigation", "o")
            .unwrap()
            .where_clause(QlFragment::raw("o.title LIKE 'dog%'"))
            .skip(0)
            .limit(2)
            .build();
        assert_eq!(q, "SELECT o FROM Investigation o WHERE o.title LIKE 'dog%' LIMIT 0, 2");
    }

    #[test]
    fn test_skip_only_uses_max_int() {
        let q = IcatQueryBuilder::new("Dataset", "o").unwrap().skip(10).build();
        assert_eq!(q, format!("SELECT o FROM Dataset o LIMIT 10, {}", MAX_INT));
    }

    #[test]
    fn test_join_and_order_and_include() {
        let q = IcatQueryBuilder::new("Dataset", "o")
            .unwrap()
            .join("JOIN o.investigation o1")
            .order_by("o.name ASC")
            .include("o1")
            .build();
        assert_eq!(
            q,
            "SELECT o FROM Dataset o JOIN o.investigation o1 ORDER BY o.name ASC INCLUDE o1"
        );
    }

    #[test]
    fn test_distinct() {
        let q = IcatQueryBuilder::new("Dataset", "o")
            .unwrap()
            .distinct(vec!["o.name".into()])
            .build();
        assert_eq!(q, "SELECT DISTINCT o.name FROM Dataset o");
    }

    #[test]
    fn test_duplicate_includes_deduplicated() {
        let q = IcatQueryBuilder::new("Dataset", "o")
            .unwrap()
            .include("o1")
            .include("o1")
            .build();
        assert_eq!(q, "SELECT o FROM Dataset o INCLUDE o1");
    }
}
