//! Core filter model, parser, entity descriptor and query builder for the
//! ICAT gateway.
//!
//! # Architecture
//!
//! The request processing pipeline, leaves first:
//!
//! 1. **Filter model** (`filter::model`) - typed `where`/`include`/`limit`/
//!    `skip`/`order`/`distinct` representation
//! 2. **Filter parser** (`filter::parser`) - decode the stringified-JSON
//!    filter grammar, merge individual query-parameter overrides
//! 3. **Entity descriptor** (`descriptor`) - static catalogue schema metadata
//! 4. **Plan** (`plan`) - resolve dotted field paths against the descriptor,
//!    assigning join aliases
//! 5. **Query builder** (`query_builder`) - render the resolved filter into
//!    the catalogue query-language string

pub mod config;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod plan;
pub mod query_builder;

pub use config::{AppConfig, Backend, LogLevel};
pub use descriptor::{entity, Cardinality, EntityDescriptor, RelationDescriptor};
pub use error::{Error, Result};
pub use filter::{
    parse, parse_from_str, parse_with_overrides, Expr, Filter, FilterOverrides, IncludeExpr,
    Operator, OrderTerm,
};
pub use query_builder::{CatalogueQueryBuilder, QueryBuilder, RenderedQuery};

/// Prelude for common imports.
pub mod prelude {
    pub use super::config::AppConfig;
    pub use super::descriptor::{entity, EntityDescriptor};
    pub use super::error::{Error, Result};
    pub use super::filter::{parse, parse_from_str, Filter};
    pub use super::query_builder::{CatalogueQueryBuilder, QueryBuilder, RenderedQuery};
}
