//! Fragment builder for the catalogue query language.
//!
//! The catalogue ("ICAT") is queried through a JPQL-like string language:
//! `SELECT o FROM Entity o JOIN o.relation o1 WHERE ... ORDER BY ... LIMIT
//! skip, limit INCLUDE o1`. There is no driver-level parameter binding, so
//! this crate renders literal values inline (escaped) rather than building
//! a parameterized statement.

pub mod builder;
pub mod error;
pub mod expr;
pub mod identifier;
pub mod query;

pub use builder::QlFragment;
pub use error::{QlError, Result};
pub use expr::{qualified_column, Condition, OrderDirection, OrderExpr};
pub use identifier::{quote_literal, render_ident, render_number};
pub use query::{IcatQueryBuilder, MAX_INT};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        qualified_column, quote_literal, render_ident, Condition, IcatQueryBuilder, OrderDirection,
        OrderExpr, QlError, QlFragment, Result,
    };
}
