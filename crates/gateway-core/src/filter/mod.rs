//! C1 (filter model) and C2 (filter parser).

pub mod model;
pub mod parser;

pub use model::{Expr, Filter, IncludeExpr, Operator, OrderTerm};
pub use parser::{parse, parse_from_str, parse_with_overrides, FilterOverrides};
