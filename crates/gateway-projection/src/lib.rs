//! C5: the Search API projection engine.
//!
//! Translates between the Search-schema filter/result shape (`dataset`,
//! `document`, `instrument`, `file`, ...) and the catalogue's own shape,
//! driven entirely by a declarative [`mapping::ProjectionMapping`] loaded
//! once at startup. Two directions:
//!
//! - [`rewrite::rewrite_filter`] - a Search [`gateway_core::Filter`] into
//!   the catalogue-schema equivalent, before C4/C2 ever see it.
//! - [`reshape::reshape_row`] - a catalogue JSON row back into the
//!   Search-schema response shape, after the query has run.
//!
//! [`special_cases`] holds the one named exception to the generic per-entity
//! dispatch: `GET /datasets/{pid}/files`.

pub mod mapping;
pub mod reshape;
pub mod rewrite;
pub mod special_cases;

pub use mapping::{EntityMapping, FieldMapping, ProjectionMapping, RelationMapping};
pub use reshape::reshape_row;
pub use rewrite::{normalize_literal, rewrite_field_path, rewrite_filter};
pub use special_cases::with_dataset_pid_filter;
