//! The projection mapping: a JSON file pinning each Search-schema entity to
//! one catalogue entity, loaded once at startup and never reloaded —
//! analogous to how the entity descriptor is loaded once before the router
//! is built, per the data model's description of both as process-wide
//! immutables.

use gateway_core::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// How one Search field maps onto the catalogue row.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldMapping {
    /// A dotted path of catalogue relations ending in a scalar field.
    Path(Vec<String>),
    /// `"ALL"` — include everything under the catalogue relation that
    /// shares this field's name, rather than picking one sub-field.
    All,
    /// A literal value, independent of the catalogue row.
    Const(Value),
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if s == "ALL" => FieldMapping::All,
            Value::String(s) => FieldMapping::Path(s.split('.').map(str::to_string).collect()),
            other => FieldMapping::Const(other),
        })
    }
}

/// A Search relation (used by `include`/field paths that cross entities):
/// which Search entity it lands on, and the catalogue relation chain that
/// reaches it — possibly several hops, with intermediate catalogue entities
/// added transparently.
#[derive(Clone, Debug, Deserialize)]
pub struct RelationMapping {
    pub target: String,
    pub path: String,
}

impl RelationMapping {
    pub fn catalogue_segments(&self) -> Vec<String> {
        self.path.split('.').map(str::to_string).collect()
    }
}

/// One Search entity's mapping: its catalogue root, its field mappings, and
/// its relation mappings (the "panosc-to-icat" chains).
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMapping {
    pub catalogue_entity: String,
    #[serde(default)]
    pub fields: HashMap<String, FieldMapping>,
    #[serde(default)]
    pub relations: HashMap<String, RelationMapping>,
    /// Search fields that must resolve to a non-null value; if one doesn't,
    /// the whole record is dropped rather than the field omitted.
    #[serde(default)]
    pub required: Vec<String>,
}

impl EntityMapping {
    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.get(name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationMapping> {
        self.relations.get(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// The full mapping file: every Search entity keyed by its lowercase name
/// (`dataset`, `document`, `instrument`, `file`, ...).
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectionMapping {
    #[serde(flatten)]
    pub entities: HashMap<String, EntityMapping>,
}

impl ProjectionMapping {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("reading projection mapping {}: {e}", path.display()))
        })?;
        Self::load_from_str(&contents)
    }

    pub fn load_from_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| Error::Config(format!("parsing projection mapping: {e}")))
    }

    pub fn entity(&self, name: &str) -> Result<&EntityMapping> {
        self.entities
            .get(name)
            .ok_or_else(|| Error::bad_filter("entity", format!("unknown Search entity: {name}")))
    }
}
