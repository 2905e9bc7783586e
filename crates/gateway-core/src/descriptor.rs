//! The catalogue entity descriptor: static, build-time metadata about ICAT
//! entities, their relations and scalar attributes. Unlike this codebase's
//! `SchemaCache`, this is never introspected from a live connection and
//! never reloaded — it is compiled in once and read by C4 for the lifetime
//! of the process.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Relationship multiplicity, simplified from this codebase's
/// foreign-key-specific `Cardinality` (O2M/M2O/O2O/M2M) down to what the
/// query builder actually needs to decide INCLUDE/array-reshape behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// One relation a catalogue entity declares to another.
#[derive(Clone, Copy, Debug)]
pub struct RelationDescriptor {
    pub name: &'static str,
    pub target: &'static str,
    pub cardinality: Cardinality,
}

/// Static metadata about a single catalogue entity type.
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub attributes: &'static [&'static str],
    pub text_searchable: &'static [&'static str],
    pub relations: &'static [RelationDescriptor],
}

impl EntityDescriptor {
    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(&name)
    }
}

macro_rules! rel {
    ($name:literal, $target:literal, one) => {
        RelationDescriptor {
            name: $name,
            target: $target,
            cardinality: Cardinality::One,
        }
    };
    ($name:literal, $target:literal, many) => {
        RelationDescriptor {
            name: $name,
            target: $target,
            cardinality: Cardinality::Many,
        }
    };
}

static INVESTIGATION: EntityDescriptor = EntityDescriptor {
    name: "Investigation",
    attributes: &["id", "name", "title", "visitId", "doi", "pid", "summary", "startDate", "endDate"],
    text_searchable: &["name", "title", "summary"],
    relations: &[
        rel!("datasets", "Dataset", many),
        rel!("investigationInstruments", "InvestigationInstrument", many),
        rel!("samples", "Sample", many),
    ],
};

static DATASET: EntityDescriptor = EntityDescriptor {
    name: "Dataset",
    attributes: &["id", "name", "doi", "pid", "location", "complete", "startDate", "endDate"],
    text_searchable: &["name"],
    relations: &[
        rel!("investigation", "Investigation", one),
        rel!("datafiles", "Datafile", many),
        rel!("sample", "Sample", one),
        rel!("parameters", "DatasetParameter", many),
    ],
};

static DATAFILE: EntityDescriptor = EntityDescriptor {
    name: "Datafile",
    attributes: &["id", "name", "location", "fileSize", "checksum", "datafileModTime"],
    // `dataset.pid` (crossing the `dataset` relation) backs the
    // `GET /datasets/{pid}/files` special case in the projection engine.
    text_searchable: &["name"],
    relations: &[rel!("dataset", "Dataset", one), rel!("parameters", "DatafileParameter", many)],
};

static INSTRUMENT: EntityDescriptor = EntityDescriptor {
    name: "Instrument",
    attributes: &["id", "name", "fullName", "description"],
    text_searchable: &["name", "fullName", "description"],
    relations: &[rel!("investigationInstruments", "InvestigationInstrument", many)],
};

static SAMPLE: EntityDescriptor = EntityDescriptor {
    name: "Sample",
    attributes: &["id", "name"],
    text_searchable: &["name"],
    relations: &[
        rel!("investigation", "Investigation", one),
        rel!("parameters", "SampleParameter", many),
    ],
};

static PARAMETER_TYPE: EntityDescriptor = EntityDescriptor {
    name: "ParameterType",
    attributes: &["id", "name", "units", "valueType"],
    text_searchable: &["name"],
    relations: &[],
};

static REGISTRY: Lazy<HashMap<&'static str, &'static EntityDescriptor>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for entity in [
        &INVESTIGATION,
        &DATASET,
        &DATAFILE,
        &INSTRUMENT,
        &SAMPLE,
        &PARAMETER_TYPE,
    ] {
        m.insert(entity.name, entity);
    }
    m
});

/// Look up an entity by its catalogue name.
pub fn entity(name: &str) -> Result<&'static EntityDescriptor> {
    REGISTRY
        .get(name)
        .copied()
        .ok_or_else(|| Error::bad_filter("entity", format!("unknown entity: {name}")))
}

/// Resolve a relation on an entity, failing with a path-qualified `BadFilter`.
pub fn resolve_relation(
    entity_desc: &'static EntityDescriptor,
    relation_name: &str,
    path: &str,
) -> Result<&'static RelationDescriptor> {
    entity_desc.relation(relation_name).ok_or_else(|| {
        Error::bad_filter(
            path,
            format!("{} has no relation \"{relation_name}\"", entity_desc.name),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_entity() {
        let e = entity("Dataset").unwrap();
        assert_eq!(e.name, "Dataset");
        assert!(e.has_attribute("name"));
    }

    #[test]
    fn test_lookup_unknown_entity() {
        assert!(entity("Bogus").is_err());
    }

    #[test]
    fn test_relation_cardinality() {
        let investigation = entity("Investigation").unwrap();
        let datasets = investigation.relation("datasets").unwrap();
        assert_eq!(datasets.cardinality, Cardinality::Many);
        assert_eq!(datasets.target, "Dataset");
    }

    #[test]
    fn test_resolve_unknown_relation_names_segment() {
        let dataset = entity("Dataset").unwrap();
        let err = resolve_relation(dataset, "bogus", "where.bogus.name").unwrap_err();
        match err {
            Error::BadFilter { path, .. } => assert_eq!(path, "where.bogus.name"),
            other => panic!("expected BadFilter, got {other:?}"),
        }
    }

    #[test]
    fn test_text_searchable_attributes() {
        let instrument = entity("Instrument").unwrap();
        assert!(instrument.text_searchable.contains(&"fullName"));
    }
}
