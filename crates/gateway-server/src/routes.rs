//! Method/path dispatch table for the DataGateway and Search API surfaces,
//! per the route list in the external interfaces section: entity-per-path
//! CRUD for DataGateway, a curated five-route shape (list/byPid/count plus
//! the `{pid}/files` special case) for the Search API.

use axum::http::Method;
use gateway_core::error::{Error, Result};

/// One resolved DataGateway action against a catalogue entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataGatewayRoute {
    List { entity: String },
    Get { entity: String, id: String },
    Create { entity: String },
    Update { entity: String },
    Delete { entity: String, id: String },
    Count { entity: String },
    FindOne { entity: String },
}

/// One resolved Search API action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchRoute {
    List { entity: String },
    GetByPid { entity: String, pid: String },
    Count { entity: String },
    DatasetFiles { pid: String },
    DatasetFilesCount { pid: String },
}

/// Match a DataGateway path (already stripped of its `datagateway-api`
/// prefix) and method against the seven-route CRUD contract.
pub fn match_data_gateway(method: &Method, segments: &[&str]) -> Result<DataGatewayRoute> {
    match segments {
        [entity] => match *method {
            Method::GET => Ok(DataGatewayRoute::List {
                entity: entity.to_string(),
            }),
            Method::POST => Ok(DataGatewayRoute::Create {
                entity: entity.to_string(),
            }),
            Method::PATCH => Ok(DataGatewayRoute::Update {
                entity: entity.to_string(),
            }),
            _ => Err(Error::NotFound(format!("no route for {method} /{entity}"))),
        },
        [entity, "count"] if *method == Method::GET => Ok(DataGatewayRoute::Count {
            entity: entity.to_string(),
        }),
        [entity, "findone"] if *method == Method::GET => Ok(DataGatewayRoute::FindOne {
            entity: entity.to_string(),
        }),
        [entity, id] if *method == Method::GET => Ok(DataGatewayRoute::Get {
            entity: entity.to_string(),
            id: id.to_string(),
        }),
        [entity, id] if *method == Method::DELETE => Ok(DataGatewayRoute::Delete {
            entity: entity.to_string(),
            id: id.to_string(),
        }),
        _ => Err(Error::NotFound(format!("no route for {method} /{}", segments.join("/")))),
    }
}

/// Match a Search API path (stripped of its `search-api` prefix).
pub fn match_search(method: &Method, segments: &[&str]) -> Result<SearchRoute> {
    if *method != Method::GET {
        return Err(Error::NotFound(format!(
            "no route for {method} /{}",
            segments.join("/")
        )));
    }
    match segments {
        [entity] => Ok(SearchRoute::List {
            entity: entity.to_string(),
        }),
        [entity, "count"] => Ok(SearchRoute::Count {
            entity: entity.to_string(),
        }),
        ["datasets", pid, "files"] => Ok(SearchRoute::DatasetFiles { pid: pid.to_string() }),
        ["datasets", pid, "files", "count"] => Ok(SearchRoute::DatasetFilesCount { pid: pid.to_string() }),
        [entity, pid] => Ok(SearchRoute::GetByPid {
            entity: entity.to_string(),
            pid: pid.to_string(),
        }),
        _ => Err(Error::NotFound(format!("no route for /{}", segments.join("/")))),
    }
}

/// Map a DataGateway URL entity segment (plural) to its descriptor name.
pub fn data_gateway_entity_name(segment: &str) -> Result<&'static str> {
    Ok(match segment {
        "Investigations" => "Investigation",
        "Datasets" => "Dataset",
        "Datafiles" => "Datafile",
        "Instruments" => "Instrument",
        "Samples" => "Sample",
        "ParameterTypes" => "ParameterType",
        other => return Err(Error::NotFound(format!("unknown entity: {other}"))),
    })
}

/// Map a Search API URL entity segment (lowercase plural) to its mapping
/// key, as used by `ProjectionMapping::entity`.
pub fn search_entity_name(segment: &str) -> Result<&'static str> {
    Ok(match segment {
        "datasets" => "dataset",
        "documents" => "document",
        "instruments" => "instrument",
        other => return Err(Error::NotFound(format!("unknown entity: {other}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_gateway_list_and_count() {
        assert_eq!(
            match_data_gateway(&Method::GET, &["Investigations"]).unwrap(),
            DataGatewayRoute::List { entity: "Investigations".into() }
        );
        assert_eq!(
            match_data_gateway(&Method::GET, &["Investigations", "count"]).unwrap(),
            DataGatewayRoute::Count { entity: "Investigations".into() }
        );
    }

    #[test]
    fn test_data_gateway_get_by_id() {
        assert_eq!(
            match_data_gateway(&Method::GET, &["Datasets", "42"]).unwrap(),
            DataGatewayRoute::Get { entity: "Datasets".into(), id: "42".into() }
        );
    }

    #[test]
    fn test_data_gateway_post_and_patch() {
        assert_eq!(
            match_data_gateway(&Method::POST, &["Datasets"]).unwrap(),
            DataGatewayRoute::Create { entity: "Datasets".into() }
        );
        assert_eq!(
            match_data_gateway(&Method::PATCH, &["Datasets"]).unwrap(),
            DataGatewayRoute::Update { entity: "Datasets".into() }
        );
    }

    #[test]
    fn test_search_dataset_files_special_case() {
        assert_eq!(
            match_search(&Method::GET, &["datasets", "abc-123", "files"]).unwrap(),
            SearchRoute::DatasetFiles { pid: "abc-123".into() }
        );
        assert_eq!(
            match_search(&Method::GET, &["datasets", "abc-123", "files", "count"]).unwrap(),
            SearchRoute::DatasetFilesCount { pid: "abc-123".into() }
        );
    }

    #[test]
    fn test_search_get_by_pid_vs_count() {
        assert_eq!(
            match_search(&Method::GET, &["datasets", "count"]).unwrap(),
            SearchRoute::Count { entity: "datasets".into() }
        );
        assert_eq!(
            match_search(&Method::GET, &["datasets", "abc-123"]).unwrap(),
            SearchRoute::GetByPid { entity: "datasets".into(), pid: "abc-123".into() }
        );
    }

    #[test]
    fn test_unknown_entity_name_errors() {
        assert!(data_gateway_entity_name("Bogus").is_err());
        assert!(search_entity_name("bogus").is_err());
    }
}
