//! C6: the request orchestrator. One entrypoint dispatches both the
//! DataGateway and Search API surfaces: parse the filter, borrow a session,
//! build and run the catalogue query, reshape if Search API, serialise,
//! release the session on every exit path.
//!
//! The pool serves a single configured identity (multi-tenant
//! authentication is a named Non-goal), so there is no client-supplied
//! session header to validate here — every request borrows from the one
//! shared pool.

use crate::routes::{self, DataGatewayRoute, SearchRoute};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use gateway_core::error::{Error, Result};
use gateway_core::filter::{parse_with_overrides, Filter, FilterOverrides};
use gateway_core::query_builder::{CatalogueQueryBuilder, QueryBuilder};
use gateway_projection::{mapping::EntityMapping, reshape_row, rewrite_filter, with_dataset_pid_filter};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Main request handler. Enforces the per-request wall-clock deadline
/// around the whole pipeline; a cancelled catalogue call still runs the
/// session's release path via `SessionGuard`'s `Drop` impl, so no extra
/// cleanup is needed here when the deadline fires.
pub async fn handle_request(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    debug!("{} {}", method, path);

    let deadline = std::time::Duration::from_millis(state.config.request_timeout_ms);
    match tokio::time::timeout(deadline, process_request(&state, request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => error_response(e),
        Err(_) => error_response(Error::CatalogueUnavailable(
            "request exceeded the configured deadline".to_string(),
        )),
    }
}

async fn process_request(state: &Arc<AppState>, request: Request) -> Result<Response> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = parse_query(request.uri().query().unwrap_or(""));

    let body_bytes = axum::body::to_bytes(request.into_body(), 10 * 1024 * 1024)
        .await
        .map_err(|e| Error::Internal(format!("reading request body: {e}")))?;

    let trimmed = path
        .strip_prefix(&state.config.extension)
        .unwrap_or(&path)
        .trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

    match segments.split_first() {
        Some((&"datagateway-api", rest)) => {
            handle_data_gateway(state, &method, rest, &query, &body_bytes).await
        }
        Some((&"search-api", rest)) => handle_search(state, &method, rest, &query).await,
        _ => Err(Error::NotFound(format!("no route for /{}", segments.join("/")))),
    }
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

fn build_filter(query: &HashMap<String, String>) -> Result<Filter> {
    let filter_param = query.get("filter").map(String::as_str);

    let parse_json = |key: &str| -> Result<Option<Value>> {
        query
            .get(key)
            .map(|s| serde_json::from_str(s).map_err(|e| Error::bad_filter(key, format!("invalid JSON: {e}"))))
            .transpose()
    };
    let parse_int = |key: &str| -> Result<Option<i64>> {
        query
            .get(key)
            .map(|s| s.parse::<i64>().map_err(|_| Error::bad_filter(key, "expected an integer")))
            .transpose()
    };

    let overrides = FilterOverrides {
        where_: parse_json("where")?,
        limit: parse_int("limit")?,
        skip: parse_int("skip")?,
        include: parse_json("include")?,
        order: parse_json("order")?,
        distinct: parse_json("distinct")?,
    };

    parse_with_overrides(filter_param, overrides)
}

/// ICAT entity ids are numeric (`Long`); render them as a JSON number so
/// the catalogue query language doesn't see a string literal compared
/// against a numeric column.
fn with_where_id(filter: Filter, id: &str) -> Filter {
    let value = match id.parse::<i64>() {
        Ok(n) => Value::Number(n.into()),
        Err(_) => Value::String(id.to_string()),
    };
    with_where(filter, "id", value)
}

/// AND an implicit `field = value` clause onto a filter's `where`, capping
/// the result to one row — used for id/pid lookups that should match at
/// most one record.
fn with_where_eq(filter: Filter, field: &str, value: &str) -> Filter {
    with_where(filter, field, Value::String(value.to_string()))
}

fn with_where(mut filter: Filter, field: &str, value: Value) -> Filter {
    use gateway_core::filter::{Expr, Operator};
    let clause = Expr::Cmp {
        field: field.to_string(),
        op: Operator::Eq,
        value,
    };
    filter.where_ = Some(match filter.where_ {
        Some(existing) => Expr::And(vec![clause, existing]),
        None => clause,
    });
    filter.limit = Some(1);
    filter
}

/// Derive a `SELECT COUNT(o) FROM ...` query from a rendered `SELECT o
/// FROM ...` query, keeping the joins and WHERE clause but dropping
/// ORDER BY/LIMIT/INCLUDE, which a count has no use for. C4 only renders
/// the row-projecting form; deriving COUNT by truncation here avoids
/// teaching the query builder a second projection shape for a single
/// orchestrator-level request kind.
fn to_count_query(rendered: &str) -> String {
    let Some(from_idx) = find_outside_quotes(rendered, " FROM ") else {
        return rendered.to_string();
    };
    let after_from = &rendered[from_idx + 6..];
    let mut end = after_from.len();
    for marker in [" ORDER BY ", " LIMIT ", " INCLUDE "] {
        if let Some(idx) = find_outside_quotes(after_from, marker) {
            end = end.min(idx);
        }
    }
    format!("SELECT COUNT(o) FROM {}", &after_from[..end])
}

/// Find the first occurrence of `marker` in `haystack` that isn't inside a
/// single-quoted string literal, so a user-supplied filter value containing
/// e.g. `" LIMIT "` can't fool the COUNT-query truncation above.
/// `quote_literal` escapes embedded quotes by doubling them (`''`); two
/// adjacent quote characters toggle the in-literal state twice, netting no
/// change, so a plain per-quote toggle already handles the escape correctly.
fn find_outside_quotes(haystack: &str, marker: &str) -> Option<usize> {
    let mut in_quote = false;
    let mut idx = 0;
    let bytes = haystack.as_bytes();
    while idx < bytes.len() {
        if bytes[idx] == b'\'' {
            in_quote = !in_quote;
        } else if !in_quote && haystack[idx..].starts_with(marker) {
            return Some(idx);
        }
        idx += 1;
    }
    None
}

/// Borrow a session, run `op`, and release it on every exit path. On
/// `SessionExpired`, invalidate the stale session and retry once with a
/// freshly borrowed one, per the `Issued -> Active -> (Refreshing ->
/// Active)* -> Expired` state machine.
async fn run_with_session<T, F, Fut>(state: &Arc<AppState>, op: F) -> Result<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let guard = state.pool.borrow().await.map_err(Error::from)?;
    let session_id = guard.session_id().to_string();

    match op(session_id).await {
        Ok(value) => {
            state.pool.release(guard);
            Ok(value)
        }
        Err(Error::SessionExpired) => {
            warn!("session expired, retrying with a fresh session");
            state.pool.invalidate(guard).await;
            let guard = state.pool.borrow().await.map_err(Error::from)?;
            let session_id = guard.session_id().to_string();
            let result = op(session_id).await;
            state.pool.release(guard);
            result
        }
        Err(e) => {
            state.pool.release(guard);
            Err(e)
        }
    }
}

async fn execute_rows(state: &Arc<AppState>, root: &str, filter: &Filter) -> Result<Vec<Value>> {
    let rendered = CatalogueQueryBuilder.build(root, filter)?;
    let catalogue = state.catalogue.clone();
    run_with_session(state, move |session_id| {
        let catalogue = catalogue.clone();
        let query = rendered.query.clone();
        async move { catalogue.search(&session_id, &query).await }
    })
    .await
}

async fn execute_count(state: &Arc<AppState>, root: &str, filter: &Filter) -> Result<i64> {
    let rendered = CatalogueQueryBuilder.build(root, filter)?;
    let count_query = to_count_query(&rendered.query);
    let catalogue = state.catalogue.clone();
    run_with_session(state, move |session_id| {
        let catalogue = catalogue.clone();
        let query = count_query.clone();
        async move { catalogue.count(&session_id, &query).await }
    })
    .await
}

// ============================================================================
// DataGateway API
// ============================================================================

async fn handle_data_gateway(
    state: &Arc<AppState>,
    method: &Method,
    segments: &[&str],
    query: &HashMap<String, String>,
    body: &[u8],
) -> Result<Response> {
    let route = routes::match_data_gateway(method, segments)?;

    match route {
        DataGatewayRoute::List { entity } => {
            let root = routes::data_gateway_entity_name(&entity)?;
            let filter = build_filter(query)?;
            let rows = execute_rows(state, root, &filter).await?;
            Ok(json_response(StatusCode::OK, &rows))
        }
        DataGatewayRoute::Get { entity, id } => {
            let root = routes::data_gateway_entity_name(&entity)?;
            let filter = with_where_id(build_filter(query)?, &id);
            let rows = execute_rows(state, root, &filter).await?;
            match rows.into_iter().next() {
                Some(row) => Ok(json_response(StatusCode::OK, &row)),
                None => Err(Error::NotFound(format!("{root} {id} not found"))),
            }
        }
        DataGatewayRoute::FindOne { entity } => {
            let root = routes::data_gateway_entity_name(&entity)?;
            let mut filter = build_filter(query)?;
            filter.limit = Some(1);
            let rows = execute_rows(state, root, &filter).await?;
            match rows.into_iter().next() {
                Some(row) => Ok(json_response(StatusCode::OK, &row)),
                None => Err(Error::NotFound(format!("no {root} matched"))),
            }
        }
        DataGatewayRoute::Count { entity } => {
            let root = routes::data_gateway_entity_name(&entity)?;
            let filter = build_filter(query)?;
            let count = execute_count(state, root, &filter).await?;
            Ok(json_response(StatusCode::OK, &count))
        }
        DataGatewayRoute::Create { entity } => {
            let root = routes::data_gateway_entity_name(&entity)?;
            let payload = parse_body(body)?;
            let catalogue = state.catalogue.clone();
            let root = root.to_string();
            let created = run_with_session(state, move |session_id| {
                let catalogue = catalogue.clone();
                let root = root.clone();
                let payload = payload.clone();
                async move { catalogue.create(&session_id, &root, &payload).await }
            })
            .await?;
            Ok(json_response(StatusCode::CREATED, &created))
        }
        DataGatewayRoute::Update { entity } => {
            let root = routes::data_gateway_entity_name(&entity)?;
            let payload = parse_body(body)?;
            let catalogue = state.catalogue.clone();
            let root = root.to_string();
            run_with_session(state, move |session_id| {
                let catalogue = catalogue.clone();
                let root = root.clone();
                let payload = payload.clone();
                async move { catalogue.update(&session_id, &root, &payload).await }
            })
            .await?;
            Ok(empty_response(StatusCode::NO_CONTENT))
        }
        DataGatewayRoute::Delete { entity, id } => {
            let root = routes::data_gateway_entity_name(&entity)?;
            let catalogue = state.catalogue.clone();
            let root = root.to_string();
            run_with_session(state, move |session_id| {
                let catalogue = catalogue.clone();
                let root = root.clone();
                let id = id.clone();
                async move { catalogue.delete(&session_id, &root, &id).await }
            })
            .await?;
            Ok(empty_response(StatusCode::NO_CONTENT))
        }
    }
}

fn parse_body(body: &[u8]) -> Result<Value> {
    if body.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| Error::bad_filter("body", format!("invalid JSON: {e}")))
}

// ============================================================================
// Search API
// ============================================================================

async fn handle_search(
    state: &Arc<AppState>,
    method: &Method,
    segments: &[&str],
    query: &HashMap<String, String>,
) -> Result<Response> {
    let route = routes::match_search(method, segments)?;

    match route {
        SearchRoute::List { entity } => {
            let key = routes::search_entity_name(&entity)?;
            let mapping_entity = state.mapping.entity(key)?;
            let search_filter = build_filter(query)?;
            let catalogue_filter = rewrite_filter(&state.mapping, mapping_entity, &search_filter)?;
            let rows = execute_rows(state, &mapping_entity.catalogue_entity, &catalogue_filter).await?;
            let reshaped = reshape_rows(state, mapping_entity, &rows, &search_filter)?;
            Ok(json_response(StatusCode::OK, &reshaped))
        }
        SearchRoute::GetByPid { entity, pid } => {
            let key = routes::search_entity_name(&entity)?;
            let mapping_entity = state.mapping.entity(key)?;
            let search_filter = build_filter(query)?;
            let mut catalogue_filter = rewrite_filter(&state.mapping, mapping_entity, &search_filter)?;
            catalogue_filter = with_where_eq(catalogue_filter, "pid", &pid);
            let rows = execute_rows(state, &mapping_entity.catalogue_entity, &catalogue_filter).await?;
            let reshaped = reshape_rows(state, mapping_entity, &rows, &search_filter)?;
            match reshaped.into_iter().next() {
                Some(row) => Ok(json_response(StatusCode::OK, &row)),
                None => Err(Error::NotFound(format!("{entity} {pid} not found"))),
            }
        }
        SearchRoute::Count { entity } => {
            let key = routes::search_entity_name(&entity)?;
            let mapping_entity = state.mapping.entity(key)?;
            let search_filter = build_filter(query)?;
            let catalogue_filter = rewrite_filter(&state.mapping, mapping_entity, &search_filter)?;
            let count = execute_count(state, &mapping_entity.catalogue_entity, &catalogue_filter).await?;
            Ok(json_response(StatusCode::OK, &count))
        }
        SearchRoute::DatasetFiles { pid } => {
            let mapping_entity = state.mapping.entity("file")?;
            let search_filter = build_filter(query)?;
            let catalogue_filter = rewrite_filter(&state.mapping, mapping_entity, &search_filter)?;
            let catalogue_filter = with_dataset_pid_filter(catalogue_filter, &pid);
            let rows = execute_rows(state, &mapping_entity.catalogue_entity, &catalogue_filter).await?;
            let reshaped = reshape_rows(state, mapping_entity, &rows, &search_filter)?;
            Ok(json_response(StatusCode::OK, &reshaped))
        }
        SearchRoute::DatasetFilesCount { pid } => {
            let mapping_entity = state.mapping.entity("file")?;
            let search_filter = build_filter(query)?;
            let catalogue_filter = rewrite_filter(&state.mapping, mapping_entity, &search_filter)?;
            let catalogue_filter = with_dataset_pid_filter(catalogue_filter, &pid);
            let count = execute_count(state, &mapping_entity.catalogue_entity, &catalogue_filter).await?;
            Ok(json_response(StatusCode::OK, &count))
        }
    }
}

fn reshape_rows(
    state: &Arc<AppState>,
    mapping_entity: &EntityMapping,
    rows: &[Value],
    search_filter: &Filter,
) -> Result<Vec<Value>> {
    let includes: Vec<String> = search_filter.include.iter().map(|i| i.relation.clone()).collect();
    rows.iter()
        .map(|row| reshape_row(&state.mapping, mapping_entity, row, &includes))
        .collect::<Result<Vec<_>>>()
        .map(|opts| opts.into_iter().flatten().collect())
}

// ============================================================================
// Response helpers
// ============================================================================

fn json_response<T: serde::Serialize>(status: StatusCode, value: &T) -> Response {
    let body = serde_json::to_vec(value).unwrap_or_default();
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn empty_response(status: StatusCode) -> Response {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn error_response(error: Error) -> Response {
    let status = error.status_code();
    let body = serde_json::to_vec(&error.to_json()).unwrap_or_default();
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
        .into_response()
}
