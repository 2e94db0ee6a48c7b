use crate::server_security::AuthToken;
use crate::service::{PsgcService, ServiceError};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, Response as HttpResponse, StatusCode, Uri},
    response::Response,
    routing::get,
    Router,
};
use psgc_graph::{EntityKind, RelationshipType};
use psgc_protocol::{serialize_json, ApiResponse, ErrorEnvelope, PageRequest, ResponseMeta};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

pub(crate) struct HttpState {
    pub(crate) service: PsgcService,
    pub(crate) auth_token: Option<AuthToken>,
}

type SharedState = Arc<HttpState>;
type Params = HashMap<String, String>;
type HttpResult = Result<Response, StatusCode>;

pub(crate) const ROUTES: &[&str] = &[
    "/health",
    "/regions",
    "/regions/:code/provinces",
    "/regions/:code/cities-municipalities",
    "/provinces/:code/cities-municipalities",
    "/cities-municipalities/:code/barangays",
    "/cities-municipalities/:code/sub-municipalities",
    "/search",
    "/hierarchy/:code",
    "/nodes/:code",
];

pub(crate) fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/regions", get(regions))
        .route("/regions/:code/provinces", get(region_provinces))
        .route(
            "/regions/:code/cities-municipalities",
            get(region_cities_municipalities),
        )
        .route(
            "/provinces/:code/cities-municipalities",
            get(province_cities_municipalities),
        )
        .route("/cities-municipalities/:code/barangays", get(barangays))
        .route(
            "/cities-municipalities/:code/sub-municipalities",
            get(sub_municipalities),
        )
        .route("/search", get(search))
        .route("/hierarchy/:code", get(hierarchy))
        .route("/nodes/:code", get(node))
        .fallback(unknown_route)
        .with_state(state)
}

async fn health(State(state): State<SharedState>, headers: HeaderMap) -> HttpResult {
    respond(&state, &headers, |service| Ok((service.health(), None)))
}

async fn regions(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> HttpResult {
    respond(&state, &headers, |service| {
        Ok((service.regions(page_request(&params)?)?, None))
    })
}

async fn region_provinces(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Query(params): Query<Params>,
) -> HttpResult {
    children(
        &state,
        &headers,
        &code,
        &params,
        EntityKind::Region,
        RelationshipType::HasProvince,
    )
}

async fn region_cities_municipalities(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Query(params): Query<Params>,
) -> HttpResult {
    children(
        &state,
        &headers,
        &code,
        &params,
        EntityKind::Region,
        RelationshipType::HasCityMunicipality,
    )
}

async fn province_cities_municipalities(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Query(params): Query<Params>,
) -> HttpResult {
    children(
        &state,
        &headers,
        &code,
        &params,
        EntityKind::Province,
        RelationshipType::HasCityMunicipality,
    )
}

async fn barangays(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Query(params): Query<Params>,
) -> HttpResult {
    children(
        &state,
        &headers,
        &code,
        &params,
        EntityKind::CityMunicipality,
        RelationshipType::HasBarangay,
    )
}

async fn sub_municipalities(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(code): Path<String>,
    Query(params): Query<Params>,
) -> HttpResult {
    children(
        &state,
        &headers,
        &code,
        &params,
        EntityKind::CityMunicipality,
        RelationshipType::HasSubmunicipality,
    )
}

async fn search(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> HttpResult {
    respond(&state, &headers, |service| {
        let page = page_request(&params)?;
        let query = params.get("q").map(String::as_str).unwrap_or_default();
        let kind = params.get("kind").map(String::as_str);
        Ok((service.search(query, kind, page)?, None))
    })
}

async fn hierarchy(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> HttpResult {
    respond(&state, &headers, |service| {
        let resolved = service.hierarchy(&code)?;
        Ok((resolved.path, Some(resolved.cached)))
    })
}

async fn node(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> HttpResult {
    respond(&state, &headers, |service| Ok((service.node(&code)?, None)))
}

async fn unknown_route(
    State(state): State<SharedState>,
    headers: HeaderMap,
    uri: Uri,
) -> HttpResult {
    let err = ServiceError::NotFound(format!("No route for {}", uri.path()));
    respond(&state, &headers, |_| Err::<((), Option<bool>), _>(err))
}

fn children(
    state: &HttpState,
    headers: &HeaderMap,
    code: &str,
    params: &Params,
    parent_kind: EntityKind,
    relationship: RelationshipType,
) -> HttpResult {
    respond(state, headers, |service| {
        let page = page_request(params)?;
        Ok((
            service.children(code, parent_kind, relationship, page)?,
            None,
        ))
    })
}

/// Authorize, run one read operation and wrap the outcome in the response envelope.
fn respond<T, F>(state: &HttpState, headers: &HeaderMap, run: F) -> HttpResult
where
    T: Serialize,
    F: FnOnce(&PsgcService) -> Result<(T, Option<bool>), ServiceError>,
{
    if let Some(token) = &state.auth_token {
        if !is_authorized(headers, token) {
            return build_response(
                StatusCode::UNAUTHORIZED,
                ApiResponse::error(unauthorized_envelope()),
            );
        }
    }

    let started = Instant::now();
    let outcome = run(&state.service);
    let mut meta = ResponseMeta {
        duration_ms: Some(started.elapsed().as_millis() as u64),
        cached: None,
    };

    match outcome {
        Ok((data, cached)) => {
            meta.cached = cached;
            let response = ApiResponse::ok(&data).map_err(|err| {
                log::error!("Failed to encode response: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            build_response(StatusCode::OK, response.with_meta(meta))
        }
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                log::warn!("Request failed: {err}");
            } else {
                log::debug!("Request rejected: {err}");
            }
            build_response(status, ApiResponse::error(err.envelope()).with_meta(meta))
        }
    }
}

fn page_request(params: &Params) -> Result<PageRequest, ServiceError> {
    Ok(PageRequest {
        limit: parse_usize(params, "limit")?,
        offset: parse_usize(params, "offset")?,
    })
}

fn parse_usize(params: &Params, key: &str) -> Result<Option<usize>, ServiceError> {
    params
        .get(key)
        .map(|raw| {
            raw.trim().parse::<usize>().map_err(|_| {
                ServiceError::InvalidRequest(format!(
                    "{key} must be a non-negative integer, got {raw:?}"
                ))
            })
        })
        .transpose()
}

pub(crate) fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ServiceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Unreachable(_) | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn is_authorized(headers: &HeaderMap, token: &AuthToken) -> bool {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    token.accepts(value)
}

fn unauthorized_envelope() -> ErrorEnvelope {
    ErrorEnvelope::new("unauthorized", "Missing or invalid bearer token").with_hint(
        "The server was started with PSGC_AUTH_TOKEN; include Authorization: Bearer <token>.",
    )
}

pub(crate) fn build_response(status: StatusCode, response: ApiResponse) -> HttpResult {
    let bytes = serialize_json(&response)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_bytes();

    let mut builder = HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json");

    if status == StatusCode::UNAUTHORIZED {
        builder = builder.header("www-authenticate", "Bearer");
    }

    Ok(builder
        .body(Body::from(bytes))
        .expect("valid HTTP response"))
}
