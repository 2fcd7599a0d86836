//! HTTP request handlers for the ArcGIS REST tile API.
//!
//! # Endpoints
//!
//! - `GET /` - Redirect to the services directory
//! - `GET /health` - Health check endpoint
//! - `GET /rest/services` - Services directory
//! - `GET /rest/services/{name}/MapServer` - MapServer document
//! - `GET /rest/services/{name}/MapServer/tile/{level}/{row}/{col}` - Serve a tile

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::cache::CacheReader;
use crate::error::{CacheError, TileError};
use crate::tile::{TileRequest, TileService};

use super::pages;

/// Where `/` redirects to.
pub const SERVICES_ROOT: &str = "/rest/services";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile service.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// The tile service for processing tile and document requests
    pub tile_service: Arc<TileService>,

    /// Cache-Control max-age in seconds for tiles and JSON documents
    pub cache_max_age: u32,
}

impl AppState {
    /// Create a new application state with the default max-age of one hour.
    pub fn new(tile_service: TileService) -> Self {
        Self::with_cache_max_age(tile_service, 3600)
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(tile_service: TileService, cache_max_age: u32) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            cache_max_age,
        }
    }

    fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age)
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/rest/services/{name}/MapServer/tile/{level}/{row}/{col}`
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    /// Service name
    pub name: String,

    /// Level ID
    pub level: u64,

    /// Tile row
    pub row: u64,

    /// Tile column
    pub col: u64,
}

/// Query parameters shared by the directory and MapServer endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FormatQueryParams {
    /// Response format (`html`, `json`, `pjson`, `jsapi`)
    #[serde(default)]
    pub f: Option<String>,

    /// JSONP callback wrapping JSON responses
    #[serde(default)]
    pub callback: Option<String>,
}

/// Response format selected by the `f` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Html,
    Json,
    PrettyJson,
    JsApi,
}

impl ResponseFormat {
    /// Parse the `f` parameter, trimmed and case-insensitive.
    ///
    /// A missing or empty value selects HTML. `jsapi` is only accepted where
    /// `allow_jsapi` is set.
    pub fn parse(f: Option<&str>, allow_jsapi: bool) -> Result<Self, TileError> {
        let value = f.map(|f| f.trim().to_ascii_lowercase()).unwrap_or_default();
        match value.as_str() {
            "" | "html" => Ok(ResponseFormat::Html),
            "json" => Ok(ResponseFormat::Json),
            "pjson" => Ok(ResponseFormat::PrettyJson),
            "jsapi" if allow_jsapi => Ok(ResponseFormat::JsApi),
            _ => Err(TileError::UnsupportedFormat {
                format: f.unwrap_or_default().to_string(),
            }),
        }
    }

    fn is_pretty(self) -> bool {
        self == ResponseFormat::PrettyJson
    }
}

/// Validate a JSONP callback.
///
/// Returns `None` for a missing or blank callback. Anything other than a
/// dotted JavaScript identifier path (`[A-Za-z_$][A-Za-z0-9_$.]*`) is
/// rejected.
pub fn validate_callback(callback: Option<&str>) -> Result<Option<&str>, TileError> {
    let callback = match callback.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(callback) => callback,
    };

    let mut chars = callback.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.');

    if valid_start && valid_rest {
        Ok(Some(callback))
    } else {
        Err(TileError::InvalidCallback {
            callback: callback.to_string(),
        })
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_request")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Number of registered services
    pub services: usize,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// This implementation logs errors appropriately based on their severity:
/// - 404 at DEBUG level (common and expected)
/// - other 4xx errors at WARN level (client errors)
/// - 5xx errors at ERROR level (server errors)
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileError::ServiceNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),

            TileError::UnsupportedFormat { .. } => (StatusCode::BAD_REQUEST, "invalid_format"),
            TileError::InvalidCallback { .. } => (StatusCode::BAD_REQUEST, "invalid_callback"),
            TileError::Cache(CacheError::InvalidTileCoordinate { .. }) => {
                (StatusCode::BAD_REQUEST, "invalid_tile_coordinate")
            }

            TileError::Cache(
                CacheError::UnsupportedCacheVersion { .. }
                | CacheError::UnsupportedStorageFormat { .. },
            ) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_cache"),

            TileError::Cache(CacheError::Truncated { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "truncated_bundle")
            }
            TileError::Cache(CacheError::Io { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "io_error")
            }
            TileError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "cache_error"),
            TileError::TaskFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        let message = self.to_string();

        // Log errors based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Wrapper for handler errors to implement IntoResponse.
pub struct HandlerError(pub TileError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<TileError> for HandlerError {
    fn from(err: TileError) -> Self {
        HandlerError(err)
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Build a JSON response, wrapped as `callback(json);` when a callback is set.
fn json_response(body: String, callback: Option<&str>, cache_control: String) -> Response {
    let (content_type, body) = match callback {
        Some(callback) => ("application/javascript", format!("{}({});", callback, body)),
        None => ("application/json", body),
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CACHE_CONTROL, cache_control),
        ],
        body,
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Redirect the root to the services directory.
///
/// # Endpoint
///
/// `GET /`
pub async fn root_handler() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, SERVICES_ROOT)]).into_response()
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "services": 2
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: state.tile_service.registry().len(),
    })
}

/// Handle services directory requests.
///
/// # Endpoint
///
/// `GET /rest/services`
///
/// # Query Parameters
///
/// - `f`: `html` (default), `json` or `pjson`
/// - `callback`: JSONP callback for JSON responses
///
/// # Response
///
/// - `200 OK`: HTML listing, or the directory JSON document
/// - `400 Bad Request`: Unsupported `f` or invalid callback
pub async fn services_directory_handler(
    State(state): State<AppState>,
    Query(query): Query<FormatQueryParams>,
) -> Result<Response, HandlerError> {
    let format = ResponseFormat::parse(query.f.as_deref(), false)?;
    let callback = validate_callback(query.callback.as_deref())?;

    match format {
        ResponseFormat::Html => {
            let registry = state.tile_service.registry();
            Ok(Html(pages::services_directory_html(registry.names())).into_response())
        }
        _ => {
            let body = state.tile_service.services_directory(format.is_pretty())?;
            Ok(json_response(body, callback, state.cache_control()))
        }
    }
}

/// Handle MapServer document requests.
///
/// # Endpoint
///
/// `GET /rest/services/{name}/MapServer`
///
/// # Query Parameters
///
/// - `f`: `html` (default), `json`, `pjson` or `jsapi`
/// - `callback`: JSONP callback for JSON responses
///
/// # Response
///
/// - `200 OK`: HTML summary, MapServer JSON document, or JS API preview page
/// - `400 Bad Request`: Unsupported `f` or invalid callback
/// - `404 Not Found`: No service with this name
pub async fn mapserver_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<FormatQueryParams>,
) -> Result<Response, HandlerError> {
    let cache = state.tile_service.service(&name)?;
    let format = ResponseFormat::parse(query.f.as_deref(), true)?;
    let callback = validate_callback(query.callback.as_deref())?;

    match format {
        ResponseFormat::Html => {
            Ok(Html(pages::mapserver_html(&name, cache.metadata())).into_response())
        }
        ResponseFormat::JsApi => Ok(Html(pages::jsapi_html(&name)).into_response()),
        ResponseFormat::Json | ResponseFormat::PrettyJson => {
            let body = cache
                .mapserver_document(format.is_pretty())
                .map_err(TileError::from)?;
            Ok(json_response(body, callback, state.cache_control()))
        }
    }
}

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /rest/services/{name}/MapServer/tile/{level}/{row}/{col}`
///
/// # Response
///
/// - `200 OK`: Tile bytes as stored, with a content type from the cache format
/// - `400 Bad Request`: Coordinate outside its bundle block
/// - `404 Not Found`: Unknown service, or no tile at this coordinate (empty body)
/// - `500 Internal Server Error`: Truncated bundle or I/O failure
///
/// # Headers
///
/// - `Content-Type: image/png`, `image/jpeg`, ...
/// - `Cache-Control: public, max-age={cache_max_age}`
pub async fn tile_handler(
    State(state): State<AppState>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, HandlerError> {
    let request = TileRequest::new(params.name, params.level, params.row, params.col);
    let response = state.tile_service.get_tile(request).await?;

    if response.is_missing() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, response.content_type),
            (header::CACHE_CONTROL, state.cache_control()),
        ],
        Body::from(response.data),
    )
        .into_response())
}

// =============================================================================
// Tests
// =============================================================================
