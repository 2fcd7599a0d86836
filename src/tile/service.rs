//! Tile Service for serving tiles from registered caches.
//!
//! The TileService is the entry point the HTTP layer uses. It:
//! - Resolves the service name against the registry
//! - Runs the blocking bundle read on tokio's blocking pool
//! - Attaches the content type for the payload
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                   TileService                     │
//! │   get_tile()                                      │
//! │   1. Look up service     3. Pick content type     │
//! │   2. Read on blocking pool                        │
//! └───────────┬──────────────────────────────────────┘
//!             │
//!             ▼
//!    ┌─────────────────┐      ┌──────────────────┐
//!    │ ServiceRegistry │ ───► │  CompactCache    │
//!    └─────────────────┘      └──────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::cache::{CacheReader, CompactCache, ServiceRegistry};
use crate::error::TileError;
use crate::mapserver::ServicesDirectory;

use super::content_type::tile_content_type;

// =============================================================================
// Tile Request
// =============================================================================

/// A request for a single tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    /// Service name as registered
    pub service: String,

    /// Level ID
    pub level: u64,

    /// Tile row (0 at the top of the tiling origin)
    pub row: u64,

    /// Tile column (0 at the left of the tiling origin)
    pub col: u64,
}

impl TileRequest {
    pub fn new(service: impl Into<String>, level: u64, row: u64, col: u64) -> Self {
        Self {
            service: service.into(),
            level,
            row,
            col,
        }
    }
}

// =============================================================================
// Tile Response
// =============================================================================

/// Response from the tile service.
#[derive(Debug, Clone)]
pub struct TileResponse {
    /// Image bytes exactly as stored in the bundle; empty for a missing tile
    pub data: Bytes,

    /// MIME type for `data`
    pub content_type: String,
}

impl TileResponse {
    /// Whether the cache holds no tile at the requested coordinate.
    pub fn is_missing(&self) -> bool {
        self.data.is_empty()
    }
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service for reading tiles and documents from registered caches.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Debug, Clone)]
pub struct TileService {
    registry: Arc<ServiceRegistry>,
}

impl TileService {
    pub fn new(registry: ServiceRegistry) -> Self {
        Self::with_shared_registry(Arc::new(registry))
    }

    /// Create a tile service over a registry shared with other components.
    pub fn with_shared_registry(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Look up a service, failing with `ServiceNotFound`.
    pub fn service(&self, name: &str) -> Result<Arc<CompactCache>, TileError> {
        self.registry
            .get(name)
            .ok_or_else(|| TileError::ServiceNotFound {
                name: name.to_string(),
            })
    }

    /// Read a tile.
    ///
    /// The bundle read runs on the blocking pool so file I/O never stalls the
    /// async executor. A missing tile comes back as an empty response.
    ///
    /// # Errors
    ///
    /// - `ServiceNotFound` if no service has the requested name
    /// - `Cache` for coordinate or read failures in the cache
    /// - `TaskFailed` if the blocking task panicked
    pub async fn get_tile(&self, request: TileRequest) -> Result<TileResponse, TileError> {
        let cache = self.service(&request.service)?;
        let format = cache.tile_format();

        let TileRequest {
            level, row, col, ..
        } = request;
        let data = tokio::task::spawn_blocking(move || cache.get_tile(level, row, col))
            .await
            .map_err(|e| TileError::TaskFailed {
                message: e.to_string(),
            })??;

        debug!(
            service = %request.service,
            level,
            row,
            col,
            bytes = data.len(),
            "Served tile"
        );

        let content_type = tile_content_type(&format, &data);
        Ok(TileResponse { data, content_type })
    }

    /// Render the MapServer document of a service.
    pub fn mapserver_document(&self, name: &str, pretty: bool) -> Result<String, TileError> {
        Ok(self.service(name)?.mapserver_document(pretty)?)
    }

    /// Render the services directory.
    pub fn services_directory(&self, pretty: bool) -> Result<String, TileError> {
        Ok(ServicesDirectory::from_names(self.registry.names()).to_json(pretty)?)
    }
}
