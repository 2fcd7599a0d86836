//! # Basemap Server
//!
//! A read-only tile server for ArcGIS compact caches.
//!
//! Exposes caches written by ArcGIS Server 10.1 and later through the ArcGIS
//! REST MapServer API, so web clients that speak that API can display the
//! tiles without an ArcGIS Server installation.
//!
//! ## Features
//!
//! - **Both compact formats**: 10.1 / 10.2 (`.bundle` + `.bundlx`) and 10.3+ (`.bundle` only)
//! - **Sparse caches**: absent bundles and empty records are missing tiles, not errors
//! - **No long-lived handles**: each tile read opens and closes its own bundle files
//! - **ArcGIS REST surface**: services directory, MapServer document, tiles, JSONP
//!
//! ## Architecture
//!
//! - [`io`] - Positional file reads and the little-endian byte codec
//! - [`mod@format`] - `conf.xml` / `conf.cdi` parsing, bundle addressing and bundle readers
//! - [`cache`] - Version-dispatching cache facade and the services registry
//! - [`mapserver`] - MapServer and services directory JSON documents
//! - [`tile`] - Tile service used by the HTTP layer
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration file
//!
//! ## Example
//!
//! ```rust,no_run
//! use basemap_server::{open_cache, CacheReader};
//!
//! let cache = open_cache("/data/caches/World/Layers")?;
//! let tile = cache.get_tile(2, 36, 28)?;
//! println!("{} bytes of {}", tile.len(), cache.tile_format());
//! # Ok::<(), basemap_server::CacheError>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod mapserver;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use cache::{open_cache, CacheReader, CompactCache, ServiceRegistry, V1Cache, V3Cache};
pub use config::{Cli, Config, FileConfig, ServiceConfig};
pub use error::{CacheError, ConfigError, RegistryError, TileError};
pub use format::{
    compute_address, parse_metadata, BundleAddress, CacheMetadata, CacheVersion, StorageDialect,
};
pub use io::{FileRangeReader, RangeReader};
pub use mapserver::{MapServerDocument, ServicesDirectory};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use tile::{TileRequest, TileResponse, TileService};
