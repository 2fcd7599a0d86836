//! HTTP server layer exposing compact caches through the ArcGIS REST API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   GET /rest/services/{name}/MapServer/tile/{level}/{row}/{col}  │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    pages    │  │        routes           │  │
//! │  │ (requests)  │  │   (HTML)    │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod pages;
pub mod routes;

pub use handlers::{
    health_handler, mapserver_handler, root_handler, services_directory_handler, tile_handler,
    validate_callback, AppState, ErrorResponse, FormatQueryParams, HealthResponse, ResponseFormat,
    TilePathParams,
};
pub use routes::{create_router, RouterConfig};
