//! Tile service layer.
//!
//! Sits between the HTTP handlers and the cache registry:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │   (lookup, blocking read, MIME type)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            ServiceRegistry              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Tiles are returned exactly as stored; there is no decoding, re-encoding
//! or in-process tile cache.

mod content_type;
mod service;

pub use content_type::{sniff_content_type, tile_content_type};
pub use service::{TileRequest, TileResponse, TileService};
