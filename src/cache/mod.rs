//! Cache facade over the two compact cache dialects.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           ServiceRegistry               │
//! │  (name → Arc<CompactCache>)             │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          CacheReader trait              │
//! │  get_tile / tile_format / mapserver_doc │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │    V1Cache      │    │      V3Cache        │
//! │ (10.1 / 10.2)   │    │   (10.3 and later)  │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! [`open_cache`] parses the metadata and picks the variant; nothing else in
//! the crate branches on the cache version.

mod compact;
mod reader;
mod registry;

pub use compact::{open_cache, CompactCache, V1Cache, V3Cache};
pub use reader::CacheReader;
pub use registry::ServiceRegistry;
