//! CacheReader trait for version-agnostic cache access.
//!
//! Implemented by the V1 and V3 caches and by [`CompactCache`](super::CompactCache),
//! which dispatches to whichever one the declared version selected.

use bytes::Bytes;

use crate::error::CacheError;
use crate::format::CacheMetadata;

/// Read-only access to a compact cache.
///
/// Implementations hold only immutable metadata; every tile read opens and
/// closes its own bundle files, so a reader can be shared across threads and
/// called concurrently without coordination.
pub trait CacheReader: Send + Sync {
    /// Read the image bytes of a tile.
    ///
    /// A tile whose bundle is absent, or whose record is empty, yields an
    /// empty buffer rather than an error.
    ///
    /// # Errors
    ///
    /// - `InvalidTileCoordinate` if the coordinate maps outside its block
    /// - `Truncated` if a bundle is shorter than its index claims
    /// - `Io` on any other filesystem failure
    fn get_tile(&self, level: u64, row: u64, col: u64) -> Result<Bytes, CacheError>;

    /// Tile image format, lowercased (e.g. `png`, `jpeg`, `mixed`).
    fn tile_format(&self) -> String {
        self.metadata().tile_format_lowercase()
    }

    /// Render the MapServer capability document as JSON.
    ///
    /// `pretty` selects two-space indented output.
    fn mapserver_document(&self, pretty: bool) -> Result<String, CacheError> {
        crate::mapserver::MapServerDocument::from_metadata(self.metadata()).to_json(pretty)
    }

    /// Parsed metadata the reader was opened with.
    fn metadata(&self) -> &CacheMetadata;
}
