//! Bundle addressing: from `(level, row, col)` to a bundle file and record.
//!
//! Tiles are grouped into N×N blocks (N = packet size). Each block lives in
//! one bundle under `_alllayers/`, named after its level and the row/column
//! of its top-left tile:
//!
//! ```text
//! <cache>/_alllayers/L02/R0080C0100.bundle
//!                     │    │    └─ block column origin, 4+ hex digits
//!                     │    └────── block row origin, 4+ hex digits
//!                     └─────────── level, 2+ decimal digits
//! ```
//!
//! Within the block, the record number orders tiles column-major for V1
//! caches and row-major for V3 caches.

use std::path::{Path, PathBuf};

use crate::error::CacheError;

use super::version::StorageDialect;

/// Directory under the cache root holding the per-level bundle folders.
pub const ALL_LAYERS_DIR: &str = "_alllayers";

/// Location of one tile inside a compact cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleAddress {
    /// Bundle path without extension
    pub stem: PathBuf,

    /// 0-based index of the tile within its N×N block
    pub record_number: u64,
}

impl BundleAddress {
    /// Path of the bundle data file (`<stem>.bundle`).
    pub fn bundle_path(&self) -> PathBuf {
        self.stem.with_extension("bundle")
    }

    /// Path of the V1 index file (`<stem>.bundlx`).
    pub fn bundlx_path(&self) -> PathBuf {
        self.stem.with_extension("bundlx")
    }
}

/// File stem of the bundle block with the given origin, relative to `_alllayers/`.
///
/// Hex fields widen past four digits rather than truncating.
pub fn bundle_file_stem(level: u64, row_block: u64, col_block: u64) -> String {
    format!("L{:02}/R{:04X}C{:04X}", level, row_block, col_block)
}

/// Compute the bundle stem and record number for a tile.
///
/// # Errors
///
/// Returns `InvalidMetadata` for a zero packet size and
/// `InvalidTileCoordinate` if the record number falls outside `[0, N²)`.
pub fn compute_address(
    cache_dir: &Path,
    packet_size: u64,
    dialect: StorageDialect,
    level: u64,
    row: u64,
    col: u64,
) -> Result<BundleAddress, CacheError> {
    if packet_size == 0 {
        return Err(CacheError::InvalidMetadata {
            message: "PacketSize must be at least 1".to_string(),
        });
    }

    let row_block = (row / packet_size) * packet_size;
    let col_block = (col / packet_size) * packet_size;
    let row_in_block = row - row_block;
    let col_in_block = col - col_block;

    let record_number = match dialect {
        StorageDialect::V1 => packet_size
            .checked_mul(col_in_block)
            .and_then(|r| r.checked_add(row_in_block)),
        StorageDialect::V3 => packet_size
            .checked_mul(row_in_block)
            .and_then(|r| r.checked_add(col_in_block)),
    };

    let record_number = match (record_number, packet_size.checked_mul(packet_size)) {
        (Some(record), Some(records_per_bundle)) if record < records_per_bundle => record,
        _ => return Err(CacheError::InvalidTileCoordinate { level, row, col }),
    };

    let stem = cache_dir
        .join(ALL_LAYERS_DIR)
        .join(bundle_file_stem(level, row_block, col_block));

    Ok(BundleAddress {
        stem,
        record_number,
    })
}
