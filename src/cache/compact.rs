use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::CacheError;
use crate::format::{bundle_v1, bundle_v3, compute_address, CacheMetadata, StorageDialect};

use super::reader::CacheReader;

// =============================================================================
// V1Cache
// =============================================================================

/// A 10.1 / 10.2 compact cache (`.bundle` + `.bundlx`, column-major records).
#[derive(Debug, Clone)]
pub struct V1Cache {
    root: PathBuf,
    metadata: CacheMetadata,
}

impl V1Cache {
    pub fn new(root: impl Into<PathBuf>, metadata: CacheMetadata) -> Self {
        Self {
            root: root.into(),
            metadata,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CacheReader for V1Cache {
    fn get_tile(&self, level: u64, row: u64, col: u64) -> Result<Bytes, CacheError> {
        let address = compute_address(
            &self.root,
            self.metadata.storage_packet_size,
            StorageDialect::V1,
            level,
            row,
            col,
        )?;
        debug!(
            bundle = %address.bundle_path().display(),
            record = address.record_number,
            "Reading V1 tile"
        );
        bundle_v1::read_tile(&address)
    }

    fn metadata(&self) -> &CacheMetadata {
        &self.metadata
    }
}

// =============================================================================
// V3Cache
// =============================================================================

/// A 10.3+ compact cache (single `.bundle`, row-major records).
#[derive(Debug, Clone)]
pub struct V3Cache {
    root: PathBuf,
    metadata: CacheMetadata,
}

impl V3Cache {
    pub fn new(root: impl Into<PathBuf>, metadata: CacheMetadata) -> Self {
        Self {
            root: root.into(),
            metadata,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CacheReader for V3Cache {
    fn get_tile(&self, level: u64, row: u64, col: u64) -> Result<Bytes, CacheError> {
        let address = compute_address(
            &self.root,
            self.metadata.storage_packet_size,
            StorageDialect::V3,
            level,
            row,
            col,
        )?;
        debug!(
            bundle = %address.bundle_path().display(),
            record = address.record_number,
            "Reading V3 tile"
        );
        bundle_v3::read_tile(&address)
    }

    fn metadata(&self) -> &CacheMetadata {
        &self.metadata
    }
}

// =============================================================================
// CompactCache
// =============================================================================

/// A compact cache of either dialect, as selected by [`open_cache`].
#[derive(Debug, Clone)]
pub enum CompactCache {
    V1(V1Cache),
    V3(V3Cache),
}

impl CompactCache {
    /// Bundle dialect of this cache.
    pub fn dialect(&self) -> StorageDialect {
        match self {
            CompactCache::V1(_) => StorageDialect::V1,
            CompactCache::V3(_) => StorageDialect::V3,
        }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        match self {
            CompactCache::V1(c) => c.root(),
            CompactCache::V3(c) => c.root(),
        }
    }
}

impl CacheReader for CompactCache {
    fn get_tile(&self, level: u64, row: u64, col: u64) -> Result<Bytes, CacheError> {
        match self {
            CompactCache::V1(c) => c.get_tile(level, row, col),
            CompactCache::V3(c) => c.get_tile(level, row, col),
        }
    }

    fn metadata(&self) -> &CacheMetadata {
        match self {
            CompactCache::V1(c) => c.metadata(),
            CompactCache::V3(c) => c.metadata(),
        }
    }
}

/// Open the compact cache rooted at `cache_dir`.
///
/// Parses `conf.xml` / `conf.cdi` and selects the reader from the declared
/// version. No bundle files are opened here.
///
/// # Errors
///
/// - `UnsupportedCacheVersion` for versions below 10.1
/// - any metadata error from [`parse_metadata`](crate::format::parse_metadata)
pub fn open_cache(cache_dir: impl AsRef<Path>) -> Result<CompactCache, CacheError> {
    let cache_dir = cache_dir.as_ref();
    let metadata = crate::format::parse_metadata(cache_dir)?;

    let cache = match metadata.dialect()? {
        StorageDialect::V1 => CompactCache::V1(V1Cache::new(cache_dir, metadata)),
        StorageDialect::V3 => CompactCache::V3(V3Cache::new(cache_dir, metadata)),
    };

    debug!(
        cache = %cache_dir.display(),
        version = %cache.metadata().declared_version,
        dialect = cache.dialect().name(),
        "Opened compact cache"
    );

    Ok(cache)
}
