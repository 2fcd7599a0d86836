//! Declared cache versions and storage dialect selection.
//!
//! A compact cache declares the ArcGIS release that wrote it through the
//! schema namespace in `conf.xml` (`http://www.esri.com/schemas/ArcGIS/10.3`).
//! The version decides which bundle layout is on disk:
//!
//! | Version        | Dialect | Files                    |
//! |----------------|---------|--------------------------|
//! | < 10.1         | -       | unsupported              |
//! | 10.1, 10.2     | V1      | `.bundle` + `.bundlx`    |
//! | >= 10.3        | V3      | `.bundle` (index inside) |

use std::cmp::Ordering;
use std::fmt;

use crate::error::CacheError;

// =============================================================================
// CacheVersion
// =============================================================================

/// A dotted-decimal cache version such as `10.1` or `10.3.1`.
///
/// Segments compare numerically, so `10.10` sorts after `10.3`. Missing
/// trailing segments count as zero (`10.1 == 10.1.0`).
#[derive(Debug, Clone)]
pub struct CacheVersion {
    raw: String,
    segments: Vec<u64>,
}

impl CacheVersion {
    /// Parse a dotted-decimal version string.
    ///
    /// Anything that is not a non-empty sequence of `.`-separated integers is
    /// rejected as `UnsupportedCacheVersion`.
    pub fn parse(raw: &str) -> Result<Self, CacheError> {
        let trimmed = raw.trim();
        let segments = trimmed
            .split('.')
            .map(|s| s.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| CacheError::UnsupportedCacheVersion {
                version: raw.to_string(),
            })?;

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// Extract the version from a namespace URI, taking its last `/` segment.
    pub fn from_namespace(namespace: &str) -> Result<Self, CacheError> {
        let last = namespace
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        Self::parse(last)
    }

    /// The version as written in the metadata.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric segments of the version.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Pick the bundle layout for this version.
    pub fn dialect(&self) -> Result<StorageDialect, CacheError> {
        if *self < Self::from_segments(&[10, 1]) {
            Err(CacheError::UnsupportedCacheVersion {
                version: self.raw.clone(),
            })
        } else if *self < Self::from_segments(&[10, 3]) {
            Ok(StorageDialect::V1)
        } else {
            Ok(StorageDialect::V3)
        }
    }

    fn from_segments(segments: &[u64]) -> Self {
        Self {
            raw: segments
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join("."),
            segments: segments.to_vec(),
        }
    }
}

impl Ord for CacheVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| {
                let a = self.segments.get(i).copied().unwrap_or(0);
                let b = other.segments.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for CacheVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CacheVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CacheVersion {}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// =============================================================================
// StorageDialect
// =============================================================================

/// On-disk bundle layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDialect {
    /// 10.1 / 10.2: `.bundlx` index beside the `.bundle`, column-major records
    V1,

    /// 10.3+: index embedded in the `.bundle` header, row-major records
    V3,
}

impl StorageDialect {
    /// Get a human-readable name for the dialect.
    pub const fn name(&self) -> &'static str {
        match self {
            StorageDialect::V1 => "compact v1 (10.1-10.2)",
            StorageDialect::V3 => "compact v2 (10.3+)",
        }
    }
}
