//! Little-endian integer decoding for bundle index and header fields.
//!
//! Compact cache bundles store offsets and lengths as little-endian unsigned
//! integers of unusual widths: 5-byte offsets in `.bundlx` indexes, 4-byte
//! lengths in front of each tile, and 8-byte index entries in 10.3+ bundles.

use crate::error::CacheError;

/// Width of a V1 `.bundlx` index entry.
pub const V1_INDEX_ENTRY_WIDTH: usize = 5;

/// Width of a tile length prefix.
pub const TILE_LENGTH_WIDTH: usize = 4;

/// Width of a V3 embedded index entry.
pub const V3_INDEX_ENTRY_WIDTH: usize = 8;

/// Decode a little-endian unsigned integer of `width` bytes.
///
/// Bytes are consumed low-order first; the result is zero-extended to 64
/// bits. Only the first `width` bytes of `bytes` are read. Widths outside
/// `1..=8` are rejected as `InvalidMetadata` since they cannot fit a `u64`.
///
/// # Errors
///
/// Returns `CacheError::Truncated` if `bytes` is shorter than `width`.
#[inline]
pub fn read_uint_le(bytes: &[u8], width: usize) -> Result<u64, CacheError> {
    if width == 0 || width > 8 {
        return Err(CacheError::InvalidMetadata {
            message: format!("integer width {} is outside 1..=8", width),
        });
    }
    if bytes.len() < width {
        return Err(CacheError::Truncated {
            source_id: "buffer".to_string(),
            offset: 0,
            expected: width as u64,
            actual: bytes.len() as u64,
        });
    }

    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(&bytes[..width]);
    Ok(u64::from_le_bytes(buf))
}

/// Decode a 3-byte little-endian integer.
#[inline]
pub fn read_u24_le(bytes: &[u8]) -> Result<u64, CacheError> {
    read_uint_le(bytes, 3)
}

/// Decode a 4-byte little-endian integer.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> Result<u64, CacheError> {
    read_uint_le(bytes, 4)
}

/// Decode a 5-byte (40-bit) little-endian integer.
#[inline]
pub fn read_u40_le(bytes: &[u8]) -> Result<u64, CacheError> {
    read_uint_le(bytes, 5)
}

/// Decode an 8-byte little-endian integer.
#[inline]
pub fn read_u64_le(bytes: &[u8]) -> Result<u64, CacheError> {
    read_uint_le(bytes, 8)
}
