//! Reader for 10.3+ compact bundles.
//!
//! A single `.bundle` file holds a 64-byte header, an embedded index of N²
//! 8-byte entries, and the tile data:
//!
//! ```text
//! ┌─────────────────────────┐ 0
//! │ header (64 bytes)       │
//! ├─────────────────────────┤ 64
//! │ record 0: u64 entry     │──┐  low 32 bits = offset of image data
//! │ record 1: u64 entry     │  │
//! │ ...  (N² entries)       │  │
//! ├─────────────────────────┤  │
//! │ ...                     │  │
//! │ u32 length │ image      │◄─┘  length sits in the 4 bytes before the data
//! └─────────────────────────┘
//! ```
//!
//! Records are numbered row-major within the block.

use bytes::Bytes;

use crate::error::CacheError;
use crate::io::codec::{TILE_LENGTH_WIDTH, V3_INDEX_ENTRY_WIDTH};
use crate::io::{read_u32_le, FileRangeReader, RangeReader};

use super::bundle_path::BundleAddress;

/// Size of the bundle header preceding the embedded index.
pub const BUNDLE_HEADER_SIZE: u64 = 64;

/// Byte offset of a record's entry in the embedded index.
#[inline]
pub fn index_entry_offset(record_number: u64) -> u64 {
    BUNDLE_HEADER_SIZE + V3_INDEX_ENTRY_WIDTH as u64 * record_number
}

/// Read the image data offset of a record from the embedded index.
pub fn read_image_offset<R: RangeReader + ?Sized>(
    bundle: &R,
    record_number: u64,
) -> Result<u64, CacheError> {
    let entry = bundle.read_exact_at(index_entry_offset(record_number), V3_INDEX_ENTRY_WIDTH)?;
    read_u32_le(&entry)
}

/// Read a record from an opened bundle.
///
/// An index entry pointing below the length prefix (a record that was never
/// written) or a zero length yields an empty payload.
pub fn read_record<R: RangeReader + ?Sized>(
    bundle: &R,
    record_number: u64,
) -> Result<Bytes, CacheError> {
    let image_offset = read_image_offset(bundle, record_number)?;
    if image_offset < TILE_LENGTH_WIDTH as u64 {
        return Ok(Bytes::new());
    }

    let prefix = bundle.read_exact_at(image_offset - TILE_LENGTH_WIDTH as u64, TILE_LENGTH_WIDTH)?;
    let image_length = read_u32_le(&prefix)?;
    if image_length == 0 {
        return Ok(Bytes::new());
    }

    bundle.read_exact_at(image_offset, image_length as usize)
}

/// Read the tile at `address` from disk.
///
/// The bundle is opened for the duration of the call only. A missing bundle
/// means a missing tile and yields an empty payload.
pub fn read_tile(address: &BundleAddress) -> Result<Bytes, CacheError> {
    match FileRangeReader::open(address.bundle_path())? {
        Some(bundle) => read_record(&bundle, address.record_number),
        None => Ok(Bytes::new()),
    }
}
