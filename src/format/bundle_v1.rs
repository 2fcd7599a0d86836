//! Reader for 10.1 / 10.2 compact bundles.
//!
//! Each N×N block is stored as two files:
//!
//! ```text
//! <stem>.bundlx                          <stem>.bundle
//! ┌──────────────────────┐               ┌──────────────────────┐
//! │ header (16 bytes)    │               │ header               │
//! ├──────────────────────┤               ├──────────────────────┤
//! │ record 0: u40 offset ├──────────────►│ u32 length │ image   │
//! │ record 1: u40 offset │               │ u32 length │ image   │
//! │ ...  (N² entries)    │               │ ...                  │
//! ├──────────────────────┤               └──────────────────────┘
//! │ trailer (16 bytes)   │
//! └──────────────────────┘
//! ```
//!
//! Records are numbered column-major within the block.

use bytes::Bytes;

use crate::error::CacheError;
use crate::io::codec::{TILE_LENGTH_WIDTH, V1_INDEX_ENTRY_WIDTH};
use crate::io::{read_u32_le, read_u40_le, FileRangeReader, RangeReader};

use super::bundle_path::BundleAddress;

/// Size of the `.bundlx` header preceding the offset table.
pub const BUNDLX_HEADER_SIZE: u64 = 16;

/// Size of the `.bundlx` trailer following the offset table.
pub const BUNDLX_TRAILER_SIZE: u64 = 16;

/// Byte offset of a record's entry in the `.bundlx` index.
#[inline]
pub fn bundlx_entry_offset(record_number: u64) -> u64 {
    BUNDLX_HEADER_SIZE + V1_INDEX_ENTRY_WIDTH as u64 * record_number
}

/// Read the `.bundle` offset of a record from a `.bundlx` index.
pub fn read_image_offset<R: RangeReader + ?Sized>(
    index: &R,
    record_number: u64,
) -> Result<u64, CacheError> {
    let entry = index.read_exact_at(bundlx_entry_offset(record_number), V1_INDEX_ENTRY_WIDTH)?;
    read_u40_le(&entry)
}

/// Read the length-prefixed image stored at `image_offset` in a `.bundle`.
///
/// A zero length is a hole and yields an empty payload.
pub fn read_length_prefixed<R: RangeReader + ?Sized>(
    bundle: &R,
    image_offset: u64,
) -> Result<Bytes, CacheError> {
    let prefix = bundle.read_exact_at(image_offset, TILE_LENGTH_WIDTH)?;
    let image_length = read_u32_le(&prefix)?;
    if image_length == 0 {
        return Ok(Bytes::new());
    }

    let data_offset = image_offset + TILE_LENGTH_WIDTH as u64;
    bundle.read_exact_at(data_offset, image_length as usize)
}

/// Read a record from an opened `.bundlx` / `.bundle` pair.
pub fn read_record<I, B>(index: &I, bundle: &B, record_number: u64) -> Result<Bytes, CacheError>
where
    I: RangeReader + ?Sized,
    B: RangeReader + ?Sized,
{
    let image_offset = read_image_offset(index, record_number)?;
    read_length_prefixed(bundle, image_offset)
}

/// Read the tile at `address` from disk.
///
/// Both files are opened for the duration of the call only. If either file
/// of the pair does not exist the tile is missing and the payload is empty.
pub fn read_tile(address: &BundleAddress) -> Result<Bytes, CacheError> {
    let Some(index) = FileRangeReader::open(address.bundlx_path())? else {
        return Ok(Bytes::new());
    };
    let image_offset = read_image_offset(&index, address.record_number)?;
    drop(index);

    let Some(bundle) = FileRangeReader::open(address.bundle_path())? else {
        return Ok(Bytes::new());
    };
    read_length_prefixed(&bundle, image_offset)
}
