//! Low-level I/O for compact cache bundles: positional file reads and the
//! little-endian integer codec used by the bundle layouts.

pub mod codec;
mod range_reader;

pub use codec::{read_u24_le, read_u32_le, read_u40_le, read_u64_le, read_uint_le};
pub use range_reader::{FileRangeReader, RangeReader};

pub(crate) use range_reader::truncated;
