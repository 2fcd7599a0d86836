//! Property tests over randomly placed tiles.
//!
//! Each case writes a small cache to disk, so case counts are kept low.

use std::path::Path;

use proptest::prelude::*;

use basemap_server::format::bundle_file_stem;
use basemap_server::{compute_address, open_cache, CacheReader, StorageDialect};

use super::test_utils::CacheBuilder;

fn dialect() -> impl Strategy<Value = StorageDialect> {
    prop_oneof![Just(StorageDialect::V1), Just(StorageDialect::V3)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A tile written at `(level, row, col)` reads back byte for byte, and
    /// its neighbour in the same block reads back empty.
    #[test]
    fn prop_tile_round_trip(
        dialect in dialect(),
        packet_size in 2u64..=16,
        level in 0u64..=20,
        row in 0u64..5000,
        col in 0u64..5000,
        payload in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let builder = match dialect {
            StorageDialect::V1 => CacheBuilder::v1(),
            StorageDialect::V3 => CacheBuilder::v3(),
        };
        let dir = builder
            .packet_size(packet_size)
            .tile(level, row, col, payload.clone())
            .build();
        let cache = open_cache(dir.path()).unwrap();

        let tile = cache.get_tile(level, row, col).unwrap();
        prop_assert_eq!(tile.as_ref(), payload.as_slice());

        let neighbour_col = if col % packet_size == 0 { col + 1 } else { col - 1 };
        prop_assert!(cache.get_tile(level, row, neighbour_col).unwrap().is_empty());
    }

    /// Record numbers stay inside the block and the two dialects are
    /// transposes of each other.
    #[test]
    fn prop_record_numbers_transpose(
        packet_size in 1u64..=256,
        row in any::<u32>(),
        col in any::<u32>(),
    ) {
        let (row, col) = (u64::from(row), u64::from(col));
        let root = Path::new("/cache");
        let v1 = compute_address(root, packet_size, StorageDialect::V1, 0, row, col).unwrap();
        let v3 = compute_address(root, packet_size, StorageDialect::V3, 0, row, col).unwrap();

        prop_assert!(v1.record_number < packet_size * packet_size);
        prop_assert!(v3.record_number < packet_size * packet_size);
        prop_assert_eq!(&v1.stem, &v3.stem);

        let (r, c) = (row % packet_size, col % packet_size);
        prop_assert_eq!(v1.record_number, packet_size * c + r);
        prop_assert_eq!(v3.record_number, packet_size * r + c);
    }

    /// Hex fields are at least four digits and never truncated.
    #[test]
    fn prop_bundle_stem_widens(level in 0u64..200, row_block in any::<u32>(), col_block in any::<u32>()) {
        let stem = bundle_file_stem(level, u64::from(row_block), u64::from(col_block));
        let (level_part, rest) = stem.split_once('/').unwrap();
        let (row_part, col_part) = rest[1..].split_once('C').unwrap();

        prop_assert!(level_part.len() >= 3);
        prop_assert_eq!(level_part[1..].parse::<u64>().unwrap(), level);
        prop_assert!(row_part.len() >= 4);
        prop_assert!(col_part.len() >= 4);
        prop_assert_eq!(u64::from_str_radix(row_part, 16).unwrap(), u64::from(row_block));
        prop_assert_eq!(u64::from_str_radix(col_part, 16).unwrap(), u64::from(col_block));
        prop_assert_eq!(rest.to_uppercase(), rest);
    }
}
