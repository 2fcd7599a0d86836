//! Test utilities for integration tests.
//!
//! This module builds synthetic compact caches on disk: `conf.xml`,
//! `conf.cdi` and bundles in either the 10.1 or the 10.3+ layout.

use std::collections::BTreeMap;
use std::path::Path;

use axum::Router;
use tempfile::TempDir;

use basemap_server::{
    create_router, open_cache, CacheVersion, RouterConfig, ServiceRegistry, StorageDialect,
    TileService,
};

/// Two-level Web Mercator LOD table used unless a test overrides it.
pub const DEFAULT_LODS: &[(u64, f64, f64)] = &[
    (0, 591657527.0, 156543.03392800014),
    (1, 295828763.0, 78271.516963999937),
];

/// Size of the 10.1 bundle header the builder writes.
const V1_BUNDLE_HEADER_SIZE: usize = 60;

// =============================================================================
// Tile Payloads
// =============================================================================

/// A payload starting with the PNG signature, unique per `seed`.
pub fn png_tile(seed: u64) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
    data.extend_from_slice(&seed.to_le_bytes());
    data.extend_from_slice(b"IDAT");
    data
}

/// A payload starting with the JPEG SOI marker, unique per `seed`.
pub fn jpeg_tile(seed: u64) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend_from_slice(&seed.to_le_bytes());
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

// =============================================================================
// Cache Builder
// =============================================================================

/// Builder for a compact cache directory.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    version: String,
    packet_size: u64,
    tile_format: String,
    storage_format: String,
    lods: Vec<(u64, f64, f64)>,
    envelope: Option<[f64; 4]>,
    tiles: Vec<(u64, u64, u64, Vec<u8>)>,
}

impl CacheBuilder {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            packet_size: 128,
            tile_format: "PNG".to_string(),
            storage_format: "esriMapCacheStorageModeCompact".to_string(),
            lods: DEFAULT_LODS.to_vec(),
            envelope: Some([
                -20037508.342787,
                -20037508.342787,
                20037508.342787,
                20037508.342787,
            ]),
            tiles: Vec::new(),
        }
    }

    /// A 10.1 cache (`.bundle` + `.bundlx`).
    pub fn v1() -> Self {
        Self::new("10.1")
    }

    /// A 10.3 cache (single `.bundle`).
    pub fn v3() -> Self {
        Self::new("10.3")
    }

    pub fn packet_size(mut self, packet_size: u64) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn tile_format(mut self, format: &str) -> Self {
        self.tile_format = format.to_string();
        self
    }

    pub fn storage_format(mut self, format: &str) -> Self {
        self.storage_format = format.to_string();
        self
    }

    pub fn lods(mut self, lods: &[(u64, f64, f64)]) -> Self {
        self.lods = lods.to_vec();
        self
    }

    pub fn without_envelope(mut self) -> Self {
        self.envelope = None;
        self
    }

    pub fn tile(mut self, level: u64, row: u64, col: u64, data: impl Into<Vec<u8>>) -> Self {
        self.tiles.push((level, row, col, data.into()));
        self
    }

    /// Write the cache into a fresh temporary directory.
    pub fn build(&self) -> TempDir {
        let dir = tempfile::tempdir().expect("create temp dir");
        self.write_to(dir.path());
        dir
    }

    /// Write the cache into `dir`.
    pub fn write_to(&self, dir: &Path) {
        std::fs::write(dir.join("conf.xml"), self.conf_xml()).expect("write conf.xml");
        if let Some(envelope) = self.envelope {
            std::fs::write(dir.join("conf.cdi"), conf_cdi(envelope)).expect("write conf.cdi");
        }

        // Unsupported versions get metadata only
        let dialect = match CacheVersion::parse(&self.version).and_then(|v| v.dialect()) {
            Ok(dialect) => dialect,
            Err(_) => return,
        };

        for ((level, row_block, col_block), records) in self.blocks(dialect) {
            let level_dir = dir.join("_alllayers").join(format!("L{:02}", level));
            std::fs::create_dir_all(&level_dir).expect("create level dir");
            let stem = format!("R{:04X}C{:04X}", row_block, col_block);

            match dialect {
                StorageDialect::V1 => {
                    let (bundlx, bundle) = v1_bundle(self.packet_size, &records);
                    std::fs::write(level_dir.join(format!("{stem}.bundlx")), bundlx)
                        .expect("write bundlx");
                    std::fs::write(level_dir.join(format!("{stem}.bundle")), bundle)
                        .expect("write bundle");
                }
                StorageDialect::V3 => {
                    let bundle = v3_bundle(self.packet_size, &records);
                    std::fs::write(level_dir.join(format!("{stem}.bundle")), bundle)
                        .expect("write bundle");
                }
            }
        }
    }

    /// Group tiles by bundle block, keyed by record number within the block.
    fn blocks(
        &self,
        dialect: StorageDialect,
    ) -> BTreeMap<(u64, u64, u64), BTreeMap<u64, Vec<u8>>> {
        let n = self.packet_size;
        let mut blocks: BTreeMap<_, BTreeMap<_, _>> = BTreeMap::new();

        for (level, row, col, data) in &self.tiles {
            let (row_block, col_block) = ((row / n) * n, (col / n) * n);
            let (r, c) = (row - row_block, col - col_block);
            let record = match dialect {
                StorageDialect::V1 => n * c + r,
                StorageDialect::V3 => n * r + c,
            };
            blocks
                .entry((*level, row_block, col_block))
                .or_default()
                .insert(record, data.clone());
        }

        blocks
    }

    fn conf_xml(&self) -> String {
        let lods: String = self
            .lods
            .iter()
            .map(|(level, scale, resolution)| {
                format!(
                    "<LODInfo xsi:type='typens:LODInfo'><LevelID>{level}</LevelID><Scale>{scale}</Scale><Resolution>{resolution}</Resolution></LODInfo>\n"
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<CacheInfo xsi:type='typens:CacheInfo' xmlns:xsi='http://www.w3.org/2001/XMLSchema-instance' xmlns:xs='http://www.w3.org/2001/XMLSchema' xmlns:typens='http://www.esri.com/schemas/ArcGIS/{version}'>
<TileCacheInfo xsi:type='typens:TileCacheInfo'>
<SpatialReference xsi:type='typens:ProjectedCoordinateSystem'>
<WKT>PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere"]</WKT>
<WKID>102100</WKID>
<LatestWKID>3857</LatestWKID>
</SpatialReference>
<TileOrigin xsi:type='typens:PointN'><X>-20037508.342787001</X><Y>20037508.342787001</Y></TileOrigin>
<TileCols>256</TileCols>
<TileRows>256</TileRows>
<DPI>96</DPI>
<LODInfos xsi:type='typens:ArrayOfLODInfo'>
{lods}</LODInfos>
</TileCacheInfo>
<TileImageInfo xsi:type='typens:TileImageInfo'><CacheTileFormat>{format}</CacheTileFormat><CompressionQuality>0</CompressionQuality></TileImageInfo>
<CacheStorageInfo xsi:type='typens:CacheStorageInfo'><StorageFormat>{storage}</StorageFormat><PacketSize>{packet_size}</PacketSize></CacheStorageInfo>
</CacheInfo>
"#,
            version = self.version,
            format = self.tile_format,
            storage = self.storage_format,
            packet_size = self.packet_size,
        )
    }
}

fn conf_cdi([xmin, ymin, xmax, ymax]: [f64; 4]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<EnvelopeN xsi:type='typens:EnvelopeN' xmlns:xsi='http://www.w3.org/2001/XMLSchema-instance' xmlns:typens='http://www.esri.com/schemas/ArcGIS/10.1'>
<XMin>{xmin}</XMin><YMin>{ymin}</YMin><XMax>{xmax}</XMax><YMax>{ymax}</YMax>
</EnvelopeN>
"#
    )
}

// =============================================================================
// Bundle Encoders
// =============================================================================

/// Encode a 10.1 `.bundlx` / `.bundle` pair.
///
/// Empty records point at a shared zero-length prefix.
pub fn v1_bundle(packet_size: u64, records: &BTreeMap<u64, Vec<u8>>) -> (Vec<u8>, Vec<u8>) {
    let count = packet_size * packet_size;
    let mut bundle = vec![0u8; V1_BUNDLE_HEADER_SIZE];
    let empty_offset = bundle.len() as u64;
    bundle.extend_from_slice(&0u32.to_le_bytes());

    let mut bundlx = vec![0u8; 16];
    for record in 0..count {
        let offset = match records.get(&record) {
            Some(data) => {
                let offset = bundle.len() as u64;
                bundle.extend_from_slice(&(data.len() as u32).to_le_bytes());
                bundle.extend_from_slice(data);
                offset
            }
            None => empty_offset,
        };
        bundlx.extend_from_slice(&offset.to_le_bytes()[..5]);
    }
    bundlx.extend_from_slice(&[0u8; 16]);

    (bundlx, bundle)
}

/// Encode a 10.3+ `.bundle`.
///
/// Index entries carry the data offset in the low 40 bits and the size in
/// the high 24 bits; empty records are all zero.
pub fn v3_bundle(packet_size: u64, records: &BTreeMap<u64, Vec<u8>>) -> Vec<u8> {
    let count = (packet_size * packet_size) as usize;
    let mut bundle = vec![0u8; 64 + count * 8];

    for (record, data) in records {
        bundle.extend_from_slice(&(data.len() as u32).to_le_bytes());
        let offset = bundle.len() as u64;
        bundle.extend_from_slice(data);

        let entry = offset | ((data.len() as u64) << 40);
        let at = 64 + *record as usize * 8;
        bundle[at..at + 8].copy_from_slice(&entry.to_le_bytes());
    }

    bundle
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Build a router serving `caches` under the given names, tracing disabled.
pub fn router_for(caches: &[(&str, &Path)]) -> Router {
    router_with_config(caches, RouterConfig::new().with_tracing(false))
}

/// Build a router serving `caches` with a custom router configuration.
pub fn router_with_config(caches: &[(&str, &Path)], config: RouterConfig) -> Router {
    let mut registry = ServiceRegistry::new();
    for (name, path) in caches {
        let cache = open_cache(path).expect("open test cache");
        registry.insert(*name, cache).expect("register test cache");
    }
    create_router(TileService::new(registry), config)
}
