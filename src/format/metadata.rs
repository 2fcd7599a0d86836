//! Compact cache metadata parsing.
//!
//! A cache directory carries two XML documents next to `_alllayers/`:
//!
//! - `conf.xml`: the tiling scheme (`TileCacheInfo`), image settings
//!   (`TileImageInfo`) and storage layout (`CacheStorageInfo`). The root
//!   element declares the schema namespace whose last path segment is the
//!   ArcGIS version that wrote the cache.
//! - `conf.cdi`: the data envelope (`XMin`, `YMin`, `XMax`, `YMax`). Optional;
//!   a cache without it reports an all-zero envelope.
//!
//! # Example `conf.xml`
//!
//! ```xml
//! <CacheInfo xsi:type='typens:CacheInfo'
//!     xmlns:typens='http://www.esri.com/schemas/ArcGIS/10.1'>
//!   <TileCacheInfo>
//!     <SpatialReference><WKID>102100</WKID><LatestWKID>3857</LatestWKID></SpatialReference>
//!     <TileOrigin><X>-20037508.342787</X><Y>20037508.342787</Y></TileOrigin>
//!     <TileCols>256</TileCols><TileRows>256</TileRows><DPI>96</DPI>
//!     <LODInfos>
//!       <LODInfo><LevelID>0</LevelID><Scale>591657527.591555</Scale><Resolution>156543.033928</Resolution></LODInfo>
//!     </LODInfos>
//!   </TileCacheInfo>
//!   <TileImageInfo><CacheTileFormat>PNG</CacheTileFormat><CompressionQuality>0</CompressionQuality></TileImageInfo>
//!   <CacheStorageInfo><StorageFormat>esriMapCacheStorageModeCompact</StorageFormat><PacketSize>128</PacketSize></CacheStorageInfo>
//! </CacheInfo>
//! ```

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::warn;

use crate::error::CacheError;

use super::version::{CacheVersion, StorageDialect};

/// Name of the tiling scheme document inside a cache directory.
pub const CONF_XML: &str = "conf.xml";

/// Name of the envelope document inside a cache directory.
pub const CONF_CDI: &str = "conf.cdi";

/// Local name of the root attribute carrying the schema namespace.
const VERSION_ATTRIBUTE: &[u8] = b"typens";

// =============================================================================
// Public Metadata Types
// =============================================================================

/// World-space origin of the tiling scheme (upper-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TileOrigin {
    pub x: f64,
    pub y: f64,
}

/// Spatial reference of the cache.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpatialReference {
    /// Well-known ID as configured when the cache was built
    pub wkid: Option<i64>,

    /// Latest well-known ID for the same system (e.g. 3857 for 102100)
    pub latest_wkid: Option<i64>,

    /// Well-known text definition
    pub wkt: Option<String>,
}

/// One level of detail in the tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lod {
    pub level_id: u64,
    pub scale: f64,
    pub resolution: f64,
}

/// Axis-aligned data extent from `conf.cdi`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Envelope {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Non-fatal conditions noticed while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataWarning {
    /// `conf.cdi` is absent; the envelope is all zeros
    MissingEnvelope,
}

/// Parsed and validated description of a compact cache.
///
/// Immutable once constructed; shared by every tile read of the cache.
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    /// Version declared by the schema namespace in `conf.xml`
    pub declared_version: CacheVersion,

    /// Raw `StorageFormat` value, if present
    pub storage_format: Option<String>,

    /// Edge length N of the N×N tile block stored per bundle
    pub storage_packet_size: u64,

    /// Tile height in pixels
    pub tile_rows: u32,

    /// Tile width in pixels
    pub tile_cols: u32,

    pub dpi: u32,

    /// Tile image format exactly as written in `conf.xml` (e.g. `PNG`, `JPEG`, `MIXED`)
    pub tile_format: String,

    pub compression_quality: i64,

    pub tile_origin: TileOrigin,

    pub spatial_reference: SpatialReference,

    /// Levels of detail, strictly ascending by `level_id`
    pub lods: Vec<Lod>,

    pub envelope: Envelope,

    pub warnings: Vec<MetadataWarning>,
}

impl CacheMetadata {
    /// Tile format normalised to lowercase for content negotiation.
    pub fn tile_format_lowercase(&self) -> String {
        self.tile_format.to_lowercase()
    }

    /// Bundle layout implied by the declared version.
    pub fn dialect(&self) -> Result<StorageDialect, CacheError> {
        self.declared_version.dialect()
    }

    /// Look up a level of detail by its level ID.
    pub fn lod(&self, level_id: u64) -> Option<&Lod> {
        self.lods
            .binary_search_by_key(&level_id, |lod| lod.level_id)
            .ok()
            .map(|i| &self.lods[i])
    }

    /// Scale of the coarsest level.
    pub fn min_scale(&self) -> f64 {
        self.lods.first().map(|lod| lod.scale).unwrap_or_default()
    }

    /// Scale of the finest level.
    pub fn max_scale(&self) -> f64 {
        self.lods.last().map(|lod| lod.scale).unwrap_or_default()
    }

    /// Whether `conf.cdi` was present when the cache was opened.
    pub fn has_envelope(&self) -> bool {
        !self.warnings.contains(&MetadataWarning::MissingEnvelope)
    }
}

// =============================================================================
// Raw XML Schema
// =============================================================================
//
// Every element is optional at the serde level so that an absent element
// surfaces as `MissingField` naming it, while a present element with a bad
// value surfaces as `MalformedXml`.

#[derive(Debug, Deserialize)]
struct RawCacheInfo {
    #[serde(rename = "TileCacheInfo")]
    tile_cache_info: Option<RawTileCacheInfo>,
    #[serde(rename = "TileImageInfo")]
    tile_image_info: Option<RawTileImageInfo>,
    #[serde(rename = "CacheStorageInfo")]
    cache_storage_info: Option<RawCacheStorageInfo>,
}

#[derive(Debug, Deserialize)]
struct RawTileCacheInfo {
    #[serde(rename = "SpatialReference")]
    spatial_reference: Option<RawSpatialReference>,
    #[serde(rename = "TileOrigin")]
    tile_origin: Option<RawPoint>,
    #[serde(rename = "TileCols")]
    tile_cols: Option<u32>,
    #[serde(rename = "TileRows")]
    tile_rows: Option<u32>,
    #[serde(rename = "DPI")]
    dpi: Option<u32>,
    #[serde(rename = "LODInfos")]
    lod_infos: Option<RawLodInfos>,
}

#[derive(Debug, Deserialize)]
struct RawSpatialReference {
    #[serde(rename = "WKT")]
    wkt: Option<String>,
    #[serde(rename = "WKID")]
    wkid: Option<i64>,
    #[serde(rename = "LatestWKID")]
    latest_wkid: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    #[serde(rename = "X")]
    x: Option<f64>,
    #[serde(rename = "Y")]
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawLodInfos {
    #[serde(rename = "LODInfo", default)]
    lods: Vec<RawLodInfo>,
}

#[derive(Debug, Deserialize)]
struct RawLodInfo {
    #[serde(rename = "LevelID")]
    level_id: Option<u64>,
    #[serde(rename = "Scale")]
    scale: Option<f64>,
    #[serde(rename = "Resolution")]
    resolution: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawTileImageInfo {
    #[serde(rename = "CacheTileFormat")]
    cache_tile_format: Option<String>,
    #[serde(rename = "CompressionQuality")]
    compression_quality: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawCacheStorageInfo {
    #[serde(rename = "StorageFormat")]
    storage_format: Option<String>,
    #[serde(rename = "PacketSize")]
    packet_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "XMin")]
    xmin: Option<f64>,
    #[serde(rename = "YMin")]
    ymin: Option<f64>,
    #[serde(rename = "XMax")]
    xmax: Option<f64>,
    #[serde(rename = "YMax")]
    ymax: Option<f64>,
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse the metadata of the cache rooted at `cache_dir`.
///
/// Reads `conf.xml` (required) and `conf.cdi` (optional). A missing
/// `conf.cdi` is logged and recorded as [`MetadataWarning::MissingEnvelope`].
///
/// # Errors
///
/// - `Io` if `conf.xml` is absent or either file is unreadable
/// - `MalformedXml` if a document is not well-formed or a value has the wrong type
/// - `MissingField` if a required element is absent
/// - `UnsupportedCacheVersion` if the declared version is not dotted-decimal
/// - `UnsupportedStorageFormat` if the cache is exploded rather than compact
/// - `InvalidMetadata` if the packet size is zero or the LOD table is empty or unordered
pub fn parse_metadata(cache_dir: impl AsRef<Path>) -> Result<CacheMetadata, CacheError> {
    let cache_dir = cache_dir.as_ref();

    let conf_path = cache_dir.join(CONF_XML);
    let conf = read_document(&conf_path)?.ok_or_else(|| CacheError::Io {
        path: conf_path.display().to_string(),
        message: "file not found".to_string(),
    })?;
    let mut metadata = parse_conf_xml(&conf)?;

    let cdi_path = cache_dir.join(CONF_CDI);
    match read_document(&cdi_path)? {
        Some(cdi) => metadata.envelope = parse_conf_cdi(&cdi)?,
        None => {
            warn!(
                cache = %cache_dir.display(),
                "{} not found, reporting an empty extent", CONF_CDI
            );
            metadata.warnings.push(MetadataWarning::MissingEnvelope);
        }
    }

    Ok(metadata)
}

/// Read a metadata document, returning `None` if it does not exist.
fn read_document(path: &Path) -> Result<Option<String>, CacheError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let text = String::from_utf8(bytes).map_err(|e| CacheError::MalformedXml {
                file: path.display().to_string(),
                message: e.to_string(),
            })?;
            Ok(Some(text.trim_start_matches('\u{feff}').to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::io(path.display(), &e)),
    }
}

/// Parse the contents of a `conf.xml` document.
///
/// The envelope is left at zero; [`parse_metadata`] fills it from `conf.cdi`.
pub fn parse_conf_xml(xml: &str) -> Result<CacheMetadata, CacheError> {
    let namespace = root_attribute(xml, VERSION_ATTRIBUTE, CONF_XML)?.ok_or(
        CacheError::MissingField {
            file: CONF_XML.to_string(),
            field: "typens",
        },
    )?;
    let declared_version = CacheVersion::from_namespace(&namespace)?;

    let raw: RawCacheInfo = quick_xml::de::from_str(xml).map_err(|e| malformed(CONF_XML, e))?;

    let tile_cache_info = require(raw.tile_cache_info, "TileCacheInfo")?;
    let tile_image_info = require(raw.tile_image_info, "TileImageInfo")?;
    let storage_info = require(raw.cache_storage_info, "CacheStorageInfo")?;

    let raw_sr = require(tile_cache_info.spatial_reference, "SpatialReference")?;
    let spatial_reference = SpatialReference {
        wkid: raw_sr.wkid,
        latest_wkid: raw_sr.latest_wkid,
        wkt: raw_sr.wkt.filter(|wkt| !wkt.trim().is_empty()),
    };

    let raw_origin = require(tile_cache_info.tile_origin, "TileOrigin")?;
    let tile_origin = TileOrigin {
        x: require(raw_origin.x, "TileOrigin/X")?,
        y: require(raw_origin.y, "TileOrigin/Y")?,
    };

    let lods = require(tile_cache_info.lod_infos, "LODInfos")?
        .lods
        .into_iter()
        .map(|lod| {
            Ok(Lod {
                level_id: require(lod.level_id, "LODInfo/LevelID")?,
                scale: require(lod.scale, "LODInfo/Scale")?,
                resolution: require(lod.resolution, "LODInfo/Resolution")?,
            })
        })
        .collect::<Result<Vec<_>, CacheError>>()?;
    validate_lods(&lods)?;

    let storage_format = storage_info.storage_format;
    if let Some(ref format) = storage_format {
        if format.to_ascii_lowercase().contains("exploded") {
            return Err(CacheError::UnsupportedStorageFormat {
                format: format.clone(),
            });
        }
    }

    let storage_packet_size = require(storage_info.packet_size, "PacketSize")?;
    if storage_packet_size == 0 {
        return Err(CacheError::InvalidMetadata {
            message: "PacketSize must be at least 1".to_string(),
        });
    }

    let tile_format = require(tile_image_info.cache_tile_format, "CacheTileFormat")?
        .trim()
        .to_string();

    Ok(CacheMetadata {
        declared_version,
        storage_format,
        storage_packet_size,
        tile_rows: require(tile_cache_info.tile_rows, "TileRows")?,
        tile_cols: require(tile_cache_info.tile_cols, "TileCols")?,
        dpi: require(tile_cache_info.dpi, "DPI")?,
        tile_format,
        compression_quality: tile_image_info.compression_quality.unwrap_or(0),
        tile_origin,
        spatial_reference,
        lods,
        envelope: Envelope::default(),
        warnings: Vec::new(),
    })
}

/// Parse the contents of a `conf.cdi` document.
pub fn parse_conf_cdi(xml: &str) -> Result<Envelope, CacheError> {
    let raw: RawEnvelope = quick_xml::de::from_str(xml).map_err(|e| malformed(CONF_CDI, e))?;

    let field = |value: Option<f64>, name: &'static str| {
        value.ok_or(CacheError::MissingField {
            file: CONF_CDI.to_string(),
            field: name,
        })
    };

    Ok(Envelope {
        xmin: field(raw.xmin, "XMin")?,
        ymin: field(raw.ymin, "YMin")?,
        xmax: field(raw.xmax, "XMax")?,
        ymax: field(raw.ymax, "YMax")?,
    })
}

/// Find an attribute of the root element by local name (case-insensitive).
fn root_attribute(xml: &str, local_name: &[u8], file: &str) -> Result<Option<String>, CacheError> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                for attr in element.attributes() {
                    let attr = attr.map_err(|e| malformed(file, e))?;
                    if attr.key.local_name().as_ref().eq_ignore_ascii_case(local_name) {
                        let value = attr.unescape_value().map_err(|e| malformed(file, e))?;
                        return Ok(Some(value.into_owned()));
                    }
                }
                return Ok(None);
            }
            Ok(Event::Eof) => {
                return Err(CacheError::MalformedXml {
                    file: file.to_string(),
                    message: "document has no root element".to_string(),
                })
            }
            Ok(_) => {}
            Err(e) => return Err(malformed(file, e)),
        }
    }
}

fn validate_lods(lods: &[Lod]) -> Result<(), CacheError> {
    if lods.is_empty() {
        return Err(CacheError::InvalidMetadata {
            message: "LODInfos must contain at least one level".to_string(),
        });
    }
    if let Some(pair) = lods.windows(2).find(|w| w[0].level_id >= w[1].level_id) {
        return Err(CacheError::InvalidMetadata {
            message: format!(
                "LODInfos must be strictly ascending by LevelID ({} followed by {})",
                pair[0].level_id, pair[1].level_id
            ),
        });
    }
    Ok(())
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, CacheError> {
    value.ok_or(CacheError::MissingField {
        file: CONF_XML.to_string(),
        field,
    })
}

fn malformed(file: &str, err: impl std::fmt::Display) -> CacheError {
    CacheError::MalformedXml {
        file: file.to_string(),
        message: err.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
