//! MapServer capability document (`/rest/services/{name}/MapServer?f=json`).
//!
//! The document is a pure function of [`CacheMetadata`]. Fields a tile-only
//! server has no data for are filled with the constants ArcGIS clients expect.

use serde::Serialize;

use crate::error::CacheError;
use crate::format::{CacheMetadata, Envelope, SpatialReference};

/// ArcGIS REST API version reported by every document.
pub const CURRENT_VERSION: f64 = 10.11;

/// Image formats advertised to clients.
pub const SUPPORTED_IMAGE_FORMAT_TYPES: &str =
    "PNG32,PNG24,PNG,JPG,DIB,TIFF,EMF,PS,PDF,GIF,SVG,SVGZ,BMP";

const MAP_NAME: &str = "Layers";
const UNITS: &str = "esriDecimalDegrees";
const CAPABILITIES: &str = "Map,Query,Data";
const SUPPORTED_QUERY_FORMATS: &str = "JSON, AMF";
const MAX_RECORD_COUNT: u32 = 1000;
const MAX_IMAGE_SIZE: u32 = 2048;

/// Spatial reference as emitted in JSON.
///
/// Absent identifiers are omitted. WKT is only emitted when neither WKID is
/// known, since clients prefer the numeric form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialReferenceJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wkid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_wkid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wkt: Option<String>,
}

impl From<&SpatialReference> for SpatialReferenceJson {
    fn from(sr: &SpatialReference) -> Self {
        let wkt = match (sr.wkid, sr.latest_wkid) {
            (None, None) => sr.wkt.clone(),
            _ => None,
        };
        Self {
            wkid: sr.wkid,
            latest_wkid: sr.latest_wkid,
            wkt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LodJson {
    pub level: u64,
    pub resolution: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileInfo {
    pub rows: u32,
    pub cols: u32,
    pub dpi: u32,
    /// Tile format with its original case
    pub format: String,
    pub compression_quality: i64,
    pub origin: Point,
    pub spatial_reference: SpatialReferenceJson,
    pub lods: Vec<LodJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub spatial_reference: SpatialReferenceJson,
}

impl Extent {
    fn new(envelope: &Envelope, spatial_reference: SpatialReferenceJson) -> Self {
        Self {
            xmin: envelope.xmin,
            ymin: envelope.ymin,
            xmax: envelope.xmax,
            ymax: envelope.ymax,
            spatial_reference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub comments: String,
    pub subject: String,
    pub category: String,
    pub antialiasing_mode: String,
    pub text_antialiasing_mode: String,
    pub keywords: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            comments: String::new(),
            subject: String::new(),
            category: String::new(),
            antialiasing_mode: "None".to_string(),
            text_antialiasing_mode: "Force".to_string(),
            keywords: String::new(),
        }
    }
}

/// The MapServer JSON document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapServerDocument {
    pub current_version: f64,
    pub service_description: String,
    pub map_name: String,
    pub description: String,
    pub copyright_text: String,
    pub supports_dynamic_layers: bool,
    pub layers: Vec<serde_json::Value>,
    pub tables: Vec<serde_json::Value>,
    pub spatial_reference: SpatialReferenceJson,
    pub single_fused_map_cache: bool,
    pub tile_info: TileInfo,
    pub initial_extent: Extent,
    pub full_extent: Extent,
    pub min_scale: f64,
    pub max_scale: f64,
    pub units: String,
    pub supported_image_format_types: String,
    pub document_info: DocumentInfo,
    pub capabilities: String,
    pub supported_query_formats: String,
    pub max_record_count: u32,
    pub max_image_height: u32,
    pub max_image_width: u32,
}

impl MapServerDocument {
    /// Build the document for a cache.
    pub fn from_metadata(metadata: &CacheMetadata) -> Self {
        let spatial_reference = SpatialReferenceJson::from(&metadata.spatial_reference);

        let tile_info = TileInfo {
            rows: metadata.tile_rows,
            cols: metadata.tile_cols,
            dpi: metadata.dpi,
            format: metadata.tile_format.clone(),
            compression_quality: metadata.compression_quality,
            origin: Point {
                x: metadata.tile_origin.x,
                y: metadata.tile_origin.y,
            },
            spatial_reference: spatial_reference.clone(),
            lods: metadata
                .lods
                .iter()
                .map(|lod| LodJson {
                    level: lod.level_id,
                    resolution: lod.resolution,
                    scale: lod.scale,
                })
                .collect(),
        };

        Self {
            current_version: CURRENT_VERSION,
            service_description: String::new(),
            map_name: MAP_NAME.to_string(),
            description: String::new(),
            copyright_text: String::new(),
            supports_dynamic_layers: false,
            layers: Vec::new(),
            tables: Vec::new(),
            spatial_reference: spatial_reference.clone(),
            single_fused_map_cache: true,
            tile_info,
            initial_extent: Extent::new(&metadata.envelope, spatial_reference.clone()),
            full_extent: Extent::new(&metadata.envelope, spatial_reference),
            min_scale: metadata.min_scale(),
            max_scale: metadata.max_scale(),
            units: UNITS.to_string(),
            supported_image_format_types: SUPPORTED_IMAGE_FORMAT_TYPES.to_string(),
            document_info: DocumentInfo::default(),
            capabilities: CAPABILITIES.to_string(),
            supported_query_formats: SUPPORTED_QUERY_FORMATS.to_string(),
            max_record_count: MAX_RECORD_COUNT,
            max_image_height: MAX_IMAGE_SIZE,
            max_image_width: MAX_IMAGE_SIZE,
        }
    }

    /// Serialise to JSON, two-space indented when `pretty` is set.
    pub fn to_json(&self, pretty: bool) -> Result<String, CacheError> {
        to_json(self, pretty)
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CacheError> {
    let result = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    result.map_err(|e| CacheError::Serialization(e.to_string()))
}
