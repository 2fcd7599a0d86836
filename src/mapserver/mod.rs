//! ArcGIS REST JSON documents: the per-service MapServer document and the
//! services directory.

mod directory;
mod document;

pub use directory::{ServiceEntry, ServicesDirectory, SERVICE_TYPE_MAPSERVER};
pub use document::{
    DocumentInfo, Extent, LodJson, MapServerDocument, Point, SpatialReferenceJson, TileInfo,
    CURRENT_VERSION, SUPPORTED_IMAGE_FORMAT_TYPES,
};
