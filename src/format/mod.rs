//! On-disk layout of ArcGIS compact caches.
//!
//! A cache directory holds two metadata files and a tree of bundles:
//!
//! ```text
//! <cache>/
//! ├── conf.xml          tiling scheme, storage format, version namespace
//! ├── conf.cdi          full extent (optional)
//! └── _alllayers/
//!     └── L00/
//!         ├── R0000C0000.bundle
//!         └── R0000C0000.bundlx   (10.1 / 10.2 only)
//! ```
//!
//! The declared version selects between the two bundle dialects:
//!
//! - **V1** (10.1, 10.2): separate `.bundlx` index, column-major records
//! - **V3** (10.3 and later): index embedded in the `.bundle`, row-major records

pub mod bundle_path;
pub mod bundle_v1;
pub mod bundle_v3;
pub mod metadata;
pub mod version;

pub use bundle_path::{bundle_file_stem, compute_address, BundleAddress, ALL_LAYERS_DIR};
pub use metadata::{
    parse_conf_cdi, parse_conf_xml, parse_metadata, CacheMetadata, Envelope, Lod,
    MetadataWarning, SpatialReference, TileOrigin, CONF_CDI, CONF_XML,
};
pub use version::{CacheVersion, StorageDialect};
