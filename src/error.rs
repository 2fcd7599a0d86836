use thiserror::Error;

/// Errors raised while opening a compact cache or reading tiles from it.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Declared cache version is older than 10.1 or not a dotted-decimal version
    #[error("Unsupported cache version: {version} (10.1 or later is required)")]
    UnsupportedCacheVersion { version: String },

    /// Cache uses a storage format other than compact bundles
    #[error("Unsupported storage format: {format} (only compact caches are supported)")]
    UnsupportedStorageFormat { format: String },

    /// Metadata file is not well-formed XML or a value has the wrong type
    #[error("Malformed XML in {file}: {message}")]
    MalformedXml { file: String, message: String },

    /// Required element is missing from a metadata file
    #[error("Missing required field {field} in {file}")]
    MissingField { file: String, field: &'static str },

    /// Metadata parsed but violates a layout invariant
    #[error("Invalid cache metadata: {message}")]
    InvalidMetadata { message: String },

    /// Unexpected filesystem failure on a required file
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Fewer bytes available than the layout requires
    #[error("Truncated read from {source_id}: expected {expected} bytes at offset {offset}, got {actual}")]
    Truncated {
        source_id: String,
        offset: u64,
        expected: u64,
        actual: u64,
    },

    /// Tile coordinate maps outside its bundle block
    #[error("Invalid tile coordinate: level {level}, row {row}, col {col}")]
    InvalidTileCoordinate { level: u64, row: u64, col: u64 },

    /// Capability document could not be serialised
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Build an `Io` error from a `std::io::Error` and the path it concerns.
    pub fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        CacheError::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors raised while building the services registry at start-up.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Two services were configured with the same name
    #[error("Duplicate service name: {name}")]
    DuplicateService { name: String },

    /// A configured cache could not be opened
    #[error("Failed to open service {name} at {path}: {source}")]
    Open {
        name: String,
        path: String,
        #[source]
        source: CacheError,
    },
}

/// Errors surfaced by the tile service and HTTP handlers.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// No service is registered under the requested name
    #[error("Service not found: {name}")]
    ServiceNotFound { name: String },

    /// The `f` query parameter names an unsupported response format
    #[error("Unsupported response format: {format}")]
    UnsupportedFormat { format: String },

    /// The `callback` query parameter is not a JavaScript identifier
    #[error("Invalid callback: {callback}")]
    InvalidCallback { callback: String },

    /// Error from the underlying compact cache
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// The blocking read task panicked or was cancelled
    #[error("Tile task failed: {message}")]
    TaskFailed { message: String },
}

/// Errors raised while loading the configuration file.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    /// Configuration file is not valid TOML or has the wrong shape
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    /// Configuration parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
