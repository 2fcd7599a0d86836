//! Configuration management for the basemap server.
//!
//! Configuration comes from two places:
//! - A TOML file listing the server port and the services to publish
//! - Command-line arguments via clap, with `BASEMAP_` environment fallbacks
//!
//! Command-line values override the file.
//!
//! # Configuration File
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 9000
//!
//! [[services]]
//! name = "World"
//! path = "/data/caches/World/Layers"
//! ```
//!
//! `[[service]]` is accepted as a synonym for `[[services]]`.
//!
//! # Environment Variables
//!
//! - `BASEMAP_CONFIG` - Configuration file path (default: config.toml)
//! - `BASEMAP_HOST` - Server bind address (overrides `server.host`)
//! - `BASEMAP_PORT` - Server port (overrides `server.port`)
//! - `BASEMAP_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `BASEMAP_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `BASEMAP_STATIC_DIR` - Directory served under `/static`

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;

// =============================================================================
// Default Values
// =============================================================================

/// Default configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 9000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Basemap Server - serves ArcGIS compact caches over the ArcGIS REST API.
///
/// Publishes each configured cache as a MapServer service with tile,
/// capability document and services directory endpoints.
#[derive(Parser, Debug, Clone)]
#[command(name = "basemap-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "BASEMAP_CONFIG")]
    pub config: PathBuf,

    /// Host address to bind the server to (overrides the file).
    #[arg(long, env = "BASEMAP_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides the file).
    #[arg(short, long, env = "BASEMAP_PORT")]
    pub port: Option<u16>,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "BASEMAP_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "BASEMAP_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Directory of static files served under /static.
    #[arg(long, env = "BASEMAP_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

// =============================================================================
// Configuration File
// =============================================================================

/// A cache published as a MapServer service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Name used in `/rest/services/{name}/MapServer`
    pub name: String,

    /// Cache directory holding `conf.xml` and `_alllayers/`
    pub path: PathBuf,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// The `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default, alias = "service")]
    pub services: Vec<ServiceConfig>,
}

impl FileConfig {
    /// Parse a configuration file's contents.
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load a configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents, path)
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Configuration after merging the file with command-line overrides.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub services: Vec<ServiceConfig>,
    pub cache_max_age: u32,
    pub cors_origins: Option<Vec<String>>,
    pub static_dir: Option<PathBuf>,
    pub verbose: bool,
    pub no_tracing: bool,
}

impl Config {
    /// Read the configuration file named by `cli` and apply its overrides.
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let file = FileConfig::from_toml_file(&cli.config)?;
        Ok(Self::merge(file, cli))
    }

    /// Apply command-line overrides to a parsed configuration file.
    pub fn merge(file: FileConfig, cli: Cli) -> Self {
        Self {
            host: cli.host.unwrap_or(file.server.host),
            port: cli.port.unwrap_or(file.server.port),
            services: file.services,
            cache_max_age: cli.cache_max_age,
            cors_origins: cli.cors_origins,
            static_dir: cli.static_dir,
            verbose: cli.verbose,
            no_tracing: cli.no_tracing,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be greater than 0".to_string()));
        }

        if self.services.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[services]] entry is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "service name must not be empty".to_string(),
                ));
            }
            if service.name.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "service name {:?} must not contain '/'",
                    service.name
                )));
            }
            if service.path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "service {} has an empty path",
                    service.name
                )));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate service name {}",
                    service.name
                )));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
