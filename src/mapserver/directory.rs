//! Services directory document (`/rest/services?f=json`).

use serde::Serialize;

use crate::error::CacheError;

use super::document::{to_json, CURRENT_VERSION};

/// Service type reported for every entry; only tiled map services are served.
pub const SERVICE_TYPE_MAPSERVER: &str = "MapServer";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
}

/// Catalogue of the services hosted by this server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesDirectory {
    pub current_version: f64,
    pub folders: Vec<String>,
    pub services: Vec<ServiceEntry>,
}

impl ServicesDirectory {
    /// Build the catalogue from service names, keeping their order.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            current_version: CURRENT_VERSION,
            folders: Vec::new(),
            services: names
                .into_iter()
                .map(|name| ServiceEntry {
                    name: name.to_string(),
                    service_type: SERVICE_TYPE_MAPSERVER.to_string(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, CacheError> {
        to_json(self, pretty)
    }
}
