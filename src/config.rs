//! Planner configuration.
//!
//! All settings have defaults; a JSON config file only needs the keys it
//! changes. `AREAL_CATALOG` and `AREAL_STORE` override the catalog source
//! and storage path after the file is read.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::map_sync::MapView;
use crate::navigation::DEFAULT_NAVIGATION_BASE_URL;
use crate::store::{FileStorage, KeyValueStore, MemoryStorage, RouteStore, DEFAULT_ROUTE_KEY};

/// Environment variable overriding [`PlannerConfig::catalog`].
pub const CATALOG_ENV: &str = "AREAL_CATALOG";
/// Environment variable overriding [`StorageConfig::path`].
pub const STORE_ENV: &str = "AREAL_STORE";

/// Where the site catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// `http://` and `https://` sources are URLs, anything else a file path.
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            CatalogSource::Url(trimmed.to_string())
        } else {
            CatalogSource::File(PathBuf::from(trimmed))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Route lost on exit
    Memory,
    #[default]
    File,
    /// Requires the `persistence` feature
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
    /// Key the route is stored under
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("areal-storage.json"),
            key: DEFAULT_ROUTE_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    /// Open the configured backend.
    pub fn open_backend(&self) -> Result<Box<dyn KeyValueStore>> {
        match self.backend {
            StorageBackend::Memory => Ok(Box::new(MemoryStorage::new())),
            StorageBackend::File => Ok(Box::new(FileStorage::new(&self.path))),
            #[cfg(feature = "persistence")]
            StorageBackend::Sqlite => Ok(Box::new(crate::store::SqliteStorage::open(&self.path)?)),
            #[cfg(not(feature = "persistence"))]
            StorageBackend::Sqlite => Err(PlannerError::Config {
                message: "sqlite storage requires the `persistence` feature".to_string(),
            }),
        }
    }

    /// Open the configured backend wrapped in a route store adapter.
    pub fn open_route_store(&self) -> Result<RouteStore> {
        Ok(RouteStore::with_key(self.open_backend()?, &self.key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerConfig {
    /// File path or http(s) URL of the catalog document
    pub catalog: String,
    pub storage: StorageConfig,
    pub navigation_base_url: String,
    /// View used when no site can be placed
    pub default_view: MapView,
    /// Optional knowledge table replacing the built-in FAQ answers
    pub faq_table: Option<PathBuf>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            catalog: "data/arealy.json".to_string(),
            storage: StorageConfig::default(),
            navigation_base_url: DEFAULT_NAVIGATION_BASE_URL.to_string(),
            default_view: MapView::default(),
            faq_table: None,
        }
    }
}

impl PlannerConfig {
    /// Load from an optional JSON file, then apply environment overrides.
    ///
    /// A missing file means defaults; a file that exists but cannot be
    /// parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let config = Self::from_path(path)?;
                info!("[Config] Loaded {}", path.display());
                config
            }
            Some(path) => {
                debug!("[Config] {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(CATALOG_ENV).ok(),
            std::env::var(STORE_ENV).ok(),
        );
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PlannerError::Config {
            message: e.to_string(),
        })
    }

    fn apply_overrides(&mut self, catalog: Option<String>, store: Option<String>) {
        if let Some(catalog) = catalog.filter(|c| !c.trim().is_empty()) {
            debug!("[Config] Catalog overridden by {}", CATALOG_ENV);
            self.catalog = catalog;
        }
        if let Some(store) = store.filter(|s| !s.trim().is_empty()) {
            debug!("[Config] Storage path overridden by {}", STORE_ENV);
            self.storage.path = PathBuf::from(store);
        }
    }

    pub fn catalog_source(&self) -> CatalogSource {
        CatalogSource::parse(&self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.storage.key, "jvsRoute");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(
            config.catalog_source(),
            CatalogSource::File(PathBuf::from("data/arealy.json"))
        );
    }

    #[test]
    fn test_partial_file() {
        let config = PlannerConfig::from_json_str(
            r#"{"catalog": "https://example.org/arealy.json", "storage": {"backend": "memory"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.catalog_source(),
            CatalogSource::Url("https://example.org/arealy.json".to_string())
        );
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.key, DEFAULT_ROUTE_KEY);
        assert_eq!(config.default_view, MapView::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        assert!(matches!(
            PlannerConfig::from_json_str(r#"{"storage": {"backend": "floppy"}}"#),
            Err(PlannerError::Config { .. })
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = PlannerConfig::load(Some(Path::new("/nonexistent/areal.json"))).unwrap();
        assert_eq!(config.storage.key, DEFAULT_ROUTE_KEY);
    }

    #[test]
    fn test_overrides() {
        let mut config = PlannerConfig::default();
        config.apply_overrides(Some("other.json".to_string()), Some("  ".to_string()));
        assert_eq!(config.catalog, "other.json");
        assert_eq!(config.storage.path, PathBuf::from("areal-storage.json"));

        config.apply_overrides(None, Some("/tmp/route.json".to_string()));
        assert_eq!(config.storage.path, PathBuf::from("/tmp/route.json"));
    }

    #[test]
    fn test_memory_backend_opens() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        let store = config.open_route_store().unwrap();
        assert_eq!(store.key(), DEFAULT_ROUTE_KEY);
    }

    #[cfg(not(feature = "persistence"))]
    #[test]
    fn test_sqlite_without_feature() {
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            ..Default::default()
        };
        assert!(matches!(config.open_backend(), Err(PlannerError::Config { .. })));
    }
}
