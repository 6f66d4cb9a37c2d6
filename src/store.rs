//! # Route Storage
//!
//! Keyed persistence for the visit route.
//!
//! ## Layers
//!
//! 1. **Backends** ([`KeyValueStore`]): string values under string keys,
//!    like browser-local storage. In-memory, JSON file, and SQLite
//!    (feature `persistence`) implementations are provided.
//! 2. **Adapter** ([`RouteStore`]): reads and writes the route as a JSON
//!    array under one fixed key.
//!
//! The adapter writes full site snapshots. On read it also accepts an
//! array of bare ids, resolving both forms against the catalog so a
//! refreshed catalog wins over stale snapshots. Content that is not a
//! JSON array is treated as an absent route; only backend failures are
//! reported as errors.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::Value;

use crate::error::Result;
#[cfg(feature = "persistence")]
use crate::error::PlannerError;
use crate::{Catalog, Site};

#[cfg(feature = "persistence")]
use rusqlite::{params, Connection, OptionalExtension};

/// Fixed key the route is stored under.
pub const DEFAULT_ROUTE_KEY: &str = "jvsRoute";

// ============================================================================
// Backends
// ============================================================================

/// Minimal keyed string storage.
pub trait KeyValueStore {
    /// Read the value stored under `key`, `None` if absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }
}

/// Non-persistent storage, lost when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key (useful for restoring a saved state).
    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by a single JSON object file (`{"key": "value", ...}`).
///
/// Writes go to a sibling temp file that is renamed over the existing file, so
/// a crash mid-write leaves the previous state intact. A file that is not a
/// JSON object reads as empty and is replaced by the next write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(items) => Ok(items),
                Err(e) => {
                    warn!(
                        "[FileStorage] {} is unreadable, treating as empty: {}",
                        self.path.display(),
                        e
                    );
                    Ok(BTreeMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_items()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut items = self.read_items()?;
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, serde_json::to_string_pretty(&items)?)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Storage backed by a SQLite key/value table.
#[cfg(feature = "persistence")]
pub struct SqliteStorage {
    db: Connection,
}

#[cfg(feature = "persistence")]
impl SqliteStorage {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        let db = Connection::open(db_path).map_err(sql_error)?;
        Self::init_schema(&db)?;
        Ok(Self { db })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().map_err(sql_error)?;
        Self::init_schema(&db)?;
        Ok(Self { db })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER DEFAULT (strftime('%s', 'now'))
            );
        "#,
        )
        .map_err(sql_error)
    }
}

#[cfg(feature = "persistence")]
fn sql_error(e: rusqlite::Error) -> PlannerError {
    PlannerError::storage("sqlite", e.to_string())
}

#[cfg(feature = "persistence")]
impl KeyValueStore for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.db
            .query_row("SELECT value FROM storage WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(sql_error)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.db
            .execute(
                "INSERT OR REPLACE INTO storage (key, value, updated_at)
                 VALUES (?, ?, strftime('%s', 'now'))",
                params![key, value],
            )
            .map_err(sql_error)?;
        Ok(())
    }
}

// ============================================================================
// Route Store Adapter
// ============================================================================

/// Reads and writes the route as one serialized array under a fixed key.
pub struct RouteStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl RouteStore {
    /// Adapter over `backend` using [`DEFAULT_ROUTE_KEY`].
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self::with_key(backend, DEFAULT_ROUTE_KEY)
    }

    pub fn with_key(backend: Box<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            backend,
            key: key.to_string(),
        }
    }

    /// Adapter over fresh in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored route.
    ///
    /// An absent key, corrupt JSON or a non-array value all yield an
    /// empty route. Errors are returned only when the backend itself fails.
    pub fn read(&self, catalog: &Catalog) -> Result<Vec<Site>> {
        let raw = match self.backend.get_item(&self.key)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!("[RouteStore] Stored route under '{}' is not an array, ignoring", self.key);
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!("[RouteStore] Stored route under '{}' is corrupt: {}", self.key, e);
                return Ok(Vec::new());
            }
        };

        let mut seen = HashSet::new();
        let route: Vec<Site> = entries
            .into_iter()
            .filter_map(|entry| resolve_entry(entry, catalog))
            .filter(|site| seen.insert(site.id.clone()))
            .collect();

        debug!("[RouteStore] Read {} route entries from '{}'", route.len(), self.key);
        Ok(route)
    }

    /// Write the full route, replacing the stored value.
    pub fn write(&mut self, route: &[Site]) -> Result<()> {
        let json = serde_json::to_string(route)?;
        self.backend.set_item(&self.key, &json)
    }
}

/// Turn one stored entry (bare id or snapshot) into a site.
fn resolve_entry(entry: Value, catalog: &Catalog) -> Option<Site> {
    let id = match &entry {
        Value::String(id) => id.clone(),
        Value::Object(map) => match map.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => {
                warn!("[RouteStore] Dropping stored entry without an id");
                return None;
            }
        },
        _ => {
            warn!("[RouteStore] Dropping stored entry of unexpected type");
            return None;
        }
    };

    if let Some(site) = catalog.get(&id) {
        return Some(site.clone());
    }

    match entry {
        Value::Object(_) => match serde_json::from_value::<Site>(entry) {
            Ok(site) => Some(site),
            Err(e) => {
                warn!("[RouteStore] Dropping unreadable snapshot '{}': {}", id, e);
                None
            }
        },
        _ => {
            warn!("[RouteStore] Dropping unknown site id '{}'", id);
            None
        }
    }
}
