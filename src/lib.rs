//! # Areal Route
//!
//! Field-operations planning for a fixed set of water-infrastructure sites
//! ("areály").
//!
//! This library provides:
//! - An immutable site catalog loaded once from a JSON document
//! - Filtering by free text, district and category
//! - Aggregate statistics over any filtered view
//! - An ordered, duplicate-free visit route persisted across sessions
//! - Marker state derivation for a map-rendering collaborator
//! - Navigation URL export and a keyword-matched FAQ assistant
//!
//! ## Features
//!
//! - **`persistence`** - SQLite-backed route storage
//! - **`http`** - Fetch the catalog from a URL
//! - **`cli`** - The `areal` command-line front end (default)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use areal_route::{Catalog, FilterCriteria, GpsPoint, RouteManager, Site, filter_sites};
//!
//! let catalog = Catalog::from_sites(vec![
//!     Site::new("pt-ptacnik", "VDJ Ptáčník", "PT").with_location(GpsPoint::new(49.05, 14.115)),
//!     Site::new("cb-zdoba", "VDJ Zdoba", "CB").with_location(GpsPoint::new(49.053, 14.13)),
//! ]);
//!
//! let criteria = FilterCriteria::default().district("CB");
//! let view = filter_sites(catalog.sites(), &criteria);
//! assert_eq!(view.len(), 1);
//!
//! let mut route = RouteManager::in_memory();
//! assert!(route.add_to_route(view[0]).is_added());
//! let url = route.export_route_url().unwrap();
//! assert!(url.contains("49.053,14.13"));
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, PlannerError, Result};

// User-visible notices (toasts)
pub mod notice;
pub use notice::{Notice, NoticeLevel};

// Configuration
pub mod config;
pub use config::{CatalogSource, PlannerConfig, StorageBackend, StorageConfig};

// Immutable site catalog
pub mod catalog;
pub use catalog::Catalog;

// Filter engine
pub mod filter;
pub use filter::{distinct_categories, distinct_districts, filter_sites, FilterCriteria, TagFilter};

// Stats projector
pub mod stats;
pub use stats::{format_area, project_stats, SiteStats};

// Persistent store adapter and backends
pub mod store;
pub use store::{FileStorage, KeyValueStore, MemoryStorage, RouteStore, DEFAULT_ROUTE_KEY};
#[cfg(feature = "persistence")]
pub use store::SqliteStorage;

// Navigation URL construction
pub mod navigation;
pub use navigation::NavigationService;

// Route manager
pub mod route;
pub use route::{AddOutcome, RemoveOutcome, RouteEvent, RouteManager, RouteSummary, SubscriptionId};

// Spatial index for map viewport queries
pub mod spatial;
pub use spatial::SiteIndex;

// Map sync bridge
pub mod map_sync;
pub use map_sync::{
    display_state, recenter_view, MapSyncBridge, MapView, MarkerSink, MarkerState, NullMarkerSink, ViewTarget,
    FIT_PADDING_PX,
};

// FAQ assistant
pub mod assistant;
pub use assistant::{FaqAssistant, FaqEntry};

// Dashboard facade wiring everything together
pub mod dashboard;
pub use dashboard::{Dashboard, FilterView};

// HTTP module for catalog fetching
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::{fetch_catalog_blocking, CatalogFetcher};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use areal_route::GpsPoint;
/// let point = GpsPoint::new(49.0267, 13.994); // VDJ Amerika II
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Great-circle distance to another point in meters.
    pub fn haversine_distance(&self, other: &GpsPoint) -> f64 {
        use geo::{Distance, Haversine, Point};
        let p1 = Point::new(self.longitude, self.latitude);
        let p2 = Point::new(other.longitude, other.latitude);
        Haversine::distance(p1, p2)
    }
}

/// Bounding box around a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Check whether a point lies inside the bounds (inclusive).
    pub fn contains(&self, point: &GpsPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }
}

/// A fixed physical installation tracked by the planner.
///
/// Sites are immutable once loaded into a [`Catalog`]. The serialized form
/// is also what the route store persists as a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Stable identifier, unique within the catalog
    pub id: String,
    pub name: String,
    /// Town or place the site belongs to (searched alongside the name)
    #[serde(default)]
    pub locality: String,
    /// District tag ("okres")
    #[serde(default)]
    pub district: String,
    /// Category tag ("kategorie"); absent for unclassified sites
    #[serde(default)]
    pub category: Option<String>,
    /// Placement on the map; `None` keeps the site off the map only
    #[serde(default)]
    pub location: Option<GpsPoint>,
    #[serde(default)]
    pub area_square_meters: f64,
    #[serde(default)]
    pub fence_length_meters: f64,
}

impl Site {
    /// Create a site with the required tags and no measurements.
    pub fn new(id: impl Into<String>, name: impl Into<String>, district: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            locality: String::new(),
            district: district.into(),
            category: None,
            location: None,
            area_square_meters: 0.0,
            fence_length_meters: 0.0,
        }
    }

    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = locality.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_location(mut self, location: GpsPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_area(mut self, square_meters: f64) -> Self {
        self.area_square_meters = square_meters;
        self
    }

    pub fn with_fence_length(mut self, meters: f64) -> Self {
        self.fence_length_meters = meters;
        self
    }

    /// Location if present and valid for map placement.
    pub fn placement(&self) -> Option<GpsPoint> {
        self.location.filter(GpsPoint::is_valid)
    }

    /// Whether the map collaborator can render this site.
    pub fn is_placeable(&self) -> bool {
        self.placement().is_some()
    }
}
