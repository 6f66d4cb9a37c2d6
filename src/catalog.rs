//! # Site Catalog
//!
//! The immutable list of all sites, loaded once at startup.
//!
//! The source document is a JSON array of site records. Two spellings of
//! the record are accepted: the canonical camelCase form produced by
//! [`Site`]'s serializer, and the field dataset's native keys
//! (`okres`, `kategorie`, `vymra_m2`, `oploceni_bm`, `gps: [lat, lng]`,
//! `jmeno`, `adresa.mesto`). A record that cannot be read is skipped on
//! its own; only a document that is not an array fails as a whole.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{PlannerError, Result};
use crate::{GpsPoint, Notice, Site};

// ============================================================================
// Raw Record Types
// ============================================================================

/// A location in either `[lat, lng]` or `{lat, lng}` form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLocation {
    Pair([f64; 2]),
    Object {
        #[serde(alias = "latitude")]
        lat: f64,
        #[serde(alias = "lon", alias = "longitude")]
        lng: f64,
    },
}

impl RawLocation {
    fn into_point(self) -> GpsPoint {
        match self {
            RawLocation::Pair([lat, lng]) => GpsPoint::new(lat, lng),
            RawLocation::Object { lat, lng } => GpsPoint::new(lat, lng),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawAddress {
    #[serde(default, alias = "mesto")]
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSite {
    #[serde(default)]
    id: Option<String>,
    #[serde(alias = "jmeno")]
    name: String,
    #[serde(default, alias = "obec")]
    locality: Option<String>,
    #[serde(default, alias = "adresa")]
    address: Option<RawAddress>,
    #[serde(default, alias = "okres")]
    district: Option<String>,
    #[serde(default, alias = "kategorie")]
    category: Option<String>,
    /// Kept untyped so a malformed location only drops the placement
    #[serde(default, alias = "gps", alias = "gps_rtk")]
    location: Option<Value>,
    #[serde(default, alias = "vymra_m2", alias = "plocha_m2")]
    area_square_meters: Option<f64>,
    #[serde(default, alias = "oploceni_bm")]
    fence_length_meters: Option<f64>,
    /// House number, used to derive an id when none is given
    #[serde(default, alias = "cislo_popisne")]
    house_number: Option<Value>,
}

/// Clamp a measurement to a finite, non-negative value.
fn measurement(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

impl RawSite {
    fn into_site(self, index: usize) -> Site {
        let location = self.location.and_then(|raw| parse_location(&self.name, raw));
        let id = match self.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => derive_id(self.house_number.as_ref(), &self.name, location, index),
        };
        let locality = self
            .locality
            .or_else(|| self.address.and_then(|a| a.city))
            .unwrap_or_default();

        Site {
            id,
            name: self.name,
            locality,
            district: self.district.unwrap_or_default(),
            category: self.category.filter(|c| !c.trim().is_empty()),
            location,
            area_square_meters: measurement(self.area_square_meters),
            fence_length_meters: measurement(self.fence_length_meters),
        }
    }
}

fn parse_location(name: &str, raw: Value) -> Option<GpsPoint> {
    if raw.is_null() {
        return None;
    }
    match serde_json::from_value::<RawLocation>(raw) {
        Ok(location) => Some(location.into_point()),
        Err(_) => {
            debug!("[Catalog] Site '{}' has an unreadable location, not placeable", name);
            None
        }
    }
}

/// Build a stable id for a record that has none: `<house number or name>_<lat to 4 places>`.
///
/// Without a usable latitude the record's position in the document is used
/// instead, which is stable as long as the document is.
fn derive_id(house_number: Option<&Value>, name: &str, location: Option<GpsPoint>, index: usize) -> String {
    let base = match house_number {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => name.to_string(),
    };
    match location.filter(GpsPoint::is_valid) {
        Some(point) => format!("{}_{:.4}", base, point.latitude),
        None => format!("{}_{}", base, index),
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// The immutable, ordered collection of all known sites.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sites: Vec<Site>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// An empty catalog (the degraded state after a failed load).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from sites, keeping the first occurrence of each id.
    pub fn from_sites(sites: Vec<Site>) -> Self {
        let mut kept = Vec::with_capacity(sites.len());
        let mut by_id = HashMap::with_capacity(sites.len());

        for site in sites {
            if by_id.contains_key(&site.id) {
                warn!("[Catalog] Dropping duplicate site id '{}' ({})", site.id, site.name);
                continue;
            }
            by_id.insert(site.id.clone(), kept.len());
            kept.push(site);
        }

        Self { sites: kept, by_id }
    }

    /// Parse a catalog from a JSON document.
    ///
    /// Fails only when the document itself is not a JSON array; individual
    /// unreadable records are skipped with a warning.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(json)?;
        let records = match document {
            Value::Array(records) => records,
            other => {
                return Err(PlannerError::catalog(format!(
                    "expected an array of site records, found {}",
                    json_kind(&other)
                )))
            }
        };

        let total = records.len();
        let sites: Vec<Site> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value::<RawSite>(record) {
                Ok(raw) => Some(raw.into_site(index)),
                Err(e) => {
                    warn!("[Catalog] Skipping record {}: {}", index, e);
                    None
                }
            })
            .collect();

        debug!("[Catalog] Parsed {} of {} records", sites.len(), total);
        Ok(Self::from_sites(sites))
    }

    /// Read and parse a catalog file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load a catalog file, falling back to an empty catalog.
    ///
    /// Never fails: the returned notice tells the user whether data is
    /// available.
    pub fn load_or_empty(path: &Path) -> (Self, Notice) {
        match Self::from_path(path) {
            Ok(catalog) => {
                info!("[Catalog] Loaded {} sites from {}", catalog.len(), path.display());
                (catalog, Notice::success("Site data loaded."))
            }
            Err(e) => {
                warn!("[Catalog] Failed to load {}: {}", path.display(), e);
                (Self::empty(), load_failure_notice())
            }
        }
    }

    /// All sites in catalog order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn get(&self, id: &str) -> Option<&Site> {
        self.by_id.get(id).map(|&i| &self.sites[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Sites the map collaborator can place.
    pub fn placeable(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter().filter(|s| s.is_placeable())
    }
}

/// Notice shown when the catalog cannot be loaded.
pub(crate) fn load_failure_notice() -> Notice {
    Notice::error("Site data could not be loaded. Working without site data.")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_records() {
        let json = r#"[
            {"id": "a", "name": "VDJ A", "locality": "Tábor", "district": "TA",
             "category": "I.", "location": {"latitude": 49.14, "longitude": 14.56},
             "areaSquareMeters": 1200.5, "fenceLengthMeters": 150}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let site = catalog.get("a").unwrap();
        assert_eq!(site.locality, "Tábor");
        assert_eq!(site.category.as_deref(), Some("I."));
        assert_eq!(site.location, Some(GpsPoint::new(49.14, 14.56)));
        assert_eq!(site.area_square_meters, 1200.5);
        assert_eq!(site.fence_length_meters, 150.0);
    }

    #[test]
    fn test_parse_native_records() {
        let json = r#"[
            {"id": "cb-hlavatce", "name": "VDJ Hlavatce", "okres": "CB", "kategorie": null,
             "oploceni_bm": 424, "vymra_m2": 7968, "gps": [49.035, 14.04]}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let site = catalog.get("cb-hlavatce").unwrap();
        assert_eq!(site.district, "CB");
        assert_eq!(site.category, None);
        assert_eq!(site.location, Some(GpsPoint::new(49.035, 14.04)));
        assert_eq!(site.area_square_meters, 7968.0);
        assert_eq!(site.fence_length_meters, 424.0);
    }

    #[test]
    fn test_derived_id_and_address_locality() {
        let json = r#"[
            {"jmeno": "ÚV Tábor", "cislo_popisne": 1520, "adresa": {"ulice": "Hlavní", "mesto": "Tábor"},
             "gps_rtk": {"lat": 49.14, "lng": 14.565}, "plocha_m2": 12262}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 1);
        let site = &catalog.sites()[0];
        assert_eq!(site.id, "1520_49.1400");
        assert_eq!(site.locality, "Tábor");
        assert_eq!(site.area_square_meters, 12262.0);
    }

    #[test]
    fn test_bad_record_skipped() {
        let json = r#"[
            {"id": "a", "name": "A"},
            {"id": "b"},
            "not a record",
            {"id": "c", "name": "C", "gps": [null, 14.0]}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let ids: Vec<&str> = catalog.sites().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(catalog.get("c").unwrap().location.is_none());
    }

    #[test]
    fn test_missing_location_is_kept_but_not_placeable() {
        let json = r#"[
            {"id": "a", "name": "A", "district": "CB"},
            {"id": "b", "name": "B", "district": "CB", "gps": [49.0, 14.0]}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.placeable().count(), 1);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = Catalog::from_sites(vec![
            Site::new("a", "First", "CB"),
            Site::new("a", "Second", "CB"),
            Site::new("b", "Third", "PT"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").unwrap().name, "First");
    }

    #[test]
    fn test_negative_measurements_clamped() {
        let json = r#"[{"id": "a", "name": "A", "vymra_m2": -5, "oploceni_bm": 10}]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.sites()[0].area_square_meters, 0.0);
    }

    #[test]
    fn test_non_array_document_fails() {
        assert!(matches!(
            Catalog::from_json_str(r#"{"sites": []}"#),
            Err(PlannerError::Catalog { .. })
        ));
        assert!(matches!(
            Catalog::from_json_str("<html>"),
            Err(PlannerError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let (catalog, notice) = Catalog::load_or_empty(Path::new("/nonexistent/arealy.json"));
        assert!(catalog.is_empty());
        assert_eq!(notice.level, crate::NoticeLevel::Error);
    }
}
