//! Route survives a restart through file storage, and the session
//! facade keeps markers, notices and the stored route in step.

use areal_route::{
    Catalog, Dashboard, FileStorage, FilterCriteria, GpsPoint, KeyValueStore, MarkerState,
    NullMarkerSink, PlannerConfig, RouteManager, RouteStore, Site, DEFAULT_ROUTE_KEY,
};
use serde_json::Value;
use tempfile::TempDir;

fn catalog() -> Catalog {
    Catalog::from_sites(vec![
        Site::new("pt-ptacnik", "VDJ Ptáčník", "PT")
            .with_category("II.")
            .with_location(GpsPoint::new(49.05, 14.115))
            .with_area(1070.0),
        Site::new("cb-hlavatce", "VDJ Hlavatce", "CB")
            .with_location(GpsPoint::new(49.035, 14.04))
            .with_area(7968.0),
        Site::new("st-vodnany", "VDJ Vodňany", "ST")
            .with_category("I.")
            .with_location(GpsPoint::new(49.032, 14.025))
            .with_area(1594.0),
    ])
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn file_store(dir: &TempDir) -> RouteStore {
    RouteStore::new(Box::new(FileStorage::new(dir.path().join("storage.json"))))
}

#[test]
fn route_restored_in_order_after_restart() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let catalog = catalog();

    {
        let mut route = RouteManager::open(file_store(&dir), &catalog);
        assert!(route.add_to_route(catalog.get("st-vodnany").unwrap()).is_added());
        assert!(route.add_to_route(catalog.get("pt-ptacnik").unwrap()).is_added());
        assert!(!route.add_to_route(catalog.get("st-vodnany").unwrap()).is_added());
    }

    let route = RouteManager::open(file_store(&dir), &catalog);
    let ids: Vec<&str> = route.route().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["st-vodnany", "pt-ptacnik"]);
    assert!(!route.is_degraded());
}

#[test]
fn stored_value_is_json_array_of_snapshots() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let catalog = catalog();

    let mut route = RouteManager::open(file_store(&dir), &catalog);
    let _ = route.add_to_route(catalog.get("cb-hlavatce").unwrap());

    let backend = FileStorage::new(dir.path().join("storage.json"));
    let raw = backend.get_item(DEFAULT_ROUTE_KEY).unwrap().unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "cb-hlavatce");
    assert_eq!(entries[0]["name"], "VDJ Hlavatce");
}

#[test]
fn snapshot_kept_when_site_leaves_catalog() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let full = catalog();

    {
        let mut route = RouteManager::open(file_store(&dir), &full);
        let _ = route.add_to_route(full.get("pt-ptacnik").unwrap());
        let _ = route.add_to_route(full.get("cb-hlavatce").unwrap());
    }

    let reduced = Catalog::from_sites(vec![full.get("cb-hlavatce").unwrap().clone()]);
    let route = RouteManager::open(file_store(&dir), &reduced);
    assert_eq!(route.len(), 2);
    assert_eq!(route.route()[0].name, "VDJ Ptáčník");
}

#[test]
fn corrupt_storage_file_is_replaced_on_next_write() {
    init_logging();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("storage.json"), "not json").unwrap();
    let catalog = catalog();

    {
        let mut route = RouteManager::open(file_store(&dir), &catalog);
        assert!(!route.is_degraded());
        assert!(route.is_empty());
        assert!(route.add_to_route(catalog.get("pt-ptacnik").unwrap()).is_added());
    }

    let mut route = RouteManager::open(file_store(&dir), &catalog);
    assert!(!route.is_degraded());
    assert_eq!(route.len(), 1);
    assert!(route.add_to_route(catalog.get("st-vodnany").unwrap()).is_added());

    let route = RouteManager::open(file_store(&dir), &catalog);
    let ids: Vec<&str> = route.route().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["pt-ptacnik", "st-vodnany"]);
}

#[test]
fn unreadable_storage_path_degrades_to_memory() {
    init_logging();
    let dir = TempDir::new().unwrap();
    // A directory where the storage file should be
    let store = RouteStore::new(Box::new(FileStorage::new(dir.path())));
    let catalog = catalog();

    let mut route = RouteManager::open(store, &catalog);
    assert!(route.is_degraded());
    assert!(route.add_to_route(catalog.get("pt-ptacnik").unwrap()).is_added());
    assert_eq!(route.len(), 1);
}

#[test]
fn dashboard_session_round_trip() {
    init_logging();
    let dir = TempDir::new().unwrap();

    {
        let mut dash = Dashboard::with_catalog(
            PlannerConfig::default(),
            catalog(),
            file_store(&dir),
            Box::new(NullMarkerSink),
        );
        let view = dash.apply_filters(FilterCriteria::default().category(""));
        assert_eq!(view.sites.len(), 1);
        assert_eq!(view.sites[0].id, "cb-hlavatce");

        assert!(dash.add_to_route_by_id("cb-hlavatce"));
        assert_eq!(dash.marker_state("cb-hlavatce"), Some(MarkerState::OnRoute));
        assert_eq!(dash.marker_state("pt-ptacnik"), None);
    }

    let dash = Dashboard::with_catalog(
        PlannerConfig::default(),
        catalog(),
        file_store(&dir),
        Box::new(NullMarkerSink),
    );
    assert_eq!(dash.route().len(), 1);
    assert_eq!(dash.marker_state("cb-hlavatce"), Some(MarkerState::OnRoute));
    assert_eq!(
        dash.export_route_url().unwrap(),
        "https://www.google.com/maps/dir/49.035,14.04"
    );
}
