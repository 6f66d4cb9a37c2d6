//! # Dashboard
//!
//! Wires the catalog, filter state, route manager, map bridge and FAQ
//! assistant into one session object.
//!
//! Startup never fails: a missing catalog, an unopenable store or a broken
//! knowledge table each degrade their own part and leave a [`Notice`].
//! Notices accumulate until [`Dashboard::take_notices`] drains them.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};
use serde::Serialize;

use crate::config::{CatalogSource, PlannerConfig};
use crate::error::Result;
use crate::map_sync::{recenter_view, MapSyncBridge, MarkerSink, MarkerState, ViewTarget};
use crate::navigation::NavigationService;
use crate::route::{RemoveOutcome, RouteEvent, RouteManager, RouteSummary};
use crate::spatial::SiteIndex;
use crate::store::RouteStore;
use crate::{filter_sites, project_stats, Catalog, FaqAssistant, FilterCriteria, Notice, Site, SiteStats};

/// The current filtered view and its aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterView {
    pub sites: Vec<Site>,
    pub stats: SiteStats,
}

type NoticeLog = Rc<RefCell<Vec<Notice>>>;

pub struct Dashboard {
    config: PlannerConfig,
    catalog: Catalog,
    index: SiteIndex,
    route: RouteManager,
    map: Rc<RefCell<MapSyncBridge>>,
    assistant: FaqAssistant,
    criteria: FilterCriteria,
    notices: NoticeLog,
}

impl Dashboard {
    /// Load everything the configuration points at.
    pub fn start(config: PlannerConfig, sink: Box<dyn MarkerSink>) -> Self {
        let (catalog, catalog_notice) = load_catalog(&config);

        let (store, store_notice) = match config.storage.open_route_store() {
            Ok(store) => (store, None),
            Err(e) => {
                warn!("[Dashboard] Failed to open route storage: {}", e);
                (
                    RouteStore::in_memory(),
                    Some(Notice::warning(
                        "Route storage unavailable. Changes are kept for this session only.",
                    )),
                )
            }
        };

        let dashboard = Self::with_catalog(config, catalog, store, sink);
        {
            let mut notices = dashboard.notices.borrow_mut();
            notices.insert(0, catalog_notice);
            notices.extend(store_notice);
        }
        dashboard
    }

    /// Assemble a session from an already loaded catalog and store.
    pub fn with_catalog(
        config: PlannerConfig,
        catalog: Catalog,
        store: RouteStore,
        sink: Box<dyn MarkerSink>,
    ) -> Self {
        let notices: NoticeLog = Rc::new(RefCell::new(Vec::new()));
        let map = Rc::new(RefCell::new(MapSyncBridge::new(sink)));

        let mut route = RouteManager::open(store, &catalog)
            .with_navigation(NavigationService::new(&config.navigation_base_url));

        {
            let map = Rc::clone(&map);
            let notices = Rc::clone(&notices);
            route.subscribe(move |event, entries| {
                map.borrow_mut().sync_route(entries);
                if let RouteEvent::StorageDegraded { .. } = event {
                    notices.borrow_mut().push(Notice::warning(
                        "Route storage unavailable. Changes are kept for this session only.",
                    ));
                }
            });
        }

        let assistant = match &config.faq_table {
            Some(path) => {
                let (assistant, notice) = FaqAssistant::load_or_builtin(path);
                notices.borrow_mut().extend(notice);
                assistant
            }
            None => FaqAssistant::builtin(),
        };

        let index = SiteIndex::build(catalog.sites());
        info!(
            "[Dashboard] Started with {} sites ({} placeable), {} stops on route",
            catalog.len(),
            index.len(),
            route.len()
        );

        let dashboard = Self {
            config,
            catalog,
            index,
            route,
            map,
            assistant,
            criteria: FilterCriteria::default(),
            notices,
        };
        dashboard.render();
        dashboard
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Replace the filter criteria, re-render markers and return the new view.
    pub fn apply_filters(&mut self, criteria: FilterCriteria) -> FilterView {
        self.criteria = criteria;
        let view = self.render();
        self.push_notice(Notice::info(format!("{} sites shown.", view.stats.count)));
        view
    }

    /// The view for the current criteria, without touching the map.
    pub fn current_view(&self) -> FilterView {
        let sites: Vec<Site> = filter_sites(self.catalog.sites(), &self.criteria)
            .into_iter()
            .cloned()
            .collect();
        let stats = project_stats(&sites);
        FilterView { sites, stats }
    }

    fn render(&self) -> FilterView {
        let view = self.current_view();
        let mut map = self.map.borrow_mut();
        map.show_sites(&view.sites);
        map.sync_route(self.route.route());
        view
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    // ========================================================================
    // Route
    // ========================================================================

    /// Add a catalog site to the route by id.
    pub fn add_to_route_by_id(&mut self, id: &str) -> bool {
        match self.catalog.get(id).cloned() {
            Some(site) => self.add_to_route(&site),
            None => {
                warn!("[Dashboard] Unknown site id '{}'", id);
                self.push_notice(Notice::error(format!("Unknown site '{}'.", id)));
                false
            }
        }
    }

    /// Add a site; returns false if it was already on the route.
    pub fn add_to_route(&mut self, site: &Site) -> bool {
        if self.route.add_to_route(site).is_added() {
            self.push_notice(Notice::success(format!("Site {} added to route.", site.name)));
            true
        } else {
            self.push_notice(Notice::info(format!("Site {} is already on the route.", site.name)));
            false
        }
    }

    pub fn remove_from_route(&mut self, id: &str) -> bool {
        match self.route.remove_from_route(id) {
            RemoveOutcome::Removed(site) => {
                self.push_notice(Notice::success(format!("Site {} removed from route.", site.name)));
                true
            }
            RemoveOutcome::NotFound => {
                self.push_notice(Notice::info(format!("Site {} is not on the route.", id)));
                false
            }
        }
    }

    /// Empty the route; returns how many stops were removed.
    pub fn clear_route(&mut self) -> usize {
        let removed = self.route.clear_route();
        self.push_notice(Notice::warning("Route cleared."));
        removed
    }

    pub fn route(&self) -> &[Site] {
        self.route.route()
    }

    pub fn route_summary(&self) -> RouteSummary {
        self.route.route_summary()
    }

    pub fn export_route_url(&self) -> Result<String> {
        self.route.export_route_url()
    }

    pub fn is_storage_degraded(&self) -> bool {
        self.route.is_degraded()
    }

    // ========================================================================
    // Map
    // ========================================================================

    /// Fit the current view's sites, or fall back to the configured default view.
    pub fn recenter(&self) -> ViewTarget {
        let view = self.current_view();
        recenter_view(&view.sites, &self.config.default_view)
    }

    /// Single-destination navigation link for one catalog site.
    pub fn site_navigation_url(&self, id: &str) -> Option<String> {
        let site = self.catalog.get(id)?;
        NavigationService::new(&self.config.navigation_base_url).destination_url(site)
    }

    pub fn marker_state(&self, id: &str) -> Option<MarkerState> {
        self.map.borrow().state_of(id)
    }

    /// Catalog sites within `radius_meters` of a site, nearest first, excluding itself.
    pub fn nearby_sites(&self, id: &str, radius_meters: f64) -> Vec<&Site> {
        let center = match self.catalog.get(id).and_then(Site::placement) {
            Some(center) => center,
            None => return Vec::new(),
        };
        self.index
            .find_nearby(center, radius_meters)
            .iter()
            .filter(|other| other.as_str() != id)
            .filter_map(|other| self.catalog.get(other))
            .collect()
    }

    // ========================================================================
    // Assistant & notices
    // ========================================================================

    pub fn ask(&self, question: &str) -> &str {
        self.assistant.answer(question)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn push_notice(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }
}

fn load_catalog(config: &PlannerConfig) -> (Catalog, Notice) {
    match config.catalog_source() {
        CatalogSource::File(path) => Catalog::load_or_empty(&path),
        #[cfg(feature = "http")]
        CatalogSource::Url(url) => crate::http::fetch_or_empty(&url),
        #[cfg(not(feature = "http"))]
        CatalogSource::Url(url) => {
            warn!("[Dashboard] Cannot fetch {} without the `http` feature", url);
            (Catalog::empty(), crate::catalog::load_failure_notice())
        }
    }
}
