//! # Map Sync Bridge
//!
//! Derives marker state for every displayed site and pushes it to the
//! map-rendering collaborator.
//!
//! A marker has two states, [`MarkerState::Default`] and
//! [`MarkerState::OnRoute`], and its state is a pure projection of route
//! membership. The bridge is the only place that decides marker styling;
//! the collaborator behind [`MarkerSink`] only draws what it is told.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Bounds, GpsPoint, Site};

/// Visual state of one site's marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerState {
    #[default]
    Default,
    OnRoute,
}

impl MarkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerState::Default => "default",
            MarkerState::OnRoute => "on-route",
        }
    }
}

/// `OnRoute` if the site's id is on the route, otherwise `Default`.
pub fn display_state(site: &Site, route_ids: &HashSet<String>) -> MarkerState {
    if route_ids.contains(&site.id) {
        MarkerState::OnRoute
    } else {
        MarkerState::Default
    }
}

/// The map-rendering collaborator.
pub trait MarkerSink {
    /// Replace the set of rendered markers. Every new marker starts in
    /// [`MarkerState::Default`].
    fn show_markers(&mut self, sites: &[Site]);

    /// Restyle one marker.
    fn set_marker_state(&mut self, site_id: &str, state: MarkerState);
}

/// Sink that renders nothing (headless use).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMarkerSink;

impl MarkerSink for NullMarkerSink {
    fn show_markers(&mut self, _sites: &[Site]) {}

    fn set_marker_state(&mut self, _site_id: &str, _state: MarkerState) {}
}

// ============================================================================
// Bridge
// ============================================================================

pub struct MapSyncBridge {
    sink: Box<dyn MarkerSink>,
    /// Placeable sites currently rendered, in display order
    displayed: Vec<Site>,
    route_ids: HashSet<String>,
    states: HashMap<String, MarkerState>,
}

impl MapSyncBridge {
    pub fn new(sink: Box<dyn MarkerSink>) -> Self {
        Self {
            sink,
            displayed: Vec::new(),
            route_ids: HashSet::new(),
            states: HashMap::new(),
        }
    }

    /// Filter changed: render a new set of sites.
    ///
    /// Sites without valid coordinates are left off the map.
    pub fn show_sites<'a, I>(&mut self, sites: I)
    where
        I: IntoIterator<Item = &'a Site>,
    {
        self.displayed = sites
            .into_iter()
            .filter(|s| s.is_placeable())
            .cloned()
            .collect();

        self.states = self
            .displayed
            .iter()
            .map(|site| (site.id.clone(), MarkerState::Default))
            .collect();
        self.sink.show_markers(&self.displayed);
        debug!("[MapSync] Showing {} markers", self.displayed.len());

        self.push_states();
    }

    /// Route changed: recompute on-route membership for every displayed site.
    pub fn sync_route(&mut self, route: &[Site]) {
        self.route_ids = route.iter().map(|s| s.id.clone()).collect();
        self.push_states();
    }

    fn push_states(&mut self) {
        for site in &self.displayed {
            let state = display_state(site, &self.route_ids);
            self.states.insert(site.id.clone(), state);
            self.sink.set_marker_state(&site.id, state);
        }
    }

    /// Last state pushed for a site; `None` if it is not displayed.
    pub fn state_of(&self, site_id: &str) -> Option<MarkerState> {
        self.states.get(site_id).copied()
    }

    pub fn displayed(&self) -> &[Site] {
        &self.displayed
    }
}

// ============================================================================
// Map View
// ============================================================================

/// Fallback map view when there is nothing to fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: GpsPoint,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: GpsPoint::new(49.7, 15.5),
            zoom: 8,
        }
    }
}

/// Where the map should move after a recenter request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewTarget {
    /// Fit these bounds with the given padding in pixels
    Fit { bounds: Bounds, padding: u32 },
    Center { center: GpsPoint, zoom: u8 },
}

/// Padding used when fitting markers into view.
pub const FIT_PADDING_PX: u32 = 50;

/// Fit all placeable sites, or fall back to the default view.
pub fn recenter_view<'a, I>(sites: I, fallback: &MapView) -> ViewTarget
where
    I: IntoIterator<Item = &'a Site>,
{
    let points: Vec<GpsPoint> = sites.into_iter().filter_map(Site::placement).collect();
    match Bounds::from_points(&points) {
        Some(bounds) => ViewTarget::Fit {
            bounds,
            padding: FIT_PADDING_PX,
        },
        None => ViewTarget::Center {
            center: fallback.center,
            zoom: fallback.zoom,
        },
    }
}
