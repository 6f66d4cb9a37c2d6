//! # Route Manager
//!
//! Owns the ordered, duplicate-free visit route.
//!
//! ## Architecture
//!
//! The manager is a plain owned object, not a global. It:
//! - Loads the route from a [`RouteStore`] once, at construction
//! - Mutates it only through add / remove / clear
//! - Writes it back after every successful mutation (one write each)
//! - Notifies subscribers synchronously before the mutating call returns
//!
//! Rendering (route list, badge, map markers) lives in subscribers, so the
//! state transitions here are testable without any UI.
//!
//! ## Storage failures
//!
//! A failed read or write never reaches the caller. The manager logs a
//! warning once, emits [`RouteEvent::StorageDegraded`] once, and from then
//! on keeps the route in memory only.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::Result;
use crate::navigation::NavigationService;
use crate::store::RouteStore;
use crate::{Catalog, Site};

// ============================================================================
// Outcomes and Events
// ============================================================================

/// Result of [`RouteManager::add_to_route`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum AddOutcome {
    Added,
    /// Site was already on the route; nothing changed
    Duplicate,
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added)
    }
}

/// Result of [`RouteManager::remove_from_route`].
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum RemoveOutcome {
    Removed(Site),
    /// No entry with that id; nothing changed
    NotFound,
}

impl RemoveOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, RemoveOutcome::Removed(_))
    }
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RouteEvent {
    Added { id: String },
    Removed { id: String },
    Cleared { removed: usize },
    /// Storage failed; the route is now kept in memory only
    StorageDegraded { message: String },
}

/// Handle returned by [`RouteManager::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&RouteEvent, &[Site])>;

struct Subscriber {
    id: SubscriptionId,
    callback: Callback,
}

/// Aggregates shown in the route panel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub stops: usize,
    pub total_area: f64,
    /// Straight-line distance between consecutive placeable stops, in meters
    pub travel_distance: f64,
}

// ============================================================================
// Route Manager
// ============================================================================

pub struct RouteManager {
    entries: Vec<Site>,
    store: RouteStore,
    navigation: NavigationService,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
    /// Set after the first storage failure; no further storage access
    degraded: bool,
    pending_warning: Option<String>,
}

impl RouteManager {
    /// Open the route stored in `store`, resolving entries against `catalog`.
    ///
    /// Never fails. If the store cannot be read, the manager starts with an
    /// empty, in-memory-only route.
    pub fn open(store: RouteStore, catalog: &Catalog) -> Self {
        let mut manager = Self {
            entries: Vec::new(),
            store,
            navigation: NavigationService::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
            degraded: false,
            pending_warning: None,
        };

        match manager.store.read(catalog) {
            Ok(entries) => {
                info!(
                    "[RouteManager] Restored {} stops from '{}'",
                    entries.len(),
                    manager.store.key()
                );
                manager.entries = entries;
            }
            Err(e) => manager.degrade(&e.to_string()),
        }

        manager
    }

    /// A manager over fresh in-memory storage.
    pub fn in_memory() -> Self {
        Self::open(RouteStore::in_memory(), &Catalog::empty())
    }

    /// Use a different navigation service for [`export_route_url`](Self::export_route_url).
    pub fn with_navigation(mut self, navigation: NavigationService) -> Self {
        self.navigation = navigation;
        self
    }

    // ========================================================================
    // Subscribers
    // ========================================================================

    /// Register a callback run after every route change.
    ///
    /// If storage already failed during construction, the new subscriber is
    /// told immediately so the warning is not lost.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&RouteEvent, &[Site]) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            callback: Box::new(callback),
        });

        if let Some(message) = self.pending_warning.take() {
            self.notify(RouteEvent::StorageDegraded { message });
        }
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, event: RouteEvent) {
        debug!("[RouteManager] {:?} ({} subscribers)", event, self.subscribers.len());
        for subscriber in self.subscribers.iter_mut() {
            (subscriber.callback)(&event, &self.entries);
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a site unless its id is already on the route.
    pub fn add_to_route(&mut self, site: &Site) -> AddOutcome {
        if self.contains(&site.id) {
            debug!("[RouteManager] '{}' already on route", site.id);
            return AddOutcome::Duplicate;
        }

        self.entries.push(site.clone());
        self.persist();
        self.notify(RouteEvent::Added {
            id: site.id.clone(),
        });
        AddOutcome::Added
    }

    /// Remove the entry with this id, if present.
    pub fn remove_from_route(&mut self, id: &str) -> RemoveOutcome {
        let index = match self.entries.iter().position(|s| s.id == id) {
            Some(index) => index,
            None => {
                debug!("[RouteManager] '{}' not on route", id);
                return RemoveOutcome::NotFound;
            }
        };

        let removed = self.entries.remove(index);
        self.persist();
        self.notify(RouteEvent::Removed { id: removed.id.clone() });
        RemoveOutcome::Removed(removed)
    }

    /// Empty the route. Always persists and notifies; returns how many stops
    /// were removed.
    pub fn clear_route(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.persist();
        self.notify(RouteEvent::Cleared { removed });
        removed
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Owned snapshot of the route in visit order.
    pub fn get_route(&self) -> Vec<Site> {
        self.entries.clone()
    }

    /// Borrowed read-only view of the route.
    pub fn route(&self) -> &[Site] {
        &self.entries
    }

    /// Ids on the route, for membership tests.
    pub fn route_ids(&self) -> HashSet<String> {
        self.entries.iter().map(|s| s.id.clone()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once storage has failed and the route is memory-only.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Navigation URL visiting every stop in order.
    ///
    /// Errors with [`crate::PlannerError::EmptyRoute`] when no stop has
    /// coordinates.
    pub fn export_route_url(&self) -> Result<String> {
        self.navigation.route_url(&self.entries)
    }

    /// Stop count, total area and straight-line travel distance.
    pub fn route_summary(&self) -> RouteSummary {
        let stats = crate::project_stats(&self.entries);
        let points: Vec<_> = self.entries.iter().filter_map(Site::placement).collect();
        let travel_distance = points
            .windows(2)
            .map(|pair| pair[0].haversine_distance(&pair[1]))
            .sum();

        RouteSummary {
            stops: stats.count,
            total_area: stats.total_area,
            travel_distance,
        }
    }

    // ========================================================================
    // Storage
    // ========================================================================

    fn persist(&mut self) {
        if self.degraded {
            return;
        }
        if let Err(e) = self.store.write(&self.entries) {
            self.degrade(&e.to_string());
        }
    }

    /// Switch to memory-only operation, warning once per session.
    fn degrade(&mut self, reason: &str) {
        if self.degraded {
            return;
        }
        self.degraded = true;
        warn!(
            "[RouteManager] Route storage unavailable, continuing in memory only: {}",
            reason
        );

        let message = reason.to_string();
        if self.subscribers.is_empty() {
            self.pending_warning = Some(message);
        } else {
            self.notify(RouteEvent::StorageDegraded { message });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
