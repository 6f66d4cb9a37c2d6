//! Navigation URL construction for the external mapping service.
//!
//! One-way only: URLs are built, never requested.

use log::debug;

use crate::error::{OptionExt, Result};
use crate::{GpsPoint, Site};

/// Default turn-by-turn navigation service.
pub const DEFAULT_NAVIGATION_BASE_URL: &str = "https://www.google.com/maps/dir/";

/// Builds waypoint URLs in the `<base>/<lat>,<lng>/<lat>,<lng>/...` scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationService {
    base_url: String,
}

impl Default for NavigationService {
    fn default() -> Self {
        Self::new(DEFAULT_NAVIGATION_BASE_URL)
    }
}

impl NavigationService {
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL visiting every placeable site in order.
    ///
    /// Sites without valid coordinates are skipped. Fails with
    /// [`crate::PlannerError::EmptyRoute`] when nothing is left to visit.
    pub fn route_url(&self, sites: &[Site]) -> Result<String> {
        let waypoints: Vec<String> = sites
            .iter()
            .filter_map(|site| {
                let point = site.placement();
                if point.is_none() {
                    debug!("[Navigation] Skipping '{}' without coordinates", site.id);
                }
                point
            })
            .map(|p| coordinate_pair(&p))
            .collect();

        let path = Some(waypoints.join("/")).filter(|p| !p.is_empty()).ok_or_empty_route()?;
        Ok(format!("{}{}", self.base_url, path))
    }

    /// Single-destination URL for one site, `None` if it has no coordinates.
    pub fn destination_url(&self, site: &Site) -> Option<String> {
        site.placement()
            .map(|p| format!("{}?api=1&destination={}", self.base_url, coordinate_pair(&p)))
    }
}

/// Format a point as `"<lat>,<lng>"`.
pub fn coordinate_pair(point: &GpsPoint) -> String {
    format!("{},{}", point.latitude, point.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlannerError;

    fn site(id: &str, lat: f64, lng: f64) -> Site {
        Site::new(id, id.to_uppercase(), "CB").with_location(GpsPoint::new(lat, lng))
    }

    #[test]
    fn test_route_url_in_order() {
        let nav = NavigationService::default();
        let url = nav
            .route_url(&[site("a", 49.02671, 13.994001), site("b", 49.03, 14.01)])
            .unwrap();
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/49.02671,13.994001/49.03,14.01"
        );
    }

    #[test]
    fn test_unplaceable_sites_skipped() {
        let nav = NavigationService::default();
        let url = nav
            .route_url(&[Site::new("x", "X", "CB"), site("a", 49.5, 14.5)])
            .unwrap();
        assert!(url.ends_with("/49.5,14.5"));
    }

    #[test]
    fn test_empty_route_is_error() {
        let nav = NavigationService::default();
        assert!(matches!(nav.route_url(&[]), Err(PlannerError::EmptyRoute)));
        assert!(matches!(
            nav.route_url(&[Site::new("x", "X", "CB")]),
            Err(PlannerError::EmptyRoute)
        ));
    }

    #[test]
    fn test_custom_base_gets_trailing_slash() {
        let nav = NavigationService::new("https://maps.example/dir");
        assert_eq!(nav.base_url(), "https://maps.example/dir/");
    }

    #[test]
    fn test_destination_url() {
        let nav = NavigationService::default();
        assert_eq!(
            nav.destination_url(&site("a", 49.1, 14.2)).as_deref(),
            Some("https://www.google.com/maps/dir/?api=1&destination=49.1,14.2")
        );
        assert!(nav.destination_url(&Site::new("x", "X", "CB")).is_none());
    }
}
