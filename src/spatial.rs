//! Spatial index over placeable sites for map viewport queries.

use rstar::{RTree, RTreeObject, AABB};

use crate::{Bounds, GpsPoint, Site};

/// Site position wrapper for R-tree indexing.
#[derive(Debug, Clone)]
struct SitePosition {
    site_id: String,
    point: GpsPoint,
}

impl RTreeObject for SitePosition {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.longitude, self.point.latitude])
    }
}

/// R-tree of site positions. Sites without valid coordinates are not indexed.
#[derive(Debug)]
pub struct SiteIndex {
    tree: RTree<SitePosition>,
}

impl SiteIndex {
    pub fn build<'a, I>(sites: I) -> Self
    where
        I: IntoIterator<Item = &'a Site>,
    {
        let positions: Vec<SitePosition> = sites
            .into_iter()
            .filter_map(|site| {
                site.placement().map(|point| SitePosition {
                    site_id: site.id.clone(),
                    point,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(positions),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Ids of sites inside a viewport.
    pub fn query_viewport(&self, bounds: &Bounds) -> Vec<String> {
        let search_bounds = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );

        self.tree
            .locate_in_envelope(&search_bounds)
            .map(|p| p.site_id.clone())
            .collect()
    }

    /// Ids of sites within `radius_meters` of a point, nearest first.
    pub fn find_nearby(&self, center: GpsPoint, radius_meters: f64) -> Vec<String> {
        // ~111 km per degree of latitude; widen longitude by latitude
        let lat_degrees = radius_meters / 111_000.0;
        let lng_degrees = lat_degrees / center.latitude.to_radians().cos().abs().max(0.01);
        let search_bounds = AABB::from_corners(
            [center.longitude - lng_degrees, center.latitude - lat_degrees],
            [center.longitude + lng_degrees, center.latitude + lat_degrees],
        );

        let mut hits: Vec<(f64, &SitePosition)> = self
            .tree
            .locate_in_envelope(&search_bounds)
            .map(|p| (center.haversine_distance(&p.point), p))
            .filter(|(distance, _)| *distance <= radius_meters)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, p)| p.site_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sites() -> Vec<Site> {
        vec![
            Site::new("a", "A", "CB").with_location(GpsPoint::new(49.00, 14.00)),
            Site::new("b", "B", "CB").with_location(GpsPoint::new(49.01, 14.00)),
            Site::new("c", "C", "TA").with_location(GpsPoint::new(49.50, 14.60)),
            Site::new("x", "No coords", "TA"),
        ]
    }

    #[test]
    fn test_unplaceable_not_indexed() {
        let index = SiteIndex::build(&sample_sites());
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_viewport_query() {
        let index = SiteIndex::build(&sample_sites());
        let mut ids = index.query_viewport(&Bounds {
            min_lat: 48.9,
            max_lat: 49.1,
            min_lng: 13.9,
            max_lng: 14.1,
        });
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        let ids = index.query_viewport(&Bounds {
            min_lat: 40.0,
            max_lat: 41.0,
            min_lng: -75.0,
            max_lng: -74.0,
        });
        assert!(ids.is_empty());
    }

    #[test]
    fn test_find_nearby_sorted_by_distance() {
        let index = SiteIndex::build(&sample_sites());
        let ids = index.find_nearby(GpsPoint::new(49.009, 14.0), 2_000.0);
        assert_eq!(ids, vec!["b", "a"]);

        let ids = index.find_nearby(GpsPoint::new(49.009, 14.0), 500.0);
        assert_eq!(ids, vec!["b"]);
    }
}
