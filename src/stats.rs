//! Aggregate statistics over a view of sites.

use serde::Serialize;

use crate::Site;

/// Raw aggregates for a set of sites.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub count: usize,
    /// Sum of site areas in square meters
    pub total_area: f64,
    /// Sum of fence lengths in meters
    pub total_fence_length: f64,
}

/// Project count and totals for any ordered sequence of sites.
///
/// Missing or non-finite measurements count as zero.
pub fn project_stats<'a, I>(sites: I) -> SiteStats
where
    I: IntoIterator<Item = &'a Site>,
{
    sites.into_iter().fold(SiteStats::default(), |mut acc, site| {
        acc.count += 1;
        acc.total_area += finite_or_zero(site.area_square_meters);
        acc.total_fence_length += finite_or_zero(site.fence_length_meters);
        acc
    })
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Format an area for display: thousands abbreviated to one decimal
/// (`125000` → `"125.0k"`), smaller values as whole numbers.
pub fn format_area(square_meters: f64) -> String {
    if square_meters >= 1000.0 {
        format!("{:.1}k", square_meters / 1000.0)
    } else {
        format!("{:.0}", square_meters)
    }
}
