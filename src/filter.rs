//! # Filter Engine
//!
//! Pure filtering of the catalog by free text, district and category.
//!
//! Filtering is stable: the result keeps catalog order and is never
//! re-sorted. Applying the same criteria to an already filtered view
//! returns the same view.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Site;

/// Sentinel tag value meaning "no constraint".
pub const ALL: &str = "all";

/// Constraint on a single tag dimension.
///
/// Parsed from a selector value: `"all"` means [`TagFilter::All`], anything
/// else is an exact match. A site without a tag (e.g. an unclassified
/// category) is a distinct value of its own and only matches
/// `Exact("")`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TagFilter {
    #[default]
    All,
    Exact(String),
}

impl TagFilter {
    pub fn parse(value: &str) -> Self {
        if value == ALL {
            TagFilter::All
        } else {
            TagFilter::Exact(value.to_string())
        }
    }

    /// Check a site's tag against this constraint.
    pub fn matches(&self, tag: Option<&str>) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Exact(wanted) => match tag {
                Some(tag) => tag == wanted,
                None => wanted.is_empty(),
            },
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, TagFilter::All)
    }
}

impl From<&str> for TagFilter {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for TagFilter {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TagFilter> for String {
    fn from(filter: TagFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFilter::All => f.write_str(ALL),
            TagFilter::Exact(tag) => f.write_str(tag),
        }
    }
}

/// The complete set of filter inputs.
///
/// Defaults are the "show everything" state: empty search text and no
/// district or category constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against name or locality
    pub search_text: String,
    pub district_filter: TagFilter,
    pub category_filter: TagFilter,
}

impl FilterCriteria {
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn district(mut self, district: impl Into<TagFilter>) -> Self {
        self.district_filter = district.into();
        self
    }

    pub fn category(mut self, category: impl Into<TagFilter>) -> Self {
        self.category_filter = category.into();
        self
    }

    /// Check whether a single site satisfies every constraint.
    pub fn matches(&self, site: &Site) -> bool {
        self.district_filter.matches(Some(site.district.as_str()))
            && self.category_filter.matches(site.category.as_deref())
            && self.matches_text(site)
    }

    fn matches_text(&self, site: &Site) -> bool {
        let needle = self.search_text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        site.name.to_lowercase().contains(&needle) || site.locality.to_lowercase().contains(&needle)
    }
}

/// Return the ordered subsequence of sites matching the criteria.
///
/// Accepts the catalog slice or an earlier filter result.
///
/// # Example
/// ```
/// use areal_route::{filter_sites, FilterCriteria, Site};
///
/// let sites = vec![
///     Site::new("1", "VDJ Jankov", "CB"),
///     Site::new("2", "VDJ Chlum", "CB"),
///     Site::new("3", "VDJ Ptáčník", "PT"),
/// ];
/// let view = filter_sites(&sites, &FilterCriteria::default().district("CB"));
/// assert_eq!(view.len(), 2);
/// ```
pub fn filter_sites<'a, I>(sites: I, criteria: &FilterCriteria) -> Vec<&'a Site>
where
    I: IntoIterator<Item = &'a Site>,
{
    sites.into_iter().filter(|site| criteria.matches(site)).collect()
}

/// Sorted, distinct district tags for populating a district selector.
pub fn distinct_districts(sites: &[Site]) -> Vec<String> {
    sites
        .iter()
        .filter(|s| !s.district.is_empty())
        .map(|s| s.district.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted, distinct category tags. Unclassified sites are reported as an
/// empty string so they can be selected on their own.
pub fn distinct_categories(sites: &[Site]) -> Vec<String> {
    sites
        .iter()
        .map(|s| s.category.clone().unwrap_or_default())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
