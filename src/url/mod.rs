//! URL handling module for Fitment-Harvester
//!
//! This module provides discovered-link normalization, resource URL
//! resolution, host matching and the deduplicated set of discovered
//! product URLs.

mod domain;
mod normalize;

use std::collections::BTreeSet;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, host_matches, is_on_domain};
pub use normalize::{absolutize, normalize_discovered_url};

/// Deduplicated set of normalized candidate product URLs
///
/// Every URL is stored in normalized form (see [`normalize_discovered_url`]),
/// so the same product reached through different listings, anchors or query
/// strings is stored once. Membership is the only contract; iteration order
/// is lexicographic and carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredUrlSet {
    urls: BTreeSet<String>,
}

impl DiscoveredUrlSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes `href` against `base` and inserts it
    ///
    /// Returns `true` only when the normalized URL was not already present.
    /// Hrefs that cannot be normalized are ignored.
    pub fn insert(&mut self, href: &str, base: &Url) -> bool {
        match normalize_discovered_url(href, base) {
            Ok(url) => self.urls.insert(url),
            Err(e) => {
                tracing::trace!("Skipping link '{}': {}", href, e);
                false
            }
        }
    }

    /// Returns true if the normalized form of `href` is present
    pub fn contains(&self, href: &str, base: &Url) -> bool {
        normalize_discovered_url(href, base)
            .map(|url| self.urls.contains(&url))
            .unwrap_or(false)
    }

    /// Unions another set into this one, returning how many URLs were new
    pub fn merge(&mut self, other: DiscoveredUrlSet) -> usize {
        let before = self.urls.len();
        self.urls.extend(other.urls);
        self.urls.len() - before
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.acurapartswarehouse.com").unwrap()
    }

    #[test]
    fn test_insert_deduplicates_by_normalized_form() {
        let mut set = DiscoveredUrlSet::new();
        assert!(set.insert("/oem-acura-rims.html", &base()));
        assert!(!set.insert("/oem-acura-rims.html?page=2", &base()));
        assert!(!set.insert("/oem-acura-rims.html#top", &base()));
        assert!(!set.insert(
            "https://www.acurapartswarehouse.com/oem-acura-rims.html/",
            &base()
        ));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_insert_ignores_unusable_links() {
        let mut set = DiscoveredUrlSet::new();
        assert!(!set.insert("javascript:void(0)", &base()));
        assert!(!set.insert("#", &base()));
        assert!(set.is_empty());
    }

    #[test]
    fn test_contains_uses_normalized_form() {
        let mut set = DiscoveredUrlSet::new();
        set.insert("/oem/acura~wheel~42700-tk4-a51.html", &base());
        assert!(set.contains("/oem/acura~wheel~42700-tk4-a51.html?ref=x", &base()));
        assert!(!set.contains("/oem/acura~wheel~other.html", &base()));
    }

    #[test]
    fn test_union_is_order_independent() {
        let links_a = ["/a.html", "/b.html?x=1", "/c.html"];
        let links_b = ["/c.html#frag", "/d.html", "/a.html/"];

        let build = |links: &[&str]| {
            let mut set = DiscoveredUrlSet::new();
            for link in links {
                set.insert(link, &base());
            }
            set
        };

        let mut forward = build(&links_a);
        forward.merge(build(&links_b));

        let mut backward = build(&links_b);
        let added = backward.merge(build(&links_a));

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 4);
        assert_eq!(added, 1);
    }

    #[test]
    fn test_into_vec_contains_every_member_once() {
        let mut set = DiscoveredUrlSet::new();
        set.insert("/b.html", &base());
        set.insert("/a.html", &base());
        set.insert("/a.html?dup", &base());
        let urls = set.into_vec();
        assert_eq!(
            urls,
            vec![
                "https://www.acurapartswarehouse.com/a.html".to_string(),
                "https://www.acurapartswarehouse.com/b.html".to_string(),
            ]
        );
    }
}
