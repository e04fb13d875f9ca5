//! Visit tracking
//!
//! One record per `(page, fingerprint)`: a repeat visit only refreshes the
//! timestamp, so counts are unique visitors. The administrator's own
//! fingerprint is never recorded and is left out of every statistic.
//! Sections of the storefront also keep a plain view counter.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::Result;

/// Page recorded when a visit comes in without a path
pub const DEFAULT_PAGE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisit {
    pub page_path: String,
    pub visitor_fingerprint: String,
    pub visited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    pub page_path: String,
    pub unique_visitors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_path: String,
    pub unique_visitors: usize,
    pub last_visit: Option<DateTime<Utc>>,
}

/// Storefront sections with a view counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Catalog,
    Articles,
    Promocodes,
    Comparisons,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Catalog,
        Section::Articles,
        Section::Promocodes,
        Section::Comparisons,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Catalog => "catalog",
            Section::Articles => "articles",
            Section::Promocodes => "promocodes",
            Section::Comparisons => "comparisons",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.as_str() == s.to_lowercase())
    }

    /// Blob key of the counter
    pub fn views_key(&self) -> String {
        format!("{}_views", self.as_str())
    }
}

fn page_or_default(page_path: &str) -> &str {
    match page_path.trim() {
        "" => DEFAULT_PAGE,
        path => path,
    }
}

/// Visit tracking service
pub trait Analytics {
    /// Record a visit; `false` when it was skipped (no fingerprint, or the admin)
    fn track_visit(
        &mut self,
        page_path: &str,
        fingerprint: &str,
        admin_fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    fn page_stats(&self, page_path: &str, admin_fingerprint: &str) -> Result<PageStats>;

    /// Every tracked page, most visited first
    fn all_stats(&self, admin_fingerprint: &str) -> Result<Vec<PageSummary>>;

    /// Distinct visitors across all pages
    fn total_unique_visitors(&self, admin_fingerprint: &str) -> Result<usize>;

    /// Bump a section counter, returning the new value
    fn record_view(&mut self, section: Section) -> Result<u64>;

    fn views(&self, section: Section) -> Result<u64>;
}

/// `Analytics` over the `page_visits` blob and the `<section>_views` counters
pub struct BlobAnalytics<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> BlobAnalytics<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn load_visits(&self) -> Result<Vec<PageVisit>> {
        Ok(load_json(&self.store, keys::PAGE_VISITS)?.unwrap_or_default())
    }

    /// Visits from everyone but the admin
    fn visitor_visits(&self, admin_fingerprint: &str) -> Result<Vec<PageVisit>> {
        let mut visits = self.load_visits()?;
        visits.retain(|v| v.visitor_fingerprint != admin_fingerprint);
        Ok(visits)
    }
}

impl<S: BlobStore> Analytics for BlobAnalytics<S> {
    fn track_visit(
        &mut self,
        page_path: &str,
        fingerprint: &str,
        admin_fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if fingerprint.is_empty() || fingerprint == admin_fingerprint {
            log::debug!("Visit not tracked for {:?}", fingerprint);
            return Ok(false);
        }
        let page_path = page_or_default(page_path);

        let mut visits = self.load_visits()?;
        match visits
            .iter_mut()
            .find(|v| v.page_path == page_path && v.visitor_fingerprint == fingerprint)
        {
            Some(visit) => visit.visited_at = now,
            None => visits.push(PageVisit {
                page_path: page_path.to_string(),
                visitor_fingerprint: fingerprint.to_string(),
                visited_at: now,
            }),
        }
        save_json(&mut self.store, keys::PAGE_VISITS, &visits)?;
        Ok(true)
    }

    fn page_stats(&self, page_path: &str, admin_fingerprint: &str) -> Result<PageStats> {
        let page_path = page_or_default(page_path);
        let unique_visitors = self
            .visitor_visits(admin_fingerprint)?
            .iter()
            .filter(|v| v.page_path == page_path)
            .map(|v| v.visitor_fingerprint.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        Ok(PageStats {
            page_path: page_path.to_string(),
            unique_visitors,
        })
    }

    fn all_stats(&self, admin_fingerprint: &str) -> Result<Vec<PageSummary>> {
        let visits = self.visitor_visits(admin_fingerprint)?;

        let mut pages: BTreeMap<&str, (BTreeSet<&str>, Option<DateTime<Utc>>)> = BTreeMap::new();
        for visit in &visits {
            let (visitors, last) = pages.entry(visit.page_path.as_str()).or_default();
            visitors.insert(visit.visitor_fingerprint.as_str());
            *last = (*last).max(Some(visit.visited_at));
        }

        let mut stats: Vec<PageSummary> = pages
            .into_iter()
            .map(|(page_path, (visitors, last_visit))| PageSummary {
                page_path: page_path.to_string(),
                unique_visitors: visitors.len(),
                last_visit,
            })
            .collect();
        // BTreeMap order already sorts by path; stable sort keeps it for ties
        stats.sort_by(|a, b| b.unique_visitors.cmp(&a.unique_visitors));
        Ok(stats)
    }

    fn total_unique_visitors(&self, admin_fingerprint: &str) -> Result<usize> {
        let visits = self.visitor_visits(admin_fingerprint)?;
        Ok(visits
            .iter()
            .map(|v| v.visitor_fingerprint.as_str())
            .collect::<BTreeSet<_>>()
            .len())
    }

    fn record_view(&mut self, section: Section) -> Result<u64> {
        let views = self.views(section)? + 1;
        save_json(&mut self.store, &section.views_key(), &views)?;
        Ok(views)
    }

    fn views(&self, section: Section) -> Result<u64> {
        Ok(load_json(&self.store, &section.views_key())?.unwrap_or(0))
    }
}
