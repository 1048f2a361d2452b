//! Site snapshot: the pages and cached speaking URLs the gateway resolves
//! against.
//!
//! ```json
//! {
//!   "pages": [
//!     {"uid": 1, "pid": 0, "title": "Home", "is_siteroot": true},
//!     {"uid": 10, "pid": 1, "title": "About Us"}
//!   ],
//!   "urls": [
//!     {"page_id": 10, "speaking_url": "company/about/"}
//!   ]
//! }
//! ```
//!
//! Page rows are kept verbatim; only `uid` is required. Pages without a
//! `urls` entry get a speaking URL derived from their titles on first
//! request.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use permalink_config::SiteConfig;
use permalink_core::memory::{MemoryPageStore, MemoryRewriteCache, SlugRewriteService};
use permalink_core::{
    PageId, PagePayload, PageRecord, PermalinkMatcher, PermalinkResolver, RewriteCacheEntry,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GatewayError, GatewayResult};

/// Serialized site data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSnapshot {
    /// Page rows.
    #[serde(default)]
    pub pages: Vec<PagePayload>,

    /// Pre-computed speaking URLs.
    #[serde(default)]
    pub urls: Vec<UrlSnapshot>,
}

/// One rewrite cache row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UrlSnapshot {
    /// Page the URL belongs to.
    pub page_id: u64,
    /// Speaking path, relative to the site root.
    pub speaking_url: String,
}

impl SiteSnapshot {
    /// Parses a snapshot from JSON.
    pub fn from_json(content: &str) -> GatewayResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads and parses a snapshot file.
    pub fn from_file(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::site(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }
}

/// In-memory site data shared by the resolver and the health endpoint.
#[derive(Debug, Clone, Default)]
pub struct Site {
    pages: Arc<MemoryPageStore>,
    cache: Arc<MemoryRewriteCache>,
}

impl Site {
    /// Creates a site without pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the snapshot named in the configuration, or an empty site.
    pub fn load(config: &SiteConfig) -> GatewayResult<Self> {
        match &config.snapshot_path {
            Some(path) => {
                let site = Self::from_snapshot(SiteSnapshot::from_file(path)?)?;
                info!(
                    path = %path,
                    pages = site.pages.len(),
                    cached_urls = site.cache.len(),
                    "site snapshot loaded"
                );
                Ok(site)
            }
            None => {
                info!("no site snapshot configured, starting with an empty site");
                Ok(Self::new())
            }
        }
    }

    /// Builds the in-memory stores from a snapshot.
    ///
    /// Fails on the first page without a usable `uid` and on URL rows for
    /// page 0. Later rows replace earlier ones with the same id.
    pub fn from_snapshot(snapshot: SiteSnapshot) -> GatewayResult<Self> {
        let site = Self::new();

        for row in snapshot.pages {
            site.pages.insert(PageRecord::from_row(row)?);
        }

        for url in snapshot.urls {
            let page_id = PageId::new(url.page_id)
                .ok_or_else(|| GatewayError::site("url row with page_id 0"))?;
            site.cache
                .insert(RewriteCacheEntry::new(page_id, url.speaking_url));
        }

        Ok(site)
    }

    /// Page store.
    #[must_use]
    pub fn pages(&self) -> &Arc<MemoryPageStore> {
        &self.pages
    }

    /// Rewrite cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<MemoryRewriteCache> {
        &self.cache
    }

    /// Builds a resolver over this site for the given permalink segment.
    pub fn resolver(&self, segment: &str) -> GatewayResult<PermalinkResolver> {
        let matcher = PermalinkMatcher::with_segment(segment)?;
        let service = SlugRewriteService::new(self.pages.clone(), self.cache.clone());
        Ok(
            PermalinkResolver::new(self.pages.clone(), service, self.cache.clone())
                .with_matcher(matcher),
        )
    }
}
