//! Collaborator interfaces.
//!
//! The resolver never owns page data or speaking URLs. It reaches them
//! through three narrow, synchronous traits. Implementations handle their
//! own concurrency; the resolver imposes no locking of its own.

use crate::encoder::EncoderRequest;
use crate::error::PermalinkResult;
use crate::page::{PageId, PageRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Table holding page rows.
pub const PAGES_TABLE: &str = "pages";

/// Table holding cached speaking URLs.
pub const URL_DATA_TABLE: &str = "tx_realurl_urldata";

/// One row of the rewrite cache: the speaking path of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteCacheEntry {
    /// The page this entry belongs to.
    pub page_id: PageId,
    /// Relative speaking path (e.g. `about/team/`).
    pub speaking_url: String,
}

impl RewriteCacheEntry {
    /// Creates a cache entry.
    #[must_use]
    pub fn new(page_id: PageId, speaking_url: impl Into<String>) -> Self {
        Self {
            page_id,
            speaking_url: speaking_url.into(),
        }
    }
}

/// Read-only access to page rows.
pub trait PageStore: Send + Sync {
    /// Looks up a page by primary key. A miss is `Ok(None)`, not an error.
    fn find_page(&self, id: PageId) -> PermalinkResult<Option<PageRecord>>;
}

/// Generates speaking URLs and writes them to the rewrite cache.
pub trait RewriteService: Send + Sync {
    /// Makes sure the rewrite cache holds an entry for the request's page.
    ///
    /// Callers rely only on the side effect, never on a return value.
    fn ensure_cached(&self, request: &EncoderRequest) -> PermalinkResult<()>;
}

/// Read-only access to cached speaking URLs.
pub trait RewriteCache: Send + Sync {
    /// Looks up the cache entry for a page.
    fn find_by_page_id(&self, id: PageId) -> PermalinkResult<Option<RewriteCacheEntry>>;
}

impl<T: PageStore + ?Sized> PageStore for Arc<T> {
    fn find_page(&self, id: PageId) -> PermalinkResult<Option<PageRecord>> {
        (**self).find_page(id)
    }
}

impl<T: RewriteService + ?Sized> RewriteService for Arc<T> {
    fn ensure_cached(&self, request: &EncoderRequest) -> PermalinkResult<()> {
        (**self).ensure_cached(request)
    }
}

impl<T: RewriteCache + ?Sized> RewriteCache for Arc<T> {
    fn find_by_page_id(&self, id: PageId) -> PermalinkResult<Option<RewriteCacheEntry>> {
        (**self).find_by_page_id(id)
    }
}
