//! In-memory collaborators.
//!
//! [`MemoryPageStore`] and [`MemoryRewriteCache`] back the gateway's site
//! snapshot and the test suites. [`SlugRewriteService`] fills the rewrite
//! cache with paths derived from page titles, the way a URL encoder builds
//! a speaking path from a page's rootline.

use crate::encoder::EncoderRequest;
use crate::error::PermalinkResult;
use crate::page::{PageId, PageRecord};
use crate::store::{PageStore, RewriteCache, RewriteCacheEntry, RewriteService};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of ancestors followed when building a speaking path.
pub const MAX_ROOTLINE_DEPTH: usize = 32;

/// Page rows held in memory.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: RwLock<HashMap<PageId, PageRecord>>,
}

impl MemoryPageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a page.
    pub fn insert(&self, page: PageRecord) {
        self.pages.write().insert(page.uid(), page);
    }

    /// Removes a page, returning it if present.
    pub fn remove(&self, id: PageId) -> Option<PageRecord> {
        self.pages.write().remove(&id)
    }

    /// Returns the number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    /// Returns true if the store holds no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }
}

impl PageStore for MemoryPageStore {
    fn find_page(&self, id: PageId) -> PermalinkResult<Option<PageRecord>> {
        Ok(self.pages.read().get(&id).cloned())
    }
}

/// Speaking URLs held in memory, keyed by page.
#[derive(Debug, Default)]
pub struct MemoryRewriteCache {
    entries: RwLock<HashMap<PageId, RewriteCacheEntry>>,
}

impl MemoryRewriteCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry.
    pub fn insert(&self, entry: RewriteCacheEntry) {
        self.entries.write().insert(entry.page_id, entry);
    }

    /// Inserts an entry unless one already exists. Returns true if inserted.
    pub fn insert_if_absent(&self, entry: RewriteCacheEntry) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&entry.page_id) {
            return false;
        }
        entries.insert(entry.page_id, entry);
        true
    }

    /// Returns true if an entry exists for the page.
    #[must_use]
    pub fn contains(&self, id: PageId) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl RewriteCache for MemoryRewriteCache {
    fn find_by_page_id(&self, id: PageId) -> PermalinkResult<Option<RewriteCacheEntry>> {
        Ok(self.entries.read().get(&id).cloned())
    }
}

/// Rewrite service that derives speaking paths from page titles.
///
/// The path is the slugified title of every page on the rootline, from the
/// top down, skipping site roots. Pages without a usable title contribute
/// their uid. Entries already in the cache are never rewritten.
pub struct SlugRewriteService {
    pages: Arc<dyn PageStore>,
    cache: Arc<MemoryRewriteCache>,
}

impl SlugRewriteService {
    /// Creates a service reading parents from `pages` and writing to `cache`.
    pub fn new<P: PageStore + 'static>(pages: P, cache: Arc<MemoryRewriteCache>) -> Self {
        Self {
            pages: Arc::new(pages),
            cache,
        }
    }

    fn speaking_path(&self, page: &PageRecord) -> PermalinkResult<String> {
        let mut segments = Vec::new();
        let mut current = Some(page.clone());
        let mut depth = 0;

        while let Some(page) = current.take() {
            if !page.is_site_root() {
                let slug = page.title().map(slugify).unwrap_or_default();
                segments.push(if slug.is_empty() {
                    page.uid().to_string()
                } else {
                    slug
                });
            }

            depth += 1;
            if depth >= MAX_ROOTLINE_DEPTH {
                break;
            }
            if let Some(parent) = page.parent_id() {
                current = self.pages.find_page(parent)?;
            }
        }

        segments.reverse();
        Ok(segments.join("/"))
    }
}

impl RewriteService for SlugRewriteService {
    fn ensure_cached(&self, request: &EncoderRequest) -> PermalinkResult<()> {
        let page_id = request.page_id();
        if self.cache.contains(page_id) {
            return Ok(());
        }

        let path = self.speaking_path(&request.page)?;
        debug!(page_id = %page_id, speaking_url = %path, "caching speaking url");
        self.cache.insert_if_absent(RewriteCacheEntry::new(page_id, path));
        Ok(())
    }
}

/// Lowercases ASCII alphanumerics and folds every other run into one `-`.
///
/// # Example
///
/// ```
/// use permalink_core::memory::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Über uns  "), "ber-uns");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
