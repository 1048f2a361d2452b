//! # Permalink Core
//!
//! Resolves numeric permalinks (`/page/<id>/`) to the canonical "speaking"
//! URL of a page and decides whether the request should be redirected.
//!
//! Resolution is a linear pipeline with a silent fallback at every step:
//!
//! ```text
//! path ─► Matcher ─► PageValidator ─► UrlDeriver ─► RedirectBuilder ─► 301
//!           │              │               │
//!           ▼              ▼               ▼
//!        NoMatch     PageNotFound      CacheMiss      (pass through)
//! ```
//!
//! The page database and the URL rewrite cache are collaborators reached
//! through the [`PageStore`], [`RewriteService`] and [`RewriteCache`] traits.
//! In-memory implementations live in [`memory`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use permalink_core::memory::{MemoryPageStore, MemoryRewriteCache, SlugRewriteService};
//! use permalink_core::{PageId, PageRecord, PermalinkResolver, RedirectDecision, RequestContext};
//!
//! let pages = Arc::new(MemoryPageStore::new());
//! pages.insert(PageRecord::new(PageId::new(123).unwrap()).with_field("title", "Hello"));
//! let cache = Arc::new(MemoryRewriteCache::new());
//! let service = SlugRewriteService::new(pages.clone(), cache.clone());
//!
//! let resolver = PermalinkResolver::new(pages, Arc::new(service), cache);
//! let ctx = RequestContext::new("/page/123/")
//!     .with_secure_flag("on")
//!     .with_host("www.test.com")
//!     .with_script_name("/index.php");
//!
//! let decision = resolver.resolve(Some(ctx.path()), &ctx);
//! assert_eq!(
//!     decision,
//!     RedirectDecision::redirect("https://www.test.com/hello/")
//! );
//! ```

#![doc(html_root_url = "https://docs.rs/permalink-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod decision;
mod encoder;
mod error;
mod matcher;
pub mod memory;
mod page;
mod redirect;
mod resolver;
mod store;
mod url;

pub use context::{RequestContext, Scheme, SECURE_FLAG_ON};
pub use decision::{PassThroughReason, RedirectDecision};
pub use encoder::{EncoderRequest, RenderEnvironment};
pub use error::{PermalinkError, PermalinkResult};
pub use matcher::{PermalinkMatcher, DEFAULT_SEGMENT};
pub use page::{PageId, PagePayload, PageRecord};
pub use redirect::redirect_url;
pub use resolver::PermalinkResolver;
pub use store::{
    PageStore, RewriteCache, RewriteCacheEntry, RewriteService, PAGES_TABLE, URL_DATA_TABLE,
};
pub use url::{derive_pretty_path, prepare_encoder_request, self_url};
