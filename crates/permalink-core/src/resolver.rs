//! Permalink resolution.
//!
//! Per request the resolver moves through a fixed set of states and never
//! revisits one:
//!
//! ```text
//! Start ─► NoMatch                                   (pass through)
//!   └────► Matched ─► PageMissing                    (pass through)
//!                └──► PageFound ─► CacheMiss         (pass through)
//!                             └──► CacheHit ─► Redirecting (terminal)
//! ```

use crate::context::RequestContext;
use crate::decision::{PassThroughReason, RedirectDecision};
use crate::error::PermalinkError;
use crate::matcher::PermalinkMatcher;
use crate::page::PageId;
use crate::redirect::redirect_url;
use crate::store::{PageStore, RewriteCache, RewriteService, PAGES_TABLE, URL_DATA_TABLE};
use crate::url::{derive_pretty_path, prepare_encoder_request};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether a request path is a permalink to redirect.
///
/// The resolver holds no per-request state; resolving the same path twice
/// against an unchanged cache gives the same decision.
#[derive(Clone)]
pub struct PermalinkResolver {
    matcher: PermalinkMatcher,
    pages: Arc<dyn PageStore>,
    service: Arc<dyn RewriteService>,
    cache: Arc<dyn RewriteCache>,
}

impl PermalinkResolver {
    /// Creates a resolver for the default `/page/<id>/` grammar.
    pub fn new<P, S, C>(pages: P, service: S, cache: C) -> Self
    where
        P: PageStore + 'static,
        S: RewriteService + 'static,
        C: RewriteCache + 'static,
    {
        Self {
            matcher: PermalinkMatcher::new(),
            pages: Arc::new(pages),
            service: Arc::new(service),
            cache: Arc::new(cache),
        }
    }

    /// Replaces the matcher (e.g. for a custom path segment).
    #[must_use]
    pub fn with_matcher(mut self, matcher: PermalinkMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Returns the matcher in use.
    #[must_use]
    pub fn matcher(&self) -> &PermalinkMatcher {
        &self.matcher
    }

    /// Resolves a request URL to a redirect decision.
    ///
    /// `url` is the `URL` field of the inbound request descriptor; `None`
    /// means the descriptor had no such field. Every failure is silent and
    /// yields [`RedirectDecision::PassThrough`].
    pub fn resolve(&self, url: Option<&str>, ctx: &RequestContext) -> RedirectDecision {
        let Some(url) = url else {
            return pass(PassThroughReason::MissingUrl, None);
        };

        let Some(page_id) = self.matcher.match_path(url) else {
            return pass(PassThroughReason::NoMatch, None);
        };

        if !ctx.has_host() {
            warn!(page_id = %page_id, "no host in request context, building host-less URLs");
        }

        let request = match prepare_encoder_request(page_id, ctx, self.pages.as_ref()) {
            Ok(Some(request)) => request,
            Ok(None) => return pass(PassThroughReason::PageNotFound, Some(page_id)),
            Err(e) => return failure(&e, page_id, PAGES_TABLE),
        };

        let pretty_path =
            match derive_pretty_path(&request, self.service.as_ref(), self.cache.as_ref()) {
                Ok(Some(path)) => path,
                Ok(None) => return pass(PassThroughReason::CacheMiss, Some(page_id)),
                Err(e) => return failure(&e, page_id, URL_DATA_TABLE),
            };

        let location = redirect_url(Some(&pretty_path), ctx);
        debug!(
            page_id = %page_id,
            location = %location,
            outcome = "redirect",
            "permalink resolved"
        );
        RedirectDecision::redirect(location)
    }
}

impl fmt::Debug for PermalinkResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermalinkResolver")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

fn pass(reason: PassThroughReason, page_id: Option<PageId>) -> RedirectDecision {
    match (page_id, missed_table(reason)) {
        (Some(page_id), Some(table)) => {
            debug!(page_id = %page_id, table, outcome = %reason, "permalink passed through");
        }
        (Some(page_id), None) => {
            debug!(page_id = %page_id, outcome = %reason, "permalink passed through");
        }
        (None, _) => debug!(outcome = %reason, "permalink passed through"),
    }
    RedirectDecision::PassThrough(reason)
}

/// The table whose missing row caused `reason`.
const fn missed_table(reason: PassThroughReason) -> Option<&'static str> {
    match reason {
        PassThroughReason::PageNotFound => Some(PAGES_TABLE),
        PassThroughReason::CacheMiss => Some(URL_DATA_TABLE),
        _ => None,
    }
}

fn failure(error: &PermalinkError, page_id: PageId, table: &'static str) -> RedirectDecision {
    warn!(page_id = %page_id, table, error = %error, "permalink collaborator failed");
    RedirectDecision::PassThrough(PassThroughReason::CollaboratorFailure)
}
