//! Permalink redirect middleware.
//!
//! Builds a fresh [`RequestContext`] from each request, asks the
//! [`PermalinkResolver`] for a decision and, on a redirect, answers with
//! `301 Moved Permanently` without calling the rest of the chain. Every other
//! outcome passes the request on untouched.
//!
//! The decision is stored in the [`MiddlewareContext`] so later stages and
//! the handler can see why a request was not redirected.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use http::header::HOST;
use http::uri::Scheme as UriScheme;
use permalink_core::{
    PassThroughReason, PermalinkResolver, RedirectDecision, RequestContext, SECURE_FLAG_ON,
};
use tracing::{info, warn};

/// Header set by TLS-terminating proxies.
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Middleware that redirects permalinks to their speaking URL.
///
/// # Example
///
/// ```
/// use permalink_core::memory::{MemoryPageStore, MemoryRewriteCache, SlugRewriteService};
/// use permalink_core::PermalinkResolver;
/// use permalink_middleware::PermalinkMiddleware;
/// use std::sync::Arc;
///
/// let pages = Arc::new(MemoryPageStore::new());
/// let cache = Arc::new(MemoryRewriteCache::new());
/// let service = SlugRewriteService::new(pages.clone(), cache.clone());
///
/// let middleware = PermalinkMiddleware::new(PermalinkResolver::new(pages, service, cache))
///     .with_script_name("index.php")
///     .with_trust_forwarded_proto(true);
/// assert!(middleware.is_enabled());
/// ```
#[derive(Debug, Clone)]
pub struct PermalinkMiddleware {
    resolver: PermalinkResolver,
    enabled: bool,
    script_name: Option<String>,
    trust_forwarded_proto: bool,
}

impl PermalinkMiddleware {
    /// Creates an enabled middleware around `resolver`.
    #[must_use]
    pub fn new(resolver: PermalinkResolver) -> Self {
        Self {
            resolver,
            enabled: true,
            script_name: None,
            trust_forwarded_proto: false,
        }
    }

    /// Enables or disables resolution. A disabled stage passes every request on.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the front controller script reported in self URLs.
    #[must_use]
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = Some(script_name.into());
        self
    }

    /// Honors `X-Forwarded-Proto: https` when deciding the scheme.
    #[must_use]
    pub fn with_trust_forwarded_proto(mut self, trust: bool) -> Self {
        self.trust_forwarded_proto = trust;
        self
    }

    /// Returns true if resolution is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Builds the environment the resolver reads for this request.
    #[must_use]
    pub fn request_context(&self, request: &Request) -> RequestContext {
        let uri = request.uri();
        let mut ctx = RequestContext::new(uri.path());

        let host = request
            .headers()
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .filter(|host| !host.is_empty())
            .or_else(|| uri.authority().map(http::uri::Authority::as_str));
        if let Some(host) = host {
            ctx = ctx.with_host(host);
        }

        if self.is_secure(request) {
            ctx = ctx.with_secure_flag(SECURE_FLAG_ON);
        }

        if let Some(script_name) = &self.script_name {
            ctx = ctx.with_script_name(script_name.as_str());
        }

        ctx
    }

    fn is_secure(&self, request: &Request) -> bool {
        if request.uri().scheme() == Some(&UriScheme::HTTPS) {
            return true;
        }

        self.trust_forwarded_proto
            && request
                .headers()
                .get(FORWARDED_PROTO_HEADER)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
    }
}

impl Middleware for PermalinkMiddleware {
    fn name(&self) -> &'static str {
        "permalink"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if !self.enabled {
                return next.run(ctx, request).await;
            }

            let request_ctx = self.request_context(&request);
            let mut decision = self.resolver.resolve(Some(request_ctx.path()), &request_ctx);

            let redirect = match &decision {
                RedirectDecision::Redirect { location, status } => {
                    match Response::redirect(*status, location) {
                        Ok(response) => {
                            info!(
                                request_id = %ctx.request_id(),
                                path = %request_ctx.path(),
                                location = %location,
                                "permalink redirect"
                            );
                            Some(response)
                        }
                        Err(e) => {
                            warn!(
                                request_id = %ctx.request_id(),
                                path = %request_ctx.path(),
                                location = ?location,
                                error = %e,
                                "permalink target is not a valid Location header"
                            );
                            None
                        }
                    }
                }
                RedirectDecision::PassThrough(_) => None,
            };
            if redirect.is_none() && decision.is_redirect() {
                decision = RedirectDecision::PassThrough(PassThroughReason::InvalidLocation);
            }

            permalink_telemetry::record_resolution(decision.outcome());
            ctx.set_decision(decision);

            match redirect {
                Some(response) => response,
                None => next.run(ctx, request).await,
            }
        })
    }
}
