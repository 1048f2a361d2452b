//! Per-request state shared by the pipeline stages.
//!
//! A [`MiddlewareContext`] is created for every inbound request. The request
//! id stage fills in the id, the permalink stage records its
//! [`RedirectDecision`], and the final handler reads whatever it needs.

use std::fmt;
use std::str::FromStr;

use http::Extensions;
use permalink_core::RedirectDecision;
use uuid::Uuid;

/// Time-ordered (UUID v7) request identifier.
///
/// # Example
///
/// ```
/// use permalink_middleware::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.as_uuid().get_version_num(), 7);
/// assert_eq!(id.to_string().parse::<RequestId>().unwrap(), id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an id received from a trusted client.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// State carried through one pass of the pipeline.
///
/// # Example
///
/// ```
/// use permalink_core::{PassThroughReason, RedirectDecision};
/// use permalink_middleware::context::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// assert!(ctx.decision().is_none());
///
/// ctx.set_decision(RedirectDecision::PassThrough(PassThroughReason::NoMatch));
/// assert!(!ctx.decision().unwrap().is_redirect());
/// ```
#[derive(Debug, Default)]
pub struct MiddlewareContext {
    request_id: RequestId,
    decision: Option<RedirectDecision>,
    extensions: Extensions,
}

impl MiddlewareContext {
    /// Context with a freshly generated request id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a request whose id is already known.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            ..Self::default()
        }
    }

    /// The request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request id. Only the request id stage does this.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// What the permalink stage decided, if it ran.
    #[must_use]
    pub fn decision(&self) -> Option<&RedirectDecision> {
        self.decision.as_ref()
    }

    /// Records the permalink stage's decision.
    pub fn set_decision(&mut self, decision: RedirectDecision) {
        self.decision = Some(decision);
    }

    /// Additional typed values attached by custom stages.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to the typed values.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}
