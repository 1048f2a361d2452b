//! Redirect decisions.

use http::StatusCode;
use std::fmt;

/// Why a request was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassThroughReason {
    /// The request descriptor carried no URL.
    MissingUrl,
    /// The path is not a permalink.
    NoMatch,
    /// The id parsed but no page has that primary key.
    PageNotFound,
    /// The page exists but no speaking URL could be read from the cache.
    CacheMiss,
    /// A collaborator returned an error.
    CollaboratorFailure,
    /// The derived target cannot be sent as a `Location` header.
    InvalidLocation,
}

impl PassThroughReason {
    /// Returns a stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingUrl => "missing_url",
            Self::NoMatch => "no_match",
            Self::PageNotFound => "page_not_found",
            Self::CacheMiss => "cache_miss",
            Self::CollaboratorFailure => "collaborator_failure",
            Self::InvalidLocation => "invalid_location",
        }
    }
}

impl fmt::Display for PassThroughReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Continue handling the request unchanged.
    PassThrough(PassThroughReason),
    /// Answer with `status` and `Location: location`, and stop.
    Redirect {
        /// Absolute target URL.
        location: String,
        /// Always `301 Moved Permanently`.
        status: StatusCode,
    },
}

impl RedirectDecision {
    /// Creates a permanent redirect to `location`.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            status: StatusCode::MOVED_PERMANENTLY,
        }
    }

    /// Returns true for a redirect.
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    /// Returns the redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location, .. } => Some(location),
            Self::PassThrough(_) => None,
        }
    }

    /// Returns a stable outcome label (`redirect` or the pass-through reason).
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Redirect { .. } => "redirect",
            Self::PassThrough(reason) => reason.as_str(),
        }
    }
}
