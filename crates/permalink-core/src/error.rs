//! Error types for permalink resolution.
//!
//! None of these errors ever reach an end user. The resolver collapses
//! collaborator failures into [`PassThroughReason::CollaboratorFailure`]
//! and lets the request continue unchanged.
//!
//! [`PassThroughReason::CollaboratorFailure`]: crate::PassThroughReason::CollaboratorFailure

use thiserror::Error;

/// Result type alias using [`PermalinkError`].
pub type PermalinkResult<T> = Result<T, PermalinkError>;

/// Errors raised by collaborators or while configuring the resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermalinkError {
    /// A page store, rewrite service or rewrite cache call failed.
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        /// Which collaborator failed (e.g. "page_store").
        collaborator: &'static str,
        /// Human-readable error message.
        message: String,
    },

    /// The permalink path segment cannot be used in the grammar.
    #[error("invalid permalink segment {segment:?}: {reason}")]
    InvalidSegment {
        /// The rejected segment.
        segment: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A page identifier was zero or otherwise unusable.
    #[error("invalid page id: {0}")]
    InvalidPageId(String),
}

impl PermalinkError {
    /// Creates a collaborator error.
    #[must_use]
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// Creates an invalid segment error.
    #[must_use]
    pub fn invalid_segment(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSegment {
            segment: segment.into(),
            reason: reason.into(),
        }
    }
}
