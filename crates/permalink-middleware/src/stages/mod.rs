//! Middleware stages installed by the gateway.
//!
//! 1. [`request_id`] - Generate/propagate request ID
//! 2. [`permalink`] - Redirect `/page/<id>/` permalinks

pub mod permalink;
pub mod request_id;

// Re-export main types
pub use permalink::PermalinkMiddleware;
pub use request_id::RequestIdMiddleware;
