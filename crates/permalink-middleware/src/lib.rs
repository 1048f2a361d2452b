//! # Permalink Middleware
//!
//! Middleware pipeline that turns `/page/<id>/` permalinks into permanent
//! redirects before the request reaches the site's page renderer.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → RequestId → Permalink ─┬─► 301 Location: <speaking url>
//!                                  └─► Handler (renderer / upstream)
//! ```
//!
//! | Stage | Middleware  | Purpose                                      |
//! |-------|-------------|----------------------------------------------|
//! | 1     | Request ID  | Generate/propagate request ID (UUID v7)      |
//! | 2     | Permalink   | Resolve permalinks and short-circuit with 301 |
//!
//! The permalink stage is terminal when it redirects: the handler never runs
//! and no later stage sees the request.
//!
//! ## Example
//!
//! ```
//! use permalink_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 2);
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[1].name(), "permalink");
//! ```

#![doc(html_root_url = "https://docs.rs/permalink-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::{MiddlewareContext, RequestId};
pub use middleware::{BoxFuture, BoxedMiddleware, FnMiddleware, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use stages::{PermalinkMiddleware, RequestIdMiddleware};
pub use types::{Request, Response, ResponseExt};
