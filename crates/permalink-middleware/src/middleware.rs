//! Core middleware trait and types.
//!
//! Every stage implements [`Middleware`]. A stage either continues the chain
//! through [`Next::run`] or answers the request itself, in which case nothing
//! downstream runs.

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Terminal handler invoked after the last stage.
type HandlerFn<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// The core middleware trait.
///
/// # Invariants
///
/// - Middleware MUST call `next.run()` at most once
/// - Middleware that answers the request itself MUST NOT call `next.run()`
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this middleware stage.
    ///
    /// This name is used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Process the request through this middleware.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Shared handle to a stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of the chain: the stages not yet run, then the handler.
///
/// Consumed on use, so it can run at most once.
pub struct Next<'a> {
    remaining: &'a [BoxedMiddleware],
    handler: HandlerFn<'a>,
}

impl<'a> Next<'a> {
    /// Runs `stages` in order, then `handler`.
    pub(crate) fn chain<F>(stages: &'a [BoxedMiddleware], handler: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            remaining: stages,
            handler: Box::new(handler),
        }
    }

    /// A chain with no stages left, only the handler.
    ///
    /// Public so stages can be driven directly in tests and by callers that
    /// run a single stage outside a [`Pipeline`](crate::Pipeline).
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self::chain(&[], f)
    }

    /// Runs the next stage, or the handler once no stages remain.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.remaining.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    remaining: rest,
                    handler: self.handler,
                };
                stage.process(ctx, request, next).await
            }
            None => (self.handler)(ctx, request).await,
        }
    }
}

/// A middleware that can be created from a function.
///
/// # Example
///
/// ```
/// use permalink_middleware::{FnMiddleware, Middleware};
///
/// let mw = FnMiddleware::new("passthrough", |ctx, req, next| {
///     Box::pin(async move { next.run(ctx, req).await })
/// });
/// assert_eq!(mw.name(), "passthrough");
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}
