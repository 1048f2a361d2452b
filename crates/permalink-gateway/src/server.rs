//! Gateway HTTP server.
//!
//! Every request other than the internal `/_permalink/*` endpoints runs
//! through the middleware pipeline. Permalinks are answered there with a
//! 301; everything else reaches the upstream, or a 404 when none is
//! configured.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{header, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use permalink_config::GatewayConfig;
use permalink_middleware::{
    BoxFuture, MiddlewareContext, PermalinkMiddleware, Pipeline, Request, RequestIdMiddleware,
    Response, ResponseExt,
};
use permalink_telemetry::{record_request, render_metrics, InFlightGuard};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn, Instrument};

use crate::error::{GatewayError, GatewayResult};
use crate::proxy::ProxyClient;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::site::Site;

/// Liveness endpoint.
pub const HEALTH_PATH: &str = "/_permalink/health";
/// Prometheus endpoint.
pub const METRICS_PATH: &str = "/_permalink/metrics";

const INTERNAL_PREFIX: &str = "/_permalink/";

/// Body of the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests.
    pub status: &'static str,
    /// Gateway version.
    pub version: &'static str,
    /// Seconds since the server was created.
    pub uptime_seconds: u64,
    /// Whether permalinks are redirected.
    pub permalinks_enabled: bool,
    /// Pages in the site snapshot.
    pub pages: usize,
    /// Speaking URLs currently cached.
    pub cached_urls: usize,
}

/// The permalink gateway.
#[derive(Debug)]
pub struct GatewayServer {
    config: Arc<GatewayConfig>,
    pipeline: Pipeline,
    proxy: Option<Arc<ProxyClient>>,
    site: Site,
    started_at: Instant,
}

impl GatewayServer {
    /// Builds the pipeline and upstream client from validated configuration.
    pub fn new(config: GatewayConfig, site: Site) -> GatewayResult<Self> {
        let resolver = site.resolver(&config.permalink.segment)?;

        let mut permalink = PermalinkMiddleware::new(resolver)
            .with_enabled(config.permalink.enabled)
            .with_trust_forwarded_proto(config.permalink.trust_forwarded_proto);
        if let Some(script_name) = &config.permalink.script_name {
            permalink = permalink.with_script_name(script_name.clone());
        }

        let pipeline = Pipeline::builder()
            .add_stage(RequestIdMiddleware::with_trust(config.permalink.trust_request_id))
            .add_stage(permalink)
            .build();

        let proxy = match &config.server.upstream_url {
            Some(url) => Some(Arc::new(ProxyClient::new(
                url,
                Duration::from_millis(config.server.upstream_timeout_ms),
            )?)),
            None => None,
        };

        Ok(Self {
            config: Arc::new(config),
            pipeline,
            proxy,
            site,
            started_at: Instant::now(),
        })
    }

    /// The middleware pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The site the resolver reads from.
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Binds the configured address and serves until SIGTERM or SIGINT.
    pub async fn run(self) -> GatewayResult<()> {
        let addr = self.config.http_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::server(format!("failed to bind {addr}: {e}")))?;

        self.serve(listener, ShutdownSignal::with_os_signals()).await
    }

    /// Serves connections from `listener` until `shutdown` triggers, then
    /// waits up to the configured timeout for open connections to finish.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> GatewayResult<()> {
        let local_addr = listener.local_addr()?;
        info!(
            addr = %local_addr,
            upstream = self.proxy.as_ref().map_or("none", |p| p.upstream_url()),
            stages = ?self.pipeline.stage_names(),
            "permalink gateway listening"
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                            continue;
                        }
                    };

                    let server = Arc::clone(&server);
                    let token = tracker.acquire();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        server.serve_connection(stream, peer_addr, shutdown).await;
                        drop(token);
                    });
                }
                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = Duration::from_secs(server.config.server.shutdown_timeout_secs);
        info!(
            timeout_secs = timeout.as_secs(),
            open_connections = tracker.active_connections(),
            "draining connections"
        );
        tokio::select! {
            () = tracker.wait_until_drained() => info!("all connections closed"),
            () = tokio::time::sleep(timeout) => warn!(
                open_connections = tracker.active_connections(),
                "shutdown timeout reached"
            ),
        }

        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) {
        let server = Arc::clone(&self);
        let service = service_fn(move |req: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_incoming(req, peer_addr).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    debug!(peer = %peer_addr, error = %e, "connection error");
                }
            }
            () = shutdown.recv() => {
                // Finish the in-flight request, then close.
                conn.as_mut().graceful_shutdown();
                if let Err(e) = conn.await {
                    debug!(peer = %peer_addr, error = %e, "connection error during shutdown");
                }
            }
        }
    }

    async fn handle_incoming(
        &self,
        req: http::Request<Incoming>,
        peer_addr: SocketAddr,
    ) -> Response {
        let (parts, body) = req.into_parts();
        let span = tracing::info_span!(
            "request",
            method = %parts.method,
            path = %parts.uri.path(),
            peer = %peer_addr,
        );

        async move {
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    warn!(error = %e, "failed to read request body");
                    return Response::error(StatusCode::BAD_REQUEST, "failed to read request body");
                }
            };
            self.handle(http::Request::from_parts(parts, Full::new(body)))
                .await
        }
        .instrument(span)
        .await
    }

    /// Handles one buffered request.
    pub async fn handle(&self, request: Request) -> Response {
        let start = Instant::now();
        let _in_flight = InFlightGuard::new();

        let path = request.uri().path();
        let response = if path.starts_with(INTERNAL_PREFIX) {
            self.internal_endpoint(request.method(), path)
        } else {
            let proxy = self.proxy.clone();
            let handler =
                move |ctx: &mut MiddlewareContext, req: Request| -> BoxFuture<'static, Response> {
                    let request_id = ctx.request_id();
                    Box::pin(async move { render(proxy, req, request_id).await })
                };
            self.pipeline
                .process(MiddlewareContext::new(), request, handler)
                .await
        };

        let status = response.status();
        let elapsed = start.elapsed();
        record_request(status.as_u16(), elapsed);
        debug!(
            status = status.as_u16(),
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
        response
    }

    fn internal_endpoint(&self, method: &Method, path: &str) -> Response {
        if method != Method::GET && method != Method::HEAD {
            return Response::json_error(
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "internal endpoints only accept GET",
            );
        }

        match path {
            HEALTH_PATH => json_response(StatusCode::OK, &self.health()),
            METRICS_PATH => match render_metrics() {
                Some(body) => http::Response::builder()
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                    .body(Full::new(Bytes::from(body)))
                    .unwrap_or_else(|_| {
                        Response::error(StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable")
                    }),
                None => Response::json_error(
                    StatusCode::NOT_FOUND,
                    "metrics_disabled",
                    "metrics are not enabled",
                ),
            },
            _ => Response::json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                &format!("unknown internal endpoint: {path}"),
            ),
        }
    }

    fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy",
            version: crate::VERSION,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            permalinks_enabled: self.config.permalink.enabled,
            pages: self.site.pages().len(),
            cached_urls: self.site.cache().len(),
        }
    }
}

/// Terminal handler: forwards to the upstream or answers 404.
async fn render(
    proxy: Option<Arc<ProxyClient>>,
    request: Request,
    request_id: permalink_middleware::RequestId,
) -> Response {
    let Some(proxy) = proxy else {
        return Response::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            &format!("no upstream configured for {}", request.uri().path()),
        );
    };

    match proxy.forward(request, request_id).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "upstream request failed");
            e.to_response()
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|_| Response::error(StatusCode::INTERNAL_SERVER_ERROR, "internal error"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use permalink_config::{PermalinkConfig, ServerConfig};

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "www.test.com")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = GatewayServer::new(GatewayConfig::default(), Site::new()).unwrap();
        let response = server.handle(request(Method::GET, HEALTH_PATH)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["pages"], 0);
        assert_eq!(body["permalinks_enabled"], true);
    }

    #[tokio::test]
    async fn test_internal_endpoint_rejects_post() {
        let server = GatewayServer::new(GatewayConfig::default(), Site::new()).unwrap();
        let response = server.handle(request(Method::POST, HEALTH_PATH)).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_internal_endpoint() {
        let server = GatewayServer::new(GatewayConfig::default(), Site::new()).unwrap();
        let response = server.handle(request(Method::GET, "/_permalink/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_no_upstream_answers_404() {
        let server = GatewayServer::new(GatewayConfig::default(), Site::new()).unwrap();
        let response = server.handle(request(Method::GET, "/about/")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_answers_502() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = GatewayConfig::builder()
            .server(ServerConfig {
                upstream_url: Some(format!("http://{addr}")),
                upstream_timeout_ms: 2_000,
                ..ServerConfig::default()
            })
            .build();
        let server = GatewayServer::new(config, Site::new()).unwrap();

        let response = server.handle(request(Method::GET, "/about/")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_segment_fails_construction() {
        let config = GatewayConfig::builder()
            .permalink(PermalinkConfig {
                segment: "a b".to_string(),
                ..PermalinkConfig::default()
            })
            .build();
        assert!(matches!(
            GatewayServer::new(config, Site::new()),
            Err(GatewayError::Permalink(_))
        ));
    }
}
