//! Gateway behavior over real sockets with a stub upstream renderer.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use permalink_config::{GatewayConfig, PermalinkConfig, ServerConfig};
use permalink_gateway::{GatewayServer, ShutdownSignal, Site, SiteSnapshot, HEALTH_PATH};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const SNAPSHOT: &str = r#"{
    "pages": [
        {"uid": 1, "pid": 0, "title": "Home", "is_siteroot": true},
        {"uid": 10, "pid": 1, "title": "About Us"},
        {"uid": 11, "pid": 10, "title": "The Team"}
    ],
    "urls": [
        {"page_id": 11, "speaking_url": "/company/team"}
    ]
}"#;

/// Upstream that echoes what it received.
async fn spawn_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let service = service_fn(|req: http::Request<Incoming>| async move {
                    let header = |name: &str| {
                        req.headers()
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("-")
                            .to_string()
                    };
                    let body = format!(
                        "rendered {} request_id={} forwarded_host={}",
                        req.uri(),
                        header("x-request-id"),
                        header("x-forwarded-host"),
                    );
                    Ok::<_, Infallible>(
                        http::Response::builder()
                            .header("x-rendered-by", "stub")
                            .body(Full::new(Bytes::from(body)))
                            .unwrap(),
                    )
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    addr
}

async fn spawn_gateway(
    config: GatewayConfig,
) -> (SocketAddr, ShutdownSignal, JoinHandle<permalink_gateway::GatewayResult<()>>) {
    let site = Site::from_snapshot(SiteSnapshot::from_json(SNAPSHOT).unwrap()).unwrap();
    let server = GatewayServer::new(config, site).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

    (addr, shutdown, handle)
}

fn config_with_upstream(upstream: SocketAddr) -> GatewayConfig {
    GatewayConfig::builder()
        .server(ServerConfig {
            upstream_url: Some(format!("http://{upstream}")),
            upstream_timeout_ms: 5_000,
            shutdown_timeout_secs: 1,
            ..ServerConfig::default()
        })
        .build_validated()
        .unwrap()
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_permalink_is_redirected_permanently() {
    let upstream = spawn_upstream().await;
    let (addr, shutdown, handle) = spawn_gateway(config_with_upstream(upstream)).await;

    let response = client()
        .get(format!("http://{addr}/page/10/"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        format!("http://{addr}/about-us/")
    );
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.text().await.unwrap().is_empty());

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_cached_speaking_url_is_normalized() {
    let upstream = spawn_upstream().await;
    let (addr, shutdown, handle) = spawn_gateway(config_with_upstream(upstream)).await;

    let response = client()
        .get(format!("http://{addr}/page/11"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        format!("http://{addr}/company/team/")
    );

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_other_requests_reach_the_upstream() {
    let upstream = spawn_upstream().await;
    let (addr, shutdown, handle) = spawn_gateway(config_with_upstream(upstream)).await;

    for path in ["/about-us/?lang=de", "/page/404/", "/page/abc/", "/pages/10/"] {
        let response = client()
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(response.headers()["x-rendered-by"], "stub");
        let request_id = response.headers()["x-request-id"]
            .to_str()
            .unwrap()
            .to_string();

        let body = response.text().await.unwrap();
        assert!(body.starts_with(&format!("rendered {path} ")), "{body}");
        assert!(body.contains(&format!("request_id={request_id}")), "{body}");
        assert!(body.contains(&format!("forwarded_host={addr}")), "{body}");
    }

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_disabled_permalinks_are_forwarded() {
    let upstream = spawn_upstream().await;
    let mut config = config_with_upstream(upstream);
    config.permalink = PermalinkConfig {
        enabled: false,
        ..PermalinkConfig::default()
    };
    let (addr, shutdown, handle) = spawn_gateway(config).await;

    let response = client()
        .get(format!("http://{addr}/page/10/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_forwarded_proto_selects_https_when_trusted() {
    let upstream = spawn_upstream().await;
    let mut config = config_with_upstream(upstream);
    config.permalink.trust_forwarded_proto = true;
    let (addr, shutdown, handle) = spawn_gateway(config).await;

    let response = client()
        .get(format!("http://{addr}/page/10/"))
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        format!("https://{addr}/about-us/")
    );

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_health_endpoint_reports_site() {
    let (addr, shutdown, handle) = spawn_gateway(GatewayConfig::default()).await;

    let response = client()
        .get(format!("http://{addr}{HEALTH_PATH}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["pages"], 3);
    assert_eq!(body["cached_urls"], 1);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let (addr, shutdown, handle) = spawn_gateway(GatewayConfig::default()).await;

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();

    assert!(client()
        .get(format!("http://{addr}{HEALTH_PATH}"))
        .send()
        .await
        .is_err());
}
