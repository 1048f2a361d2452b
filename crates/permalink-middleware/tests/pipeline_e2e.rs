//! End-to-end pipeline integration tests.
//!
//! These tests run the gateway's stage order:
//!
//! 1. Request ID - Generate/propagate request ID
//! 2. Permalink - Redirect permalinks, pass everything else on

use bytes::Bytes;
use http::{header::LOCATION, Request as HttpRequest, Response as HttpResponse, StatusCode};
use http_body_util::{BodyExt, Full};
use permalink_core::memory::{MemoryPageStore, MemoryRewriteCache, SlugRewriteService};
use permalink_core::{PageId, PageRecord, PermalinkMatcher, PermalinkResolver, RewriteCacheEntry};
use permalink_middleware::{
    context::MiddlewareContext,
    pipeline::{Pipeline, Stage},
    stages::{request_id::REQUEST_ID_HEADER, PermalinkMiddleware, RequestIdMiddleware},
    types::{Request, Response},
    BoxFuture,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Site {
    pages: Arc<MemoryPageStore>,
    cache: Arc<MemoryRewriteCache>,
}

impl Site {
    fn new() -> Self {
        let pages = Arc::new(MemoryPageStore::new());
        pages.insert(page(1, 0, "Home").with_field("is_siteroot", true));
        pages.insert(page(10, 1, "About Us"));
        pages.insert(page(11, 10, "The Team"));
        Self {
            pages,
            cache: Arc::new(MemoryRewriteCache::new()),
        }
    }

    fn resolver(&self) -> PermalinkResolver {
        let service = SlugRewriteService::new(self.pages.clone(), self.cache.clone());
        PermalinkResolver::new(self.pages.clone(), service, self.cache.clone())
    }
}

fn page(uid: u64, pid: u64, title: &str) -> PageRecord {
    PageRecord::new(PageId::new(uid).unwrap())
        .with_field("pid", pid)
        .with_field("title", title)
}

fn build_pipeline(permalink: PermalinkMiddleware) -> Pipeline {
    Pipeline::builder()
        .add_stage(RequestIdMiddleware::new())
        .add_stage(permalink)
        .build()
}

fn make_request(uri: &str, host: &str) -> Request {
    HttpRequest::builder()
        .uri(uri)
        .header("host", host)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Runs the pipeline with a handler that counts how often it was reached.
async fn run(pipeline: &Pipeline, request: Request) -> (Response, usize) {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = calls.clone();
    let response = pipeline
        .process(
            MiddlewareContext::new(),
            request,
            move |_ctx: &mut MiddlewareContext, req: Request| -> BoxFuture<'static, Response> {
                handler_calls.fetch_add(1, Ordering::SeqCst);
                let body = format!("rendered {}", req.uri().path());
                Box::pin(async move {
                    HttpResponse::builder()
                        .status(StatusCode::OK)
                        .body(Full::new(Bytes::from(body)))
                        .unwrap()
                })
            },
        )
        .await;
    (response, calls.load(Ordering::SeqCst))
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_stage_names_follow_stage_order() {
    let site = Site::new();
    let pipeline = build_pipeline(PermalinkMiddleware::new(site.resolver()));
    let expected: Vec<_> = Stage::all().iter().map(|s| s.name()).collect();
    assert_eq!(pipeline.stage_names(), expected);
}

#[tokio::test]
async fn test_permalink_redirects_with_request_id() {
    let site = Site::new();
    let pipeline = build_pipeline(PermalinkMiddleware::new(site.resolver()));

    let (response, handler_calls) =
        run(&pipeline, make_request("/page/11/", "www.test.com")).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "http://www.test.com/about-us/the-team/"
    );
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(handler_calls, 0);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_site_root_without_speaking_url_reaches_handler() {
    let site = Site::new();
    let pipeline = build_pipeline(PermalinkMiddleware::new(site.resolver()));

    let (response, handler_calls) = run(&pipeline, make_request("/page/1", "www.test.com")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(handler_calls, 1);
    assert!(response.headers().get(LOCATION).is_none());
}

#[tokio::test]
async fn test_existing_cache_entry_is_used() {
    let site = Site::new();
    site.cache
        .insert(RewriteCacheEntry::new(PageId::new(10).unwrap(), "/company/"));
    let pipeline = build_pipeline(PermalinkMiddleware::new(site.resolver()));

    let (response, _) = run(&pipeline, make_request("/page/10/", "www.test.com")).await;

    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "http://www.test.com/company/"
    );
}

#[tokio::test]
async fn test_regular_pages_reach_handler() {
    let site = Site::new();
    let pipeline = build_pipeline(PermalinkMiddleware::new(site.resolver()));

    for path in ["/somepage/", "/page/", "/page/abc/", "/page/0/", "/page/404/"] {
        let (response, handler_calls) = run(&pipeline, make_request(path, "www.test.com")).await;
        assert_eq!(response.status(), StatusCode::OK, "path {path}");
        assert_eq!(handler_calls, 1, "path {path}");
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body_text(response).await, format!("rendered {path}"));
    }
}

#[tokio::test]
async fn test_forwarded_proto_upgrades_scheme() {
    let site = Site::new();
    let permalink = PermalinkMiddleware::new(site.resolver()).with_trust_forwarded_proto(true);
    let pipeline = build_pipeline(permalink);

    let request = HttpRequest::builder()
        .uri("/page/10/")
        .header("host", "www.test.com")
        .header("x-forwarded-proto", "https")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (response, _) = run(&pipeline, request).await;

    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://www.test.com/about-us/"
    );
}

#[tokio::test]
async fn test_custom_segment() {
    let site = Site::new();
    let resolver = site
        .resolver()
        .with_matcher(PermalinkMatcher::with_segment("p").unwrap());
    let pipeline = build_pipeline(PermalinkMiddleware::new(resolver));

    let (redirect, _) = run(&pipeline, make_request("/p/10", "www.test.com")).await;
    assert_eq!(redirect.status(), StatusCode::MOVED_PERMANENTLY);

    let (untouched, handler_calls) =
        run(&pipeline, make_request("/page/10/", "www.test.com")).await;
    assert_eq!(untouched.status(), StatusCode::OK);
    assert_eq!(handler_calls, 1);
}

#[tokio::test]
async fn test_disabled_pipeline_passes_permalinks_through() {
    let site = Site::new();
    let pipeline = build_pipeline(PermalinkMiddleware::new(site.resolver()).with_enabled(false));

    let (response, handler_calls) = run(&pipeline, make_request("/page/10/", "www.test.com")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(handler_calls, 1);
    assert!(site.cache.is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_share_pipeline() {
    let site = Site::new();
    let pipeline = Arc::new(build_pipeline(PermalinkMiddleware::new(site.resolver())));

    let mut handles = Vec::new();
    for host in ["a.example.com", "b.example.com", "c.example.com"] {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            let (response, _) = run(&pipeline, make_request("/page/11/", host)).await;
            (host, response)
        }));
    }

    for handle in handles {
        let (host, response) = handle.await.unwrap();
        assert_eq!(
            response.headers().get(LOCATION).unwrap().to_str().unwrap(),
            format!("http://{host}/about-us/the-team/")
        );
    }
}
