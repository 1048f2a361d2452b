//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::header::{self, HeaderValue, InvalidHeaderValue};
use http::StatusCode;
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building canned responses.
pub trait ResponseExt {
    /// Creates a redirect with the given status and `Location` header.
    ///
    /// Fails if `location` is not a valid header value.
    fn redirect(status: StatusCode, location: &str) -> Result<Response, InvalidHeaderValue>;

    /// Creates a plain-text error response.
    fn error(status: StatusCode, message: &str) -> Response;

    /// Creates a JSON error response.
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn redirect(status: StatusCode, location: &str) -> Result<Response, InvalidHeaderValue> {
        let location = HeaderValue::from_str(location)?;
        let mut response = bare(status);
        response.headers_mut().insert(header::LOCATION, location);
        Ok(response)
    }

    fn error(status: StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .unwrap_or_else(|_| bare(status))
    }

    fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap_or_else(|_| bare(status))
    }
}

fn bare(status: StatusCode) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
