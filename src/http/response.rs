//! HTTP response building module
//!
//! Provides builders for the fixed-shape responses of the delivery path, decoupled from the
//! content logic.

use super::body::DeliveryBody;
use hyper::header::{
    HeaderMap, HeaderValue, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED,
    LOCATION,
};
use hyper::{Response, StatusCode};
use tracing::error;

/// Build a response with the given status, headers and body
pub fn build_response(
    status: StatusCode,
    headers: HeaderMap,
    body: DeliveryBody,
) -> Response<DeliveryBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Build 304 Not Modified response
///
/// Representation headers are dropped, and `Last-Modified` too when an `ETag` is present.
pub fn build_304_response(mut headers: HeaderMap) -> Response<DeliveryBody> {
    headers.remove(CONTENT_TYPE);
    headers.remove(CONTENT_LENGTH);
    headers.remove(CONTENT_ENCODING);
    if headers.contains_key(ETAG) {
        headers.remove(LAST_MODIFIED);
    }
    build_response(StatusCode::NOT_MODIFIED, headers, DeliveryBody::empty())
}

/// Build 412 Precondition Failed response
pub fn build_412_response(headers: HeaderMap) -> Response<DeliveryBody> {
    build_response(
        StatusCode::PRECONDITION_FAILED,
        headers,
        DeliveryBody::empty(),
    )
}

/// Build 301 redirect response
pub fn build_redirect_response(target: &str) -> Response<DeliveryBody> {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(target) {
        Ok(value) => {
            headers.insert(LOCATION, value);
        }
        Err(e) => log_build_error("301", &e),
    }
    build_response(StatusCode::MOVED_PERMANENTLY, headers, DeliveryBody::empty())
}

/// Build a plain text response, e.g. `404 Not Found`
pub fn build_text_response(
    status: StatusCode,
    message: String,
    is_head: bool,
) -> Response<DeliveryBody> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(message.len()));
    let body = if is_head {
        DeliveryBody::empty()
    } else {
        DeliveryBody::full(message)
    };
    build_response(status, headers, body)
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<DeliveryBody> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(content.len()));
    let body = if is_head {
        DeliveryBody::empty()
    } else {
        DeliveryBody::full(content)
    };
    build_response(StatusCode::OK, headers, body)
}

/// Log response build error
pub(crate) fn log_build_error(status: &str, err: &dyn std::error::Error) {
    error!(status, "Failed to build response: {err}");
}
