//! Page rendering hooks
//!
//! Error pages and directory listings are not produced by the file server itself; it hands
//! them to a [`Renderer`] supplied by the embedding application.

use super::listing::FileEntry;
use crate::error::DeliveryError;
use crate::http::response::{build_html_response, build_response, build_text_response};
use crate::http::DeliveryBody;
use hyper::header::HeaderMap;
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use std::fmt::Write;
use tracing::{error, warn};

/// Caller-supplied rendering of error and listing pages
pub trait Renderer: Send + Sync + 'static {
    /// Render a failure. `error` carries the underlying cause.
    fn render_error(
        &self,
        request: &Parts,
        status: StatusCode,
        error: &DeliveryError,
    ) -> Response<DeliveryBody>;

    /// Render a directory listing, entries already sorted by name
    fn render_listing(&self, request: &Parts, entries: &[FileEntry]) -> Response<DeliveryBody>;
}

/// Plain text errors and a bare `<pre>` listing
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderer;

impl Renderer for DefaultRenderer {
    fn render_error(
        &self,
        request: &Parts,
        status: StatusCode,
        err: &DeliveryError,
    ) -> Response<DeliveryBody> {
        if status.is_server_error() {
            error!(path = request.uri.path(), "{err}");
        } else {
            warn!(path = request.uri.path(), status = status.as_u16(), "{err}");
        }

        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return build_response(status, HeaderMap::new(), DeliveryBody::empty());
        }

        let message = format!(
            "{} {}\n",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        build_text_response(status, message, request.method == Method::HEAD)
    }

    fn render_listing(&self, request: &Parts, entries: &[FileEntry]) -> Response<DeliveryBody> {
        let mut page = String::from(
            "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
        );
        for entry in entries {
            // Writing to a String cannot fail
            let _ = writeln!(page, "<a href=\"{}\">{}</a>", entry.url, entry.name);
        }
        page.push_str("</pre>\n");

        build_html_response(page, request.method == Method::HEAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use hyper::Request;
    use std::io;

    fn parts(method: Method) -> Parts {
        Request::builder()
            .method(method)
            .uri("/dir/")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_error_page() {
        let err = DeliveryError::from(io::Error::from(io::ErrorKind::NotFound));
        let response = DefaultRenderer.render_error(&parts(Method::GET), err.status(), &err);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_LENGTH], "14");
    }

    #[test]
    fn test_range_error_has_no_body() {
        let err = DeliveryError::UnsatisfiableRange { size: 10 };
        let response = DefaultRenderer.render_error(&parts(Method::GET), err.status(), &err);
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert!(matches!(response.body(), DeliveryBody::Empty));
    }

    #[test]
    fn test_listing_page() {
        let entries = vec![FileEntry {
            url: "a%20b/".into(),
            name: "a b/".into(),
        }];
        let response = DefaultRenderer.render_listing(&parts(Method::GET), &entries);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        match response.body() {
            DeliveryBody::Full(Some(page)) => {
                let page = std::str::from_utf8(page).unwrap();
                assert!(page.contains("<a href=\"a%20b/\">a b/</a>\n"));
            }
            other => panic!("Expected full body, got {other:?}"),
        }
    }
}
