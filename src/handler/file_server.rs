//! File server request driver
//!
//! Resolves a request path against a [`FileSystem`], applies the trailing-slash and index
//! redirects, and hands files to [`serve_content`] and directories to the listing renderer.

use super::content::{serve_content, set_last_modified, DeliveryOptions, Resource};
use super::listing::file_entries;
use super::render::Renderer;
use crate::error::DeliveryError;
use crate::fs::FileSystem;
use crate::http::cache::metadata_etag;
use crate::http::conditional::{self, header_str, MethodKind, Outcome, Validators};
use crate::http::mime::content_type_for;
use crate::http::response::{build_304_response, build_redirect_response};
use crate::http::DeliveryBody;
use hyper::header::{HeaderMap, HeaderValue, ETAG, IF_MODIFIED_SINCE};
use hyper::http::request::Parts;
use hyper::{Request, Response};
use std::borrow::Cow;
use std::io;

/// File server behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// File served in place of a directory listing
    pub index_file: String,
    /// Redirect to the canonical trailing-slash form of a path
    pub redirect: bool,
    /// Send a weak `ETag` derived from file metadata
    pub etag: bool,
    pub delivery: DeliveryOptions,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            index_file: "index.html".to_string(),
            redirect: true,
            etag: true,
            delivery: DeliveryOptions::default(),
        }
    }
}

/// Serves a [`FileSystem`] over HTTP
#[derive(Debug)]
pub struct FileServer<F, R> {
    fs: F,
    renderer: R,
    options: ServerOptions,
}

impl<F: FileSystem, R: Renderer> FileServer<F, R> {
    pub fn new(fs: F, renderer: R) -> Self {
        Self {
            fs,
            renderer,
            options: ServerOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    /// Handle one request; the request body is ignored
    pub async fn handle<B>(&self, request: Request<B>) -> Response<DeliveryBody> {
        let (parts, _) = request.into_parts();
        self.serve(&parts).await
    }

    /// Handle a request given its head
    pub async fn serve(&self, request: &Parts) -> Response<DeliveryBody> {
        let Ok(decoded) = urlencoding::decode(request.uri.path()) else {
            let err = DeliveryError::NotFound(io::Error::new(
                io::ErrorKind::InvalidInput,
                "request path is not valid UTF-8",
            ));
            return self.render_error(request, &err, HeaderMap::new());
        };

        let url_path: Cow<'_, str> = if decoded.starts_with('/') {
            decoded
        } else {
            Cow::Owned(format!("/{decoded}"))
        };
        let name = clean_path(&url_path);

        self.serve_path(request, &url_path, &name).await
    }

    async fn serve_path(&self, request: &Parts, url_path: &str, name: &str) -> Response<DeliveryBody> {
        let index_suffix = format!("/{}", self.options.index_file);
        if url_path.ends_with(&index_suffix) {
            return local_redirect(request, "./");
        }

        let mut meta = match self.fs.stat(name).await {
            Ok(meta) => meta,
            Err(e) => return self.render_error(request, &e.into(), HeaderMap::new()),
        };

        let trailing_slash = url_path.ends_with('/');
        if self.options.redirect {
            if meta.is_dir && !trailing_slash {
                return local_redirect(request, &format!("{}/", base_name(url_path)));
            }
            if !meta.is_dir && trailing_slash {
                return local_redirect(request, &format!("../{}", base_name(url_path)));
            }
        }

        let mut file_path = Cow::Borrowed(name);
        if meta.is_dir {
            if !trailing_slash {
                return local_redirect(request, &format!("{}/", base_name(url_path)));
            }

            let index = format!("{}{index_suffix}", name.trim_end_matches('/'));
            if let Ok(index_meta) = self.fs.stat(&index).await {
                if !index_meta.is_dir {
                    meta = index_meta;
                    file_path = Cow::Owned(index);
                }
            }
        }

        if meta.is_dir {
            return self.serve_listing(request, name, &meta).await;
        }

        let file = match self.fs.open(&file_path).await {
            Ok(file) => file,
            Err(e) => return self.render_error(request, &e.into(), HeaderMap::new()),
        };

        let mut headers = HeaderMap::new();
        if self.options.etag {
            if let Ok(etag) = HeaderValue::from_str(&metadata_etag(&meta)) {
                headers.insert(ETAG, etag);
            }
        }

        let resource = Resource::new(meta.name.as_str(), meta.len)
            .with_modified(meta.modified)
            .with_content_type(content_type_for(&meta.name));

        match serve_content(&self.options.delivery, request, headers, &resource, file).await {
            Ok(response) => response,
            Err(failure) => self.render_error(request, &failure.error, failure.headers),
        }
    }

    async fn serve_listing(
        &self,
        request: &Parts,
        name: &str,
        meta: &crate::fs::Metadata,
    ) -> Response<DeliveryBody> {
        let validators = Validators {
            etag: None,
            modified: meta.modified,
        };
        let if_modified_since = header_str(&request.headers, &IF_MODIFIED_SINCE);
        let method = MethodKind::from(&request.method);
        if conditional::check_if_modified_since(method, if_modified_since.as_deref(), &validators)
            == Outcome::NotSatisfied
        {
            return build_304_response(HeaderMap::new());
        }

        let mut headers = HeaderMap::new();
        set_last_modified(&mut headers, meta.modified);

        match self.fs.read_dir(name).await {
            Ok(entries) => {
                let mut response = self
                    .renderer
                    .render_listing(request, &file_entries(entries));
                merge_missing(response.headers_mut(), headers);
                response
            }
            Err(e) => self.render_error(request, &DeliveryError::Io(e), headers),
        }
    }

    fn render_error(
        &self,
        request: &Parts,
        err: &DeliveryError,
        headers: HeaderMap,
    ) -> Response<DeliveryBody> {
        let mut response = self.renderer.render_error(request, err.status(), err);
        merge_missing(response.headers_mut(), headers);
        response
    }
}

/// Copy headers the rendered response did not set itself
fn merge_missing(target: &mut HeaderMap, headers: HeaderMap) {
    for (name, value) in &headers {
        if !target.contains_key(name) {
            target.insert(name.clone(), value.clone());
        }
    }
}

/// Redirect relative to the current path, keeping the query string
fn local_redirect(request: &Parts, target: &str) -> Response<DeliveryBody> {
    match request.uri.query() {
        Some(query) if !query.is_empty() => build_redirect_response(&format!("{target}?{query}")),
        _ => build_redirect_response(target),
    }
}

/// Lexically normalise a slash-separated path: absolute, no `.`/`..`, no trailing slash
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Last path element, ignoring trailing slashes
fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{DirEntry, Metadata};
    use crate::handler::render::DefaultRenderer;
    use chrono::{DateTime, TimeZone, Utc};
    use http_body_util::BodyExt;
    use hyper::header::{
        CONTENT_RANGE, CONTENT_TYPE, IF_NONE_MATCH, LAST_MODIFIED, LOCATION, RANGE,
    };
    use hyper::{Method, StatusCode};
    use std::collections::BTreeMap;
    use std::io::Cursor;

    /// In-memory storage: paths ending in `/` are directories
    #[derive(Debug, Default)]
    struct MemoryFs {
        files: BTreeMap<String, Vec<u8>>,
        dirs: Vec<String>,
        denied: Vec<String>,
    }

    impl MemoryFs {
        fn sample() -> Self {
            let mut fs = Self::default();
            fs.files.insert("/hello.txt".into(), b"hello world".to_vec());
            fs.files
                .insert("/site/index.html".into(), b"<h1>home</h1>".to_vec());
            fs.files.insert("/docs/a.md".into(), b"# a".to_vec());
            fs.files.insert("/secret.txt".into(), b"shh".to_vec());
            fs.dirs = vec!["/".into(), "/site".into(), "/docs".into(), "/docs/img".into()];
            fs.denied = vec!["/secret.txt".into()];
            fs
        }

        fn modified() -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        }

        fn check(&self, path: &str) -> io::Result<()> {
            if self.denied.iter().any(|d| d == path) {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            Ok(())
        }
    }

    impl FileSystem for MemoryFs {
        type File = Cursor<Vec<u8>>;

        async fn stat(&self, path: &str) -> io::Result<Metadata> {
            self.check(path)?;
            let name = path.rsplit('/').next().unwrap_or_default().to_string();
            if self.dirs.iter().any(|d| d == path) {
                return Ok(Metadata {
                    name,
                    is_dir: true,
                    len: 0,
                    modified: Some(Self::modified()),
                });
            }
            let data = self
                .files
                .get(path)
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            Ok(Metadata {
                name,
                is_dir: false,
                len: data.len() as u64,
                modified: Some(Self::modified()),
            })
        }

        async fn open(&self, path: &str) -> io::Result<Self::File> {
            self.check(path)?;
            self.files
                .get(path)
                .map(|data| Cursor::new(data.clone()))
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
            let prefix = format!("{}/", path.trim_end_matches('/'));
            let direct_child = |p: &str| {
                p.strip_prefix(&prefix)
                    .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                    .map(ToString::to_string)
            };
            let mut entries: Vec<DirEntry> = self
                .files
                .keys()
                .filter_map(|p| direct_child(p))
                .map(|name| DirEntry { name, is_dir: false })
                .collect();
            entries.extend(
                self.dirs
                    .iter()
                    .filter_map(|p| direct_child(p))
                    .map(|name| DirEntry { name, is_dir: true }),
            );
            Ok(entries)
        }
    }

    fn server() -> FileServer<MemoryFs, DefaultRenderer> {
        FileServer::new(MemoryFs::sample(), DefaultRenderer)
    }

    fn get(uri: &str, headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    async fn body_text(response: Response<DeliveryBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("/a/b/"), "/a/b");
        assert_eq!(clean_path("/a/./b/../c"), "/a/c");
        assert_eq!(clean_path("/../../etc/passwd"), "/etc/passwd");
        assert_eq!(clean_path("//a//b"), "/a/b");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/a/b"), "b");
        assert_eq!(base_name("/a/b/"), "b");
        assert_eq!(base_name("/"), "/");
    }

    #[tokio::test]
    async fn test_serves_file() {
        let response = server().handle(get("/hello.txt", &[])).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert!(response.headers().contains_key(ETAG));
        assert_eq!(
            response.headers()[LAST_MODIFIED],
            "Fri, 01 Mar 2024 12:00:00 GMT"
        );
        assert_eq!(body_text(response).await, "hello world");
    }

    #[tokio::test]
    async fn test_etag_round_trip() {
        let server = server();
        let first = server.handle(get("/hello.txt", &[])).await;
        let etag = first.headers()[ETAG].to_str().unwrap().to_owned();

        let response = server
            .handle(get("/hello.txt", &[(IF_NONE_MATCH.as_str(), etag.as_str())]))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(!response.headers().contains_key(LAST_MODIFIED));
    }

    #[tokio::test]
    async fn test_range_request() {
        let response = server()
            .handle(get("/hello.txt", &[(RANGE.as_str(), "bytes=6-")]))
            .await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 6-10/11");
        assert_eq!(body_text(response).await, "world");
    }

    #[tokio::test]
    async fn test_unsatisfiable_range_rendered() {
        let response = server()
            .handle(get("/hello.txt", &[(RANGE.as_str(), "bytes=100-")]))
            .await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes */11");
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_and_forbidden() {
        let response = server().handle(get("/missing.txt", &[])).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = server().handle(get("/secret.txt", &[])).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_index_redirect() {
        let response = server().handle(get("/site/index.html?v=2", &[])).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "./?v=2");
    }

    #[tokio::test]
    async fn test_trailing_slash_redirects() {
        let response = server().handle(get("/docs", &[])).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "docs/");

        let response = server().handle(get("/hello.txt/", &[])).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "../hello.txt");
    }

    #[tokio::test]
    async fn test_directory_index() {
        let response = server().handle(get("/site/", &[])).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let response = server().handle(get("/docs/", &[])).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[LAST_MODIFIED],
            "Fri, 01 Mar 2024 12:00:00 GMT"
        );
        let page = body_text(response).await;
        let a = page.find("<a href=\"a.md\">a.md</a>").unwrap();
        let img = page.find("<a href=\"img/\">img/</a>").unwrap();
        assert!(a < img);
    }

    #[tokio::test]
    async fn test_directory_not_modified() {
        let response = server()
            .handle(get(
                "/docs/",
                &[(IF_MODIFIED_SINCE.as_str(), "Fri, 01 Mar 2024 12:00:00 GMT")],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_percent_encoded_path() {
        let mut fs = MemoryFs::sample();
        fs.files.insert("/a b.txt".into(), b"spaced".to_vec());
        let server = FileServer::new(fs, DefaultRenderer);
        let response = server.handle(get("/a%20b.txt", &[])).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "spaced");
    }

    #[tokio::test]
    async fn test_without_etag_option() {
        let options = ServerOptions {
            etag: false,
            ..ServerOptions::default()
        };
        let server = server().with_options(options);
        let response = server.handle(get("/hello.txt", &[])).await;
        assert!(!response.headers().contains_key(ETAG));
    }
}
