//! Static file serving module
//!
//! Generic file server rooted at a directory. The URL path maps onto the
//! root unchanged, so `/localbackend/dash/index.mpd` is read from
//! `<root>/localbackend/dash/index.mpd`.

use super::Handler;
use crate::error::ServeError;
use crate::http::{self, conditional, mime, path, response, Body, RangeParseResult};
use crate::logger;
use async_trait::async_trait;
use hyper::{Method, Request, Response, StatusCode};
use std::fmt::Write as _;
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

const INDEX_FILE: &str = "index.html";

/// Request fields the file server needs, extracted once
pub struct RequestContext {
    /// Percent-decoded URL path
    pub path: String,
    /// URL path as sent, used to build relative redirects
    pub raw_path: String,
    pub query: Option<String>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
}

impl RequestContext {
    /// `None` when the path does not decode to UTF-8
    pub fn from_request<B>(req: &Request<B>) -> Option<Self> {
        let uri = req.uri();
        let decoded = path::decode_path(uri.path())?;
        let conditional = matches!(*req.method(), Method::GET | Method::HEAD);
        let path = if decoded.starts_with('/') {
            decoded.into_owned()
        } else {
            format!("/{decoded}")
        };

        Some(Self {
            path,
            raw_path: uri.path().to_string(),
            query: uri.query().map(ToString::to_string),
            is_head: req.method() == Method::HEAD,
            // Only GET and HEAD are conditional
            if_modified_since: req
                .headers()
                .get("if-modified-since")
                .filter(|_| conditional)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
            range_header: req
                .headers()
                .get("range")
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
        })
    }

    /// 301 to a location relative to the request path, keeping the query
    fn local_redirect(&self, target: &str) -> Response<Body> {
        match &self.query {
            Some(q) if !q.is_empty() => http::build_redirect_response(&format!("{target}?{q}")),
            _ => http::build_redirect_response(target),
        }
    }
}

pub struct FileServer {
    root: PathBuf,
}

impl FileServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL path onto the root without ever leaving it
    pub fn resolve(&self, url_path: &str) -> PathBuf {
        let cleaned = path::clean_path(url_path);
        let mut resolved = self.root.clone();
        resolved.extend(cleaned.split('/').filter(|s| !s.is_empty()));
        resolved
    }

    /// Serve one request; errors are mapped to status responses by the caller
    pub async fn serve(&self, ctx: &RequestContext) -> Result<Response<Body>, ServeError> {
        if ctx.raw_path.ends_with("/index.html") {
            return Ok(ctx.local_redirect("./"));
        }

        let mut fs_path = self.resolve(&ctx.path);
        let mut meta = fs::metadata(&fs_path).await?;

        if meta.is_dir() {
            if !ctx.raw_path.ends_with('/') {
                return Ok(ctx.local_redirect(&format!("{}/", base_name(&ctx.raw_path))));
            }
            let index = fs_path.join(INDEX_FILE);
            match fs::metadata(&index).await {
                Ok(index_meta) if index_meta.is_file() => {
                    fs_path = index;
                    meta = index_meta;
                }
                _ => return serve_listing(ctx, &fs_path, &meta).await,
            }
        } else if ctx.raw_path.ends_with('/') {
            return Ok(ctx.local_redirect(&format!("../{}", base_name(&ctx.raw_path))));
        }

        serve_content(ctx, &fs_path, &meta).await
    }
}

#[async_trait]
impl<B: Send + 'static> Handler<B> for FileServer {
    async fn handle(&self, req: Request<B>) -> Response<Body> {
        let Some(ctx) = RequestContext::from_request(&req) else {
            return http::build_400_response();
        };
        if path::contains_dot_dot(&ctx.path) {
            return http::build_error_response(StatusCode::BAD_REQUEST, "invalid URL path");
        }

        match self.serve(&ctx).await {
            Ok(resp) => resp,
            Err(err) => {
                if let ServeError::Io(ref e) = err {
                    logger::log_error(&format!("Failed to serve '{}': {e}", ctx.path));
                }
                http::build_error_response(err.status(), err.message())
            }
        }
    }
}

/// Last segment of a URL path, ignoring a trailing slash
fn base_name(url_path: &str) -> &str {
    url_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// `Last-Modified` value and whether the client copy is still fresh
fn freshness(ctx: &RequestContext, meta: &Metadata) -> (Option<String>, bool) {
    let Ok(modified) = meta.modified() else {
        return (None, false);
    };
    let fresh = conditional::is_not_modified(ctx.if_modified_since.as_deref(), modified);
    (Some(conditional::format_http_date(modified)), fresh)
}

async fn serve_content(
    ctx: &RequestContext,
    fs_path: &Path,
    meta: &Metadata,
) -> Result<Response<Body>, ServeError> {
    let (last_modified, fresh) = freshness(ctx, meta);
    if let (true, Some(lm)) = (fresh, last_modified.as_deref()) {
        return Ok(http::build_304_response(lm));
    }

    let size = meta.len();
    let mut file = File::open(fs_path).await?;

    let ext = path::extension(&ctx.path).trim_start_matches('.').to_ascii_lowercase();
    let content_type = match mime::from_extension(&ext) {
        Some(ct) => ct,
        None => mime::sniff(&read_prefix(&mut file, mime::SNIFF_LEN).await?),
    };

    match http::parse_range_header(ctx.range_header.as_deref(), size) {
        RangeParseResult::Valid(range) => {
            let body = if ctx.is_head {
                http::empty()
            } else {
                file.seek(SeekFrom::Start(range.start)).await?;
                response::stream(file.take(range.length()))
            };
            Ok(response::build_partial_response(
                body,
                content_type,
                last_modified.as_deref(),
                range,
                size,
            ))
        }
        RangeParseResult::NotSatisfiable => Ok(http::build_416_response(size)),
        RangeParseResult::None => {
            // Bounded to the stat size in case the file grows mid-send
            let body = if ctx.is_head {
                http::empty()
            } else {
                response::stream(file.take(size))
            };
            Ok(response::build_file_response(
                body,
                size,
                content_type,
                last_modified.as_deref(),
            ))
        }
    }
}

/// Read the first `len` bytes and rewind
async fn read_prefix(file: &mut File, len: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len);
    (&mut *file).take(len as u64).read_to_end(&mut buf).await?;
    file.seek(SeekFrom::Start(0)).await?;
    Ok(buf)
}

async fn serve_listing(
    ctx: &RequestContext,
    dir: &Path,
    meta: &Metadata,
) -> Result<Response<Body>, ServeError> {
    let (last_modified, fresh) = freshness(ctx, meta);
    if let (true, Some(lm)) = (fresh, last_modified.as_deref()) {
        return Ok(http::build_304_response(lm));
    }

    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    Ok(response::build_html_response(
        render_listing(&names),
        last_modified.as_deref(),
        ctx.is_head,
    ))
}

/// Directory listing page; subdirectory names carry a trailing `/`
pub fn render_listing(names: &[String]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for name in names {
        let (stem, slash) = name
            .strip_suffix('/')
            .map_or((name.as_str(), ""), |s| (s, "/"));
        let _ = writeln!(
            html,
            "<a href=\"{}{slash}\">{}</a>",
            urlencoding::encode(stem),
            escape_html(name)
        );
    }
    html.push_str("</pre>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::body::Bytes;
    use hyper::header::{
        ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LAST_MODIFIED, LOCATION,
    };
    use hyper::StatusCode;

    const MANIFEST: &[u8] = b"<?xml version=\"1.0\"?>\n<MPD type=\"static\"></MPD>\n";

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let dash = dir.path().join("localbackend/dash");
        std::fs::create_dir_all(&dash).unwrap();
        std::fs::write(dash.join("index.mpd"), MANIFEST).unwrap();
        std::fs::write(dash.join("seg_1.m4s"), (0u8..=99).collect::<Vec<_>>()).unwrap();
        std::fs::write(dash.join("notes.txt"), "hello").unwrap();
        std::fs::write(dash.join("blob"), [0u8, 159, 146, 150]).unwrap();
        let site = dir.path().join("webbackend/site");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(site.join("index.html"), "<html>player</html>").unwrap();
        std::fs::create_dir_all(dir.path().join("webbackend/empty")).unwrap();
        dir
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    async fn body_of(resp: Response<Body>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_file_bytes() {
        let dir = fixture();
        let server = FileServer::new(dir.path());
        let resp = server.handle(get("/localbackend/dash/index.mpd")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], MANIFEST.len().to_string().as_str());
        assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
        assert!(resp.headers().contains_key(LAST_MODIFIED));
        // No table here; the generic server sniffs XML
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/xml; charset=utf-8");
        assert_eq!(body_of(resp).await, MANIFEST);
    }

    #[tokio::test]
    async fn test_own_content_types() {
        let dir = fixture();
        let server = FileServer::new(dir.path());
        let resp = server.handle(get("/localbackend/dash/notes.txt")).await;
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        let resp = server.handle(get("/localbackend/dash/blob")).await;
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/octet-stream");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = fixture();
        let server = FileServer::new(dir.path());
        let resp = server.handle(get("/localbackend/missing.mp4")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(resp).await, "404 page not found\n");

        // A file used as a directory is also missing
        let resp = server.handle(get("/localbackend/dash/index.mpd/x")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_head_has_headers_only() {
        let dir = fixture();
        let server = FileServer::new(dir.path());
        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/localbackend/dash/seg_1.m4s")
            .body(())
            .unwrap();
        let resp = server.handle(req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "100");
        assert!(body_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_range_request() {
        let dir = fixture();
        let server = FileServer::new(dir.path());
        let req = Request::builder()
            .uri("/localbackend/dash/seg_1.m4s")
            .header("range", "bytes=10-14")
            .body(())
            .unwrap();
        let resp = server.handle(req).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 10-14/100");
        assert_eq!(body_of(resp).await, vec![10u8, 11, 12, 13, 14]);

        let req = Request::builder()
            .uri("/localbackend/dash/seg_1.m4s")
            .header("range", "bytes=500-")
            .body(())
            .unwrap();
        let resp = server.handle(req).await;
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes */100");
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let dir = fixture();
        let server = FileServer::new(dir.path());
        let first = server.handle(get("/localbackend/dash/index.mpd")).await;
        let last_modified = first.headers()[LAST_MODIFIED].clone();

        let req = Request::builder()
            .uri("/localbackend/dash/index.mpd")
            .header("if-modified-since", last_modified)
            .body(())
            .unwrap();
        let resp = server.handle(req).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert!(!resp.headers().contains_key(CONTENT_TYPE));
        assert!(body_of(resp).await.is_empty());

        let req = Request::builder()
            .uri("/localbackend/dash/index.mpd")
            .header("if-modified-since", "Thu, 01 Jan 1970 00:00:01 GMT")
            .body(())
            .unwrap();
        assert_eq!(server.handle(req).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_directory_redirects() {
        let dir = fixture();
        let server = FileServer::new(dir.path());

        let resp = server.handle(get("/localbackend/dash?v=2")).await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "dash/?v=2");

        let resp = server.handle(get("/localbackend/dash/index.mpd/")).await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "../index.mpd");

        let resp = server.handle(get("/webbackend/site/index.html")).await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "./");
    }

    #[tokio::test]
    async fn test_directory_index_and_listing() {
        let dir = fixture();
        let server = FileServer::new(dir.path());

        let resp = server.handle(get("/webbackend/site/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_of(resp).await, "<html>player</html>");

        let resp = server.handle(get("/localbackend/dash/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_of(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        let blob = html.find("href=\"blob\"").unwrap();
        let index = html.find("href=\"index.mpd\"").unwrap();
        assert!(blob < index);

        let resp = server.handle(get("/webbackend/")).await;
        let body = body_of(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("<a href=\"empty/\">empty/</a>"));
        assert!(html.contains("<a href=\"site/\">site/</a>"));
    }

    #[tokio::test]
    async fn test_stays_inside_root() {
        let dir = fixture();
        let server = FileServer::new(dir.path().join("webbackend"));
        std::fs::write(dir.path().join("secret.json"), "{}").unwrap();

        let resp = server.handle(get("/../secret.json")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            server.resolve("/../../secret.json"),
            dir.path().join("webbackend").join("secret.json")
        );
    }

    #[tokio::test]
    async fn test_encoded_dot_dot_rejected() {
        let dir = fixture();
        let server = FileServer::new(dir.path());
        std::fs::write(dir.path().join("dashserve.toml"), "[server]").unwrap();

        for uri in [
            "/localbackend/%2e%2e/dashserve.toml",
            "/localbackend/..%2fdashserve.toml",
            "/localbackend/dash/%2E%2E/%2e%2e/dashserve.toml",
            "/localbackend/..%5cdashserve.toml",
        ] {
            let resp = server.handle(get(uri)).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body_of(resp).await, "invalid URL path\n");
        }
    }

    #[tokio::test]
    async fn test_if_modified_since_ignored_for_post() {
        let dir = fixture();
        let server = FileServer::new(dir.path());
        let first = server.handle(get("/localbackend/dash/index.mpd")).await;
        let last_modified = first.headers()[LAST_MODIFIED].clone();

        for method in [Method::POST, Method::PUT] {
            let req = Request::builder()
                .method(method)
                .uri("/localbackend/dash/index.mpd")
                .header("if-modified-since", last_modified.clone())
                .body(())
                .unwrap();
            let resp = server.handle(req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(body_of(resp).await, MANIFEST);
        }

        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/localbackend/dash/index.mpd")
            .header("if-modified-since", last_modified)
            .body(())
            .unwrap();
        assert_eq!(server.handle(req).await.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_percent_encoded_path() {
        let dir = fixture();
        std::fs::write(dir.path().join("localbackend/my clip.mp4"), "mp4").unwrap();
        let server = FileServer::new(dir.path());
        let resp = server.handle(get("/localbackend/my%20clip.mp4")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, "mp4");

        let resp = server.handle(get("/localbackend/%FF.mp4")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_render_listing_escapes() {
        let html = render_listing(&["a&b <1>.json".to_string(), "sub dir/".to_string()]);
        assert!(html.contains("<a href=\"a%26b%20%3C1%3E.json\">a&amp;b &lt;1&gt;.json</a>"));
        assert!(html.contains("<a href=\"sub%20dir/\">sub dir/</a>"));
        assert!(html.starts_with("<!doctype html>"));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/localbackend/dash"), "dash");
        assert_eq!(base_name("/localbackend/dash/"), "dash");
        assert_eq!(base_name("/"), "");
    }
}
