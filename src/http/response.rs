//! HTTP response building module
//!
//! Builders for the status responses the router and file server emit.
//! Fixed responses carry a buffered body; file content is streamed.

use crate::http::range::ByteRange;
use futures::TryStreamExt;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{
    ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LAST_MODIFIED, LOCATION,
    X_CONTENT_TYPE_OPTIONS,
};
use hyper::{Response, StatusCode};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

pub type Body = UnsyncBoxBody<Bytes, std::io::Error>;

/// Buffered body
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn empty() -> Body {
    full(Bytes::new())
}

/// Body read from `reader` chunk by chunk as the client consumes it
pub fn stream(reader: impl AsyncRead + Send + 'static) -> Body {
    StreamBody::new(ReaderStream::new(reader).map_ok(Frame::data)).boxed_unsync()
}

/// Plain-text error response, e.g. `404 page not found`
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(full(format!("{message}\n")))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(empty())
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Body> {
    build_error_response(StatusCode::NOT_FOUND, "404 page not found")
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<Body> {
    build_error_response(StatusCode::BAD_REQUEST, "400 Bad Request")
}

/// Build 301 redirect response
pub fn build_redirect_response(target: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, target)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(empty())
        })
}

/// Empty `200` answer to a CORS preflight
pub fn build_preflight_response() -> Response<Body> {
    Response::new(empty())
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, last_modified)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(empty())
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<Body> {
    let mut resp = build_error_response(
        StatusCode::RANGE_NOT_SATISFIABLE,
        "invalid range: failed to overlap",
    );
    if let Ok(value) = format!("bytes */{file_size}").parse() {
        resp.headers_mut().insert(CONTENT_RANGE, value);
    }
    resp
}

/// Build 200 response carrying file content
///
/// `content_length` is passed separately so `HEAD` can send an empty body.
pub fn build_file_response(
    body: Body,
    content_length: u64,
    content_type: &str,
    last_modified: Option<&str>,
) -> Response<Body> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes");
    if let Some(lm) = last_modified {
        builder = builder.header(LAST_MODIFIED, lm);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(empty())
    })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    body: Body,
    content_type: &str,
    last_modified: Option<&str>,
    range: ByteRange,
    total_size: u64,
) -> Response<Body> {
    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, range.length())
        .header(CONTENT_RANGE, range.content_range(total_size))
        .header(ACCEPT_RANGES, "bytes");
    if let Some(lm) = last_modified {
        builder = builder.header(LAST_MODIFIED, lm);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(empty())
    })
}

/// Build generic HTML response (directory listings)
pub fn build_html_response(
    content: String,
    last_modified: Option<&str>,
    is_head: bool,
) -> Response<Body> {
    let content_length = content.len();
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, content_length);
    if let Some(lm) = last_modified {
        builder = builder.header(LAST_MODIFIED, lm);
    }

    let body = if is_head { empty() } else { full(content) };
    builder.body(body).unwrap_or_else(|e| {
        log_build_error("HTML", &e);
        Response::new(empty())
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
