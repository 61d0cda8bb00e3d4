//! Cross-origin middleware
//!
//! Logs each request and applies a permissive CORS policy to every
//! response. Preflight (`OPTIONS`) requests are answered here and never
//! reach the wrapped handler.

use super::Handler;
use crate::http::{self, Body};
use crate::logger;
use async_trait::async_trait;
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::{Method, Request, Response};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, Content-Length";

pub struct CorsMiddleware<H> {
    next: H,
}

impl<H> CorsMiddleware<H> {
    pub const fn new(next: H) -> Self {
        Self { next }
    }
}

/// Add the CORS headers the downstream handler did not set itself
fn apply_cors_headers(headers: &mut HeaderMap) {
    let policy: [(HeaderName, &'static str); 3] = [
        (ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
        (ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
        (ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
    ];
    for (name, value) in policy {
        headers
            .entry(name)
            .or_insert_with(|| HeaderValue::from_static(value));
    }
}

#[async_trait]
impl<B, H> Handler<B> for CorsMiddleware<H>
where
    B: Send + 'static,
    H: Handler<B>,
{
    async fn handle(&self, req: Request<B>) -> Response<Body> {
        logger::log_request(req.method(), req.uri());

        let mut resp = if req.method() == Method::OPTIONS {
            http::build_preflight_response()
        } else {
            self.next.handle(req).await
        };
        apply_cors_headers(resp.headers_mut());
        resp
    }
}
