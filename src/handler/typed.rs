//! Typed file handler
//!
//! Forces the Content-Type of media, manifest and payload files whose
//! type the generic file server would guess wrong (or not at all).

use super::Handler;
use crate::http::{path, Body};
use async_trait::async_trait;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response};
use std::collections::HashMap;
use std::sync::Arc;

/// Extension (lowercase, with leading dot) to Content-Type
const DEFAULT_TYPES: [(&str, &str); 7] = [
    (".mpd", "application/dash+xml"),
    (".m4s", "video/iso.segment"),
    (".m4v", "video/mp4"),
    (".mp4", "video/mp4"),
    (".ply", "application/octet-stream"),
    (".bin", "application/octet-stream"),
    (".json", "application/json"),
];

/// Immutable extension table, built once at startup and shared by `Arc`
#[derive(Debug, Clone)]
pub struct ContentTypeTable {
    types: HashMap<&'static str, HeaderValue>,
}

impl Default for ContentTypeTable {
    fn default() -> Self {
        let types = DEFAULT_TYPES
            .iter()
            .map(|&(ext, content_type)| (ext, HeaderValue::from_static(content_type)))
            .collect();
        Self { types }
    }
}

impl ContentTypeTable {
    /// Look up the Content-Type for a request path, case-insensitively
    pub fn lookup(&self, request_path: &str) -> Option<&HeaderValue> {
        let ext = path::extension(request_path);
        if ext.is_empty() {
            return None;
        }
        self.types.get(ext.to_ascii_lowercase().as_str())
    }
}

pub struct TypedFileHandler<H> {
    next: H,
    table: Arc<ContentTypeTable>,
}

impl<H> TypedFileHandler<H> {
    pub const fn new(next: H, table: Arc<ContentTypeTable>) -> Self {
        Self { next, table }
    }
}

#[async_trait]
impl<B, H> Handler<B> for TypedFileHandler<H>
where
    B: Send + 'static,
    H: Handler<B>,
{
    async fn handle(&self, req: Request<B>) -> Response<Body> {
        let content_type = {
            let raw = req.uri().path();
            let decoded = path::decode_path(raw);
            self.table.lookup(decoded.as_deref().unwrap_or(raw)).cloned()
        };

        let mut resp = self.next.handle(req).await;

        // Error bodies and 304s keep whatever the file server chose
        if let Some(value) = content_type {
            if resp.status().is_success() {
                resp.headers_mut().insert(CONTENT_TYPE, value);
            }
        }
        resp
    }
}
