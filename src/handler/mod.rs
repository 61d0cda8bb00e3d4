//! Request handler module
//!
//! Every stage of the request path implements [`Handler`] and owns the
//! next stage, so a route is an explicit chain:
//! `CorsMiddleware -> TypedFileHandler -> FileServer`.

pub mod cors;
pub mod router;
pub mod static_files;
pub mod typed;

use crate::http::Body;
use async_trait::async_trait;
use hyper::{Request, Response};
use std::path::PathBuf;
use std::sync::Arc;

pub use cors::CorsMiddleware;
pub use router::Router;
pub use static_files::FileServer;
pub use typed::{ContentTypeTable, TypedFileHandler};

/// A single request/response stage
///
/// Generic over the request body; bodies are never read.
#[async_trait]
pub trait Handler<B: Send + 'static>: Send + Sync {
    async fn handle(&self, req: Request<B>) -> Response<Body>;
}

/// Build the handler chain served under every route prefix
pub fn file_route(
    root: impl Into<PathBuf>,
    table: Arc<ContentTypeTable>,
) -> CorsMiddleware<TypedFileHandler<FileServer>> {
    CorsMiddleware::new(TypedFileHandler::new(FileServer::new(root), table))
}
