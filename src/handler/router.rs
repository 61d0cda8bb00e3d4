//! Request routing dispatch module
//!
//! Prefix multiplexer in front of the per-route handler chains. Handles
//! path canonicalization, the missing-trailing-slash redirect and 404s for
//! unregistered paths.

use super::Handler;
use crate::http::{self, path, Body};
use async_trait::async_trait;
use hyper::{Method, Request, Response};

struct Route<B> {
    /// Always ends with `/`
    prefix: String,
    handler: Box<dyn Handler<B>>,
}

pub struct Router<B> {
    routes: Vec<Route<B>>,
}

impl<B: Send + 'static> Default for Router<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Send + 'static> Router<B> {
    pub const fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a subtree; a prefix without trailing `/` gets one
    #[must_use]
    pub fn route(mut self, prefix: &str, handler: impl Handler<B> + 'static) -> Self {
        let prefix = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };
        self.routes.push(Route {
            prefix,
            handler: Box::new(handler),
        });
        // Longest prefix first
        self.routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        self
    }

    fn find(&self, path: &str) -> Option<&Route<B>> {
        self.routes.iter().find(|r| path.starts_with(&r.prefix))
    }

    /// Registered subtree whose prefix equals `path` plus a trailing slash
    fn subtree_root(&self, path: &str) -> Option<&Route<B>> {
        self.routes
            .iter()
            .find(|r| r.prefix.len() > 1 && r.prefix.strip_suffix('/') == Some(path))
    }
}

fn with_query(target: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{target}?{q}"),
        _ => target.to_string(),
    }
}

#[async_trait]
impl<B: Send + 'static> Handler<B> for Router<B> {
    async fn handle(&self, req: Request<B>) -> Response<Body> {
        let uri = req.uri();
        let raw = uri.path();
        let query = uri.query().map(ToString::to_string);

        if raw == "*" {
            return http::build_400_response();
        }

        // Match and canonicalize on the decoded path so `%2e%2e` is a `..`
        let Some(decoded) = path::decode_path(raw).map(std::borrow::Cow::into_owned) else {
            return http::build_400_response();
        };

        if req.method() != Method::CONNECT {
            let cleaned = path::clean_path(&decoded);
            if cleaned != decoded {
                let target = path::encode_path(&cleaned);
                return http::build_redirect_response(&with_query(&target, query.as_deref()));
            }
        }

        if let Some(route) = self.find(&decoded) {
            return route.handler.handle(req).await;
        }

        if let Some(route) = self.subtree_root(&decoded) {
            return http::build_redirect_response(&with_query(&route.prefix, query.as_deref()));
        }

        http::build_404_response()
    }
}
