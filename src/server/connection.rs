// Connection handling module
// Serves one accepted TCP connection over HTTP/1.1

use std::convert::Infallible;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;

use crate::handler::{Handler, Router};
use crate::logger;

/// Serve a single connection in a spawned task.
///
/// Keep-alive is on; requests on the connection are answered in order by
/// the shared router. No read or write deadlines are applied.
pub fn handle_connection(stream: tokio::net::TcpStream, router: Arc<Router<Incoming>>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let conn = http1::Builder::new().keep_alive(true).serve_connection(
            io,
            service_fn(move |req| {
                let router = Arc::clone(&router);
                async move { Ok::<_, Infallible>(router.handle(req).await) }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
