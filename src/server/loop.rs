// Server loop module
// Accepts connections forever and hands each one to its own task

use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use tokio::net::TcpListener;

use super::connection::handle_connection;
use crate::handler::Router;
use crate::logger;

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Run the accept loop. Never returns; accept errors are logged and retried.
pub async fn start_server_loop(listener: TcpListener, router: Arc<Router<Incoming>>) {
    loop {
        match listener.accept().await {
            Ok((stream, _peer_addr)) => handle_connection(stream, Arc::clone(&router)),
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
