use std::sync::Arc;

use hyper::body::Incoming;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use handler::{file_route, ContentTypeTable, Router};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

/// One CORS/typed/file chain per route prefix, all sharing the same root
fn build_router(cfg: &config::Config) -> Router<Incoming> {
    let table = Arc::new(ContentTypeTable::default());
    cfg.files.routes.iter().fold(Router::new(), |router, prefix| {
        router.route(prefix, file_route(&cfg.files.root, Arc::clone(&table)))
    })
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let listener = match server::create_listener(addr, cfg.server.backlog) {
        Ok(listener) => listener,
        Err(e) => {
            logger::log_error(&format!("Failed to bind {addr}: {e}"));
            return Err(e.into());
        }
    };

    if !cfg.files.root.is_dir() {
        logger::log_warning(&format!(
            "File root {} is not a directory; every file request will 404",
            cfg.files.root.display()
        ));
    }

    let router = Arc::new(build_router(&cfg));
    logger::log_server_start(&addr, &cfg);

    server::start_server_loop(listener, router).await;
    Ok(())
}
