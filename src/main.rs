use std::sync::Arc;

use bookmark_router::config::{AppState, Config};
use bookmark_router::server::{
    create_reusable_listener, start_server_loop, start_signal_handler, SignalHandler,
};
use bookmark_router::{bookmarks, logger};

/// Config file path without extension, overridable for deployments
const CONFIG_PATH_ENV: &str = "BOOKMARKS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = cfg.get_socket_addr()?;
    let dispatcher = bookmarks::build_dispatcher(&cfg)?;
    let state = Arc::new(AppState::new(&cfg, dispatcher));
    let listener = create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &cfg);

    let signals = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signals));

    start_server_loop(listener, state, Arc::clone(&signals.shutdown)).await
}
