use range_fileserver::config::Config;
use range_fileserver::fs::LocalFileSystem;
use range_fileserver::handler::{DefaultRenderer, FileServer};
use range_fileserver::{logger, server};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    // Worker thread count comes from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    let file_server = FileServer::new(LocalFileSystem::new(&cfg.files.root), DefaultRenderer)
        .with_options(cfg.server_options());

    logger::log_server_start(&addr, &cfg);

    server::run(listener, Arc::new(file_server), cfg.logging.access_log).await;
    Ok(())
}
