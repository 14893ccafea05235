// Server module entry point
// Accept loop, connection handling and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

pub use listener::create_listener;

use crate::fs::FileSystem;
use crate::handler::{FileServer, Renderer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Accept connections until a shutdown signal arrives
///
/// Connections already accepted keep running on their own tasks.
pub async fn run<F, R>(listener: TcpListener, server: Arc<FileServer<F, R>>, access_log: bool)
where
    F: FileSystem,
    R: Renderer,
{
    let shutdown = signal::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::handle_connection(
                            stream,
                            peer_addr,
                            Arc::clone(&server),
                            access_log,
                        );
                    }
                    Err(e) => error!("Failed to accept connection: {e}"),
                }
            }
            () = &mut shutdown => {
                info!("Stopped accepting connections");
                break;
            }
        }
    }
}
