// Connection handling module
// Serves a single TCP connection with the file server

use crate::fs::FileSystem;
use crate::handler::{FileServer, Renderer};
use crate::logger;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Serve one accepted connection on its own task
///
/// HTTP/1.1 with keep-alive; every request goes to `server`, followed by an access log line
/// when `access_log` is set. Connection-level failures are logged, never propagated.
pub fn handle_connection<F, R>(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    server: Arc<FileServer<F, R>>,
    access_log: bool,
) where
    F: FileSystem,
    R: Renderer,
{
    debug!(%peer_addr, "Connection accepted");

    // Part headers and small ranges go out as separate writes
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer_addr, "Failed to set TCP_NODELAY: {e}");
    }

    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let server = Arc::clone(&server);
            async move {
                let started = Instant::now();
                let method = req.method().clone();
                let path = req.uri().path().to_owned();

                let response = server.handle(req).await;

                if access_log {
                    logger::log_access(
                        &peer_addr,
                        &method,
                        &path,
                        response.status(),
                        started.elapsed(),
                    );
                }
                Ok::<_, Infallible>(response)
            }
        });

        let mut builder = http1::Builder::new();
        builder.keep_alive(true);
        if let Err(err) = builder.serve_connection(io, service).await {
            logger::log_connection_error(&peer_addr, &err);
        }
    });
}
