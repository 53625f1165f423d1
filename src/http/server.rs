//! Listener setup and the serve loop.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::HttpServerConfig;
use crate::routing::RouteTable;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid http.host or http.port: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bind a TCP listener on `addr`.
///
/// Fails with [`ServerError::Bind`] when the address is already in use or
/// cannot be bound at all.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve `routes` on `listener` until `shutdown` resolves.
///
/// Each connection runs on its own task. In-flight requests are allowed to
/// finish once shutdown starts.
pub async fn serve<F>(
    listener: TcpListener,
    routes: RouteTable,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = routes.into_router();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

/// Bind the configured address and serve until SIGINT or SIGTERM.
///
/// This function blocks until the server shuts down.
pub async fn start_server(config: &HttpServerConfig, routes: RouteTable) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let listener = bind(addr).await?;

    tracing::info!(
        addr = %addr,
        routes = ?routes.patterns().collect::<Vec<_>>(),
        "Starting HTTP server"
    );

    serve(listener, routes, shutdown::shutdown_signal()).await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
