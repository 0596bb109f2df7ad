//! API server lifecycle: bind, serve in a background task, shut down
//! gracefully on request.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::core_state::CoreState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind API server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("API server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    pub started_at: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Signal graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the serve task to exit.
    pub async fn stopped(self) -> Result<(), ServerError> {
        self.task.await?;
        Ok(())
    }
}

/// Bind `addr` and serve the API router in a background task.
///
/// Port 0 picks an ephemeral port; the bound address is on the handle.
pub async fn start_api_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { addr, source })?;

    let app = api_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        started_at: crate::db::now_timestamp(),
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn serves_health_then_stops() {
        let core = Arc::new(CoreState::new().unwrap());
        let mut server = start_api_server(core, loopback()).await.expect("server should start");
        assert!(server.addr.port() > 0);

        let response = raw_get(server.addr, "/api/health").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        let response = raw_get(server.addr, "/api/does-not-exist").await;
        assert!(response.starts_with("HTTP/1.1 404"), "{response}");

        server.shutdown();
        server.stopped().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let core = Arc::new(CoreState::new().unwrap());
        let mut server = start_api_server(core, loopback()).await.unwrap();
        server.shutdown();
        server.shutdown();
        server.stopped().await.unwrap();
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let core = Arc::new(CoreState::new().unwrap());
        let mut first = start_api_server(core.clone(), loopback()).await.unwrap();
        let err = start_api_server(core, first.addr).await.err().unwrap();
        assert!(matches!(err, ServerError::Bind { .. }));
        first.shutdown();
    }
}
