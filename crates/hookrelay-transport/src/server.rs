//! TCP listener lifecycle for the gateway.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{TransportError, TransportResult};
use crate::gateway::Gateway;

/// A running listener.
///
/// Cancelling the gateway's shutdown token (directly or via
/// [`ListenerHandle::shutdown`]) stops accepting connections, cancels
/// in-flight dispatches and lets the serve task finish.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Requests shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Waits for the serve task to finish.
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "HTTP server task failed");
        }
    }
}

impl Gateway {
    /// Binds `addr` and serves the gateway until its shutdown token fires.
    pub async fn listen(&self, addr: &str) -> TransportResult<ListenerHandle> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, path = %self.config().path, "HTTP server listening");
        info!(
            "Use url 'https://<your_public_host>{}' in the 3scale webhook configuration",
            self.webhook_url()
        );

        let router = self.router();
        let shutdown = self.shutdown_token().clone();
        let signal = shutdown.clone();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.cancelled().await });
            if let Err(e) = server.await {
                error!(error = %e, "HTTP server error");
            }
            info!(addr = %local_addr, "HTTP server shut down");
        });

        Ok(ListenerHandle {
            local_addr,
            shutdown,
            task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayConfig;
    use hookrelay_core::KnownTypes;
    use hookrelay_framework::{Dispatcher, HandlerRegistry};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn gateway() -> Gateway {
        let registry = HandlerRegistry::builder(KnownTypes::default())
            .build::<&str>(&[])
            .await;
        Gateway::new(Dispatcher::new(Arc::new(registry)), GatewayConfig::default())
    }

    #[tokio::test]
    async fn test_listen_serves_and_shuts_down() {
        let gw = gateway().await;
        let handle = gw.listen("127.0.0.1:0").await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);

        let mut stream = TcpStream::connect(handle.local_addr()).await.unwrap();
        stream
            .write_all(b"GET /webhook HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#"{"pong":"webhook"}"#));

        handle.shutdown();
        assert!(gw.shutdown_token().is_cancelled());
        handle.stopped().await;
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let first = gateway().await;
        let handle = first.listen("127.0.0.1:0").await.unwrap();
        let addr = handle.local_addr().to_string();

        let second = gateway().await;
        let err = second.listen(&addr).await.unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));

        handle.shutdown();
        handle.stopped().await;
    }
}
