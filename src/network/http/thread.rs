use log::{error, info};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::error::GatewayError;
use crate::network::http::server::{router, SharedGateway};
use crate::network::http::HttpConfig;

/// Runs the HTTP gateway until its shutdown channel fires.
pub struct HttpThread {
    config: HttpConfig,
    gateway: SharedGateway,
    shutdown_rx: oneshot::Receiver<()>,
    ready_tx: oneshot::Sender<SocketAddr>,
}

impl HttpThread {
    pub fn new(
        config: HttpConfig,
        gateway: SharedGateway,
        shutdown_rx: oneshot::Receiver<()>,
        ready_tx: oneshot::Sender<SocketAddr>,
    ) -> Self {
        Self {
            config,
            gateway,
            shutdown_rx,
            ready_tx,
        }
    }

    /// Binds, reports the bound address on the ready channel, then serves.
    pub async fn run(self) -> Result<(), GatewayError> {
        let addr = self.config.socket_addr().await?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;

        info!("HTTP gateway listening on {}", local_addr);
        let _ = self.ready_tx.send(local_addr);

        let shutdown_rx = self.shutdown_rx;
        match axum::serve(listener, router(self.gateway))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
        {
            Ok(()) => {
                info!("HTTP gateway shut down gracefully");
                Ok(())
            }
            Err(e) => {
                error!("HTTP gateway encountered a fatal error: {:?}", e);
                Err(GatewayError::Serve(e.to_string()))
            }
        }
    }
}
