use log::{error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{GatewayError, TokenRingError};
use crate::network::http::server::SharedGateway;
use crate::network::http::thread::HttpThread;
use crate::network::http::HttpConfig;
use crate::ring::sink::EventSink;
use crate::ring::token_ring::TokenRing;
use crate::ring::types::RingConfig;

const SERVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A token ring exposed through the HTTP gateway.
pub struct RingService {
    ring: TokenRing,
    http_config: HttpConfig,
    http_handle: Option<JoinHandle<Result<(), GatewayError>>>,
    http_shutdown: Option<oneshot::Sender<()>>,
    local_addr: Option<SocketAddr>,
}

impl RingService {
    pub fn new(
        ring_config: RingConfig,
        http_config: HttpConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, TokenRingError> {
        let ring = TokenRing::new(ring_config, sink)?;
        Ok(Self {
            ring,
            http_config,
            http_handle: None,
            http_shutdown: None,
            local_addr: None,
        })
    }

    pub fn ring(&self) -> &TokenRing {
        &self.ring
    }

    /// Address the gateway is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Starts the ring workers, then the HTTP gateway, and waits for the
    /// gateway to be listening.
    pub async fn start(&mut self) -> Result<SocketAddr, TokenRingError> {
        if let Some(addr) = self.local_addr {
            return Ok(addr);
        }

        let ingress = self.ring.run()?;
        let gateway: SharedGateway = Arc::new(ingress);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let http_thread = HttpThread::new(self.http_config.clone(), gateway, shutdown_rx, ready_tx);
        let handle = tokio::spawn(http_thread.run());

        match tokio::time::timeout(SERVER_STARTUP_TIMEOUT, ready_rx).await {
            Ok(Ok(addr)) => {
                self.http_handle = Some(handle);
                self.http_shutdown = Some(shutdown_tx);
                self.local_addr = Some(addr);
                Ok(addr)
            }
            Ok(Err(_)) => {
                // The server task ended before binding; surface its error.
                let err = match handle.await {
                    Ok(Err(e)) => e,
                    Ok(Ok(())) => GatewayError::Serve("server exited during startup".into()),
                    Err(e) => GatewayError::Serve(e.to_string()),
                };
                error!("HTTP gateway failed to start: {}", err);
                self.ring.shutdown().await;
                Err(err.into())
            }
            Err(_) => {
                error!("HTTP gateway startup timed out");
                handle.abort();
                self.ring.shutdown().await;
                Err(GatewayError::Serve("server startup timed out".into()).into())
            }
        }
    }

    /// Serves until `signal` resolves or the gateway dies, then stops
    /// everything.
    pub async fn run_until<F>(&mut self, signal: F) -> Result<(), TokenRingError>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;

        let mut server_result = Ok(());
        if let Some(handle) = self.http_handle.as_mut() {
            tokio::select! {
                _ = signal => {
                    info!("Received shutdown signal");
                }
                finished = handle => {
                    self.http_handle = None;
                    self.http_shutdown = None;
                    server_result = match finished {
                        Ok(result) => result,
                        Err(e) => Err(GatewayError::Serve(e.to_string())),
                    };
                    warn!("HTTP gateway stopped on its own");
                }
            }
        }

        self.stop().await;
        server_result.map_err(TokenRingError::from)
    }

    /// Serves until Ctrl-C.
    pub async fn run(&mut self) -> Result<(), TokenRingError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Closes the listener, stops the ring, then waits for the gateway to
    /// drain.
    ///
    /// The ring goes down before the gateway is awaited: a request stuck on a
    /// full ingress edge only returns once the ring broadcasts shutdown, and
    /// the gateway's graceful shutdown waits for that request.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.http_shutdown.take() {
            let _ = shutdown.send(());
        }
        self.ring.shutdown().await;
        if let Some(handle) = self.http_handle.take() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("HTTP gateway error: {}", e),
                Err(e) => error!("HTTP gateway task failed: {}", e),
            }
        }
        self.local_addr = None;
        info!("Ring service stopped");
    }
}
