//! Listener ownership: bind, serve plain or TLS, stop.

use std::{future::IntoFuture, io, sync::Arc};

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use weather_core::{NetConfig, WeatherProvider};

use crate::{error::ServerError, handler, tls};

/// Something the supervisor can (re)start.
///
/// `start` resolves to `Ok(())` only after a deliberate stop; any other exit is
/// an error.
#[async_trait]
pub trait Serve: Send + Sync {
    async fn start(&self) -> Result<(), ServerError>;
}

/// The HTTP server. Cheap to share; `stop` may be called from another task.
#[derive(Debug)]
pub struct Server {
    config: NetConfig,
    router: Router,
    shutdown: CancellationToken,
}

impl Server {
    pub fn new(config: NetConfig, provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            config,
            router: handler::router(provider),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelled by [`Server::stop`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Closes the listener. In-flight requests are neither drained nor cancelled.
    ///
    /// Once stopped, every later `start` returns `Ok(())` immediately.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("stopping server");
            self.shutdown.cancel();
        }
    }

    /// Binds and serves until stopped or the listener fails.
    pub async fn start(&self) -> Result<(), ServerError> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }

        let addr = self.config.bind.as_str();
        let tls_config = match self.config.tls_paths() {
            Some((cert, key)) => Some(tls::load_server_config(cert, key)?),
            None => None,
        };

        let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local = listener.local_addr()?;
        let router = self.router.clone();

        match tls_config {
            Some(tls_config) => {
                info!(addr = %local, "listening on https");
                let listener = tls::TlsListener::new(listener, tls_config)?;
                self.serve_until_stopped(axum::serve(listener, router)).await
            }
            None => {
                info!(addr = %local, "listening on http");
                self.serve_until_stopped(axum::serve(listener, router)).await
            }
        }
    }

    async fn serve_until_stopped<F>(&self, serve: F) -> Result<(), ServerError>
    where
        F: IntoFuture<Output = io::Result<()>>,
    {
        // Dropping the serve future closes the listening socket; connection
        // tasks it already spawned keep running to completion.
        tokio::select! {
            () = self.shutdown.cancelled() => Ok(()),
            res = serve.into_future() => match res {
                Ok(()) => Err(ServerError::Exited),
                Err(e) => Err(ServerError::Serve(e)),
            },
        }
    }
}

#[async_trait]
impl Serve for Server {
    async fn start(&self) -> Result<(), ServerError> {
        Server::start(self).await
    }
}
