//! Process signal wiring.
//!
//! The first SIGINT/SIGTERM stops the server; a second one exits the process
//! without waiting for anything.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::server::Server;

/// Shutdown signal streams, installed once and received repeatedly.
#[cfg(unix)]
pub struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv() => {},
            _ = self.sigterm.recv() => {},
        }
    }
}

#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}

/// Calls [`Server::stop`] once on the first signal, then force-exits on the next.
pub async fn stop_on_signal(server: Arc<Server>) {
    let mut signals = match ShutdownSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            error!(error = %e, "failed to install signal handlers");
            return;
        }
    };

    signals.recv().await;
    info!("shutdown signal received");
    server.stop();

    signals.recv().await;
    warn!("second shutdown signal received, exiting immediately");
    std::process::exit(1);
}
