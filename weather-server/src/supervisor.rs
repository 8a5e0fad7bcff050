//! Bounded restart loop around a [`Serve`] implementation.
//!
//! ```text
//! start ── Ok ─────────────────────────► done (stopped on purpose)
//!   │
//!   └─ Err ─► attempts += 1 ─► attempts == max ─► fatal
//!                    │
//!                    └─ wait restart_delay ─► start
//! ```

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{error::SupervisorError, server::Serve};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct RestartPolicy {
    /// Failed starts tolerated before giving up. Never reset.
    pub max_attempts: u32,
    /// Pause between a failure and the next start.
    pub restart_delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            restart_delay: DEFAULT_RESTART_DELAY,
        }
    }
}

pub struct Supervisor<S> {
    server: Arc<S>,
    shutdown: CancellationToken,
    policy: RestartPolicy,
}

impl<S: Serve> Supervisor<S> {
    /// `shutdown` must be the token that stops `server`; it also cuts short a
    /// pending restart delay.
    pub fn new(server: Arc<S>, shutdown: CancellationToken) -> Self {
        Self {
            server,
            shutdown,
            policy: RestartPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RestartPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs the server until it is stopped, restarting it after failures.
    pub async fn run(&self) -> Result<(), SupervisorError> {
        let mut attempts = 0;
        loop {
            let err = match self.server.start().await {
                Ok(()) => {
                    info!("server stopped");
                    return Ok(());
                }
                Err(err) => err,
            };

            attempts += 1;
            if attempts >= self.policy.max_attempts {
                error!(attempts, error = %err, "server failed too many times");
                return Err(SupervisorError::TooManyFailures {
                    attempts,
                    last: err,
                });
            }
            warn!(
                attempts,
                max_attempts = self.policy.max_attempts,
                error = %err,
                "server returned an error, restarting"
            );

            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("stopped while waiting to restart");
                    return Ok(());
                }
                () = tokio::time::sleep(self.policy.restart_delay) => {}
            }
        }
    }
}
