//! HTTP front end for weather reports.
//!
//! - [`handler`]: `GET /weather/at`
//! - [`server`]: listener lifecycle, plain or TLS
//! - [`supervisor`]: bounded restart loop around the server
//! - [`signal`]: shutdown signal wiring

pub mod error;
pub mod handler;
pub mod server;
pub mod signal;
pub mod supervisor;
pub mod tls;

pub use error::{ApiError, ServerError, SupervisorError};
pub use server::{Serve, Server};
pub use supervisor::{RestartPolicy, Supervisor};
