//! Core library for the weather server.
//!
//! This crate defines:
//! - Configuration loading (file, `.env`, environment)
//! - The weather provider abstraction and its OpenWeatherMap implementation
//! - Shared domain models (reports, temperature buckets)
//!
//! It is used by `weather-server`, but can also be reused by other binaries.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, NetConfig, WeatherSettings};
pub use error::WeatherError;
pub use model::{TemperatureBucket, WeatherReport};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
