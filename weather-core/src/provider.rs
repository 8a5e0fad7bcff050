use crate::{Config, WeatherError, WeatherReport, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// A source of weather reports for a coordinate.
///
/// Coordinates are passed through as the caller supplied them; providers do not
/// parse or range-check them.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_at(&self, lat: &str, lon: &str) -> Result<WeatherReport, WeatherError>;
}

/// Construct the provider described by `config`.
///
/// Fails with [`WeatherError::Config`] when the API key is missing, without
/// touching the network.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
    let provider = OpenWeatherProvider::new(&config.weather)?;
    Ok(Arc::new(provider))
}
