//! `GET /weather/at` and the router around it.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;
use weather_core::{WeatherProvider, WeatherReport};

use crate::error::ApiError;

/// Builds the application router around a weather provider.
pub fn router(provider: Arc<dyn WeatherProvider>) -> Router {
    Router::new()
        .route("/weather/at", get(weather_at))
        .layer(TraceLayer::new_for_http())
        .with_state(provider)
}

#[derive(Debug, Default)]
pub struct CoordinateQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl CoordinateQuery {
    /// Picks `lat` and `lon` out of decoded query pairs. A repeated key keeps
    /// its first value; unrelated keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "lat" => &mut query.lat,
                "lon" => &mut query.lon,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }

    /// Returns `(lat, lon)`, checking `lat` first.
    pub fn validate(&self) -> Result<(&str, &str), ApiError> {
        let lat = present(&self.lat).ok_or(ApiError::InvalidParam("lat"))?;
        let lon = present(&self.lon).ok_or(ApiError::InvalidParam("lon"))?;
        Ok((lat, lon))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

async fn weather_at(
    State(provider): State<Arc<dyn WeatherProvider>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Pretty<WeatherReport>, ApiError> {
    // An undecodable query string carries no usable coordinates.
    let query = query
        .map(|Query(pairs)| CoordinateQuery::from_pairs(pairs))
        .unwrap_or_default();
    let (lat, lon) = query.validate()?;

    match provider.fetch_at(lat, lon).await {
        Ok(report) => Ok(Pretty(report)),
        Err(err) => {
            error!(lat, lon, kind = err.as_label(), error = %err, "failed to get weather");
            Err(ApiError::Upstream(err))
        }
    }
}

/// JSON body with two-space indentation and a trailing newline.
#[derive(Debug)]
pub struct Pretty<T>(pub T);

impl<T: Serialize> IntoResponse for Pretty<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec_pretty(&self.0) {
            Ok(mut body) => {
                body.push(b'\n');
                (
                    [(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    )],
                    body,
                )
                    .into_response()
            }
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        }
    }
}
