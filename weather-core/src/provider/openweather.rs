use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{WeatherError, WeatherReport, config::WeatherSettings};

use super::WeatherProvider;

/// OpenWeatherMap One Call endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Upper bound for a single upstream call, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    endpoint: Url,
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    /// Builds a provider with its own HTTP client bounded by [`REQUEST_TIMEOUT`].
    pub fn new(settings: &WeatherSettings) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WeatherError::Config(format!("failed to build http client: {e}")))?;

        Self::with_client(settings, http)
    }

    /// Builds a provider around an existing client. The client's own timeout applies.
    pub fn with_client(settings: &WeatherSettings, http: Client) -> Result<Self, WeatherError> {
        if settings.api_key.is_empty() {
            return Err(WeatherError::Config("no api key specified".to_string()));
        }

        let raw = settings
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = Url::parse(raw)
            .map_err(|e| WeatherError::Config(format!("invalid endpoint '{raw}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(WeatherError::Config(format!(
                "invalid endpoint '{raw}': scheme must be http or https"
            )));
        }

        Ok(Self {
            endpoint,
            api_key: settings.api_key.clone(),
            http,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn form_request(&self, lat: &str, lon: &str) -> Result<reqwest::Request, WeatherError> {
        let request = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lat", lat),
                ("lon", lon),
            ])
            .build()?;

        Ok(request)
    }
}

// Only the fields we read. Everything else in the One Call payload is ignored.
// Absent or `null` fields fall back to the report defaults, and an entry
// without `main` reads as an empty condition.
#[derive(Debug, Deserialize)]
struct OwmResponse {
    current: Option<OwmCurrent>,
}

#[derive(Debug, Default, Deserialize)]
struct OwmCurrent {
    feels_like: Option<f64>,
    weather: Option<Vec<OwmWeather>>,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    main: Option<String>,
}

impl From<OwmResponse> for WeatherReport {
    fn from(parsed: OwmResponse) -> Self {
        let current = parsed.current.unwrap_or_default();
        let condition = current
            .weather
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|w| w.main.unwrap_or_default());
        WeatherReport::from_feels_like(current.feels_like.unwrap_or_default(), condition)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_at(&self, lat: &str, lon: &str) -> Result<WeatherReport, WeatherError> {
        let request = self.form_request(lat, lon)?;
        let res = self.http.execute(request).await?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(WeatherError::UpstreamStatus(status.as_u16()));
        }

        let body = res.text().await?;
        let parsed: OwmResponse = serde_json::from_str(&body)?;

        let report = WeatherReport::from(parsed);
        debug!(condition = %report.condition, temperature = %report.temperature, "weather fetched");

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TemperatureBucket;

    fn settings(endpoint: Option<&str>) -> WeatherSettings {
        WeatherSettings {
            api_key: "KEY".to_string(),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn empty_api_key_is_a_config_error() {
        let cfg = WeatherSettings {
            api_key: String::new(),
            endpoint: None,
        };
        let err = OpenWeatherProvider::new(&cfg).unwrap_err();
        assert!(matches!(err, WeatherError::Config(_)));
    }

    #[test]
    fn blank_but_non_empty_api_key_is_accepted() {
        let cfg = WeatherSettings {
            api_key: " ".to_string(),
            endpoint: None,
        };
        assert!(OpenWeatherProvider::new(&cfg).is_ok());
    }

    #[test]
    fn uses_default_endpoint_without_override() {
        let provider = OpenWeatherProvider::new(&settings(None)).unwrap();
        assert_eq!(provider.endpoint().as_str(), DEFAULT_ENDPOINT);

        let provider = OpenWeatherProvider::new(&settings(Some(""))).unwrap();
        assert_eq!(provider.endpoint().as_str(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn bad_endpoint_is_a_config_error() {
        let err = OpenWeatherProvider::new(&settings(Some("not a url"))).unwrap_err();
        assert!(matches!(err, WeatherError::Config(_)));

        let err = OpenWeatherProvider::new(&settings(Some("ftp://example.com/"))).unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn form_request_attaches_query_unmodified() {
        let provider =
            OpenWeatherProvider::new(&settings(Some("https://example.com/onecall"))).unwrap();
        let request = provider.form_request("40.7128", "-74.0060").unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("appid".to_string(), "KEY".to_string()),
                ("units".to_string(), "metric".to_string()),
                ("lat".to_string(), "40.7128".to_string()),
                ("lon".to_string(), "-74.0060".to_string()),
            ]
        );
    }

    #[test]
    fn first_weather_entry_wins() {
        let parsed: OwmResponse = serde_json::from_str(
            r#"{"current":{"feels_like":3.2,"weather":[{"main":"Rain"},{"main":"Mist"}]}}"#,
        )
        .unwrap();
        let report = WeatherReport::from(parsed);
        assert_eq!(report.condition, "Rain");
        assert_eq!(report.temperature, TemperatureBucket::Cold);
    }

    #[test]
    fn missing_weather_list_keeps_unknown_condition() {
        let parsed: OwmResponse =
            serde_json::from_str(r#"{"current":{"feels_like":-1.0}}"#).unwrap();
        let report = WeatherReport::from(parsed);
        assert_eq!(report.condition, "unknown");
        assert_eq!(report.temperature, TemperatureBucket::Freezing);
        assert_eq!(report.temperature_raw, -1.0);
    }

    fn report_from(body: &str) -> WeatherReport {
        WeatherReport::from(serde_json::from_str::<OwmResponse>(body).unwrap())
    }

    #[test]
    fn null_fields_fall_back_to_defaults() {
        let report = report_from(r#"{"current":null}"#);
        assert_eq!(report, WeatherReport::from_feels_like(0.0, None));

        let report = report_from(r#"{"current":{"feels_like":null,"weather":null}}"#);
        assert_eq!(report.condition, "unknown");
        assert_eq!(report.temperature, TemperatureBucket::Freezing);
        assert_eq!(report.temperature_raw, 0.0);

        let report = report_from("{}");
        assert_eq!(report.condition, "unknown");
    }

    #[test]
    fn weather_entry_without_main_is_an_empty_condition() {
        let report = report_from(r#"{"current":{"feels_like":5,"weather":[{}]}}"#);
        assert_eq!(report.condition, "");
        assert_eq!(report.temperature, TemperatureBucket::Cold);

        let report = report_from(r#"{"current":{"feels_like":5,"weather":[{"main":null}]}}"#);
        assert_eq!(report.condition, "");
    }

    #[test]
    fn wrong_types_are_still_rejected() {
        assert!(serde_json::from_str::<OwmResponse>(r#"{"current":{"feels_like":"warm"}}"#).is_err());
        assert!(serde_json::from_str::<OwmResponse>(r#"{"current":"now"}"#).is_err());
    }
}
