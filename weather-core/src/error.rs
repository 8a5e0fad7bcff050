use thiserror::Error;

/// Failures of a single weather lookup or of building a provider.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The provider cannot be built from the given configuration.
    #[error("invalid weather provider configuration: {0}")]
    Config(String),

    /// The request never produced a response (connect, timeout, body read).
    #[error("request to weather provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with something other than 200 OK.
    #[error("weather provider returned status {0}")]
    UpstreamStatus(u16),

    /// The provider answered 200 OK but the body is not what we expect.
    #[error("failed to decode weather provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl WeatherError {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WeatherError::Config(_) => "config",
            WeatherError::Transport(_) => "transport",
            WeatherError::UpstreamStatus(_) => "upstream_status",
            WeatherError::Decode(_) => "decode",
        }
    }
}
