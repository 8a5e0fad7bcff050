use serde::{Deserialize, Serialize};

/// Discretized feels-like temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBucket {
    #[default]
    Unknown,
    Freezing,
    Cold,
    Moderate,
    Hot,
    Burning,
}

impl TemperatureBucket {
    /// Buckets a Celsius value. Thresholds are inclusive upper bounds:
    /// 0, 10, 20 and 30 land in the lower bucket.
    pub fn from_celsius(temp: f64) -> Self {
        if temp <= 0.0 {
            TemperatureBucket::Freezing
        } else if temp <= 10.0 {
            TemperatureBucket::Cold
        } else if temp <= 20.0 {
            TemperatureBucket::Moderate
        } else if temp <= 30.0 {
            TemperatureBucket::Hot
        } else {
            TemperatureBucket::Burning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureBucket::Unknown => "unknown",
            TemperatureBucket::Freezing => "freezing",
            TemperatureBucket::Cold => "cold",
            TemperatureBucket::Moderate => "moderate",
            TemperatureBucket::Hot => "hot",
            TemperatureBucket::Burning => "burning",
        }
    }
}

impl std::fmt::Display for TemperatureBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized weather at a coordinate, as returned to callers.
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub condition: String,
    pub temperature: TemperatureBucket,
    pub temperature_raw: f64,
}

impl WeatherReport {
    pub const UNKNOWN_CONDITION: &'static str = "unknown";

    /// Builds a report from a feels-like temperature and an optional condition.
    pub fn from_feels_like(feels_like: f64, condition: Option<String>) -> Self {
        Self {
            condition: condition.unwrap_or_else(|| Self::UNKNOWN_CONDITION.to_string()),
            temperature: TemperatureBucket::from_celsius(feels_like),
            temperature_raw: feels_like,
        }
    }
}

impl Default for WeatherReport {
    fn default() -> Self {
        Self {
            condition: Self::UNKNOWN_CONDITION.to_string(),
            temperature: TemperatureBucket::Unknown,
            temperature_raw: 0.0,
        }
    }
}
