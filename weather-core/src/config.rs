use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    pub bind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_cert: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_key: Option<PathBuf>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl NetConfig {
    /// Certificate and key paths, only when both are set.
    pub fn tls_paths(&self) -> Option<(&Path, &Path)> {
        let cert = self.tls_cert.as_deref().filter(|p| !p.as_os_str().is_empty())?;
        let key = self.tls_key.as_deref().filter(|p| !p.as_os_str().is_empty())?;
        Some((cert, key))
    }
}

/// Upstream weather provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub api_key: String,
    /// Overrides the provider's default endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Top-level configuration.
///
/// Example TOML:
/// ```toml
/// [net]
/// bind = "0.0.0.0:8080"
///
/// [weather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub net: NetConfig,
    pub weather: WeatherSettings,
}

impl Config {
    /// Loads `.env`, then the config file (`path` or the platform default), then
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            // A missing .env is normal outside development.
            if !err.not_found() {
                return Err(err).context("Failed to load .env file");
            }
        }

        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Reads a config file, or returns defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Applies `NET_BIND`, `NET_TLSCERT`, `NET_TLSKEY`, `WEATHER_APIKEY` and
    /// `WEATHER_ENDPOINT` from `lookup`. Set variables win over file values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup("NET_BIND").filter(|v| !v.is_empty()) {
            self.net.bind = bind;
        }
        if let Some(cert) = lookup("NET_TLSCERT") {
            self.net.tls_cert = non_empty(cert).map(PathBuf::from);
        }
        if let Some(key) = lookup("NET_TLSKEY") {
            self.net.tls_key = non_empty(key).map(PathBuf::from);
        }
        if let Some(api_key) = lookup("WEATHER_APIKEY") {
            self.weather.api_key = api_key;
        }
        if let Some(endpoint) = lookup("WEATHER_ENDPOINT") {
            self.weather.endpoint = non_empty(endpoint);
        }
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Default path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather", "weather-server")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_have_no_tls_and_no_key() {
        let cfg = Config::default();
        assert_eq!(cfg.net.bind, DEFAULT_BIND);
        assert!(cfg.net.tls_paths().is_none());
        assert!(cfg.weather.api_key.is_empty());
        assert!(cfg.weather.endpoint.is_none());
    }

    #[test]
    fn tls_requires_both_paths() {
        let mut net = NetConfig {
            tls_cert: Some("cert.pem".into()),
            ..Default::default()
        };
        assert!(net.tls_paths().is_none());

        net.tls_key = Some(PathBuf::new());
        assert!(net.tls_paths().is_none());

        net.tls_key = Some("key.pem".into());
        let (cert, key) = net.tls_paths().expect("both paths set");
        assert_eq!(cert, Path::new("cert.pem"));
        assert_eq!(key, Path::new("key.pem"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.weather.api_key = "FROM_FILE".into();
        cfg.weather.endpoint = Some("http://file.example".into());

        cfg.apply_env(env(&[
            ("NET_BIND", "127.0.0.1:9000"),
            ("NET_TLSCERT", "/etc/tls/cert.pem"),
            ("NET_TLSKEY", "/etc/tls/key.pem"),
            ("WEATHER_APIKEY", "FROM_ENV"),
            ("WEATHER_ENDPOINT", ""),
        ]));

        assert_eq!(cfg.net.bind, "127.0.0.1:9000");
        assert!(cfg.net.tls_paths().is_some());
        assert_eq!(cfg.weather.api_key, "FROM_ENV");
        assert_eq!(cfg.weather.endpoint, None);
    }

    #[test]
    fn unset_env_keeps_file_values() {
        let mut cfg = Config::default();
        cfg.weather.api_key = "FROM_FILE".into();

        cfg.apply_env(env(&[]));

        assert_eq!(cfg.weather.api_key, "FROM_FILE");
        assert_eq!(cfg.net.bind, DEFAULT_BIND);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.net.bind = "127.0.0.1:8443".into();
        cfg.net.tls_cert = Some("cert.pem".into());
        cfg.net.tls_key = Some("key.pem".into());
        cfg.weather.api_key = "KEY".into();
        cfg.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[weather]\napi_key = \"KEY\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.weather.api_key, "KEY");
        assert_eq!(cfg.net.bind, DEFAULT_BIND);
    }

    #[test]
    fn bad_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is ! not toml").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
