use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::info;
use weather_core::{Config, provider_from_config};
use weather_server::{Server, Supervisor, signal};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Weather report HTTP server")]
pub struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively write the config file.
    Configure,

    /// Run the HTTP server.
    Serve {
        /// Bind address, overriding config and environment.
        #[arg(long)]
        bind: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(self.config),
            Command::Serve { bind } => serve(self.config, bind).await,
        }
    }
}

async fn serve(config_path: Option<PathBuf>, bind: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::load(config_path.as_deref()).context("failed to set up config")?;
    if let Some(bind) = bind {
        config.net.bind = bind;
    }

    let provider = provider_from_config(&config).context("failed to set up weather service")?;
    let server = Arc::new(Server::new(config.net.clone(), provider));

    tokio::spawn(signal::stop_on_signal(server.clone()));

    info!(version = env!("CARGO_PKG_VERSION"), "weather-server starting");
    Supervisor::new(server.clone(), server.shutdown_token())
        .run()
        .await
        .context("server did not recover")?;

    Ok(())
}

fn configure(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match config_path {
        Some(p) => p,
        None => Config::config_file_path()?,
    };
    // Env overrides are deliberately not merged in, so they never get persisted.
    let mut config = Config::load_from(&path)?;

    let mut key_prompt = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked);
    if !config.weather.api_key.is_empty() {
        key_prompt = key_prompt.with_help_message("leave empty to keep the current key");
    }
    let api_key = key_prompt.prompt()?;
    if !api_key.is_empty() {
        config.weather.api_key = api_key;
    }

    let endpoint = Text::new("Endpoint override (empty for default):")
        .with_default(config.weather.endpoint.as_deref().unwrap_or_default())
        .prompt()?;
    config.weather.endpoint = Some(endpoint).filter(|e| !e.is_empty());

    config.net.bind = Text::new("Bind address:")
        .with_default(&config.net.bind)
        .prompt()?;

    let current_cert = path_default(&config.net.tls_cert);
    let cert = Text::new("TLS certificate path (empty for plain HTTP):")
        .with_default(&current_cert)
        .prompt()?;
    config.net.tls_cert = Some(cert).filter(|c| !c.is_empty()).map(PathBuf::from);

    if config.net.tls_cert.is_some() {
        let current_key = path_default(&config.net.tls_key);
        let key = Text::new("TLS private key path:")
            .with_default(&current_key)
            .prompt()?;
        config.net.tls_key = Some(key).filter(|k| !k.is_empty()).map(PathBuf::from);
    } else {
        config.net.tls_key = None;
    }

    config.save(&path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn path_default(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "weather-server",
            "--config",
            "/tmp/weather.toml",
            "serve",
            "--bind",
            "127.0.0.1:9000",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/weather.toml")));
        match cli.command {
            Command::Serve { bind } => assert_eq!(bind.as_deref(), Some("127.0.0.1:9000")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["weather-server", "configure", "--config", "w.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Configure));
        assert_eq!(cli.config, Some(PathBuf::from("w.toml")));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["weather-server"]).is_err());
    }
}
