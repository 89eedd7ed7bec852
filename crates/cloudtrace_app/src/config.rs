//! Dashboard configuration.
//!
//! Read from a RON file (`--config PATH`, or `./cloudtrace.ron` when it
//! exists). Every field is optional; command-line flags win over the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cloudtrace_core::{provider_display_name, DEFAULT_NUM_RUNS};
use cloudtrace_engine::{ClientSettings, DEFAULT_SERVER_URL};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::Cli;

pub const CONFIG_FILENAME: &str = "cloudtrace.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub providers: Vec<String>,
    pub num_runs: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: 1000,
            providers: vec!["aws".into(), "azure".into(), "gcp".into()],
            num_runs: DEFAULT_NUM_RUNS,
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            log_file: None,
        }
    }
}

pub struct LoadedConfig {
    pub config: DashboardConfig,
    /// Set when the implicit config file existed but could not be used.
    pub warning: Option<String>,
}

/// Loads the config file. An explicit path must exist and parse; the implicit
/// `./cloudtrace.ron` is optional and falls back to defaults with a warning.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    match explicit {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config = ron::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?;
            Ok(LoadedConfig {
                config,
                warning: None,
            })
        }
        None => Ok(load_optional(Path::new(CONFIG_FILENAME))),
    }
}

fn load_optional(path: &Path) -> LoadedConfig {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return LoadedConfig {
                config: DashboardConfig::default(),
                warning: None,
            };
        }
        Err(err) => {
            return LoadedConfig {
                config: DashboardConfig::default(),
                warning: Some(format!("Failed to read config from {:?}: {}", path, err)),
            };
        }
    };

    match ron::from_str(&text) {
        Ok(config) => LoadedConfig {
            config,
            warning: None,
        },
        Err(err) => LoadedConfig {
            config: DashboardConfig::default(),
            warning: Some(format!("Failed to parse config from {:?}: {}", path, err)),
        },
    }
}

/// Providers and run count to submit once the dashboard is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub providers: Vec<String>,
    pub num_runs: Option<u32>,
}

impl Submission {
    /// Display names of the requested providers; unknown keys are shown as given.
    pub fn provider_names(&self) -> Vec<&str> {
        self.keys()
            .map(|key| provider_display_name(key).unwrap_or(key))
            .collect()
    }

    /// Keys the provider catalog does not know. The server decides whether
    /// to accept them.
    pub fn unknown_providers(&self) -> Vec<&str> {
        self.keys()
            .filter(|key| provider_display_name(key).is_none())
            .collect()
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.providers
            .iter()
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub settings: ClientSettings,
    pub submission: Option<Submission>,
}

impl DashboardConfig {
    /// Applies command-line overrides and builds the engine settings.
    pub fn resolve(mut self, cli: &Cli) -> Result<RunOptions> {
        if let Some(server) = cli.server.as_ref() {
            self.server_url = server.clone();
        }
        if !cli.providers.is_empty() {
            self.providers = cli.providers.clone();
        }

        let base_url = Url::parse(&self.server_url)
            .with_context(|| format!("invalid server url {:?}", self.server_url))?;
        let settings = ClientSettings {
            base_url,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..ClientSettings::default()
        };

        let submission = (!cli.watch).then(|| Submission {
            providers: self.providers.clone(),
            num_runs: cli.runs.or(Some(self.num_runs)),
        });

        Ok(RunOptions {
            settings,
            submission,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("cloudtrace").chain(args.iter().copied()))
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(server_url: "http://bench.internal:8080/", providers: ["gcp"], request_timeout_secs: Some(30))"#
        )
        .unwrap();

        let loaded = load(Some(file.path())).unwrap();
        assert!(loaded.warning.is_none());
        assert_eq!(
            loaded.config,
            DashboardConfig {
                server_url: "http://bench.internal:8080/".into(),
                providers: vec!["gcp".into()],
                request_timeout_secs: Some(30),
                ..DashboardConfig::default()
            }
        );
    }

    #[test]
    fn explicit_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(server_url: 42").unwrap();
        assert!(load(Some(file.path())).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.ron"))).is_err());
    }

    #[test]
    fn implicit_file_falls_back_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_optional(&dir.path().join(CONFIG_FILENAME));
        assert_eq!(missing.config, DashboardConfig::default());
        assert!(missing.warning.is_none());

        let broken = dir.path().join("broken.ron");
        fs::write(&broken, "not ron at all (").unwrap();
        let loaded = load_optional(&broken);
        assert_eq!(loaded.config, DashboardConfig::default());
        assert!(loaded.warning.unwrap().contains("Failed to parse config"));
    }

    #[test]
    fn cli_overrides_file() {
        let options = DashboardConfig::default()
            .resolve(&cli(&["--server", "http://10.0.0.5:5000", "-p", "azure", "--runs", "7"]))
            .unwrap();
        assert_eq!(options.settings.base_url.as_str(), "http://10.0.0.5:5000/");
        assert_eq!(options.settings.poll_interval, Duration::from_millis(1000));
        assert_eq!(options.settings.request_timeout, None);
        assert_eq!(
            options.submission,
            Some(Submission {
                providers: vec!["azure".into()],
                num_runs: Some(7),
            })
        );
    }

    #[test]
    fn watch_mode_never_submits() {
        let options = DashboardConfig::default()
            .resolve(&cli(&["--watch"]))
            .unwrap();
        assert_eq!(options.submission, None);
    }

    #[test]
    fn bad_server_url_is_reported() {
        let err = DashboardConfig::default()
            .resolve(&cli(&["--server", "not a url"]))
            .unwrap_err();
        assert!(err.to_string().contains("invalid server url"));
    }

    #[test]
    fn provider_names_use_catalog() {
        let submission = Submission {
            providers: vec!["AWS".into(), " gcp ".into(), "oracle".into(), "".into()],
            num_runs: None,
        };
        assert_eq!(
            submission.provider_names(),
            vec!["Amazon Web Services", "Google Cloud Platform", "oracle"]
        );
        assert_eq!(submission.unknown_providers(), vec!["oracle"]);
    }
}
