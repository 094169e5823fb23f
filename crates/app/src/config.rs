use anyhow::Context;
use gstrecon_client::DEFAULT_BASE_URL;
use gstrecon_report::{ExportFormat, ExportOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `config.toml` contents. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub timeout_secs: u64,
    pub output_dir: Option<PathBuf>,
    pub default_format: ExportFormat,
    pub options: ExportOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 120,
            output_dir: None,
            default_format: ExportFormat::Csv,
            options: ExportOptions::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// `<config dir>/config.toml` for this platform.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "gstrecon", "GstRecon")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// An explicit path must exist. The platform default may be absent.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => {
                    tracing::debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::default().backend_url, "http://localhost:8000");
    }

    #[test]
    fn partial_config_with_options_table() {
        let cfg = AppConfig::from_toml(
            r#"
            backend_url = "http://recon.internal:9000"
            default_format = "html"

            [options]
            include_matched = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.backend_url, "http://recon.internal:9000");
        assert_eq!(cfg.default_format, ExportFormat::Html);
        assert!(!cfg.options.include_matched);
        assert!(cfg.options.include_reasons);
        assert_eq!(cfg.timeout_secs, 120);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 5\noutput_dir = \"reports\"\n").unwrap();
        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.output_dir(), PathBuf::from("reports"));
    }
}
