//! Configuration management for the vehicle risk pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub bundle: BundleConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub request_subject: String,
    /// Subject for outgoing risk assessments
    pub assessment_subject: String,
}

/// Model bundle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BundleConfig {
    /// Directory containing bundle.json and the ONNX artifacts
    pub bundle_dir: String,
    /// Number of threads for ONNX inference per classifier (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

fn default_report_interval_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Cosmetic assets configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Startup banner; absence is informational only
    #[serde(default = "default_banner_path")]
    pub banner_path: String,
}

fn default_banner_path() -> String {
    "assets/banner.txt".to_string()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            banner_path: default_banner_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "risk.requests".to_string(),
                assessment_subject: "risk.assessments".to_string(),
            },
            bundle: BundleConfig {
                bundle_dir: "bundle".to_string(),
                onnx_threads: 1,
            },
            pipeline: PipelineConfig {
                workers: 4,
                report_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            assets: AssetsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.request_subject, "risk.requests");
        assert_eq!(config.bundle.bundle_dir, "bundle");
        assert_eq!(config.bundle.onnx_threads, 1);
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.assets.banner_path, "assets/banner.txt");
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[nats]
url = "nats://risk-bus:4222"
request_subject = "risk.requests"
assessment_subject = "risk.assessments"

[bundle]
bundle_dir = "/srv/bundle"

[pipeline]
workers = 2

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.nats.url, "nats://risk-bus:4222");
        assert_eq!(config.bundle.bundle_dir, "/srv/bundle");
        assert_eq!(config.bundle.onnx_threads, 1);
        assert_eq!(config.pipeline.workers, 2);
        assert_eq!(config.pipeline.report_interval_secs, 30);
        assert_eq!(config.assets.banner_path, "assets/banner.txt");
    }
}
