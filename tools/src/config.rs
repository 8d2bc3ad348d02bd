//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "/etc/llm-sfn/config.toml";

/// Root configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct SfnConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// ICMP probe settings for net.ip_latency
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Echo requests per probe
    #[serde(default = "default_ping_count")]
    pub count: u32,
    /// Overall deadline for the whole ping run
    #[serde(default = "default_ping_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_ping_binary")]
    pub ping_binary: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            count: default_ping_count(),
            timeout_secs: default_ping_timeout(),
            ping_binary: default_ping_binary(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToolsConfig {
    /// Upper bound for a single tool call, including resolution and ping
    #[serde(default = "default_tool_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_tool_timeout_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
fn default_ping_count() -> u32 {
    3
}
fn default_ping_timeout() -> u64 {
    3
}
fn default_ping_binary() -> String {
    "ping".into()
}
fn default_tool_timeout_ms() -> u64 {
    30000
}

/// Load configuration from `LLM_SFN_CONFIG` or the default path
pub fn load_config() -> Result<SfnConfig> {
    let config_path =
        std::env::var("LLM_SFN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(Path::new(&config_path))
}

/// Load configuration from a file, falling back to defaults if it is absent
pub fn load_config_from(path: &Path) -> Result<SfnConfig> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: SfnConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    } else {
        tracing::warn!("Config file not found at {}, using defaults", path.display());
        Ok(SfnConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SfnConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.probe.count, 3);
        assert_eq!(config.probe.timeout_secs, 3);
        assert_eq!(config.probe.ping_binary, "ping");
        assert_eq!(config.tools.timeout_ms, 30000);
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_str = r#"
[logging]
level = "debug"
"#;
        let config: SfnConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.probe.count, 3);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[logging]
level = "warn"

[probe]
count = 5
timeout_secs = 10
ping_binary = "/usr/bin/ping"

[tools]
timeout_ms = 15000
"#;
        let config: SfnConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.probe.count, 5);
        assert_eq!(config.probe.timeout_secs, 10);
        assert_eq!(config.probe.ping_binary, "/usr/bin/ping");
        assert_eq!(config.tools.timeout_ms, 15000);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.probe.count, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[probe]\ncount = 7").unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.probe.count, 7);
        assert_eq!(config.probe.timeout_secs, 3);
    }

    #[test]
    fn test_load_invalid_file_fails_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[probe\ncount = ").unwrap();

        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
