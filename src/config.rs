use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_ENV: &str = "KTWINS_CONFIG";
const MIN_REFRESH_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    pub refresh_ms: u64,
    pub command_timeout_ms: u64,
    pub diagnostic_timeout_ms: u64,
    pub request_timeout: String,
    pub max_output_bytes: usize,
    pub kubectl: String,
    pub log_tail_lines: u32,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 2_000,
            command_timeout_ms: 1_200,
            diagnostic_timeout_ms: 1_200,
            request_timeout: "1s".to_string(),
            max_output_bytes: 64 * 1024,
            kubectl: "kubectl".to_string(),
            log_tail_lines: 200,
            log_filter: "info".to_string(),
            log_file: None,
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(MIN_REFRESH_MS))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn diagnostic_timeout(&self) -> Duration {
        Duration::from_millis(self.diagnostic_timeout_ms)
    }

    pub fn kubectl_base_args(&self) -> Vec<String> {
        let request_timeout = self.request_timeout.trim();
        if request_timeout.is_empty() {
            Vec::new()
        } else {
            vec![format!("--request-timeout={request_timeout}")]
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub source: Option<PathBuf>,
    pub config: DashboardConfig,
}

/// Reads the first config file found, or defaults when there is none.
pub fn load() -> Result<LoadedConfig> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let explicit = std::env::var(CONFIG_ENV).ok();
    let Some(path) = discover_config_path(explicit.as_deref(), Path::new("."), home.as_deref())
    else {
        return Ok(LoadedConfig {
            source: None,
            config: DashboardConfig::default(),
        });
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config =
        parse(&raw).with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(LoadedConfig {
        source: Some(path),
        config,
    })
}

pub fn parse(raw: &str) -> Result<DashboardConfig> {
    if raw.trim().is_empty() {
        return Ok(DashboardConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn discover_config_path(explicit: Option<&str>, cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        cwd.join("ktwins.yaml"),
        cwd.join("ktwins.yml"),
        cwd.join(".ktwins.yaml"),
    ];
    if let Some(candidate) = cwd_candidates.into_iter().find(|path| path.exists()) {
        return Some(candidate);
    }

    let home = home?;
    [
        home.join(".config/ktwins/config.yaml"),
        home.join(".ktwins.yaml"),
    ]
    .into_iter()
    .find(|path| path.exists())
}
