use serde::Deserialize;
use std::fs;
use std::path::Path;

use topofix_core::patcher::DEFAULT_BACKUP_MARKER;

/// Optional TOML configuration for the patch subcommand. Every field has a
/// default so a partial (or absent) file is fine; CLI flags override
/// whatever the file says.
///
/// ```toml
/// [backup]
/// enabled = true
/// marker = "original"
///
/// [output]
/// pretty = false
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Whether to keep a one-time backup of the pristine file.
    #[serde(default = "default_backup_enabled")]
    pub enabled: bool,
    /// Marker inserted before the extension in the backup filename.
    #[serde(default = "default_backup_marker")]
    pub marker: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: default_backup_enabled(),
            marker: default_backup_marker(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    /// Pretty-print the rewritten JSON instead of compacting it.
    #[serde(default)]
    pub pretty: bool,
}

fn default_backup_enabled() -> bool {
    true
}

fn default_backup_marker() -> String {
    DEFAULT_BACKUP_MARKER.to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
