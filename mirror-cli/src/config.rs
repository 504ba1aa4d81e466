use anyhow::{Context, Result};
use mirror::SignatureAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of a `mirror.toml` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Source directories, in priority order for error reporting
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default = "default_target")]
    pub target: PathBuf,
    #[serde(default)]
    pub algorithm: SignatureAlgorithm,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            sources: vec![PathBuf::from("./source")],
            target: default_target(),
            algorithm: SignatureAlgorithm::default(),
            dry_run: false,
            log_level: default_log_level(),
        }
    }
}

impl MirrorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config: MirrorConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            anyhow::bail!("At least one source directory must be configured");
        }
        if self.sources.iter().any(|source| source.as_os_str().is_empty()) {
            anyhow::bail!("Source directory cannot be empty");
        }
        if self.target.as_os_str().is_empty() {
            anyhow::bail!("Target directory cannot be empty");
        }
        if let Some(source) = self.sources.iter().find(|source| **source == self.target) {
            anyhow::bail!("Source directory is also the target: {}", source.display());
        }
        if !matches!(
            self.log_level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            anyhow::bail!("Unknown log level: {}", self.log_level);
        }

        Ok(())
    }
}

// Default value functions
fn default_target() -> PathBuf { PathBuf::from("./target") }
fn default_log_level() -> String { "info".to_string() }
