// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Runtime configuration and logging setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine settings. Every field has a default, so a partial YAML file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace file used by the local persistence adapter.
    pub storage_path: PathBuf,
    /// Minimum drag extent, in percent on both axes, that makes an area
    /// instead of a pin.
    pub min_area_pct: f64,
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("visual-feedback-projects.json"),
            min_area_pct: 1.0,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        if !config.min_area_pct.is_finite() || config.min_area_pct < 0.0 {
            anyhow::bail!(
                "min_area_pct must be a non-negative number, got {}",
                config.min_area_pct
            );
        }
        Ok(config)
    }
}

/// Initialize the global logger. `RUST_LOG` overrides the configured filter.
pub fn init_logging(config: &Config) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(config.log_filter.as_str());
    env_logger::Builder::from_env(env)
        .try_init()
        .context("logger already initialized")?;
    Ok(())
}
