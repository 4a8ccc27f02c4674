// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project data serialization and deserialization.
//!
//! This module handles exporting and importing single projects in YAML
//! and JSON formats, and reading/writing the whole workspace file used
//! by the local persistence adapter.

use crate::models::project::Project;
use anyhow::{Context, Result};
use std::path::Path;

/// Export a project to YAML format.
pub fn export_yaml(project: &Project, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(project)?;
    std::fs::write(path, yaml).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Export a project to JSON format.
pub fn export_json(project: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Import a project from YAML format.
pub fn import_yaml(path: &Path) -> Result<Project> {
    let yaml = std::fs::read_to_string(path)?;
    let project = serde_yaml::from_str(&yaml)?;
    Ok(project)
}

/// Import a project from JSON format.
pub fn import_json(path: &Path) -> Result<Project> {
    let json = std::fs::read_to_string(path)?;
    let project = serde_json::from_str(&json)?;
    Ok(project)
}

/// Import a project choosing the format from the file extension.
pub fn import_project(path: &Path) -> Result<Project> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        other => anyhow::bail!("Unsupported file extension: {:?}", other),
    }
}

/// Export a project choosing the format from the file extension.
pub fn export_project(project: &Project, path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => export_yaml(project, path),
        Some("json") => export_json(project, path),
        other => anyhow::bail!("Unsupported file extension: {:?}", other),
    }
}

/// Load every project from a workspace file. A missing file is an empty workspace.
pub fn load_workspace(path: &Path) -> Result<Vec<Project>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workspace {}", path.display()))?;
    let projects = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse workspace {}", path.display()))?;
    Ok(projects)
}

/// Write every project to a workspace file, replacing it atomically.
pub fn save_workspace(projects: &[Project], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string(projects)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
