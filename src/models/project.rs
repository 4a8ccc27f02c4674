// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state management.
//!
//! A project is one reviewed page URL together with every annotation
//! placed on it, across all device modes.

use super::annotation::{Annotation, DeviceMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a project (UUID v4, generated client-side).
pub type ProjectId = String;

/// A reviewed page and its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub url: String,
    #[serde(default)]
    pub comments: Vec<Annotation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project for the given URL with no annotations.
    pub fn new(url: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub(crate) fn annotation_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.comments.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.comments.iter().any(|c| c.id == id)
    }

    /// Annotations visible while viewing in `mode`, in creation order.
    pub fn annotations_for(&self, mode: DeviceMode) -> impl Iterator<Item = &Annotation> {
        self.comments.iter().filter(move |c| c.device_mode == mode)
    }

    /// Remove an annotation by id, returning it if present.
    pub(crate) fn remove_annotation(&mut self, id: &str) -> Option<Annotation> {
        let idx = self.comments.iter().position(|c| c.id == id)?;
        Some(self.comments.remove(idx))
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Normalize user input into a reviewable page URL.
///
/// Trims whitespace and assumes `https://` when no scheme is given.
/// Returns `None` unless the result parses as an http or https URL.
pub fn normalize_review_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = url::Url::parse(&candidate).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Some(candidate),
        _ => None,
    }
}
