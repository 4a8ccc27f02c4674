// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Row shapes exchanged with a remote backend.
//!
//! Rows use snake_case column names. Conversion to and from the
//! in-memory records is total: missing resolution columns read as
//! `false`, and the legacy `is_resolved` column is read but never
//! written.

use crate::models::annotation::{resolve_legacy_flags, Annotation, AnnotationKind, DeviceMode, Role};
use crate::models::project::{Project, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the projects table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of the comments table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: String,
    pub project_id: ProjectId,
    #[serde(rename = "type", default)]
    pub kind: AnnotationKind,
    pub x_pct: f64,
    pub y_pct: f64,
    #[serde(default)]
    pub width_pct: Option<f64>,
    #[serde(default)]
    pub height_pct: Option<f64>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub device_mode: DeviceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_resolved: Option<bool>,
    #[serde(default)]
    pub resolved_by_viewer: Option<bool>,
    #[serde(default)]
    pub resolved_by_commenter: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// Partial update of the mutable columns of a comment row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by_viewer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by_commenter: Option<bool>,
}

impl AnnotationPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn position(x_pct: f64, y_pct: f64) -> Self {
        Self {
            x_pct: Some(x_pct),
            y_pct: Some(y_pct),
            ..Self::default()
        }
    }

    /// Patch touching only the flag owned by `role`, so a concurrent
    /// change to the other role's flag is never overwritten.
    pub fn resolved(role: Role, value: bool) -> Self {
        match role {
            Role::Viewer => Self {
                resolved_by_viewer: Some(value),
                ..Self::default()
            },
            Role::Commenter => Self {
                resolved_by_commenter: Some(value),
                ..Self::default()
            },
        }
    }

    /// Apply the patch onto an in-memory record.
    pub fn apply_to_annotation(&self, annotation: &mut Annotation) {
        if let Some(text) = &self.text {
            annotation.text = text.clone();
        }
        if let Some(x) = self.x_pct {
            annotation.x_pct = x;
        }
        if let Some(y) = self.y_pct {
            annotation.y_pct = y;
        }
        if let Some(viewer) = self.resolved_by_viewer {
            annotation.resolved_by_viewer = viewer;
        }
        if let Some(commenter) = self.resolved_by_commenter {
            annotation.resolved_by_commenter = commenter;
        }
    }

    /// Apply the patch onto a stored row. The legacy column is dropped
    /// once the row has been written in the new shape.
    pub fn apply_to(&self, row: &mut CommentRow) {
        if let Some(text) = &self.text {
            row.text = text.clone();
        }
        if let Some(x) = self.x_pct {
            row.x_pct = x;
        }
        if let Some(y) = self.y_pct {
            row.y_pct = y;
        }
        if self.resolved_by_viewer.is_some() || self.resolved_by_commenter.is_some() {
            let (viewer, commenter) = resolve_legacy_flags(
                row.is_resolved,
                row.resolved_by_viewer,
                row.resolved_by_commenter,
            );
            row.resolved_by_viewer = Some(self.resolved_by_viewer.unwrap_or(viewer));
            row.resolved_by_commenter = Some(self.resolved_by_commenter.unwrap_or(commenter));
            row.is_resolved = None;
        }
    }
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            url: project.url.clone(),
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

impl ProjectRow {
    /// Build an in-memory project from this row and its comment rows.
    ///
    /// Comments belonging to other projects are ignored; the rest are
    /// ordered by creation time.
    pub fn into_project(self, comments: &[CommentRow]) -> Project {
        let mut annotations: Vec<Annotation> = comments
            .iter()
            .filter(|row| row.project_id == self.id)
            .map(Annotation::from)
            .collect();
        annotations.sort_by_key(|a| a.created_at);

        Project {
            id: self.id,
            url: self.url,
            comments: annotations,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl CommentRow {
    pub fn from_annotation(project_id: &str, annotation: &Annotation) -> Self {
        Self {
            id: annotation.id.clone(),
            project_id: project_id.to_string(),
            kind: annotation.kind,
            x_pct: annotation.x_pct,
            y_pct: annotation.y_pct,
            width_pct: annotation.width_pct,
            height_pct: annotation.height_pct,
            text: annotation.text.clone(),
            device_mode: annotation.device_mode,
            is_resolved: None,
            resolved_by_viewer: Some(annotation.resolved_by_viewer),
            resolved_by_commenter: Some(annotation.resolved_by_commenter),
            created_at: annotation.created_at,
        }
    }
}

impl From<&CommentRow> for Annotation {
    fn from(row: &CommentRow) -> Self {
        let (resolved_by_viewer, resolved_by_commenter) = resolve_legacy_flags(
            row.is_resolved,
            row.resolved_by_viewer,
            row.resolved_by_commenter,
        );
        Self {
            id: row.id.clone(),
            kind: row.kind,
            x_pct: row.x_pct,
            y_pct: row.y_pct,
            width_pct: row.width_pct,
            height_pct: row.height_pct,
            text: row.text.clone(),
            device_mode: row.device_mode,
            created_at: row.created_at,
            resolved_by_viewer,
            resolved_by_commenter,
        }
    }
}
