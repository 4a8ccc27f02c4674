// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the core data structures for representing
//! pins and areas placed on a reviewed page, along with the viewport
//! class they belong to and the two resolution flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an annotation (UUID v4, generated client-side).
pub type AnnotationId = String;

/// Type of annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    #[default]
    Pin,
    Area,
}

/// Viewport class an annotation was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceMode {
    pub const ALL: [DeviceMode; 3] = [DeviceMode::Desktop, DeviceMode::Tablet, DeviceMode::Mobile];

    /// Rendered viewport width in pixels.
    pub fn viewport_width(self) -> u32 {
        match self {
            DeviceMode::Desktop => 1440,
            DeviceMode::Tablet => 1024,
            DeviceMode::Mobile => 390,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeviceMode::Desktop => "Desktop (1440px)",
            DeviceMode::Tablet => "Tablet (1024px)",
            DeviceMode::Mobile => "Mobile (390px)",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceMode::Desktop => "desktop",
            DeviceMode::Tablet => "tablet",
            DeviceMode::Mobile => "mobile",
        }
    }
}

/// The two parties that can mark an annotation as resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Requested the change; full read/write access.
    Commenter,
    /// Invited to fix things; read access plus the viewer flag.
    #[default]
    Viewer,
}

impl Role {
    /// Whether this role may create, edit, move or delete annotations.
    pub fn can_edit(self) -> bool {
        matches!(self, Role::Commenter)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Commenter => "commenter",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "commenter" => Some(Role::Commenter),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

/// A positioned annotation on a reviewed page.
///
/// Coordinates are percentages of the rendered page so the same record
/// lands in the same place regardless of the reviewer's window size.
/// Older records carrying a single `isResolved` flag are read through
/// [`StoredAnnotation`]; the legacy flag is never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredAnnotation")]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub x_pct: f64,
    pub y_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_pct: Option<f64>,
    pub text: String,
    pub device_mode: DeviceMode,
    pub created_at: DateTime<Utc>,
    pub resolved_by_viewer: bool,
    pub resolved_by_commenter: bool,
}

impl Annotation {
    /// Create a fresh, undescribed annotation from placement parameters.
    pub fn new(params: &NewAnnotation) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: params.kind,
            x_pct: params.x_pct,
            y_pct: params.y_pct,
            width_pct: params.width_pct,
            height_pct: params.height_pct,
            text: String::new(),
            device_mode: params.device_mode,
            created_at: Utc::now(),
            resolved_by_viewer: false,
            resolved_by_commenter: false,
        }
    }

    /// True until the commenter writes the first comment.
    pub fn is_awaiting_text(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The resolution flag owned by `role`.
    pub fn resolved_by(&self, role: Role) -> bool {
        match role {
            Role::Viewer => self.resolved_by_viewer,
            Role::Commenter => self.resolved_by_commenter,
        }
    }

    pub(crate) fn resolved_flag_mut(&mut self, role: Role) -> &mut bool {
        match role {
            Role::Viewer => &mut self.resolved_by_viewer,
            Role::Commenter => &mut self.resolved_by_commenter,
        }
    }
}

/// Placement parameters for a new annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewAnnotation {
    pub kind: AnnotationKind,
    pub x_pct: f64,
    pub y_pct: f64,
    pub width_pct: Option<f64>,
    pub height_pct: Option<f64>,
    pub device_mode: DeviceMode,
}

impl NewAnnotation {
    pub fn pin(x_pct: f64, y_pct: f64, device_mode: DeviceMode) -> Self {
        Self {
            kind: AnnotationKind::Pin,
            x_pct,
            y_pct,
            width_pct: None,
            height_pct: None,
            device_mode,
        }
    }

    pub fn area(
        x_pct: f64,
        y_pct: f64,
        width_pct: f64,
        height_pct: f64,
        device_mode: DeviceMode,
    ) -> Self {
        Self {
            kind: AnnotationKind::Area,
            x_pct,
            y_pct,
            width_pct: Some(width_pct),
            height_pct: Some(height_pct),
            device_mode,
        }
    }

    /// Validate and clamp the anchor into `[0, 100]`.
    ///
    /// Returns `None` for non-finite coordinates and for areas without
    /// a positive width and height. Width and height are kept as given.
    pub fn sanitized(&self) -> Option<Self> {
        if !self.x_pct.is_finite() || !self.y_pct.is_finite() {
            return None;
        }
        let (width_pct, height_pct) = match self.kind {
            AnnotationKind::Pin => (None, None),
            AnnotationKind::Area => match (self.width_pct, self.height_pct) {
                (Some(w), Some(h)) if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 => {
                    (Some(w), Some(h))
                }
                _ => return None,
            },
        };
        Some(Self {
            x_pct: self.x_pct.clamp(0.0, 100.0),
            y_pct: self.y_pct.clamp(0.0, 100.0),
            width_pct,
            height_pct,
            ..*self
        })
    }
}

/// On-disk and on-wire form of an annotation, accepting legacy records.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAnnotation {
    id: AnnotationId,
    #[serde(rename = "type", default)]
    kind: AnnotationKind,
    x_pct: f64,
    y_pct: f64,
    #[serde(default)]
    width_pct: Option<f64>,
    #[serde(default)]
    height_pct: Option<f64>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    device_mode: DeviceMode,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    is_resolved: Option<bool>,
    #[serde(default)]
    resolved_by_viewer: Option<bool>,
    #[serde(default)]
    resolved_by_commenter: Option<bool>,
}

impl From<StoredAnnotation> for Annotation {
    fn from(stored: StoredAnnotation) -> Self {
        let (resolved_by_viewer, resolved_by_commenter) = resolve_legacy_flags(
            stored.is_resolved,
            stored.resolved_by_viewer,
            stored.resolved_by_commenter,
        );
        Self {
            id: stored.id,
            kind: stored.kind,
            x_pct: stored.x_pct,
            y_pct: stored.y_pct,
            width_pct: stored.width_pct,
            height_pct: stored.height_pct,
            text: stored.text,
            device_mode: stored.device_mode,
            created_at: stored.created_at,
            resolved_by_viewer,
            resolved_by_commenter,
        }
    }
}

/// Map optional legacy and dual-role flags onto `(viewer, commenter)`.
///
/// `is_resolved` only counts when neither dual-role flag is present.
pub(crate) fn resolve_legacy_flags(
    is_resolved: Option<bool>,
    by_viewer: Option<bool>,
    by_commenter: Option<bool>,
) -> (bool, bool) {
    match (by_viewer, by_commenter) {
        (None, None) => (is_resolved.unwrap_or(false), false),
        (viewer, commenter) => (viewer.unwrap_or(false), commenter.unwrap_or(false)),
    }
}
