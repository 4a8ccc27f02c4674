// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Share links.
//!
//! A share link either points at a stored project together with the
//! role of whoever opens it, or (legacy form) embeds a self-contained
//! snapshot of one project: base64 of the URL-encoded JSON payload.
//! Malformed links resolve to nothing rather than an error.

use crate::models::annotation::{Annotation, Role};
use crate::models::project::{Project, ProjectId};
use crate::models::resolution::ResolutionSummary;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

const SNAPSHOT_SEGMENT: &str = "shared";
const SNAPSHOT_PARAM: &str = "shared";
const ROLE_PARAM: &str = "role";

/// Reference to a stored project plus the role granted by the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub project_id: ProjectId,
    pub role: Role,
}

impl ShareLink {
    pub fn new(project_id: impl Into<ProjectId>, role: Role) -> Self {
        Self {
            project_id: project_id.into(),
            role,
        }
    }

    /// Path-and-query form, e.g. `/review/<id>?role=viewer`.
    pub fn to_path(&self) -> String {
        format!(
            "/review/{}?{}={}",
            urlencoding::encode(&self.project_id),
            ROLE_PARAM,
            self.role.as_str()
        )
    }
}

/// What a share link resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum ShareTarget {
    Project(ShareLink),
    Snapshot(SharedReview),
}

/// Payload carried by a legacy snapshot link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub url: String,
    #[serde(default)]
    pub comments: Vec<Annotation>,
}

/// A decoded snapshot. Immutable apart from a local-only viewer toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedReview {
    payload: SnapshotPayload,
}

impl SharedReview {
    pub fn url(&self) -> &str {
        &self.payload.url
    }

    pub fn comments(&self) -> &[Annotation] {
        &self.payload.comments
    }

    pub fn summary(&self) -> ResolutionSummary {
        ResolutionSummary::of(&self.payload.comments)
    }

    /// Flip the viewer flag on one annotation. Never persisted.
    pub fn toggle_viewer_resolved(&mut self, annotation_id: &str) -> Option<bool> {
        let annotation = self.payload.comments.iter_mut().find(|c| c.id == annotation_id)?;
        annotation.resolved_by_viewer = !annotation.resolved_by_viewer;
        Some(annotation.resolved_by_viewer)
    }
}

/// Encode a project as a snapshot payload string.
pub fn encode_snapshot(project: &Project) -> Result<String> {
    let payload = SnapshotPayload {
        url: project.url.clone(),
        comments: project.comments.clone(),
    };
    let json = serde_json::to_string(&payload)?;
    Ok(STANDARD.encode(urlencoding::encode(&json).as_bytes()))
}

/// Path-and-query form of a snapshot link for `project`.
pub fn snapshot_link(project: &Project) -> Result<String> {
    let encoded = encode_snapshot(project)?;
    Ok(format!(
        "/review/{}?{}={}",
        SNAPSHOT_SEGMENT,
        SNAPSHOT_PARAM,
        urlencoding::encode(&encoded)
    ))
}

fn decode_payload(encoded: &str) -> Result<SnapshotPayload> {
    // Unescaped '+' in a query string arrives as a space.
    let encoded = encoded.trim().replace(' ', "+");
    let bytes = STANDARD.decode(encoded.as_bytes()).context("payload is not base64")?;
    let escaped = String::from_utf8(bytes).context("payload is not UTF-8")?;
    let json = urlencoding::decode(&escaped).context("payload is not URL-encoded")?;
    let payload = serde_json::from_str(&json).context("payload is not a project snapshot")?;
    Ok(payload)
}

/// Decode a snapshot payload string. Malformed input yields `None`.
pub fn decode_snapshot(encoded: &str) -> Option<SharedReview> {
    match decode_payload(encoded) {
        Ok(payload) => Some(SharedReview { payload }),
        Err(e) => {
            log::warn!("Ignoring malformed shared snapshot: {:#}", e);
            None
        }
    }
}

/// Resolve an absolute or path-only share link.
///
/// A project link without a `role` parameter opens as a viewer.
pub fn resolve_share_link(link: &str) -> Option<ShareTarget> {
    let base = url::Url::parse("http://localhost/").ok()?;
    let parsed = match base.join(link.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Ignoring unparsable share link {:?}: {}", link, e);
            return None;
        }
    };

    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    let id = match segments.as_slice() {
        ["review", id] => *id,
        _ => {
            log::warn!("Share link does not point at a review: {}", link);
            return None;
        }
    };
    let param = |name: &str| {
        parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if id == SNAPSHOT_SEGMENT {
        if let Some(encoded) = param(SNAPSHOT_PARAM) {
            return decode_snapshot(&encoded).map(ShareTarget::Snapshot);
        }
    }

    let role = match param(ROLE_PARAM) {
        None => Role::Viewer,
        Some(value) => Role::parse(&value)?,
    };
    let project_id = urlencoding::decode(id).ok()?.into_owned();
    Some(ShareTarget::Project(ShareLink { project_id, role }))
}
