// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Two-role resolution policy.
//!
//! The viewer's flag means "I believe this is fixed"; only the
//! commenter's flag closes an annotation for aggregate counts.

use super::annotation::Annotation;
use serde::Serialize;

/// Badge shown next to an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionBadge {
    Unresolved,
    FixedByViewer,
    ResolvedByCommenter,
    Both,
}

impl ResolutionBadge {
    /// Whether the badge counts as closed.
    pub fn is_closed(self) -> bool {
        matches!(self, ResolutionBadge::ResolvedByCommenter | ResolutionBadge::Both)
    }
}

pub fn resolution_badge(annotation: &Annotation) -> ResolutionBadge {
    match (annotation.resolved_by_viewer, annotation.resolved_by_commenter) {
        (false, false) => ResolutionBadge::Unresolved,
        (true, false) => ResolutionBadge::FixedByViewer,
        (false, true) => ResolutionBadge::ResolvedByCommenter,
        (true, true) => ResolutionBadge::Both,
    }
}

/// Aggregate counts over a set of annotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub total: usize,
    /// Confirmed by the commenter.
    pub closed: usize,
    /// Flagged fixed by the viewer, not yet confirmed.
    pub awaiting_confirmation: usize,
    pub awaiting_text: usize,
}

impl ResolutionSummary {
    pub fn of<'a>(annotations: impl IntoIterator<Item = &'a Annotation>) -> Self {
        annotations.into_iter().fold(Self::default(), |mut summary, annotation| {
            summary.total += 1;
            match resolution_badge(annotation) {
                badge if badge.is_closed() => summary.closed += 1,
                ResolutionBadge::FixedByViewer => summary.awaiting_confirmation += 1,
                _ => {}
            }
            if annotation.is_awaiting_text() {
                summary.awaiting_text += 1;
            }
            summary
        })
    }

    pub fn open(&self) -> usize {
        self.total - self.closed
    }
}
