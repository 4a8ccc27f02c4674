// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! pinsync - annotation state and synchronization engine
//!
//! Keeps projects (reviewed page URLs) and their pin/area annotations in
//! device-independent percentage coordinates, applies edits optimistically,
//! and reconciles them with a possibly multi-writer backend so that the
//! commenter and an invited viewer can each resolve annotations
//! independently.

pub mod config;
pub mod io;
pub mod models;
pub mod persistence;
pub mod store;
pub mod util;

pub use config::{init_logging, Config};
pub use models::annotation::{
    Annotation, AnnotationId, AnnotationKind, DeviceMode, NewAnnotation, Role,
};
pub use models::project::{Project, ProjectId};
pub use models::resolution::{resolution_badge, ResolutionBadge, ResolutionSummary};
pub use persistence::{ChangeEvent, PersistenceAdapter, Subscription};
pub use store::AnnotationStore;
