// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory canonical state of every project and annotation.
//!
//! All mutations apply locally first and return immediately; the
//! matching backend write is queued to the persistence worker and its
//! outcome is only ever logged. With a multi-writer backend, remote
//! change events are folded back in by [`AnnotationStore::poll_remote`],
//! which tolerates echoes of our own writes and duplicate delivery.
//!
//! Invalid requests (unknown ids, bad geometry, malformed URLs) are
//! silent no-ops so the caller never has to handle an error.

use crate::config::Config;
use crate::io::wire::{AnnotationPatch, CommentRow, ProjectRow};
use crate::models::annotation::{Annotation, AnnotationId, DeviceMode, NewAnnotation, Role};
use crate::models::project::{normalize_review_url, Project, ProjectId};
use crate::models::resolution::ResolutionSummary;
use crate::persistence::local::LocalAdapter;
use crate::persistence::{ChangeEvent, PersistenceAdapter, PersistenceWorker, Subscription};
use crate::util::geometry::{drag_to_placement, PercentPoint};
use anyhow::Result;

/// Canonical state container. Construct once and pass by reference.
///
/// Dropping the store waits for every queued write to be attempted. Call
/// [`close_without_waiting`](Self::close_without_waiting) to skip that wait.
pub struct AnnotationStore {
    /// Most recently created first.
    projects: Vec<Project>,
    initialized: bool,
    min_area_pct: f64,
    persistence: PersistenceWorker,
    subscription: Option<Subscription>,
}

impl AnnotationStore {
    /// Create a store writing through `adapter`. Call [`init`](Self::init) before use.
    pub fn new<A: PersistenceAdapter>(adapter: A) -> Result<Self> {
        Self::with_config(adapter, &Config::default())
    }

    pub fn with_config<A: PersistenceAdapter>(adapter: A, config: &Config) -> Result<Self> {
        Ok(Self {
            projects: Vec::new(),
            initialized: false,
            min_area_pct: config.min_area_pct,
            persistence: PersistenceWorker::spawn(adapter)?,
            subscription: None,
        })
    }

    /// Store backed by the local workspace file named in `config`.
    pub fn open_local(config: &Config) -> Result<Self> {
        Self::with_config(LocalAdapter::new(&config.storage_path), config)
    }

    /// Load persisted projects and open the change feed. Idempotent.
    ///
    /// The feed is opened before loading so nothing written in between is
    /// missed; anything delivered twice is absorbed by reconciliation.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }

        match self.persistence.subscribe() {
            Ok(subscription) => self.subscription = subscription,
            Err(e) => log::error!("Failed to subscribe to changes: {:#}", e),
        }

        match self.persistence.load() {
            Ok(loaded) => {
                for project in loaded {
                    if !self.projects.iter().any(|p| p.id == project.id) {
                        self.projects.push(project);
                    }
                }
            }
            Err(e) => log::error!("Failed to load projects: {:#}", e),
        }

        self.initialized = true;
        log::info!(
            "Store initialized with {} projects ({})",
            self.projects.len(),
            if self.subscription.is_some() { "live" } else { "local only" }
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn annotation(&self, project_id: &str, annotation_id: &str) -> Option<&Annotation> {
        self.project(project_id)?.annotation(annotation_id)
    }

    /// Annotations of a project visible in `mode`, in creation order.
    pub fn annotations_for(&self, project_id: &str, mode: DeviceMode) -> Vec<&Annotation> {
        self.project(project_id)
            .map(|p| p.annotations_for(mode).collect())
            .unwrap_or_default()
    }

    /// Sidebar counts for one device mode.
    pub fn summary(&self, project_id: &str, mode: DeviceMode) -> ResolutionSummary {
        ResolutionSummary::of(self.annotations_for(project_id, mode))
    }

    /// Create a project for `url`, or return the existing one's id.
    pub fn create_project(&mut self, url: &str) -> ProjectId {
        if let Some(existing) = self.projects.iter().find(|p| p.url == url) {
            log::debug!("Project for {} already exists", url);
            return existing.id.clone();
        }

        let project = Project::new(url.to_string());
        let id = project.id.clone();
        self.persistence.create_project(ProjectRow::from(&project));
        self.projects.insert(0, project);
        log::info!("Created project {} for {}", id, url);
        id
    }

    /// Normalize raw user input and create (or find) its project.
    pub fn submit_url(&mut self, raw: &str) -> Option<ProjectId> {
        match normalize_review_url(raw) {
            Some(url) => Some(self.create_project(&url)),
            None => {
                log::debug!("Rejected invalid URL {:?}", raw);
                None
            }
        }
    }

    /// Remove a project and all its annotations.
    pub fn delete_project(&mut self, id: &str) -> bool {
        let Some(idx) = self.projects.iter().position(|p| p.id == id) else {
            return false;
        };
        let project = self.projects.remove(idx);
        self.persistence.delete_project(project.id);
        log::info!("Deleted project {}, total: {}", id, self.projects.len());
        true
    }

    /// Place a new, undescribed annotation.
    pub fn add_annotation(
        &mut self,
        project_id: &str,
        params: NewAnnotation,
    ) -> Option<AnnotationId> {
        let Some(params) = params.sanitized() else {
            log::debug!("Rejected invalid placement {:?}", params);
            return None;
        };
        let Some(project) = self.project_mut(project_id) else {
            log::debug!("Ignoring annotation for unknown project {}", project_id);
            return None;
        };

        let annotation = Annotation::new(&params);
        let id = annotation.id.clone();
        let row = CommentRow::from_annotation(project_id, &annotation);
        project.comments.push(annotation);
        project.touch();
        log::info!("Added annotation {}, total: {}", id, project.comments.len());

        self.persistence.create_annotation(row);
        Some(id)
    }

    /// Place an annotation from a press/release pair in percent coordinates.
    pub fn add_annotation_from_drag(
        &mut self,
        project_id: &str,
        start: PercentPoint,
        release: PercentPoint,
        mode: DeviceMode,
    ) -> Option<AnnotationId> {
        let params = drag_to_placement(start, release, self.min_area_pct, mode);
        self.add_annotation(project_id, params)
    }

    /// Apply `edit` to one annotation locally, then queue `patch`.
    fn edit_annotation<F>(
        &mut self,
        project_id: &str,
        annotation_id: &str,
        edit: F,
    ) -> Option<AnnotationPatch>
    where
        F: FnOnce(&mut Annotation) -> Option<AnnotationPatch>,
    {
        let project = self.project_mut(project_id)?;
        let annotation = project.annotation_mut(annotation_id)?;
        let patch = edit(annotation)?;
        project.touch();
        self.persistence.update_annotation(annotation_id.to_string(), patch.clone());
        Some(patch)
    }

    pub fn update_text(&mut self, project_id: &str, annotation_id: &str, text: &str) -> bool {
        self.edit_annotation(project_id, annotation_id, |annotation| {
            annotation.text = text.to_string();
            Some(AnnotationPatch::text(text))
        })
        .is_some()
    }

    /// Move an annotation's anchor, clamped into `[0, 100]`.
    pub fn move_annotation(
        &mut self,
        project_id: &str,
        annotation_id: &str,
        x_pct: f64,
        y_pct: f64,
    ) -> bool {
        if !x_pct.is_finite() || !y_pct.is_finite() {
            return false;
        }
        let (x_pct, y_pct) = (x_pct.clamp(0.0, 100.0), y_pct.clamp(0.0, 100.0));
        self.edit_annotation(project_id, annotation_id, |annotation| {
            annotation.x_pct = x_pct;
            annotation.y_pct = y_pct;
            Some(AnnotationPatch::position(x_pct, y_pct))
        })
        .is_some()
    }

    /// Flip the flag owned by `role`, reading the value currently held
    /// by the store. Returns the new value.
    pub fn toggle_resolved(
        &mut self,
        project_id: &str,
        annotation_id: &str,
        role: Role,
    ) -> Option<bool> {
        let mut new_value = None;
        self.edit_annotation(project_id, annotation_id, |annotation| {
            let flag = annotation.resolved_flag_mut(role);
            *flag = !*flag;
            new_value = Some(*flag);
            Some(AnnotationPatch::resolved(role, *flag))
        })?;
        log::info!("{} marked {} resolved={:?}", role.as_str(), annotation_id, new_value);
        new_value
    }

    pub fn toggle_resolved_by_viewer(
        &mut self,
        project_id: &str,
        annotation_id: &str,
    ) -> Option<bool> {
        self.toggle_resolved(project_id, annotation_id, Role::Viewer)
    }

    pub fn toggle_resolved_by_commenter(
        &mut self,
        project_id: &str,
        annotation_id: &str,
    ) -> Option<bool> {
        self.toggle_resolved(project_id, annotation_id, Role::Commenter)
    }

    /// Set the flag owned by `role`. No write is queued if it already
    /// has that value. Returns whether the annotation exists.
    pub fn set_resolved(
        &mut self,
        project_id: &str,
        annotation_id: &str,
        role: Role,
        value: bool,
    ) -> bool {
        let current = match self.annotation(project_id, annotation_id) {
            Some(annotation) => annotation.resolved_by(role),
            None => return false,
        };
        if current == value {
            return true;
        }
        self.toggle_resolved(project_id, annotation_id, role).is_some()
    }

    pub fn delete_annotation(&mut self, project_id: &str, annotation_id: &str) -> bool {
        let Some(project) = self.project_mut(project_id) else {
            return false;
        };
        if project.remove_annotation(annotation_id).is_none() {
            return false;
        }
        project.touch();
        log::info!("Deleted annotation {}, total: {}", annotation_id, project.comments.len());
        self.persistence.delete_annotation(annotation_id.to_string());
        true
    }

    /// Fold one backend change into local state. Returns whether anything changed.
    ///
    /// Events are applied in delivery order; a stale event may leave a
    /// stale record until the next event for it arrives.
    pub fn reconcile_remote_event(&mut self, event: ChangeEvent) -> bool {
        match event {
            ChangeEvent::Inserted(row) => {
                let Some(project) = self.project_mut(&row.project_id) else {
                    log::debug!("Insert {} for unknown project {}", row.id, row.project_id);
                    return false;
                };
                if project.contains(&row.id) {
                    return false;
                }
                project.comments.push(Annotation::from(&row));
                log::debug!("Remote insert {}", row.id);
                true
            }
            ChangeEvent::Updated(row) => {
                let record = Annotation::from(&row);
                let slot = self
                    .projects
                    .iter_mut()
                    .find_map(|p| p.annotation_mut(&row.id));
                match slot {
                    Some(existing) if *existing == record => false,
                    Some(existing) => {
                        *existing = record;
                        log::debug!("Remote update {}", row.id);
                        true
                    }
                    None => {
                        log::debug!("Update for unknown annotation {}", row.id);
                        false
                    }
                }
            }
            ChangeEvent::Deleted(id) => {
                let removed = self
                    .projects
                    .iter_mut()
                    .any(|p| p.remove_annotation(&id).is_some());
                if removed {
                    log::debug!("Remote delete {}", id);
                }
                removed
            }
        }
    }

    /// Drain and apply every pending remote event. Returns how many changed state.
    pub fn poll_remote(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.subscription.as_mut().and_then(Subscription::try_next) {
            if self.reconcile_remote_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every write queued so far has been attempted.
    pub fn flush(&self) {
        self.persistence.flush();
    }

    /// Drop the store without joining the persistence thread. Queued
    /// writes still run, but a stalled backend cannot block the caller.
    pub fn close_without_waiting(self) {
        log::info!("Closing store with {} projects", self.projects.len());
        self.persistence.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::AnnotationKind;
    use crate::persistence::remote::RemoteHub;

    fn local_store(dir: &tempfile::TempDir) -> AnnotationStore {
        let _ = env_logger::builder().is_test(true).try_init();
        let adapter = LocalAdapter::new(dir.path().join("projects.json"));
        let mut store = AnnotationStore::new(adapter).unwrap();
        store.init();
        store
    }

    fn remote_store(hub: &RemoteHub) -> AnnotationStore {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut store = AnnotationStore::new(hub.connect()).unwrap();
        store.init();
        store
    }

    fn pin(x: f64, y: f64) -> NewAnnotation {
        NewAnnotation::pin(x, y, DeviceMode::Desktop)
    }

    #[test]
    fn test_create_project_dedupes_by_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);

        let first = store.create_project("https://example.com");
        let second = store.create_project("https://example.com");
        assert_eq!(first, second);
        assert_eq!(store.projects().len(), 1);
    }

    #[test]
    fn test_projects_are_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);

        let a = store.create_project("https://a.example");
        let b = store.create_project("https://b.example");
        let ids: Vec<&str> = store.projects().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![b.as_str(), a.as_str()]);
    }

    #[test]
    fn test_submit_url_validates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);

        assert!(store.submit_url("not a url at all").is_none());
        let id = store.submit_url("example.com").unwrap();
        assert_eq!(store.project(&id).unwrap().url, "https://example.com");
        assert_eq!(store.submit_url(" https://example.com "), Some(id));
    }

    #[test]
    fn test_add_annotation_to_unknown_project_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        store.create_project("https://example.com");
        let before = store.projects().to_vec();

        assert!(store.add_annotation("missing", pin(10.0, 10.0)).is_none());
        assert_eq!(store.projects(), before.as_slice());
    }

    #[test]
    fn test_pin_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);

        let project_id = store.create_project("https://example.com");
        let id = store.add_annotation(&project_id, pin(50.0, 10.0)).unwrap();
        assert!(store.update_text(&project_id, &id, "fix spacing"));

        let project = store.project(&project_id).unwrap();
        assert_eq!(project.comments.len(), 1);
        let annotation = &project.comments[0];
        assert_eq!(annotation.text, "fix spacing");
        assert_eq!((annotation.x_pct, annotation.y_pct), (50.0, 10.0));
        assert!(!annotation.resolved_by_viewer);
        assert!(!annotation.resolved_by_commenter);
    }

    #[test]
    fn test_add_annotation_keeps_creation_order_and_touches_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");
        let created = store.project(&project_id).unwrap().updated_at;

        let a = store.add_annotation(&project_id, pin(1.0, 1.0)).unwrap();
        let b = store
            .add_annotation(
                &project_id,
                NewAnnotation::area(5.0, 5.0, 10.0, 10.0, DeviceMode::Mobile),
            )
            .unwrap();

        let project = store.project(&project_id).unwrap();
        let ids: Vec<&str> = project.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str()]);
        assert_eq!(project.comments[1].kind, AnnotationKind::Area);
        assert!(project.updated_at >= created);
    }

    #[test]
    fn test_invalid_area_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");

        let degenerate = NewAnnotation::area(5.0, 5.0, 0.0, 10.0, DeviceMode::Desktop);
        assert!(store.add_annotation(&project_id, degenerate).is_none());
        assert!(store.project(&project_id).unwrap().comments.is_empty());
    }

    #[test]
    fn test_device_modes_are_partitioned() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");

        store.add_annotation(&project_id, pin(1.0, 1.0)).unwrap();
        store
            .add_annotation(&project_id, NewAnnotation::pin(2.0, 2.0, DeviceMode::Mobile))
            .unwrap();

        assert_eq!(store.annotations_for(&project_id, DeviceMode::Desktop).len(), 1);
        assert_eq!(store.annotations_for(&project_id, DeviceMode::Mobile).len(), 1);
        assert!(store.annotations_for(&project_id, DeviceMode::Tablet).is_empty());
        assert!(store.annotations_for("missing", DeviceMode::Desktop).is_empty());
    }

    #[test]
    fn test_drag_creates_area_or_pin() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");

        let start = PercentPoint { x_pct: 10.0, y_pct: 10.0 };
        let far = PercentPoint { x_pct: 30.0, y_pct: 25.0 };
        let near = PercentPoint { x_pct: 10.5, y_pct: 10.5 };
        let area = store
            .add_annotation_from_drag(&project_id, start, far, DeviceMode::Desktop)
            .unwrap();
        let click = store
            .add_annotation_from_drag(&project_id, start, near, DeviceMode::Desktop)
            .unwrap();

        assert_eq!(store.annotation(&project_id, &area).unwrap().kind, AnnotationKind::Area);
        assert_eq!(store.annotation(&project_id, &click).unwrap().kind, AnnotationKind::Pin);
    }

    #[test]
    fn test_move_clamps_and_ignores_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");
        let id = store.add_annotation(&project_id, pin(10.0, 10.0)).unwrap();

        assert!(store.move_annotation(&project_id, &id, 120.0, 42.0));
        let annotation = store.annotation(&project_id, &id).unwrap();
        assert_eq!((annotation.x_pct, annotation.y_pct), (100.0, 42.0));

        let before = store.projects().to_vec();
        assert!(!store.move_annotation(&project_id, "missing", 1.0, 1.0));
        assert!(!store.move_annotation("missing", &id, 1.0, 1.0));
        assert_eq!(store.projects(), before.as_slice());
    }

    #[test]
    fn test_toggle_twice_restores_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");
        let id = store.add_annotation(&project_id, pin(10.0, 10.0)).unwrap();

        assert_eq!(store.toggle_resolved_by_commenter(&project_id, &id), Some(true));
        assert_eq!(store.toggle_resolved_by_commenter(&project_id, &id), Some(false));
        assert!(!store.annotation(&project_id, &id).unwrap().resolved_by_commenter);
        assert_eq!(store.toggle_resolved_by_viewer(&project_id, "missing"), None);
    }

    #[test]
    fn test_roles_only_touch_their_own_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");
        let id = store.add_annotation(&project_id, pin(10.0, 10.0)).unwrap();

        assert!(store.set_resolved(&project_id, &id, Role::Viewer, true));
        assert!(store.set_resolved(&project_id, &id, Role::Viewer, true));
        let annotation = store.annotation(&project_id, &id).unwrap();
        assert!(annotation.resolved_by_viewer);
        assert!(!annotation.resolved_by_commenter);

        let summary = store.summary(&project_id, DeviceMode::Desktop);
        assert_eq!(summary.closed, 0);
        assert_eq!(summary.awaiting_confirmation, 1);
        assert!(!store.set_resolved(&project_id, "missing", Role::Commenter, true));
    }

    #[test]
    fn test_delete_annotation_and_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");
        let id = store.add_annotation(&project_id, pin(10.0, 10.0)).unwrap();

        assert!(store.delete_annotation(&project_id, &id));
        assert!(!store.delete_annotation(&project_id, &id));
        assert!(store.delete_project(&project_id));
        assert!(!store.delete_project(&project_id));
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_local_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (project_id, id) = {
            let mut store = local_store(&dir);
            let project_id = store.create_project("https://example.com");
            let id = store.add_annotation(&project_id, pin(50.0, 10.0)).unwrap();
            store.update_text(&project_id, &id, "fix spacing");
            store.toggle_resolved_by_viewer(&project_id, &id);
            (project_id, id)
        };

        let store = local_store(&dir);
        let annotation = store.annotation(&project_id, &id).unwrap();
        assert_eq!(annotation.text, "fix spacing");
        assert!(annotation.resolved_by_viewer);
    }

    #[test]
    fn test_open_local_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_path: dir.path().join("reviews.json"),
            min_area_pct: 20.0,
            ..Config::default()
        };

        let mut store = AnnotationStore::open_local(&config).unwrap();
        store.init();
        let project_id = store.create_project("https://example.com");
        // Below the configured threshold, so this is a pin.
        let start = PercentPoint { x_pct: 10.0, y_pct: 10.0 };
        let release = PercentPoint { x_pct: 25.0, y_pct: 25.0 };
        let id = store
            .add_annotation_from_drag(&project_id, start, release, DeviceMode::Desktop)
            .unwrap();
        assert_eq!(store.annotation(&project_id, &id).unwrap().kind, AnnotationKind::Pin);
        store.flush();

        assert!(config.storage_path.exists());
        let reopened = {
            let mut store = AnnotationStore::open_local(&config).unwrap();
            store.init();
            store
        };
        assert!(reopened.annotation(&project_id, &id).is_some());
    }

    #[test]
    fn test_write_before_init_keeps_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_path: dir.path().join("projects.json"),
            ..Config::default()
        };
        {
            let mut store = local_store(&dir);
            store.create_project("https://a.example");
        }
        {
            let mut store = AnnotationStore::open_local(&config).unwrap();
            assert!(!store.is_initialized());
            store.create_project("https://b.example");
        }

        let store = local_store(&dir);
        let urls: Vec<&str> = store.projects().iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b.example", "https://a.example"]);
    }

    #[test]
    fn test_close_without_waiting_keeps_queued_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        let project_id = store.create_project("https://example.com");
        store.flush();
        store.close_without_waiting();

        let store = local_store(&dir);
        assert!(store.project(&project_id).is_some());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = local_store(&dir);
        store.create_project("https://example.com");
        store.flush();

        store.init();
        assert!(store.is_initialized());
        assert_eq!(store.projects().len(), 1);
    }

    #[test]
    fn test_echo_of_own_insert_is_not_duplicated() {
        let hub = RemoteHub::new();
        let mut store = remote_store(&hub);
        let project_id = store.create_project("https://example.com");
        let id = store.add_annotation(&project_id, pin(10.0, 10.0)).unwrap();
        store.flush();

        store.poll_remote();
        let own = store.annotation(&project_id, &id).unwrap();
        let echo = CommentRow::from_annotation(&project_id, own);
        assert!(!store.reconcile_remote_event(ChangeEvent::Inserted(echo)));
        assert_eq!(store.project(&project_id).unwrap().comments.len(), 1);
    }

    #[test]
    fn test_remote_update_keeps_both_flags() {
        let hub = RemoteHub::new();
        let mut store = remote_store(&hub);
        let project_id = store.create_project("https://example.com");
        let id = store.add_annotation(&project_id, pin(10.0, 10.0)).unwrap();
        store.set_resolved(&project_id, &id, Role::Viewer, true);

        let current = store.annotation(&project_id, &id).unwrap();
        let mut row = CommentRow::from_annotation(&project_id, current);
        row.resolved_by_commenter = Some(true);
        assert!(store.reconcile_remote_event(ChangeEvent::Updated(row)));

        let annotation = store.annotation(&project_id, &id).unwrap();
        assert!(annotation.resolved_by_viewer);
        assert!(annotation.resolved_by_commenter);
    }

    #[test]
    fn test_remote_delete_scans_all_projects() {
        let hub = RemoteHub::new();
        let mut store = remote_store(&hub);
        let p1 = store.create_project("https://one.example");
        let p2 = store.create_project("https://two.example");
        let p3 = store.create_project("https://three.example");
        let keep = store.add_annotation(&p1, pin(1.0, 1.0)).unwrap();
        let target = store.add_annotation(&p2, pin(2.0, 2.0)).unwrap();
        store.add_annotation(&p3, pin(3.0, 3.0)).unwrap();

        assert!(store.reconcile_remote_event(ChangeEvent::Deleted(target.clone())));
        assert!(store.project(&p2).unwrap().comments.is_empty());
        assert!(store.annotation(&p1, &keep).is_some());
        assert_eq!(store.project(&p3).unwrap().comments.len(), 1);

        let before = store.projects().to_vec();
        assert!(!store.reconcile_remote_event(ChangeEvent::Deleted("missing".into())));
        assert_eq!(store.projects(), before.as_slice());
    }

    #[test]
    fn test_remote_insert_for_unknown_project_is_ignored() {
        let hub = RemoteHub::new();
        let mut store = remote_store(&hub);
        let annotation = Annotation::new(&pin(1.0, 1.0));
        let row = CommentRow::from_annotation("elsewhere", &annotation);

        assert!(!store.reconcile_remote_event(ChangeEvent::Inserted(row.clone())));
        assert!(!store.reconcile_remote_event(ChangeEvent::Updated(row)));
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_offline_backend_keeps_optimistic_state() {
        let hub = RemoteHub::new();
        let mut store = remote_store(&hub);
        hub.set_offline(true);

        let project_id = store.create_project("https://example.com");
        let id = store.add_annotation(&project_id, pin(10.0, 10.0)).unwrap();
        store.update_text(&project_id, &id, "still here");
        store.flush();

        assert_eq!(hub.project_count(), 0);
        assert_eq!(store.annotation(&project_id, &id).unwrap().text, "still here");
    }
}
