// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Multi-writer backend with a change feed.
//!
//! A [`RemoteHub`] holds the project and comment tables and broadcasts
//! every comment change to all subscribers, including the writer that
//! caused it. Each participant talks to the hub through its own
//! [`RemoteAdapter`].

use super::{ChangeEvent, PersistenceAdapter, Subscription};
use crate::io::wire::{AnnotationPatch, CommentRow, ProjectRow};
use crate::models::project::Project;
use anyhow::{anyhow, bail, Result};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct HubState {
    projects: Vec<ProjectRow>,
    comments: Vec<CommentRow>,
    subscribers: Vec<Sender<ChangeEvent>>,
    offline: bool,
}

impl HubState {
    fn broadcast(&mut self, event: ChangeEvent) {
        self.subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline {
            bail!("backend is unreachable");
        }
        Ok(())
    }
}

/// Shared backend state. Cloning yields another handle to the same tables.
#[derive(Clone, Default)]
pub struct RemoteHub {
    state: Arc<Mutex<HubState>>,
}

impl RemoteHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// A new client connection.
    pub fn connect(&self) -> RemoteAdapter {
        RemoteAdapter { hub: self.clone() }
    }

    /// Reject every request while offline.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn comment(&self, id: &str) -> Option<CommentRow> {
        self.lock().comments.iter().find(|c| c.id == id).cloned()
    }

    pub fn project(&self, id: &str) -> Option<ProjectRow> {
        self.lock().projects.iter().find(|p| p.id == id).cloned()
    }

    pub fn comment_count(&self) -> usize {
        self.lock().comments.len()
    }

    pub fn project_count(&self) -> usize {
        self.lock().projects.len()
    }
}

/// One client's connection to a [`RemoteHub`].
pub struct RemoteAdapter {
    hub: RemoteHub,
}

impl PersistenceAdapter for RemoteAdapter {
    fn load_projects(&mut self) -> Result<Vec<Project>> {
        let state = self.hub.lock();
        state.ensure_online()?;

        let mut rows = state.projects.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .map(|row| row.into_project(&state.comments))
            .collect())
    }

    fn create_project(&mut self, row: &ProjectRow) -> Result<()> {
        let mut state = self.hub.lock();
        state.ensure_online()?;
        if state.projects.iter().any(|p| p.id == row.id) {
            bail!("duplicate project id {}", row.id);
        }
        state.projects.push(row.clone());
        Ok(())
    }

    fn delete_project(&mut self, id: &str) -> Result<()> {
        let mut state = self.hub.lock();
        state.ensure_online()?;
        state.projects.retain(|p| p.id != id);

        let (removed, kept): (Vec<CommentRow>, Vec<CommentRow>) =
            std::mem::take(&mut state.comments)
                .into_iter()
                .partition(|c| c.project_id == id);
        state.comments = kept;
        for row in removed {
            state.broadcast(ChangeEvent::Deleted(row.id));
        }
        Ok(())
    }

    fn create_annotation(&mut self, row: &CommentRow) -> Result<()> {
        let mut state = self.hub.lock();
        state.ensure_online()?;
        if !state.projects.iter().any(|p| p.id == row.project_id) {
            bail!("comment {} references unknown project {}", row.id, row.project_id);
        }
        if state.comments.iter().any(|c| c.id == row.id) {
            bail!("duplicate comment id {}", row.id);
        }
        state.comments.push(row.clone());
        state.broadcast(ChangeEvent::Inserted(row.clone()));
        Ok(())
    }

    fn update_annotation(&mut self, id: &str, patch: &AnnotationPatch) -> Result<()> {
        let mut state = self.hub.lock();
        state.ensure_online()?;
        let row = state
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| anyhow!("no comment row {}", id))?;
        patch.apply_to(row);
        let updated = row.clone();
        state.broadcast(ChangeEvent::Updated(updated));
        Ok(())
    }

    fn delete_annotation(&mut self, id: &str) -> Result<()> {
        let mut state = self.hub.lock();
        state.ensure_online()?;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        if state.comments.len() != before {
            state.broadcast(ChangeEvent::Deleted(id.to_string()));
        }
        Ok(())
    }

    fn subscribe(&mut self) -> Result<Option<Subscription>> {
        let (sender, receiver) = mpsc::channel();
        self.hub.lock().subscribers.push(sender);
        Ok(Some(Subscription::new(receiver)))
    }
}
