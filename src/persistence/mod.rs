// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Durable storage for projects and annotations.
//!
//! The store never talks to an adapter directly. Every call is queued
//! to a [`PersistenceWorker`] thread that owns the adapter, so a slow or
//! failing backend can never hold up a local state change. Write
//! failures are logged and otherwise dropped.

pub mod local;
pub mod remote;

use crate::io::wire::{AnnotationPatch, CommentRow, ProjectRow};
use crate::models::annotation::AnnotationId;
use crate::models::project::{Project, ProjectId};
use anyhow::{anyhow, Context, Result};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

/// A change to an annotation observed on the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Inserted(CommentRow),
    /// Always carries the full current row.
    Updated(CommentRow),
    Deleted(AnnotationId),
}

/// Live feed of [`ChangeEvent`]s from a multi-writer backend.
///
/// Includes echoes of writes made through this process's own adapter.
pub struct Subscription {
    receiver: Receiver<ChangeEvent>,
    closed: bool,
}

impl Subscription {
    pub fn new(receiver: Receiver<ChangeEvent>) -> Self {
        Self {
            receiver,
            closed: false,
        }
    }

    /// Next pending event, without blocking.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        if self.closed {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Change feed closed by backend");
                self.closed = true;
                None
            }
        }
    }
}

/// Backend operations the store depends on.
pub trait PersistenceAdapter: Send + 'static {
    fn load_projects(&mut self) -> Result<Vec<Project>>;
    fn create_project(&mut self, row: &ProjectRow) -> Result<()>;
    fn delete_project(&mut self, id: &str) -> Result<()>;
    fn create_annotation(&mut self, row: &CommentRow) -> Result<()>;
    fn update_annotation(&mut self, id: &str, patch: &AnnotationPatch) -> Result<()>;
    fn delete_annotation(&mut self, id: &str) -> Result<()>;

    /// Open a change feed. Single-writer backends have none.
    fn subscribe(&mut self) -> Result<Option<Subscription>> {
        Ok(None)
    }
}

enum PersistCommand {
    CreateProject(ProjectRow),
    DeleteProject(ProjectId),
    CreateAnnotation(CommentRow),
    UpdateAnnotation(AnnotationId, AnnotationPatch),
    DeleteAnnotation(AnnotationId),
    Load(Sender<Result<Vec<Project>>>),
    Subscribe(Sender<Result<Option<Subscription>>>),
    Flush(Sender<()>),
    Shutdown,
}

fn run_command<A: PersistenceAdapter>(adapter: &mut A, command: PersistCommand) -> bool {
    let (operation, result) = match command {
        PersistCommand::CreateProject(row) => ("create project", adapter.create_project(&row)),
        PersistCommand::DeleteProject(id) => ("delete project", adapter.delete_project(&id)),
        PersistCommand::CreateAnnotation(row) => {
            ("create annotation", adapter.create_annotation(&row))
        }
        PersistCommand::UpdateAnnotation(id, patch) => {
            ("update annotation", adapter.update_annotation(&id, &patch))
        }
        PersistCommand::DeleteAnnotation(id) => {
            ("delete annotation", adapter.delete_annotation(&id))
        }
        PersistCommand::Load(reply) => {
            if reply.send(adapter.load_projects()).is_err() {
                log::error!("Load caller dropped before receiving projects");
            }
            return true;
        }
        PersistCommand::Subscribe(reply) => {
            if reply.send(adapter.subscribe()).is_err() {
                log::error!("Subscribe caller dropped before receiving feed");
            }
            return true;
        }
        PersistCommand::Flush(reply) => {
            let _ = reply.send(());
            return true;
        }
        PersistCommand::Shutdown => return false,
    };

    match result {
        Ok(()) => log::debug!("Persisted: {}", operation),
        Err(e) => log::error!("Failed to {}: {:#}", operation, e),
    }
    true
}

/// Background thread that applies persistence commands in FIFO order.
///
/// Dropping the worker sends a shutdown and joins the thread, so it
/// blocks until every queued command has been attempted. An adapter call
/// that never returns therefore hangs the drop; use
/// [`detach`](Self::detach) when that wait is not acceptable.
pub struct PersistenceWorker {
    sender: Sender<PersistCommand>,
    worker: Option<JoinHandle<()>>,
}

impl PersistenceWorker {
    pub fn spawn<A: PersistenceAdapter>(mut adapter: A) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<PersistCommand>();

        let worker = thread::Builder::new()
            .name("pinsync-persistence".into())
            .spawn(move || {
                while let Ok(command) = receiver.recv() {
                    if !run_command(&mut adapter, command) {
                        break;
                    }
                }
                log::info!("Persistence thread shutting down");
            })
            .context("failed to spawn persistence worker thread")?;

        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    fn submit(&self, command: PersistCommand) {
        if self.sender.send(command).is_err() {
            log::error!("Persistence thread is gone; dropping write");
        }
    }

    pub fn create_project(&self, row: ProjectRow) {
        self.submit(PersistCommand::CreateProject(row));
    }

    pub fn delete_project(&self, id: ProjectId) {
        self.submit(PersistCommand::DeleteProject(id));
    }

    pub fn create_annotation(&self, row: CommentRow) {
        self.submit(PersistCommand::CreateAnnotation(row));
    }

    pub fn update_annotation(&self, id: AnnotationId, patch: AnnotationPatch) {
        self.submit(PersistCommand::UpdateAnnotation(id, patch));
    }

    pub fn delete_annotation(&self, id: AnnotationId) {
        self.submit(PersistCommand::DeleteAnnotation(id));
    }

    /// Load every persisted project, waiting for queued writes first.
    pub fn load(&self) -> Result<Vec<Project>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.sender
            .send(PersistCommand::Load(reply_tx))
            .map_err(|_| anyhow!("persistence thread is gone"))?;
        reply_rx
            .recv()
            .map_err(|_| anyhow!("persistence thread terminated unexpectedly"))?
    }

    pub fn subscribe(&self) -> Result<Option<Subscription>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.sender
            .send(PersistCommand::Subscribe(reply_tx))
            .map_err(|_| anyhow!("persistence thread is gone"))?;
        reply_rx
            .recv()
            .map_err(|_| anyhow!("persistence thread terminated unexpectedly"))?
    }

    /// Block until every command queued so far has been attempted.
    pub fn flush(&self) {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.submit(PersistCommand::Flush(reply_tx));
        if reply_rx.recv().is_err() {
            log::error!("Persistence thread terminated before flush completed");
        }
    }

    /// Shut down without waiting. Queued commands still run in the
    /// background, but nothing joins the thread.
    pub fn detach(mut self) {
        if self.worker.take().is_some() {
            if self.sender.send(PersistCommand::Shutdown).is_err() {
                log::error!("Persistence thread already gone at detach");
            }
            log::info!("Persistence thread detached");
        }
    }
}

impl Drop for PersistenceWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            if let Err(e) = self.sender.send(PersistCommand::Shutdown) {
                log::error!("Failed to send shutdown to persistence thread: {}", e);
            }
            if let Err(e) = handle.join() {
                log::error!("Failed to join persistence thread: {:?}", e);
            }
        }
    }
}
