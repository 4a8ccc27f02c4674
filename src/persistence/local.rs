// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Single-process persistence backed by one JSON workspace file.
//!
//! There is no second writer, so no change feed is offered. The file is
//! read on first use, whether that is `load_projects` or a write, so a
//! write issued before the store is initialised never replaces the
//! workspace with a partial one.

use super::PersistenceAdapter;
use crate::io::serialization::{load_workspace, save_workspace};
use crate::io::wire::{AnnotationPatch, CommentRow, ProjectRow};
use crate::models::annotation::Annotation;
use crate::models::project::Project;
use anyhow::{anyhow, Result};
use std::path::PathBuf;

pub struct LocalAdapter {
    path: PathBuf,
    projects: Vec<Project>,
    loaded: bool,
}

impl LocalAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            projects: Vec::new(),
            loaded: false,
        }
    }

    fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.projects = match load_workspace(&self.path) {
            Ok(projects) => projects,
            Err(e) => {
                log::error!("Failed to load projects, starting empty: {:#}", e);
                Vec::new()
            }
        };
        self.loaded = true;
        log::info!("Loaded {} projects from {}", self.projects.len(), self.path.display());
    }

    fn save(&self) -> Result<()> {
        save_workspace(&self.projects, &self.path)
    }

    fn project_mut(&mut self, id: &str) -> Result<&mut Project> {
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("unknown project {}", id))
    }
}

impl PersistenceAdapter for LocalAdapter {
    fn load_projects(&mut self) -> Result<Vec<Project>> {
        self.loaded = false;
        self.ensure_loaded();
        Ok(self.projects.clone())
    }

    fn create_project(&mut self, row: &ProjectRow) -> Result<()> {
        self.ensure_loaded();
        if self.projects.iter().any(|p| p.id == row.id) {
            return Ok(());
        }
        self.projects.insert(0, row.clone().into_project(&[]));
        self.save()
    }

    fn delete_project(&mut self, id: &str) -> Result<()> {
        self.ensure_loaded();
        self.projects.retain(|p| p.id != id);
        self.save()
    }

    fn create_annotation(&mut self, row: &CommentRow) -> Result<()> {
        self.ensure_loaded();
        let project = self.project_mut(&row.project_id)?;
        if !project.contains(&row.id) {
            project.comments.push(Annotation::from(row));
            project.touch();
        }
        self.save()
    }

    fn update_annotation(&mut self, id: &str, patch: &AnnotationPatch) -> Result<()> {
        self.ensure_loaded();
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.contains(id))
            .ok_or_else(|| anyhow!("unknown annotation {}", id))?;
        if let Some(annotation) = project.annotation_mut(id) {
            patch.apply_to_annotation(annotation);
        }
        project.touch();
        self.save()
    }

    fn delete_annotation(&mut self, id: &str) -> Result<()> {
        self.ensure_loaded();
        for project in &mut self.projects {
            if project.remove_annotation(id).is_some() {
                project.touch();
            }
        }
        self.save()
    }
}
