// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Core data model: projects, annotations and resolution policy.

pub mod annotation;
pub mod project;
pub mod resolution;
