// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O formats: project files, backend rows and share links.

pub mod serialization;
pub mod share;
pub mod wire;
