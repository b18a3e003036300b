// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Container Storage
//!
//! Plain filesystem storage under a single root directory. Every client path
//! is resolved relative to that root and rejected if it would escape it.
//!
//! ## Storage Layout
//!
//! ```text
//! DO_NOT_DELETE/container/
//!   <whatever clients upload, nested as requested>
//! ```
//!
//! Nothing else lives under the root, so the sum of file sizes under it is
//! exactly the container's used space.

pub mod paths;
pub mod quota_fs;

pub use paths::{normalize_path, StoragePaths};
pub use quota_fs::{FileStore, PendingUpload, Receipt, StorageNode, StoreError, StoreResult};
