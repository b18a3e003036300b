// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Quota-enforcing file operations under the storage root.
//!
//! This module only enforces path containment and byte quotas. Whether a role
//! may perform an operation at all is decided by the permission gate before
//! any of these functions are called.
//!
//! ## Quota Accounting
//!
//! Used space is recomputed on every upload by walking the whole tree. There
//! is no lock between the quota check and the write: two concurrent uploads
//! can both pass the check against the same used-space figure. The check and
//! the write are exposed separately ([`FileStore::prepare_upload`] and
//! [`PendingUpload::commit`]) so that window is explicit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use walkdir::WalkDir;

use super::paths::{normalize_path, StoragePaths};
use crate::policy::QuotaLimits;

/// Error type for quota-enforcing storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid or prohibited path.")]
    InvalidPath,

    #[error("File exceeds allowed size.")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Container or role quota exceeded.")]
    QuotaExceeded { used: u64, size: u64, limit: u64 },

    #[error("{0}")]
    NotFound(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<walkdir::Error> for StoreError {
    fn from(e: walkdir::Error) -> Self {
        StoreError::Io(e.into())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A node of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageNode {
    File {
        name: String,
        size: u64,
    },
    Directory {
        name: String,
        #[schema(value_type = Vec<Object>)]
        children: Vec<StorageNode>,
    },
}

impl StorageNode {
    pub fn name(&self) -> &str {
        match self {
            StorageNode::File { name, .. } | StorageNode::Directory { name, .. } => name,
        }
    }
}

/// Outcome of a successful upload or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Normalized path relative to the storage root.
    pub path: String,
    /// Bytes written (upload) or freed (delete).
    pub bytes: u64,
}

/// An upload that passed path and quota checks but has not been written yet.
#[derive(Debug)]
#[must_use = "a pending upload does nothing until committed"]
pub struct PendingUpload {
    target: PathBuf,
    rel_path: String,
    size: u64,
}

impl PendingUpload {
    /// Create parent directories and write the file, overwriting any
    /// existing one.
    pub fn commit(self, content: &[u8]) -> StoreResult<Receipt> {
        if let Some(parent) = self.target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.target, content)?;

        tracing::info!(path = %self.rel_path, bytes = self.size, "File uploaded");
        Ok(Receipt {
            path: self.rel_path,
            bytes: self.size,
        })
    }
}

/// File store rooted at the container directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: StoragePaths,
}

impl FileStore {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the storage root if it does not exist. Idempotent.
    pub fn initialize(&self) -> StoreResult<()> {
        fs::create_dir_all(self.paths.root())?;
        Ok(())
    }

    /// Sum of all file sizes under the root. A missing root is empty.
    pub fn used_space(&self) -> StoreResult<u64> {
        let root = self.paths.root();
        if !root.exists() {
            return Ok(0);
        }

        let mut total = 0u64;
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() {
                total = total.saturating_add(entry.metadata()?.len());
            }
        }
        Ok(total)
    }

    /// Validate the target path and both quotas for an upload of `size` bytes.
    pub fn prepare_upload(
        &self,
        limits: &QuotaLimits,
        rel_path: &str,
        size: u64,
    ) -> StoreResult<PendingUpload> {
        let target = self
            .paths
            .resolve_file(rel_path)
            .ok_or(StoreError::InvalidPath)?;

        if size > limits.max_file_size {
            return Err(StoreError::FileTooLarge {
                size,
                limit: limits.max_file_size,
            });
        }

        let used = self.used_space()?;
        if used.saturating_add(size) > limits.max_total_size {
            return Err(StoreError::QuotaExceeded {
                used,
                size,
                limit: limits.max_total_size,
            });
        }

        Ok(PendingUpload {
            target,
            rel_path: normalize_path(rel_path),
            size,
        })
    }

    /// Check quotas and write `content` to `rel_path`.
    pub fn upload(
        &self,
        limits: &QuotaLimits,
        rel_path: &str,
        content: &[u8],
    ) -> StoreResult<Receipt> {
        self.prepare_upload(limits, rel_path, content.len() as u64)?
            .commit(content)
    }

    /// Delete a single file.
    pub fn delete(&self, rel_path: &str) -> StoreResult<Receipt> {
        let target = self
            .paths
            .resolve_file(rel_path)
            .ok_or(StoreError::InvalidPath)?;

        let metadata = match fs::symlink_metadata(&target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound("File not found."));
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            return Err(StoreError::InvalidPath);
        }

        fs::remove_file(&target)?;

        let rel_path = normalize_path(rel_path);
        tracing::info!(path = %rel_path, bytes = metadata.len(), "File deleted");
        Ok(Receipt {
            path: rel_path,
            bytes: metadata.len(),
        })
    }

    /// Recursive listing of `rel_dir` (`""` is the root).
    pub fn list(&self, rel_dir: &str) -> StoreResult<Vec<StorageNode>> {
        let dir = self
            .paths
            .resolve_dir(rel_dir)
            .ok_or(StoreError::InvalidPath)?;

        if !dir.is_dir() {
            return Err(StoreError::NotFound("Directory not found."));
        }
        walk(&dir)
    }
}

/// Build the tree below `dir`, entries sorted by name.
fn walk(dir: &Path) -> StoreResult<Vec<StorageNode>> {
    let mut nodes = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            nodes.push(StorageNode::Directory {
                name,
                children: walk(&entry.path())?,
            });
        } else {
            nodes.push(StorageNode::File {
                name,
                size: metadata.len(),
            });
        }
    }
    nodes.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MB: u64 = 1024 * 1024;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(StoragePaths::new(temp_dir.path().join("container")));
        store.initialize().expect("Failed to initialize store");
        (store, temp_dir)
    }

    fn limits(max_file_size: u64, max_total_size: u64) -> QuotaLimits {
        QuotaLimits {
            max_file_size,
            max_total_size,
        }
    }

    #[test]
    fn upload_writes_nested_file() {
        let (store, _temp_dir) = test_store();

        let receipt = store
            .upload(&QuotaLimits::unlimited(), "/docs\\notes/a.txt", b"hello")
            .unwrap();

        assert_eq!(receipt.path, "docs/notes/a.txt");
        assert_eq!(receipt.bytes, 5);
        let written = fs::read(store.paths().root().join("docs/notes/a.txt")).unwrap();
        assert_eq!(written, b"hello");
    }

    #[test]
    fn upload_overwrites_existing_file() {
        let (store, _temp_dir) = test_store();
        let unlimited = QuotaLimits::unlimited();

        store.upload(&unlimited, "a.txt", b"first version").unwrap();
        store.upload(&unlimited, "a.txt", b"second").unwrap();

        let written = fs::read(store.paths().root().join("a.txt")).unwrap();
        assert_eq!(written, b"second");
    }

    #[test]
    fn upload_rejects_traversal_and_root() {
        let (store, temp_dir) = test_store();
        let unlimited = QuotaLimits::unlimited();

        for bad in ["../escape.txt", "a/../../escape.txt", "", "/", "docs/.."] {
            let result = store.upload(&unlimited, bad, b"x");
            assert!(matches!(result, Err(StoreError::InvalidPath)), "path: {bad:?}");
        }
        assert!(!temp_dir.path().join("escape.txt").exists());
    }

    #[test]
    fn upload_rejects_oversized_file() {
        let (store, _temp_dir) = test_store();

        let result = store.upload(&limits(4, u64::MAX), "big.bin", b"12345");
        assert!(matches!(
            result,
            Err(StoreError::FileTooLarge { size: 5, limit: 4 })
        ));
    }

    #[test]
    fn role_total_cap_applies_below_global_cap() {
        let (store, _temp_dir) = test_store();
        // Global 10MB, role 5MB: effective total is 5MB.
        let editor = limits(u64::MAX, 5 * MB);
        let content = vec![0u8; (6 * MB) as usize];

        let result = store.upload(&editor, "six.bin", &content);
        assert!(matches!(result, Err(StoreError::QuotaExceeded { .. })));
    }

    #[test]
    fn quota_counts_existing_files() {
        let (store, _temp_dir) = test_store();
        let quota = limits(u64::MAX, 10);

        store.upload(&quota, "a.bin", &[1u8; 6]).unwrap();
        let result = store.upload(&quota, "nested/b.bin", &[1u8; 5]);

        assert!(matches!(
            result,
            Err(StoreError::QuotaExceeded { used: 6, size: 5, limit: 10 })
        ));
        assert_eq!(store.used_space().unwrap(), 6);
    }

    #[test]
    fn concurrent_uploads_can_both_pass_the_quota_check() {
        let (store, _temp_dir) = test_store();
        let quota = limits(u64::MAX, 5 * MB);
        let chunk = vec![7u8; (4 * MB) as usize];

        // Both checks observe an empty container before either write lands.
        let first = store.prepare_upload(&quota, "one.bin", chunk.len() as u64).unwrap();
        let second = store.prepare_upload(&quota, "two.bin", chunk.len() as u64).unwrap();

        first.commit(&chunk).unwrap();
        second.commit(&chunk).unwrap();

        assert_eq!(store.used_space().unwrap(), 8 * MB);
    }

    #[test]
    fn delete_removes_file() {
        let (store, _temp_dir) = test_store();
        store
            .upload(&QuotaLimits::unlimited(), "docs/a.txt", b"abc")
            .unwrap();

        let receipt = store.delete("docs/a.txt").unwrap();

        assert_eq!(receipt.bytes, 3);
        assert!(!store.paths().root().join("docs/a.txt").exists());
    }

    #[test]
    fn delete_missing_file_is_not_found() {
        let (store, _temp_dir) = test_store();
        assert!(matches!(store.delete("nope.txt"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_rejects_directories_and_traversal() {
        let (store, _temp_dir) = test_store();
        fs::create_dir_all(store.paths().root().join("docs")).unwrap();

        assert!(matches!(store.delete("docs"), Err(StoreError::InvalidPath)));
        assert!(matches!(store.delete("../x"), Err(StoreError::InvalidPath)));
    }

    #[test]
    fn list_empty_root() {
        let (store, _temp_dir) = test_store();
        assert_eq!(store.list("").unwrap(), Vec::new());
    }

    #[test]
    fn list_returns_recursive_tree() {
        let (store, _temp_dir) = test_store();
        let unlimited = QuotaLimits::unlimited();
        store.upload(&unlimited, "b.txt", b"bb").unwrap();
        store.upload(&unlimited, "a/inner.txt", b"i").unwrap();
        fs::create_dir_all(store.paths().root().join("a/empty")).unwrap();

        let tree = store.list("/").unwrap();

        assert_eq!(
            tree,
            vec![
                StorageNode::Directory {
                    name: "a".into(),
                    children: vec![
                        StorageNode::Directory {
                            name: "empty".into(),
                            children: vec![],
                        },
                        StorageNode::File {
                            name: "inner.txt".into(),
                            size: 1,
                        },
                    ],
                },
                StorageNode::File {
                    name: "b.txt".into(),
                    size: 2,
                },
            ]
        );
    }

    #[test]
    fn list_subdirectory_and_missing_directory() {
        let (store, _temp_dir) = test_store();
        store
            .upload(&QuotaLimits::unlimited(), "a/inner.txt", b"i")
            .unwrap();

        assert_eq!(store.list("a").unwrap().len(), 1);
        assert!(matches!(store.list("missing"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.list("a/inner.txt"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.list("../.."), Err(StoreError::InvalidPath)));
    }

    #[test]
    fn storage_node_serializes_with_type_tag() {
        let node = StorageNode::Directory {
            name: "docs".into(),
            children: vec![StorageNode::File {
                name: "a.txt".into(),
                size: 3,
            }],
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "directory",
                "name": "docs",
                "children": [{ "type": "file", "name": "a.txt", "size": 3 }]
            })
        );
    }

    #[test]
    fn used_space_of_missing_root_is_zero() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(StoragePaths::new(temp_dir.path().join("never-created")));
        assert_eq!(store.used_space().unwrap(), 0);
    }
}
