// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path normalization and containment for the container storage root.
//!
//! Client paths are always relative to the storage root. They are first
//! normalized (backslashes become `/`, leading and trailing slashes are
//! trimmed) and then resolved lexically, so a `..` segment can never climb
//! above the root.

use std::path::{Component, Path, PathBuf};

/// Default storage root, relative to the working directory.
pub const DEFAULT_STORAGE_ROOT: &str = "DO_NOT_DELETE/container";

/// Normalize a client-supplied relative path.
///
/// Idempotent: `normalize_path(&normalize_path(p)) == normalize_path(p)`.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

/// Storage path utilities rooted at the container directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all container files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path to a path strictly below the root.
    ///
    /// Returns `None` for the root itself and for anything that escapes it.
    pub fn resolve_file(&self, rel_path: &str) -> Option<PathBuf> {
        let relative = contained_relative(rel_path)?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Resolve a relative directory, allowing the root itself (`""`).
    pub fn resolve_dir(&self, rel_dir: &str) -> Option<PathBuf> {
        let relative = contained_relative(rel_dir)?;
        if relative.as_os_str().is_empty() {
            return Some(self.root.clone());
        }
        Some(self.root.join(relative))
    }
}

/// Lexically resolve `rel_path` into a relative path with no `..`, root or
/// prefix components. `None` means the path would leave the root.
fn contained_relative(rel_path: &str) -> Option<PathBuf> {
    let normalized = normalize_path(rel_path);
    let mut resolved = PathBuf::new();

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(segment) => resolved.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(resolved)
}
