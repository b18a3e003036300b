// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Policy persistence and the in-process policy cache.
//!
//! `load()` and its async twin `fetch()` always read the document from disk;
//! request paths that make authorization decisions use `fetch()` so an edited
//! file takes effect on the next request. `cached()` serves informational
//! reads and is refreshed only by `reload()` and `persist_and_reload()`.
//!
//! Documents are kept as raw JSON values. Anything that parses as JSON is
//! accepted and written back as given.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Value};

use super::PolicySnapshot;

/// Default location of the policy document.
pub const DEFAULT_POLICY_PATH: &str = "container.config.json";

/// Failure to read, parse or write the policy document.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("policy file {path} could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("policy file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("policy file {path} could not be written: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("policy could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type PolicyResult<T> = Result<T, PolicyError>;

/// File-backed policy provider with a swap-on-reload cache.
#[derive(Debug)]
pub struct PolicyStore {
    path: PathBuf,
    cache: RwLock<Arc<PolicySnapshot>>,
}

impl PolicyStore {
    /// Open the store, seeding the cache from disk.
    ///
    /// A missing or malformed document is an error; callers at startup
    /// treat it as fatal.
    pub fn open(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = read_snapshot(&path)?;
        Ok(Self {
            path,
            cache: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and compile the document from disk without touching the cache.
    pub fn load(&self) -> PolicyResult<Arc<PolicySnapshot>> {
        read_snapshot(&self.path).map(Arc::new)
    }

    /// [`load`](Self::load) without blocking the runtime.
    pub async fn fetch(&self) -> PolicyResult<Arc<PolicySnapshot>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| PolicyError::Read {
                path: self.path.clone(),
                source,
            })?;
        parse_snapshot(&self.path, &raw).map(Arc::new)
    }

    /// Current cached snapshot.
    pub fn cached(&self) -> Arc<PolicySnapshot> {
        self.cache.read().clone()
    }

    /// Re-read the document into the cache.
    pub fn reload(&self) -> PolicyResult<Arc<PolicySnapshot>> {
        let snapshot = self.load()?;
        *self.cache.write() = Arc::clone(&snapshot);
        tracing::info!(path = %self.path.display(), "Policy reloaded");
        Ok(snapshot)
    }

    /// Atomically replace the document with `document`, then reload.
    pub fn persist_and_reload(&self, document: &Value) -> PolicyResult<Arc<PolicySnapshot>> {
        write_pretty(&self.path, document)?;
        self.reload()
    }
}

fn read_snapshot(path: &Path) -> PolicyResult<PolicySnapshot> {
    let raw = fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshot(path, &raw)
}

fn parse_snapshot(path: &Path, raw: &str) -> PolicyResult<PolicySnapshot> {
    let document: Value = serde_json::from_str(raw).map_err(|source| PolicyError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PolicySnapshot::from_document(document))
}

/// Write with four-space indentation to a temp file, then rename over `path`.
fn write_pretty(path: &Path, document: &Value) -> PolicyResult<()> {
    let write_err = |source| PolicyError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let temp_path = path.with_extension("json.tmp");
    {
        let file = File::create(&temp_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        document
            .serialize(&mut serializer)
            .map_err(PolicyError::Serialize)?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }

    fs::rename(&temp_path, path).map_err(write_err)?;
    Ok(())
}
