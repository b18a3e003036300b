// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Asteroid Container - quota-bounded file store with role-based access
//!
//! This crate serves a single container: a directory tree guarded by bearer
//! tokens, a hierarchical permission policy and byte quotas. The policy
//! document can be edited and reloaded at runtime without a restart.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token issuance, permission resolution and the request gate
//! - `policy` - Policy document, compiled rules, size parsing and the store
//! - `storage` - Path containment and the quota-enforcing file store

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for handler and router tests.

    use serde_json::{json, Value};
    use tempfile::TempDir;

    use crate::auth::TokenAuthority;
    use crate::policy::PolicyStore;
    use crate::state::AppState;
    use crate::storage::{FileStore, StoragePaths};

    pub const ADMIN_KEY: &str = "test-admin-key";

    /// Policy used by most tests: an administrator, an editor capped at 5MB
    /// total who may not upload under `private/`, and a read-only viewer.
    pub fn sample_policy() -> Value {
        json!({
            "id": "test-container",
            "name": "Test Container",
            "port": 8080,
            "roles": ["admin", "editor", "viewer"],
            "permissions": {
                "admin": {
                    "container.administrator": true,
                    "container.*": true
                },
                "editor": {
                    "container.files.upload": true,
                    "container.files.view": true,
                    "container.files.delete": false,
                    "container.files.maxTotalUploadSize": "5MB",
                    "container.files.directory.\"private/*\".upload": false
                },
                "viewer": {
                    "container.files.view": true
                }
            },
            "maxContainerSize": "10MB",
            "maxIndividualFileSize": "unlimited",
            "allowedRequestDomains": ["*"],
            "deniedRequestDomains": ["https://evil.example"],
            "publicFiles": []
        })
    }

    /// App state over a fresh temp directory seeded with `policy`.
    pub fn state_with(policy: &Value) -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let policy_path = temp_dir.path().join("container.config.json");
        std::fs::write(&policy_path, serde_json::to_vec_pretty(policy).unwrap()).unwrap();

        let files = FileStore::new(StoragePaths::new(temp_dir.path().join("files")));
        files.initialize().unwrap();

        let state = AppState::new(
            PolicyStore::open(&policy_path).unwrap(),
            TokenAuthority::new(ADMIN_KEY),
            files,
        );
        (state, temp_dir)
    }

    pub fn test_state() -> (AppState, TempDir) {
        state_with(&sample_policy())
    }
}
