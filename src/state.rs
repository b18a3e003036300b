// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenAuthority;
use crate::policy::PolicyStore;
use crate::storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<PolicyStore>,
    pub tokens: Arc<TokenAuthority>,
    pub files: Arc<FileStore>,
}

impl AppState {
    pub fn new(policy: PolicyStore, tokens: TokenAuthority, files: FileStore) -> Self {
        Self {
            policy: Arc::new(policy),
            tokens: Arc::new(tokens),
            files: Arc::new(files),
        }
    }
}
