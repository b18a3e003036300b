// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opaque bearer tokens bound to a role.
//!
//! ## Issuance Rules
//!
//! 1. The requested role must be declared in the policy's `roles` list
//!    (checked first, regardless of the key presented).
//! 2. Every request, admin or not, must present the configured admin key.
//!
//! Tokens are 256 bits from the system CSPRNG, hex encoded. They live only in
//! process memory and never expire; a restart invalidates all of them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use tokio::sync::RwLock;

use super::AuthError;
use crate::policy::{PolicySnapshot, ADMIN_ROLE};

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 32;

/// Admin key used when `ADMIN_KEY` is not set.
pub const DEFAULT_ADMIN_KEY: &str = "admin123";

/// What a token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Issues and validates bearer tokens.
pub struct TokenAuthority {
    admin_key: String,
    rng: SystemRandom,
    tokens: RwLock<HashMap<String, TokenEntry>>,
}

impl TokenAuthority {
    pub fn new(admin_key: impl Into<String>) -> Self {
        Self {
            admin_key: admin_key.into(),
            rng: SystemRandom::new(),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a token for `role` if `admin_key` matches the configured key.
    pub async fn issue(
        &self,
        policy: &PolicySnapshot,
        role: &str,
        admin_key: Option<&str>,
    ) -> Result<String, AuthError> {
        if role.is_empty() || !policy.has_role(role) {
            return Err(AuthError::InvalidRole);
        }

        if !self.admin_key_matches(admin_key) {
            tracing::warn!(role, "Token request rejected: bad admin key");
            return Err(if role == ADMIN_ROLE {
                AuthError::InvalidAdminKey
            } else {
                AuthError::AdminKeyRequired
            });
        }

        let mut tokens = self.tokens.write().await;
        let token = loop {
            let candidate = self.generate()?;
            if !tokens.contains_key(&candidate) {
                break candidate;
            }
        };
        tokens.insert(
            token.clone(),
            TokenEntry {
                role: role.to_string(),
                created_at: Utc::now(),
            },
        );

        tracing::info!(role, "Token issued");
        Ok(token)
    }

    /// Role bound to `token`, if any.
    pub async fn validate(&self, token: &str) -> Option<String> {
        self.tokens.read().await.get(token).map(|entry| entry.role.clone())
    }

    /// Full record for `token`, if any.
    pub async fn entry(&self, token: &str) -> Option<TokenEntry> {
        self.tokens.read().await.get(token).cloned()
    }

    /// Number of live tokens.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn admin_key_matches(&self, supplied: Option<&str>) -> bool {
        supplied.is_some_and(|key| {
            ring::constant_time::verify_slices_are_equal(key.as_bytes(), self.admin_key.as_bytes())
                .is_ok()
        })
    }

    fn generate(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AuthError::InternalError("system random source failed".to_string()))?;

        Ok(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use serde_json::json;

    const KEY: &str = "s3cret";

    fn policy() -> PolicySnapshot {
        PolicySnapshot::from_document(json!({ "roles": ["admin", "editor"] }))
    }

    #[tokio::test]
    async fn issues_hex_token_and_validates_it() {
        let authority = TokenAuthority::new(KEY);

        let token = authority.issue(&policy(), "editor", Some(KEY)).await.unwrap();

        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(authority.validate(&token).await.as_deref(), Some("editor"));
        assert_eq!(authority.entry(&token).await.unwrap().role, "editor");
    }

    #[tokio::test]
    async fn unknown_role_is_rejected_regardless_of_key() {
        let authority = TokenAuthority::new(KEY);
        let policy = policy();

        for key in [Some(KEY), Some("wrong"), None] {
            let result = authority.issue(&policy, "ghost", key).await;
            assert!(matches!(result, Err(AuthError::InvalidRole)));
        }
        assert!(matches!(
            authority.issue(&policy, "", Some(KEY)).await,
            Err(AuthError::InvalidRole)
        ));
        assert!(authority.is_empty().await);
    }

    #[tokio::test]
    async fn admin_role_with_wrong_key_is_forbidden() {
        let authority = TokenAuthority::new(KEY);
        let result = authority.issue(&policy(), "admin", Some("wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidAdminKey)));
    }

    #[tokio::test]
    async fn non_admin_roles_also_need_the_admin_key() {
        let authority = TokenAuthority::new(KEY);
        let policy = policy();

        assert!(matches!(
            authority.issue(&policy, "editor", Some("wrong")).await,
            Err(AuthError::AdminKeyRequired)
        ));
        assert!(matches!(
            authority.issue(&policy, "editor", None).await,
            Err(AuthError::AdminKeyRequired)
        ));
    }

    #[tokio::test]
    async fn unknown_tokens_do_not_validate() {
        let authority = TokenAuthority::new(KEY);
        assert_eq!(authority.validate("deadbeef").await, None);
    }

    #[tokio::test]
    async fn concurrent_issuance_yields_distinct_tokens() {
        let authority = Arc::new(TokenAuthority::new(KEY));
        let policy = Arc::new(policy());

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let authority = Arc::clone(&authority);
                let policy = Arc::clone(&policy);
                tokio::spawn(async move { authority.issue(&policy, "editor", Some(KEY)).await })
            })
            .collect();

        let mut tokens = HashSet::new();
        for handle in handles {
            tokens.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(tokens.len(), 64);
        assert_eq!(authority.len().await, 64);
    }
}
