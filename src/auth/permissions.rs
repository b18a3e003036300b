// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission resolution against a policy snapshot.
//!
//! ## Resolution Order
//!
//! First decisive match wins:
//!
//! 1. With a non-empty path: the first directory-scoped rule of the role, in
//!    declared order, whose permission suffix ends the requested key and whose
//!    pattern matches the path.
//! 2. An exact rule for the key.
//! 3. Wildcards from most to least specific (`a.b.*`, then `a.*`).
//! 4. Deny.
//!
//! A `false` found earlier in this order is final even if a broader rule
//! further down would allow.

use crate::policy::PolicySnapshot;

/// Decides whether a role may perform an action.
#[derive(Debug, Clone, Copy)]
pub struct PermissionResolver<'a> {
    policy: &'a PolicySnapshot,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(policy: &'a PolicySnapshot) -> Self {
        Self { policy }
    }

    /// Whether `role` holds `permission`, optionally at `path`.
    pub fn is_allowed(&self, role: &str, permission: &str, path: Option<&str>) -> bool {
        let Some(rules) = self.policy.role_rules(role) else {
            return false;
        };

        if let Some(path) = path.filter(|p| !p.is_empty()) {
            if let Some(rule) = rules.scoped_match(permission, path) {
                return rule.allow;
            }
        }

        if let Some(allow) = rules.simple(permission) {
            return allow;
        }

        let segments: Vec<&str> = permission.split('.').collect();
        for depth in (1..segments.len()).rev() {
            let wildcard = format!("{}.*", segments[..depth].join("."));
            if let Some(allow) = rules.simple(&wildcard) {
                return allow;
            }
        }

        false
    }
}

impl PolicySnapshot {
    /// Shorthand for [`PermissionResolver::is_allowed`].
    pub fn is_allowed(&self, role: &str, permission: &str, path: Option<&str>) -> bool {
        PermissionResolver::new(self).is_allowed(role, permission, path)
    }
}
