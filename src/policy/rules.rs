// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed permission rules, parsed once when a policy is loaded.
//!
//! A role's permission map mixes three kinds of entries:
//!
//! | Key | Value | Parsed as |
//! |-----|-------|-----------|
//! | `container.files.upload` | `true` | [`PermissionRule::Simple`] |
//! | `container.files.*` | `false` | [`PermissionRule::Simple`] (wildcard) |
//! | `container.files.directory."uploads/*".upload` | `true` | [`PermissionRule::PathScoped`] |
//! | `container.files.maxTotalUploadSize` | `"5MB"` | quota limit, not a rule |
//!
//! Non-boolean values on other keys are ignored.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use super::size::role_limit;
use crate::storage::paths::normalize_path;

/// Grants access to the admin configuration endpoints.
pub const ADMINISTRATOR: &str = "container.administrator";
/// Upload (create or overwrite) a file.
pub const FILES_UPLOAD: &str = "container.files.upload";
/// Delete a file.
pub const FILES_DELETE: &str = "container.files.delete";
/// List a directory tree.
pub const FILES_VIEW: &str = "container.files.view";
/// Per-role cap on total container usage after an upload.
pub const MAX_TOTAL_UPLOAD_SIZE: &str = "container.files.maxTotalUploadSize";
/// Per-role cap on a single uploaded file.
pub const MAX_INDIVIDUAL_UPLOAD_SIZE: &str = "container.files.maxIndividualUploadSize";

/// Prefix of directory-scoped keys: `container.files.directory."<pattern>".<permission>`.
pub const DIRECTORY_SCOPE_PREFIX: &str = "container.files.directory";

/// A single permission rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRule {
    /// Exact or wildcard (`a.b.*`) key.
    Simple { key: String, allow: bool },
    /// Permission restricted to a path pattern.
    PathScoped(ScopedRule),
}

impl PermissionRule {
    /// Parse one permission map entry. Only boolean values are rules.
    pub fn parse(key: &str, value: &Value) -> Option<PermissionRule> {
        let allow = value.as_bool()?;
        if key.starts_with(DIRECTORY_SCOPE_PREFIX) {
            if let Some((pattern, suffix)) = parse_directory_key(key) {
                return Some(PermissionRule::PathScoped(ScopedRule {
                    suffix,
                    pattern,
                    allow,
                }));
            }
        }
        Some(PermissionRule::Simple {
            key: key.to_string(),
            allow,
        })
    }
}

/// A directory-scoped rule: `suffix` restricted to paths matching `pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedRule {
    /// Permission name the rule applies to, matched as a suffix of the
    /// requested permission key (`upload` matches `container.files.upload`).
    pub suffix: String,
    /// `dir/*` for a subtree, anything else for an exact path.
    pub pattern: String,
    pub allow: bool,
}

impl ScopedRule {
    /// Whether the rule covers `permission`.
    pub fn applies_to(&self, permission: &str) -> bool {
        permission.ends_with(&self.suffix)
    }

    /// Match an already normalized path against the pattern.
    pub fn matches_path(&self, path: &str) -> bool {
        let pattern = self.pattern.replace('\\', "/");
        let pattern = pattern.trim_start_matches('/');
        match pattern.strip_suffix('*') {
            Some(prefix) if prefix.ends_with('/') => path.starts_with(prefix),
            _ => path == pattern,
        }
    }
}

/// Split `container.files.directory."<pattern>".<permission>` into its parts.
///
/// The dot after `directory` and a backslash before each quote are optional.
fn parse_directory_key(key: &str) -> Option<(String, String)> {
    let rest = key.strip_prefix(DIRECTORY_SCOPE_PREFIX)?;
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    let rest = rest.strip_prefix('\\').unwrap_or(rest);
    let rest = rest.strip_prefix('"')?;

    let close = rest.rfind('"')?;
    let pattern = rest[..close].strip_suffix('\\').unwrap_or(&rest[..close]);
    let suffix = rest[close + 1..].strip_prefix('.')?;

    if pattern.is_empty() || suffix.is_empty() {
        return None;
    }
    Some((pattern.to_string(), suffix.to_string()))
}

/// All rules and quota limits declared for one role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleRules {
    simple: HashMap<String, bool>,
    scoped: Vec<ScopedRule>,
    max_total_upload: Option<u64>,
    max_individual_upload: Option<u64>,
}

impl RoleRules {
    /// Compile a role's permission map, keeping declared order for scoped rules.
    pub fn compile(permissions: &IndexMap<String, Value>) -> Self {
        let mut rules = RoleRules {
            max_total_upload: role_limit(permissions.get(MAX_TOTAL_UPLOAD_SIZE)),
            max_individual_upload: role_limit(permissions.get(MAX_INDIVIDUAL_UPLOAD_SIZE)),
            ..RoleRules::default()
        };

        for (key, value) in permissions {
            match PermissionRule::parse(key, value) {
                Some(PermissionRule::Simple { key, allow }) => {
                    rules.simple.insert(key, allow);
                }
                Some(PermissionRule::PathScoped(rule)) => rules.scoped.push(rule),
                None => {}
            }
        }
        rules
    }

    /// Value of an exact simple key (wildcards are looked up literally).
    pub fn simple(&self, key: &str) -> Option<bool> {
        self.simple.get(key).copied()
    }

    /// First scoped rule, in declared order, covering `permission` at `path`.
    pub fn scoped_match(&self, permission: &str, path: &str) -> Option<&ScopedRule> {
        let path = normalize_path(path);
        self.scoped
            .iter()
            .find(|rule| rule.applies_to(permission) && rule.matches_path(&path))
    }

    pub fn max_total_upload(&self) -> Option<u64> {
        self.max_total_upload
    }

    pub fn max_individual_upload(&self) -> Option<u64> {
        self.max_individual_upload
    }
}
