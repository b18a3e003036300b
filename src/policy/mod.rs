// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Container Policy
//!
//! The policy document (`container.config.json`) is the single source of
//! truth for roles, permissions, quotas and request-origin rules.
//!
//! ## Document Shape
//!
//! ```json
//! {
//!     "name": "my-container",
//!     "roles": ["admin", "editor"],
//!     "permissions": {
//!         "admin": { "container.administrator": true, "container.files.*": true },
//!         "editor": {
//!             "container.files.upload": true,
//!             "container.files.maxTotalUploadSize": "5MB",
//!             "container.files.directory.\"private/*\".upload": false
//!         }
//!     },
//!     "maxContainerSize": "500MB",
//!     "maxIndividualFileSize": "unlimited",
//!     "allowedRequestDomains": ["*"],
//!     "deniedRequestDomains": []
//! }
//! ```
//!
//! The raw JSON value is kept as loaded and is what gets persisted and
//! served back, so any well-formed document round-trips unchanged
//! (unknown fields, explicit `null`s and mistyped fields included).
//! Authorization reads a typed [`Policy`] view derived from it, in which a
//! field of the wrong JSON type counts as absent.

pub mod rules;
pub mod size;
pub mod store;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

pub use rules::{PermissionRule, RoleRules, ScopedRule};
pub use size::{to_bytes, SizeQuantity, SizeSetting, SizeUnit, UNLIMITED};
pub use store::{PolicyError, PolicyResult, PolicyStore};

/// Role that the token authority treats specially when checking the admin key.
pub const ADMIN_ROLE: &str = "admin";

/// Typed view of the fields the server acts on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    pub name: Option<String>,
    pub port: Option<u16>,
    pub roles: Vec<String>,
    /// role → permission key → value, in declared order.
    pub permissions: IndexMap<String, IndexMap<String, Value>>,
    pub max_container_size: Option<SizeSetting>,
    pub max_individual_file_size: Option<SizeSetting>,
    pub allowed_request_domains: Option<Vec<String>>,
    pub denied_request_domains: Option<Vec<String>>,
}

impl Policy {
    /// Read the typed view out of a raw document. Never fails.
    pub fn from_document(document: &Value) -> Self {
        Self {
            name: document
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            port: document.get("port").and_then(port_number),
            roles: string_list(document.get("roles")).unwrap_or_default(),
            permissions: document
                .get("permissions")
                .and_then(Value::as_object)
                .map(|roles| {
                    roles
                        .iter()
                        .filter_map(|(role, permissions)| {
                            let permissions = permissions.as_object()?;
                            let keys = permissions
                                .iter()
                                .map(|(key, value)| (key.clone(), value.clone()))
                                .collect();
                            Some((role.clone(), keys))
                        })
                        .collect()
                })
                .unwrap_or_default(),
            max_container_size: SizeSetting::from_value(document.get("maxContainerSize")),
            max_individual_file_size: SizeSetting::from_value(
                document.get("maxIndividualFileSize"),
            ),
            allowed_request_domains: string_list(document.get("allowedRequestDomains")),
            denied_request_domains: string_list(document.get("deniedRequestDomains")),
        }
    }

    /// Whether a browser origin may call the container.
    ///
    /// Denials win over allows; a missing allow list means `["*"]`.
    pub fn origin_allowed(&self, origin: &str) -> bool {
        if let Some(denied) = &self.denied_request_domains {
            if denied.iter().any(|d| d == origin) {
                return false;
            }
        }
        match &self.allowed_request_domains {
            None => true,
            Some(allowed) => allowed.iter().any(|a| a == "*" || a == origin),
        }
    }
}

/// Numbers in range, or numeric strings such as `"8080"`.
fn port_number(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|port| u16::try_from(port).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String entries of an array; non-string entries are skipped.
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

/// Effective byte limits for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    /// Largest single file, in bytes.
    pub max_file_size: u64,
    /// Largest total container usage after an upload, in bytes.
    pub max_total_size: u64,
}

impl QuotaLimits {
    pub const fn unlimited() -> Self {
        Self {
            max_file_size: UNLIMITED,
            max_total_size: UNLIMITED,
        }
    }
}

/// A loaded document, its typed view and its compiled per-role rules.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySnapshot {
    document: Value,
    policy: Policy,
    rules: HashMap<String, RoleRules>,
}

impl PolicySnapshot {
    /// Derive the typed view and compile every role's permission map.
    pub fn from_document(document: Value) -> Self {
        let policy = Policy::from_document(&document);
        let rules = policy
            .permissions
            .iter()
            .map(|(role, permissions)| (role.clone(), RoleRules::compile(permissions)))
            .collect();
        Self {
            document,
            policy,
            rules,
        }
    }

    /// The document exactly as loaded.
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Whether `role` is declared in the role list.
    pub fn has_role(&self, role: &str) -> bool {
        self.policy.roles.iter().any(|r| r == role)
    }

    pub fn role_rules(&self, role: &str) -> Option<&RoleRules> {
        self.rules.get(role)
    }

    /// Exact `container.administrator: true` check; wildcards do not count.
    pub fn is_admin(&self, role: &str) -> bool {
        self.role_rules(role)
            .and_then(|rules| rules.simple(rules::ADMINISTRATOR))
            .unwrap_or(false)
    }

    /// Lesser of the global and per-role limits.
    pub fn quota_for(&self, role: &str) -> QuotaLimits {
        let global_file = size::global_limit(self.policy.max_individual_file_size.as_ref());
        let global_total = size::global_limit(self.policy.max_container_size.as_ref());
        let rules = self.role_rules(role);

        let role_file = rules.and_then(RoleRules::max_individual_upload);
        let role_total = rules.and_then(RoleRules::max_total_upload);

        QuotaLimits {
            max_file_size: role_file.map_or(global_file, |limit| limit.min(global_file)),
            max_total_size: role_total.map_or(global_total, |limit| limit.min(global_total)),
        }
    }
}
