// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. Request types derive `Deserialize`, response types derive
//! `Serialize`, and both derive `ToSchema` for OpenAPI documentation.
//!
//! ## Response Envelope
//!
//! Every JSON response carries `code` (the HTTP status) and `success`;
//! errors add `message` (see [`ApiError`](crate::error::ApiError)).
//!
//! ## Model Categories
//!
//! - **Auth**: token requests
//! - **Files**: upload, delete and list
//! - **Admin**: policy read and write
//! - **Instance**: public container description

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::storage::{Receipt, StorageNode};

const OK: u16 = 200;

// =============================================================================
// Auth
// =============================================================================

/// Request for a bearer token.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestTokenRequest {
    /// Role the token will act as. Must be declared in the policy.
    pub role: Option<String>,
    /// Shared admin key; required for every role.
    pub admin_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub code: u16,
    pub success: bool,
    /// Opaque bearer token (64 hex characters).
    pub token: String,
}

impl TokenResponse {
    pub fn new(token: String) -> Self {
        Self {
            code: OK,
            success: true,
            token,
        }
    }
}

// =============================================================================
// Files
// =============================================================================

/// Upload request. `file` is the base64-encoded content.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UploadRequest {
    pub file: Option<String>,
    /// Target path relative to the container root.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeleteRequest {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Directory to list, relative to the container root. Empty lists the root.
    pub dir: Option<String>,
}

/// Result of an upload or delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiptResponse {
    pub code: u16,
    pub success: bool,
    pub message: String,
    /// Normalized path that was written or removed.
    pub path: String,
    pub bytes: u64,
}

impl ReceiptResponse {
    pub fn new(message: &str, receipt: Receipt) -> Self {
        Self {
            code: OK,
            success: true,
            message: message.to_string(),
            path: receipt.path,
            bytes: receipt.bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileListResponse {
    pub code: u16,
    pub success: bool,
    pub files: Vec<StorageNode>,
}

impl FileListResponse {
    pub fn new(files: Vec<StorageNode>) -> Self {
        Self {
            code: OK,
            success: true,
            files,
        }
    }
}

// =============================================================================
// Admin
// =============================================================================

/// Plain success acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    pub code: u16,
    pub success: bool,
    pub message: String,
}

impl AckResponse {
    pub fn new(message: &str) -> Self {
        Self {
            code: OK,
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfigResponse {
    pub code: u16,
    pub success: bool,
    /// The full policy document, as stored.
    #[schema(value_type = Object)]
    pub config: Value,
}

impl ConfigResponse {
    pub fn new(config: Value) -> Self {
        Self {
            code: OK,
            success: true,
            config,
        }
    }
}

// =============================================================================
// Instance
// =============================================================================

/// Public description of the container, copied verbatim from the document.
/// Omits file visibility rules and any field not listed here; fields absent
/// from the document are absent here too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicInstance {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u16>)]
    pub port: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub roles: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub permissions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub max_container_size: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub max_individual_file_size: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub default_role: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub allowed_request_domains: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub denied_request_domains: Option<Value>,
}

impl From<&Value> for PublicInstance {
    fn from(document: &Value) -> Self {
        let field = |key: &str| document.get(key).cloned();
        Self {
            id: field("id"),
            name: field("name"),
            description: field("description"),
            port: field("port"),
            roles: field("roles"),
            permissions: field("permissions"),
            max_container_size: field("maxContainerSize"),
            max_individual_file_size: field("maxIndividualFileSize"),
            default_role: field("defaultRole"),
            allowed_request_domains: field("allowedRequestDomains"),
            denied_request_domains: field("deniedRequestDomains"),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InstanceResponse {
    pub code: u16,
    pub success: bool,
    pub instance: PublicInstance,
}

impl InstanceResponse {
    pub fn new(instance: PublicInstance) -> Self {
        Self {
            code: OK,
            success: true,
            instance,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndexResponse {
    pub code: u16,
    pub success: bool,
    pub message: String,
    /// Container name from the policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub container: Option<Value>,
}
