// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::policy::PolicyError;

/// Authentication and authorization error type.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is not known to the token authority
    InvalidToken,
    /// Requested role is missing or not declared in the policy
    InvalidRole,
    /// Admin token requested with the wrong admin key
    InvalidAdminKey,
    /// Non-admin token requested without the admin key
    AdminKeyRequired,
    /// Role lacks `container.administrator`
    AdminRequired,
    /// Policy denies the action; carries the user-facing message
    PermissionDenied(&'static str),
    /// Policy could not be loaded
    Config(String),
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    code: u16,
    success: bool,
    message: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_token",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken => "invalid_token",
            AuthError::InvalidRole => "invalid_role",
            AuthError::InvalidAdminKey => "invalid_admin_key",
            AuthError::AdminKeyRequired => "admin_key_required",
            AuthError::AdminRequired => "admin_required",
            AuthError::PermissionDenied(_) => "permission_denied",
            AuthError::Config(_) => "config_error",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidRole => StatusCode::BAD_REQUEST,
            AuthError::InvalidAdminKey
            | AuthError::AdminKeyRequired
            | AuthError::AdminRequired
            | AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AuthError::Config(_) | AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Missing token."),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::InvalidToken => write!(f, "Invalid or expired token."),
            AuthError::InvalidRole => write!(f, "Invalid or missing role."),
            AuthError::InvalidAdminKey => write!(f, "Invalid admin key."),
            AuthError::AdminKeyRequired => write!(f, "Admin key required."),
            AuthError::AdminRequired => write!(f, "Admin permission required."),
            AuthError::PermissionDenied(msg) => write!(f, "{msg}"),
            AuthError::Config(msg) => write!(f, "Container configuration unavailable: {msg}"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<PolicyError> for AuthError {
    fn from(e: PolicyError) -> Self {
        AuthError::Config(e.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Authorization failed");
        }
        let body = Json(AuthErrorBody {
            code: status.as_u16(),
            success: false,
            message: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
