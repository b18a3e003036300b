// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for bearer-token authentication.
//!
//! Use the `Auth` extractor in handlers to require a valid token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(caller): Auth) -> impl IntoResponse {
//!     // caller.role is the role bound to the token
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::AuthError;
use crate::state::AppState;

/// The role a request is acting as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedRole {
    pub role: String,
}

/// Extractor for requests carrying a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_files(
///     Auth(caller): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<FileListResponse>, ApiError> {
///     // caller.role decides what the request may do
/// }
/// ```
pub struct Auth(pub AuthenticatedRole);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let role = state
            .tokens
            .validate(token)
            .await
            .ok_or(AuthError::InvalidToken)?;

        Ok(Auth(AuthenticatedRole { role }))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingAuthHeader);
    }
    Ok(token)
}

/// Extractor that requires `container.administrator: true` for the caller's
/// role. The policy is read fresh from disk for the check.
pub struct AdminOnly(pub AuthenticatedRole);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(caller) = Auth::from_request_parts(parts, state).await?;

        let policy = state.policy.fetch().await?;
        if !policy.is_admin(&caller.role) {
            tracing::warn!(role = %caller.role, "Admin endpoint refused");
            return Err(AuthError::AdminRequired);
        }

        Ok(AdminOnly(caller))
    }
}
