// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints for policy management.
//!
//! These endpoints require a role with `container.administrator: true` and
//! provide:
//! - The current (cached) policy document
//! - Replacing the policy document on disk
//! - Reloading the cache from disk after an out-of-band edit

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{AckResponse, ConfigResponse},
    policy::{PolicyResult, PolicyStore},
    state::AppState,
};

/// Run a policy file operation on the blocking pool.
async fn with_policy<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&PolicyStore) -> PolicyResult<T> + Send + 'static,
{
    let policy = Arc::clone(&state.policy);
    tokio::task::spawn_blocking(move || op(&policy))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Policy task panicked");
            ApiError::internal("Policy operation failed.")
        })?
        .map_err(ApiError::from)
}

/// Return the cached policy document.
#[utoipa::path(
    get,
    path = "/api/admin/config",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current policy", body = ConfigResponse),
        (status = 401, description = "Missing or unknown token"),
        (status = 403, description = "Admin permission required")
    )
)]
pub async fn get_config(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Json<ConfigResponse> {
    let snapshot = state.policy.cached();
    Json(ConfigResponse::new(snapshot.document().clone()))
}

/// Replace the policy document and reload it.
///
/// Any well-formed JSON document is accepted and stored as given; fields of
/// an unexpected type are ignored by authorization. It takes effect for the
/// next request.
#[utoipa::path(
    post,
    path = "/api/admin/config",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body(content = Object, description = "Complete policy document"),
    responses(
        (status = 200, description = "Policy written and reloaded", body = AckResponse),
        (status = 400, description = "Body is not JSON"),
        (status = 401, description = "Missing or unknown token"),
        (status = 403, description = "Admin permission required"),
        (status = 500, description = "Policy could not be written")
    )
)]
pub async fn update_config(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AckResponse>, ApiError> {
    let Json(document) = payload?;

    with_policy(&state, move |policy| policy.persist_and_reload(&document)).await?;
    tracing::info!(role = %admin.role, "Policy replaced through admin API");

    Ok(Json(AckResponse::new("Config updated and reloaded.")))
}

/// Re-read the policy document into the cache.
#[utoipa::path(
    post,
    path = "/api/admin/config/reload",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Policy reloaded", body = AckResponse),
        (status = 401, description = "Missing or unknown token"),
        (status = 403, description = "Admin permission required"),
        (status = 500, description = "Policy could not be read")
    )
)]
pub async fn reload_config(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<AckResponse>, ApiError> {
    with_policy(&state, PolicyStore::reload).await?;
    Ok(Json(AckResponse::new("Config reloaded.")))
}
