// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File API endpoints.
//!
//! Every handler runs the same pipeline: bearer token (`Auth`), permission
//! for the action at the target path against a freshly loaded policy, then
//! the quota-enforcing store on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use base64ct::{Base64, Encoding};

use crate::{
    auth::{authorize, Auth, FileAction},
    error::ApiError,
    models::{DeleteRequest, FileListResponse, ListQuery, ReceiptResponse, UploadRequest},
    state::AppState,
    storage::{FileStore, StoreResult},
};

/// Run a store operation on the blocking pool.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&FileStore) -> StoreResult<T> + Send + 'static,
{
    let files = Arc::clone(&state.files);
    tokio::task::spawn_blocking(move || op(&files))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Storage task panicked");
            ApiError::internal("Storage operation failed.")
        })?
        .map_err(ApiError::from)
}

/// Upload a base64-encoded file.
///
/// Overwrites any existing file at the same path. The existing file still
/// counts toward used space during the quota check.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "Files",
    security(("bearer_auth" = [])),
    request_body = UploadRequest,
    responses(
        (status = 200, description = "File uploaded", body = ReceiptResponse),
        (status = 400, description = "Missing fields, bad base64 or invalid path"),
        (status = 401, description = "Missing or unknown token"),
        (status = 403, description = "Permission denied"),
        (status = 413, description = "File too large or quota exceeded")
    )
)]
pub async fn upload(
    Auth(caller): Auth,
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let Json(request) = payload?;
    let (Some(file), Some(path)) = (
        request.file.filter(|f| !f.is_empty()),
        request.path.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Missing file or path."));
    };

    let policy = state.policy.fetch().await?;
    authorize(&policy, &caller.role, FileAction::Upload, &path)?;

    let content = Base64::decode_vec(file.trim())
        .map_err(|_| ApiError::bad_request("File content is not valid base64."))?;
    let limits = policy.quota_for(&caller.role);

    let receipt = with_store(&state, move |files| files.upload(&limits, &path, &content)).await?;

    Ok(Json(ReceiptResponse::new("File uploaded.", receipt)))
}

/// Delete a single file.
#[utoipa::path(
    post,
    path = "/api/files/delete",
    tag = "Files",
    security(("bearer_auth" = [])),
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "File deleted", body = ReceiptResponse),
        (status = 400, description = "Missing or invalid path"),
        (status = 401, description = "Missing or unknown token"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete(
    Auth(caller): Auth,
    State(state): State<AppState>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let Json(request) = payload?;
    let Some(path) = request.path.filter(|p| !p.is_empty()) else {
        return Err(ApiError::bad_request("Missing path."));
    };

    let policy = state.policy.fetch().await?;
    authorize(&policy, &caller.role, FileAction::Delete, &path)?;

    let receipt = with_store(&state, move |files| files.delete(&path)).await?;

    Ok(Json(ReceiptResponse::new("File deleted.", receipt)))
}

/// Recursive listing of a directory.
#[utoipa::path(
    get,
    path = "/api/files/list",
    tag = "Files",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Directory tree", body = FileListResponse),
        (status = 400, description = "Invalid path"),
        (status = 401, description = "Missing or unknown token"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Directory not found")
    )
)]
pub async fn list(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    let dir = query.dir.unwrap_or_default();

    let policy = state.policy.fetch().await?;
    authorize(&policy, &caller.role, FileAction::View, &dir)?;

    let files = with_store(&state, move |files| files.list(&dir)).await?;

    Ok(Json(FileListResponse::new(files)))
}
