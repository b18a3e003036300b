// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unauthenticated informational endpoints.

use axum::{extract::State, Json};

use crate::models::{IndexResponse, InstanceResponse, PublicInstance};
use crate::state::AppState;

/// Liveness banner.
#[utoipa::path(
    get,
    path = "/",
    tag = "Instance",
    responses(
        (status = 200, description = "Server is running", body = IndexResponse)
    )
)]
pub async fn index(State(state): State<AppState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        code: 200,
        success: true,
        message: "Asteroid Container Management Server running.".to_string(),
        container: state.policy.cached().document().get("name").cloned(),
    })
}

/// Public description of this container, from the cached policy.
#[utoipa::path(
    get,
    path = "/api/about-instance",
    tag = "Instance",
    responses(
        (status = 200, description = "Public container description", body = InstanceResponse)
    )
)]
pub async fn about_instance(State(state): State<AppState>) -> Json<InstanceResponse> {
    let snapshot = state.policy.cached();
    Json(InstanceResponse::new(PublicInstance::from(snapshot.document())))
}
