// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::{
    error::ApiError,
    models::{RequestTokenRequest, TokenResponse},
    state::AppState,
};

/// Exchange a role and the admin key for a bearer token.
///
/// The role is checked against the freshly loaded policy before the key,
/// so an undeclared role is always a 400.
#[utoipa::path(
    post,
    path = "/api/auth/request-token",
    tag = "Auth",
    request_body = RequestTokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid or missing role"),
        (status = 403, description = "Invalid or missing admin key")
    )
)]
pub async fn request_token(
    State(state): State<AppState>,
    payload: Result<Json<RequestTokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload?;
    let policy = state.policy.fetch().await?;

    let token = state
        .tokens
        .issue(
            &policy,
            request.role.as_deref().unwrap_or_default(),
            request.admin_key.as_deref(),
        )
        .await?;

    Ok(Json(TokenResponse::new(token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, ADMIN_KEY};
    use axum::http::StatusCode;

    fn request(role: Option<&str>, admin_key: Option<&str>) -> Json<RequestTokenRequest> {
        Json(RequestTokenRequest {
            role: role.map(str::to_string),
            admin_key: admin_key.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn issues_token_for_declared_role() {
        let (state, _temp_dir) = test_state();

        let Json(response) = request_token(
            State(state.clone()),
            Ok(request(Some("editor"), Some(ADMIN_KEY))),
        )
        .await
        .expect("token issued");

        assert!(response.success);
        assert_eq!(response.code, 200);
        assert_eq!(
            state.tokens.validate(&response.token).await.as_deref(),
            Some("editor")
        );
    }

    #[tokio::test]
    async fn undeclared_or_missing_role_is_400() {
        let (state, _temp_dir) = test_state();

        for role in [Some("ghost"), None] {
            let err = request_token(State(state.clone()), Ok(request(role, Some(ADMIN_KEY))))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.message, "Invalid or missing role.");
        }
    }

    #[tokio::test]
    async fn wrong_key_is_403_with_role_specific_message() {
        let (state, _temp_dir) = test_state();

        let err = request_token(State(state.clone()), Ok(request(Some("admin"), Some("nope"))))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Invalid admin key.");

        let err = request_token(State(state), Ok(request(Some("editor"), None)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Admin key required.");
    }
}
