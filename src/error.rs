// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::policy::PolicyError;
use crate::storage::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    success: bool,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidPath => ApiError::bad_request(e.to_string()),
            StoreError::FileTooLarge { .. } | StoreError::QuotaExceeded { .. } => {
                ApiError::payload_too_large(e.to_string())
            }
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::Io(ref source) => {
                tracing::error!(error = %source, "Storage operation failed");
                ApiError::internal("Storage operation failed.")
            }
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(e: PolicyError) -> Self {
        tracing::error!(error = %e, "Container configuration unavailable");
        ApiError::internal("Container configuration unavailable.")
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::new(e.status_code(), e.to_string())
    }
}

/// An over-limit body stays 413; every other body problem is a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::payload_too_large("Request body too large.");
        }
        ApiError::bad_request(format!("Malformed request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.status.as_u16(),
            success: false,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::FromRequest,
        http::{header::CONTENT_TYPE, Request},
    };
    use serde_json::Value;

    async fn json_rejection(body: Vec<u8>) -> JsonRejection {
        let request = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        Json::<Value>::from_request(request, &()).await.unwrap_err()
    }

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let big = ApiError::payload_too_large("big");
        assert_eq!(big.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn store_errors_map_to_http_statuses() {
        assert_eq!(ApiError::from(StoreError::InvalidPath).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(StoreError::FileTooLarge { size: 2, limit: 1 }).status,
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::from(StoreError::QuotaExceeded { used: 1, size: 2, limit: 2 }).status,
            StatusCode::PAYLOAD_TOO_LARGE
        );
        let nf = ApiError::from(StoreError::NotFound("File not found."));
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "File not found.");

        let io = ApiError::from(StoreError::Io(std::io::Error::other("disk on fire")));
        assert_eq!(io.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!io.message.contains("disk on fire"));
    }

    #[test]
    fn auth_errors_keep_status_and_message() {
        let err = ApiError::from(AuthError::PermissionDenied("no"));
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "no");
    }

    #[tokio::test]
    async fn oversized_json_body_is_413() {
        // Past axum's default 2MB extractor limit.
        let mut body = b"\"".to_vec();
        body.extend(std::iter::repeat_n(b'a', 3 * 1024 * 1024));
        body.push(b'"');

        let err = ApiError::from(json_rejection(body).await);
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.message, "Request body too large.");
    }

    #[tokio::test]
    async fn syntax_errors_are_400() {
        let err = ApiError::from(json_rejection(b"{ nope".to_vec()).await);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.starts_with("Malformed request body:"));
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"code":400,"success":false,"message":"bad data"}"#);
    }
}
