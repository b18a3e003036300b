// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        request::Parts,
        HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        AckResponse, ConfigResponse, DeleteRequest, FileListResponse, IndexResponse,
        InstanceResponse, PublicInstance, ReceiptResponse, RequestTokenRequest, TokenResponse,
        UploadRequest,
    },
    policy::PolicyStore,
    state::AppState,
    storage::StorageNode,
};

pub mod admin;
pub mod auth;
pub mod files;
pub mod instance;

/// Largest accepted request body. Uploads arrive base64-encoded, so the
/// largest storable file is about three quarters of this.
pub const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    router_with_body_limit(state, MAX_REQUEST_BODY_BYTES)
}

/// [`router`] with a custom request body limit.
pub fn router_with_body_limit(state: AppState, body_limit: usize) -> Router {
    let cors = cors_layer(Arc::clone(&state.policy));
    let origin_guard =
        middleware::from_fn_with_state(Arc::clone(&state.policy), refuse_denied_origins);

    let api_routes = Router::new()
        .route("/auth/request-token", post(auth::request_token))
        .route("/files/upload", post(files::upload))
        .route("/files/delete", post(files::delete))
        .route("/files/list", get(files::list))
        .route(
            "/admin/config",
            get(admin::get_config).post(admin::update_config),
        )
        .route("/admin/config/reload", post(admin::reload_config))
        .route("/about-instance", get(instance::about_instance));

    Router::new()
        .route("/", get(instance::index))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(origin_guard)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// CORS driven by the cached policy's request-domain lists, so a reload
/// changes the allowed origins without a restart. Requests without an
/// `Origin` header are not affected. Preflights from a refused origin get
/// no allow headers; other requests from it are stopped by
/// [`refuse_denied_origins`].
fn cors_layer(policy: Arc<PolicyStore>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| policy.cached().policy().origin_allowed(origin))
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Reject requests whose `Origin` the cached policy refuses, before any
/// handler runs.
async fn refuse_denied_origins(
    State(policy): State<Arc<PolicyStore>>,
    request: Request,
    next: Next,
) -> Response {
    let refused = request.headers().get(ORIGIN).filter(|origin| {
        !origin
            .to_str()
            .is_ok_and(|origin| policy.cached().policy().origin_allowed(origin))
    });
    if let Some(origin) = refused {
        tracing::warn!(origin = ?origin, "Request origin refused");
        return ApiError::new(StatusCode::FORBIDDEN, "Origin not allowed.").into_response();
    }

    next.run(request).await
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::request_token,
        files::upload,
        files::delete,
        files::list,
        admin::get_config,
        admin::update_config,
        admin::reload_config,
        instance::index,
        instance::about_instance
    ),
    components(
        schemas(
            RequestTokenRequest,
            TokenResponse,
            UploadRequest,
            DeleteRequest,
            ReceiptResponse,
            FileListResponse,
            StorageNode,
            AckResponse,
            ConfigResponse,
            PublicInstance,
            InstanceResponse,
            IndexResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Bearer token issuance"),
        (name = "Files", description = "Quota-enforced file operations"),
        (name = "Admin", description = "Policy management"),
        (name = "Instance", description = "Public container information")
    )
)]
struct ApiDoc;
