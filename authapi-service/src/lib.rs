pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use metrics_exporter_prometheus::PrometheusHandle;
use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Json, Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::ApiConfig;
use crate::dtos::Links;
use crate::services::{AuthService, Store};
use service_core::error::AppError;
use std::sync::Arc;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::tokens::create_token,
        handlers::tokens::current_user,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::organizations::list_organizations,
        handlers::organizations::create_organization,
        handlers::organizations::get_organization,
        handlers::organizations::update_organization,
        handlers::organizations::archive_organization,
        handlers::organizations::list_organization_users,
        handlers::organizations::add_organization_user,
        handlers::organizations::remove_organization_user,
        handlers::teams::list_teams,
        handlers::teams::create_team,
        handlers::teams::get_team,
        handlers::teams::update_team,
        handlers::teams::archive_team,
        handlers::teams::list_team_users,
        handlers::teams::add_team_user,
        handlers::teams::remove_team_user,
        handlers::permissions::list_permissions,
        handlers::permissions::create_permission,
        handlers::permissions::delete_permission,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::ResourceRef,
            dtos::auth::TokenRequest,
            dtos::auth::TokenResponse,
            dtos::auth::CurrentUserResponse,
            dtos::user::UserResponse,
            dtos::user::CreateUserRequest,
            dtos::user::UpdateUserRequest,
            dtos::organization::OrganizationResponse,
            dtos::organization::CreateOrganizationRequest,
            dtos::organization::UpdateOrganizationRequest,
            dtos::organization::MemberRequest,
            dtos::team::TeamResponse,
            dtos::team::CreateTeamRequest,
            dtos::team::UpdateTeamRequest,
            dtos::permission::PermissionResponse,
            dtos::permission::CreatePermissionRequest,
            handlers::health::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Tokens", description = "Login and the caller's effective permissions"),
        (name = "Users", description = "User accounts"),
        (name = "Organizations", description = "Organizations and their members"),
        (name = "Teams", description = "Teams within an organization"),
        (name = "Permissions", description = "Permissions granted by teams"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // `Authorization: Token <key>`
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub links: Links,
    pub token_rate_limiter: IpRateLimiter,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: ApiConfig, store: Arc<dyn Store>, metrics: Option<PrometheusHandle>) -> Self {
        let token_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.token_attempts,
            config.rate_limit.token_window_seconds,
        );
        Self {
            auth: AuthService::new(store.clone()),
            links: Links::new(config.public_url.clone()),
            store,
            token_rate_limiter,
            metrics,
            config,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = allowed_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    // Login is the only brute-forceable route
    let token_route = Router::new()
        .route("/user/tokens", post(handlers::tokens::create_token))
        .layer(from_fn_with_state(
            state.token_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let org_routes = Router::new()
        .route(
            "/organizations",
            get(handlers::organizations::list_organizations)
                .post(handlers::organizations::create_organization),
        )
        .route(
            "/organizations/:org_id",
            get(handlers::organizations::get_organization)
                .put(handlers::organizations::update_organization)
                .patch(handlers::organizations::update_organization)
                .delete(handlers::organizations::archive_organization),
        )
        .route(
            "/organizations/:org_id/users",
            get(handlers::organizations::list_organization_users)
                .post(handlers::organizations::add_organization_user),
        )
        .route(
            "/organizations/:org_id/users/:user_id",
            delete(handlers::organizations::remove_organization_user),
        )
        .route(
            "/organizations/:org_id/teams",
            get(handlers::teams::list_teams).post(handlers::teams::create_team),
        )
        .route(
            "/organizations/:org_id/teams/:team_id",
            get(handlers::teams::get_team)
                .put(handlers::teams::update_team)
                .patch(handlers::teams::update_team)
                .delete(handlers::teams::archive_team),
        )
        .route(
            "/organizations/:org_id/teams/:team_id/users",
            get(handlers::teams::list_team_users).post(handlers::teams::add_team_user),
        )
        .route(
            "/organizations/:org_id/teams/:team_id/users/:user_id",
            delete(handlers::teams::remove_team_user),
        )
        .route(
            "/organizations/:org_id/teams/:team_id/permissions",
            get(handlers::permissions::list_permissions)
                .post(handlers::permissions::create_permission),
        )
        .route(
            "/organizations/:org_id/teams/:team_id/permissions/:permission_id",
            delete(handlers::permissions::delete_permission),
        );

    let api = Router::new()
        .route("/user", get(handlers::tokens::current_user))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/:user_id",
            get(handlers::users::get_user).patch(handlers::users::update_user),
        )
        .merge(org_routes)
        .merge(token_route)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::token_auth_middleware,
        ));

    let cors = cors_layer(&state.config.security.allowed_origins)?;

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(api)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}
