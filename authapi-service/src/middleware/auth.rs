use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{models::User, AppState};

/// Pulls the key out of `Token <key>` or `Bearer <key>`.
fn token_from_header(value: &HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();
    let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known && !key.is_empty()).then_some(key)
}

/// Resolves the `Authorization` header to an active user.
///
/// No header: the request continues anonymously and each route decides.
/// A header that does not resolve is rejected outright.
pub async fn token_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => Some(token_from_header(value).map(str::to_owned).ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Invalid Authorization header."))
        })?),
    };

    if let Some(key) = key {
        let user = state.auth.resolve_user(&key).await?.ok_or_else(|| {
            tracing::debug!("Rejected unknown or inactive token");
            AppError::Unauthorized(anyhow::anyhow!("Invalid token."))
        })?;

        req.extensions_mut().insert(CurrentUser(user));
    }

    Ok(next.run(req).await)
}

/// Request extension set by [`token_auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Requires an authenticated user, else 401.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| AuthUser(current.0.clone()))
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Authentication credentials were not provided."
                ))
            })
    }
}

/// The authenticated user when there is one; never rejects.
pub struct MaybeUser(pub Option<User>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<CurrentUser>()
                .map(|current| current.0.clone()),
        ))
    }
}
