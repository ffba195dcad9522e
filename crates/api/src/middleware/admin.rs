//! Admin token extractor for Axum handlers.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use chooseme_core::error::CoreError;
use chooseme_core::login_throttle::client_ip;

use crate::auth::jwt::{validate_token, Claims, ROLE_ADMIN};
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Requires a valid admin token. Rejects with 401 otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(claims): RequireAdmin) -> AppResult<Json<()>> {
///     tracing::info!(jti = %claims.jti, "handling admin request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Claims);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing admin token. Include 'x-admin-token' header.".into(),
                ))
            })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            tracing::warn!("Invalid admin token attempt");
            AppError::Core(CoreError::Unauthorized("Invalid admin token".into()))
        })?;

        if claims.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(claims))
    }
}

/// Client IP for login throttling: proxy headers first, then the socket peer.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(client_ip(
            header("x-forwarded-for"),
            header("x-real-ip"),
            peer,
        )))
    }
}
