use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use domain::UserId;
use tracing::warn;

/// `Authorization: Bearer <jwt>` から解決した呼び出し元
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Err(ApiError::Unauthorized("Not authorized, no token".to_string()));
        };

        state
            .auth
            .authenticate(header.to_str().ok())
            .map(AuthUser)
            .map_err(|e| {
                warn!(error = %e, "Bearer token rejected");
                ApiError::from(e)
            })
    }
}

/// 不正な JSON を 400 の `{"success": false, ...}` に変換する `Json`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
