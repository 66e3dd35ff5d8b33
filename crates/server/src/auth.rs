use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use utils::jwt::decode_user_token;

use crate::{AppState, error::ApiError};

/// The signed-in user, taken from an `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let secret = state
            .jwt_secret()
            .ok_or(ApiError::Unauthorized("authentication is not configured"))?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized("missing bearer token"))?;

        let claims = decode_user_token(token, secret.as_bytes())?;
        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}
