//! Identity extraction from the `Authorization` header.
//!
//! Supports `Authorization: Bearer <token>` and a bare token. Tokens resolve
//! against the table in `AppState`; an unknown token is rejected even on
//! routes that allow anonymous access.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::domain::UserId;
use crate::error::ApiError;
use crate::state::AppState;

/// Optional identity: `None` for anonymous requests.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<UserId>);

/// Required identity; rejects with 401 when absent.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

fn extract_token(parts: &Parts) -> Result<Option<String>, ApiError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let raw = header.to_str().map_err(|_| ApiError::Unauthorized)?.trim();
    let token = match raw.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ if raw.eq_ignore_ascii_case("bearer") => "",
        _ => raw,
    };
    if token.is_empty() {
        return Err(ApiError::Unauthorized);
    }
    Ok(Some(token.to_string()))
}

fn resolve(parts: &Parts, state: &AppState) -> Result<Option<UserId>, ApiError> {
    match extract_token(parts)? {
        None => Ok(None),
        Some(token) => match state.user_for_token(&token) {
            Some(user) => Ok(Some(user.id)),
            None => {
                debug!(target: "quiz", "Rejected unknown token");
                Err(ApiError::Unauthorized)
            }
        },
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        resolve(parts, state).map(Viewer)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        resolve(parts, state)?.map(AuthUser).ok_or(ApiError::Unauthorized)
    }
}
