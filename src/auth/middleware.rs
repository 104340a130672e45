use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use super::guard::require_admin;
use super::service_key::API_KEY_HEADER;
use super::session_token::{SessionTokens, token_lookup};
use crate::error::Error;
use crate::server::AppState;
use crate::types::User;

/// Extractor that requires the service key (`x-api-key`).
pub struct ServiceKey;

/// Extractor that requires a valid, unbanned user session.
pub struct SessionUser(pub User);

/// Extractor that resolves a session when one is presented.
pub struct OptionalSession(pub Option<User>);

/// Extractor that requires the service key and an admin session, in that order.
pub struct RequireAdmin(pub User);

#[derive(Debug)]
pub enum AuthError {
    MissingServiceKey,
    InvalidServiceKey,
    MissingSession,
    InvalidScheme,
    InvalidSession,
    SessionExpired,
    Banned,
    Forbidden(String),
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingServiceKey => (
                StatusCode::UNAUTHORIZED,
                "API key is required. Provide the x-api-key header".to_string(),
            ),
            AuthError::InvalidServiceKey => {
                (StatusCode::FORBIDDEN, "Invalid API key".to_string())
            }
            AuthError::MissingSession => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            AuthError::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization scheme".to_string(),
            ),
            AuthError::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid session".to_string()),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired".to_string()),
            AuthError::Banned => (StatusCode::FORBIDDEN, "Account is banned".to_string()),
            AuthError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AuthError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                HeaderValue::from_static("Bearer realm=\"adaverse\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for ServiceKey {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        check_service_key(parts, state)?;
        Ok(ServiceKey)
    }
}

impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_session(parts, state)?.ok_or(AuthError::MissingSession)?;
        Ok(SessionUser(user))
    }
}

impl FromRequestParts<Arc<AppState>> for OptionalSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalSession(resolve_session(parts, state)?))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        check_service_key(parts, state)?;

        let user = resolve_session(parts, state)?.ok_or(AuthError::MissingSession)?;

        require_admin(&user).map_err(|e| match e {
            Error::Forbidden(message) => AuthError::Forbidden(message),
            _ => AuthError::InternalError,
        })?;

        Ok(RequireAdmin(user))
    }
}

fn check_service_key(parts: &Parts, state: &AppState) -> Result<(), AuthError> {
    let presented = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    state.service_key.check(presented).map_err(|e| match e {
        Error::Unauthenticated => {
            tracing::warn!("Request blocked: no API key provided");
            AuthError::MissingServiceKey
        }
        Error::Forbidden(_) => {
            tracing::warn!("Request blocked: invalid API key provided");
            AuthError::InvalidServiceKey
        }
        _ => AuthError::InternalError,
    })
}

/// Resolves the bearer session on the request.
/// Returns `Ok(None)` when no Authorization header is present.
fn resolve_session(parts: &Parts, state: &AppState) -> Result<Option<User>, AuthError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let raw_token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::InvalidScheme)?
        .trim();

    let lookup = token_lookup(raw_token).ok_or(AuthError::InvalidSession)?;

    let session = state
        .store
        .get_session_by_lookup(lookup)
        .map_err(|e| {
            tracing::error!("Failed to look up session: {e}");
            AuthError::InternalError
        })?
        .ok_or(AuthError::InvalidSession)?;

    let tokens = SessionTokens::new();
    if !tokens
        .verify(raw_token, &session.token_hash)
        .map_err(|_| AuthError::InternalError)?
    {
        return Err(AuthError::InvalidSession);
    }

    if let Some(expires_at) = &session.expires_at {
        if expires_at < &Utc::now() {
            return Err(AuthError::SessionExpired);
        }
    }

    let user = state
        .store
        .get_user(&session.user_id)
        .map_err(|e| {
            tracing::error!("Failed to load session user: {e}");
            AuthError::InternalError
        })?
        .ok_or(AuthError::InvalidSession)?;

    if user.banned {
        return Err(AuthError::Banned);
    }

    Ok(Some(user))
}
