use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::jwt::verify_token;
use crate::domain::drone::DroneId;

/// Caller extractor for transaction routes
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(
///     CallerAuth(drone): CallerAuth,
/// ) -> Result<String, ApiError> {
///     Ok(format!("Hello {}", drone))
/// }
/// ```
pub struct CallerAuth(pub DroneId);

/// Caller extractor for read routes; absent header yields `None`,
/// a present but invalid token is still rejected
pub struct OptionalCallerAuth(pub Option<DroneId>);

fn bearer(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let header = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("Malformed authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>"))
}

fn caller(token: &str, state: &AppState) -> Result<DroneId, ApiError> {
    verify_token(token, &state.jwt_secret)
        .map(|claims| claims.sub)
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))
}

#[async_trait]
impl FromRequestParts<AppState> for CallerAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;
        Ok(CallerAuth(caller(token, state)?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalCallerAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let drone = match bearer(parts)? {
            Some(token) => Some(caller(token, state)?),
            None => None,
        };
        Ok(OptionalCallerAuth(drone))
    }
}
