use std::sync::Arc;

use axum::{
    extract::State,
    middleware::Next,
    response::Response,
    body::Body,
};
use hmac::{Hmac, Mac};
use http::{HeaderMap, Request};
use sha2::Sha256;
use tracing::warn;

use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_value = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// Resolves the caller from the bearer token and stores the `User` in request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let user = validate_token(token, &config.supabase_jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Guards scheduler triggers with the shared `CRON_SECRET`.
pub async fn cron_secret_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    if config.cron_secret.is_empty() || !secret_matches(token, &config.cron_secret) {
        warn!("Rejected scheduler trigger with invalid credential");
        return Err(AppError::Auth("Invalid cron credential".to_string()));
    }

    Ok(next.run(request).await)
}

/// Constant-time comparison: both values are MACed so neither content nor
/// length of the expected secret leaks through timing.
fn secret_matches(presented: &str, expected: &str) -> bool {
    let tag = |value: &str| {
        Hmac::<Sha256>::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(value.as_bytes());
            mac
        })
    };

    match (tag(presented), tag(expected)) {
        (Ok(presented), Ok(expected)) => presented
            .verify_slice(&expected.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_matches_only_exact_value() {
        assert!(secret_matches("cron-secret", "cron-secret"));
        assert!(!secret_matches("cron-secreT", "cron-secret"));
        assert!(!secret_matches("cron-secre", "cron-secret"));
        assert!(!secret_matches("cron-secret-longer", "cron-secret"));
        assert!(!secret_matches("", "cron-secret"));
    }
}
