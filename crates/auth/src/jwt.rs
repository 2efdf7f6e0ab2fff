//! JWT validation and token extraction helpers

use axum::http::HeaderValue;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::claims::IdentityClaims;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Validate an identity token issued by the storefront
pub(crate) fn validate_jwt_token(
    token: &str,
    config: &AuthConfig,
) -> Result<IdentityClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);

    if let Some(aud) = &config.audience {
        validation.set_audience(&[aud]);
    } else {
        validation.validate_aud = false;
    }

    if let Some(iss) = &config.issuer {
        validation.set_issuer(&[iss]);
    }

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_ref());

    let token_data = decode::<IdentityClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        AuthError::InvalidToken
    })?;

    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
pub(crate) fn extract_bearer_token(header: &HeaderValue) -> Result<String, AuthError> {
    let header_str = header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorizationFormat)?;

    match header_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AuthError::InvalidAuthorizationFormat),
    }
}
