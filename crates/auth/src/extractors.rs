//! Axum extractors for authentication
//!
//! Generic over any state `S` where `AuthBackend: FromRef<S>`.
//! This is axum's idiomatic nested-state pattern.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::backend::AuthBackend;
use crate::context::CallerIdentity;
use crate::error::AuthError;
use crate::jwt::extract_bearer_token;

/// Authenticated caller extractor. Rejects with 401 when no valid token is sent.
#[derive(Debug)]
pub struct AuthUser(pub CallerIdentity);

impl<S> FromRequestParts<S> for AuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = extract_bearer_token(auth_header)?;
        let identity = backend.authenticate_jwt(&token)?;

        Ok(AuthUser(identity))
    }
}

/// Optional caller extractor for anonymous-friendly endpoints.
///
/// A missing header yields `None`; a header that is present but invalid
/// is still rejected so a broken token is never silently treated as a guest.
#[derive(Debug)]
pub struct MaybeAuthUser(pub Option<CallerIdentity>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }

        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        Ok(MaybeAuthUser(Some(identity)))
    }
}
