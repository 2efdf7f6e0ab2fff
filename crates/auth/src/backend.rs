//! Concrete authentication backend
//!
//! Wraps `AuthConfig` and turns a raw bearer token into a `CallerIdentity`.

use crate::config::AuthConfig;
use crate::context::CallerIdentity;
use crate::error::AuthError;

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthBackend {
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a bearer token and return the identity it asserts.
    pub fn authenticate_jwt(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let claims = crate::jwt::validate_jwt_token(token, &self.config)?;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }

        Ok(CallerIdentity::from(claims))
    }
}
