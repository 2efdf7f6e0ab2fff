//! Authentication for the Tokochat chat API
//!
//! Validates bearer tokens and exposes axum extractors that work with any
//! domain state implementing `FromRef<S>` for `AuthBackend`. Owner records
//! are not touched here: the extractors only yield the caller's stable
//! external identity, and the conversations domain provisions owners from it.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;

pub use backend::AuthBackend;
pub use claims::IdentityClaims;
pub use config::AuthConfig;
pub use context::CallerIdentity;
pub use error::AuthError;
pub use extractors::{AuthUser, MaybeAuthUser};
