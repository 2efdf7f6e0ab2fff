//! Identity of an authenticated caller

use crate::claims::IdentityClaims;

/// The caller behind a request, as asserted by a validated token.
///
/// `subject` is the stable key used to resolve (or lazily create) the
/// conversation owner record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub subject: String,
    pub email: Option<String>,
}

impl CallerIdentity {
    pub fn new(subject: impl Into<String>, email: Option<String>) -> Self {
        Self {
            subject: subject.into(),
            email,
        }
    }
}

impl From<IdentityClaims> for CallerIdentity {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email.filter(|e| !e.trim().is_empty()),
        }
    }
}
