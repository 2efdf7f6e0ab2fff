//! JWT claims types

use serde::{Deserialize, Serialize};

/// Claims carried by the storefront's identity token
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (stable external user identifier)
    pub sub: String,
    /// Email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}
