//! JWT claims shared by token minting and the extraction middleware.

use serde::{Deserialize, Serialize};

/// Claims in backend-issued access tokens; inserted into request
/// extensions by `JwtExtract`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BackendClaims {
    /// External user identifier (users.sub)
    pub sub: String,
    pub email: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}
