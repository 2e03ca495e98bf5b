use serde::{Deserialize, Serialize};

/// Claims of the bearer token issued by the identity provider.
/// `sub` is the owner id every record operation is scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String, // owner id
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize, // expiration timestamp
    #[serde(default)]
    pub iat: usize,
}
