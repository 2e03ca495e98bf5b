use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use contracts::system::auth::TokenClaims;

/// Владелец записей из JWT (claim `sub`)
/// Usage in handlers: `async fn handler(owner: CurrentOwner) -> Response`
pub struct CurrentOwner(pub TokenClaims);

impl CurrentOwner {
    pub fn owner_id(&self) -> &str {
        &self.0.sub
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentOwner
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Claims are put into extensions by require_auth
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .map(CurrentOwner)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
