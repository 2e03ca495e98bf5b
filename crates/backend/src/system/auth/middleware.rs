use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::system::app_state::AppState;

/// Middleware that requires a valid JWT; the `sub` claim is the record owner
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = super::jwt::validate_token(token, &state.config.auth.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected bearer token: {:#}", e);
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
