use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Validate JWT token and extract claims
pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;

    if token_data.claims.sub.trim().is_empty() {
        anyhow::bail!("JWT token has an empty subject");
    }
    Ok(token_data.claims)
}

/// Выпустить токен для владельца (служебные скрипты и тесты)
pub fn issue_token(
    owner_id: &str,
    email: Option<&str>,
    secret: &str,
    lifetime: chrono::Duration,
) -> Result<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: owner_id.to_string(),
        email: email.map(str::to_string),
        exp: (now + lifetime).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_wrong_secret() {
        let token = issue_token("u1", Some("a@b.c"), "secret", chrono::Duration::hours(1)).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));

        assert!(validate_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token("u1", None, "secret", chrono::Duration::hours(-2)).unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }
}
