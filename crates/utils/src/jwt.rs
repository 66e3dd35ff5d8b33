use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is empty")]
    MissingSubject,
}

/// Claims carried by a user bearer token. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Validates an HS256 bearer token and returns its claims.
pub fn decode_user_token(token: &str, secret: &[u8]) -> Result<UserClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<UserClaims>(token, &DecodingKey::from_secret(secret), &validation)?;
    if data.claims.sub.trim().is_empty() {
        return Err(TokenError::MissingSubject);
    }
    Ok(data.claims)
}

/// Issues an HS256 token for `user_id` that expires after `ttl`.
pub fn issue_user_token(user_id: &str, ttl: Duration, secret: &[u8]) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = UserClaims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn issued_token_round_trips() {
        let token = issue_user_token("user-1", Duration::hours(1), SECRET).unwrap();
        let claims = decode_user_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_user_token("user-1", Duration::hours(1), SECRET).unwrap();
        assert!(decode_user_token(&token, b"other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_user_token("user-1", Duration::hours(-2), SECRET).unwrap();
        assert!(matches!(
            decode_user_token(&token, SECRET),
            Err(TokenError::Invalid(_))
        ));
    }
}
