//! JWT claims, issuance, and verification: HS256 via `jsonwebtoken`, with a
//! short 30-minute session lifetime.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    iat: i64,
    exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or its signature does not verify")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

pub fn issue_token(user_id: i64, secret: &[u8]) -> Result<String, TokenError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + TOKEN_TTL.as_secs() as i64,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).map_err(Into::into)
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<i64, TokenError> {
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())?;
    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_user_id() {
        let secret = b"test-secret";
        let token = issue_token(42, secret).unwrap();
        assert_eq!(verify_token(&token, secret).unwrap(), 42);
    }

    #[test]
    fn rejects_tampering() {
        let token = issue_token(1, b"secret-a").unwrap();
        let err = verify_token(&token, b"secret-b").unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }
}
