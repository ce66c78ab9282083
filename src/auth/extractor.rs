//! Axum extractor resolving a request to an authenticated user id, reading
//! the `jwt` session cookie. Rejects with `Unauthorized` before the handler
//! runs if the cookie is missing or the token doesn't verify.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use super::token::verify_token;
use crate::error::AppError;

pub const COOKIE_NAME: &str = "jwt";

/// The authenticated user id, extractable directly as a handler argument.
pub struct AuthUser(pub i64);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Vec<u8>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or(AppError::Unauthorized)?;

        let secret = Vec::<u8>::from_ref(state);
        let user_id = verify_token(&token, &secret).map_err(|_| AppError::Unauthorized)?;
        Ok(AuthUser(user_id))
    }
}
