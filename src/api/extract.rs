//! Request authentication.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, StatusCode};

use crate::models::User;

use super::AppState;

/// The authenticated caller, resolved from a `Bearer` token.
///
/// Rejects with 401 when the header is missing or malformed, the signature
/// or expiry check fails, or the asserted user no longer exists.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match header {
            Some(h) if h.starts_with("Bearer ") => &h[7..],
            _ => return Err(unauthorized()),
        };

        let user_id = state.auth.verify(token).ok_or_else(unauthorized)?;
        let user = state
            .store
            .get_by_id::<User>(user_id)
            .ok_or_else(unauthorized)?;

        Ok(AuthUser(user))
    }
}

fn unauthorized() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}
