//! Authentication middleware.
//!
//! Bearer token extraction. The token identifies the acting principal and is
//! written to every audit event the request produces; deciding what that
//! principal may do is left to the deployment in front of the server.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};

use crate::AppState;

/// Actor recorded when no token is configured or supplied.
pub const ANONYMOUS: &str = "anonymous";

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The bearer token, or [`ANONYMOUS`]
    pub token: String,
}

impl AuthUser {
    /// Principal written to audit events.
    pub fn actor(&self) -> &str {
        &self.token
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        authenticate(auth_header, state.config.auth_secret.is_some())
    }
}

/// Resolve the caller from an `Authorization` header value.
fn authenticate(
    auth_header: Option<&str>,
    token_required: bool,
) -> Result<AuthUser, (StatusCode, &'static str)> {
    match auth_header {
        Some(header) if header.starts_with("Bearer ") => {
            let token = header.trim_start_matches("Bearer ").trim().to_string();
            if token.is_empty() {
                return Err((StatusCode::UNAUTHORIZED, "Empty bearer token"));
            }
            Ok(AuthUser { token })
        }
        Some(_) => Err((
            StatusCode::UNAUTHORIZED,
            "Invalid authorization header format",
        )),
        None if token_required => Err((StatusCode::UNAUTHORIZED, "Missing authorization header")),
        None => Ok(AuthUser {
            token: ANONYMOUS.to_string(),
        }),
    }
}
