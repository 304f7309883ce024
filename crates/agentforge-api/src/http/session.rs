//! Session cookie helpers and the access gate middleware.
//!
//! Every route except the public ones below requires a valid `session`
//! cookie. The resolved [`User`] is stored in the request extensions.

use axum::extract::{Request, State};
use axum::http::header::COOKIE;
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use agentforge_infra::auth::{SESSION_COOKIE, SESSION_TTL_SECS};
use agentforge_types::auth::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// Routes reachable without a session.
fn is_public(method: &Method, path: &str) -> bool {
    if path == "/health" || path.starts_with("/api/auth/") {
        return true;
    }
    // Deployed agents authenticate with their own API key.
    *method == Method::POST && path.starts_with("/api/deploy/") && path != "/api/deploy/create"
}

/// Value of the `session` cookie, if present.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={SESSION_TTL_SECS}; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that deletes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Resolve the session cookie to a user.
pub fn current_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    session_token(headers).and_then(|token| state.credentials.verify(token))
}

/// Access gate: rejects protected requests without a valid session.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if is_public(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    match current_user(&state, req.headers()) {
        Some(user) => {
            tracing::debug!(username = %user.username, path = %req.uri().path(), "session accepted");
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => AppError::Unauthorized("Unauthorized".to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_public_routes() {
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::POST, "/api/auth/login"));
        assert!(is_public(&Method::POST, "/api/auth/logout"));
        assert!(is_public(&Method::GET, "/api/auth/me"));
        assert!(is_public(&Method::POST, "/api/deploy/agent-1"));

        assert!(!is_public(&Method::POST, "/api/deploy/create"));
        assert!(!is_public(&Method::GET, "/api/deploy/agent-1"));
        assert!(!is_public(&Method::PATCH, "/api/deploy/agent-1"));
        assert!(!is_public(&Method::GET, "/api/agents"));
        assert!(!is_public(&Method::POST, "/api/chat"));
    }

    #[test]
    fn test_session_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc.def.ghi; x=1"));
        assert_eq!(session_token(&headers), Some("abc.def.ghi"));

        headers.insert(COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("mysession=nope"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("tok", false);
        assert_eq!(
            cookie,
            "session=tok; HttpOnly; Path=/; Max-Age=604800; SameSite=Lax"
        );
        assert!(session_cookie("tok", true).ends_with("; Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
