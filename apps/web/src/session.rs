use axum::http::{HeaderMap, HeaderValue, header};
use uuid::Uuid;

use crate::state::AppState;

pub const COOKIE_NAME: &str = "sentiscope_session";

/// Session id carried by the request's cookie, if any.
pub fn session_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(id: Uuid) -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&format!(
        "{COOKIE_NAME}={id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .expect("session cookie is ASCII")
}

/// Resolve the caller's live session, starting a new one when needed.
///
/// Returns the cookie to set when a new session was created.
pub fn resolve(state: &AppState, headers: &HeaderMap) -> (Uuid, Option<HeaderValue>) {
    if let Some(id) = session_from_headers(headers) {
        if state.sessions.get(&id).is_some() {
            return (id, None);
        }
    }

    let id = state.sessions.create();
    tracing::debug!(session = %id, "started session");
    (id, Some(session_cookie(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_session_among_other_cookies() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {COOKIE_NAME}={id}; lang=en")).unwrap(),
        );

        assert_eq!(session_from_headers(&headers), Some(id));
    }

    #[test]
    fn ignores_malformed_or_missing_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_from_headers(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("sentiscope_session=not-a-uuid"),
        );
        assert_eq!(session_from_headers(&headers), None);
    }

    #[test]
    fn cookie_is_scoped_to_site() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id);
        let text = cookie.to_str().unwrap();
        assert!(text.starts_with(&format!("{COOKIE_NAME}={id}")));
        assert!(text.contains("HttpOnly"));
    }
}
