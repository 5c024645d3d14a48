use std::time::Duration;

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

pub const SESSION_COOKIE_NAME: &str = "access_token";

/// Build the `HttpOnly` session cookie carrying `token`.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    let cookie = if secure {
        "access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure"
    } else {
        "access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    };
    HeaderValue::from_static(cookie)
}

/// The session token from the cookie, falling back to a bearer header.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty() {
                return Some(val.trim().to_string());
            }
        }
    }
    extract_bearer_token(headers)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi", Duration::from_secs(900), false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "access_token=abc.def.ghi; Path=/; HttpOnly; SameSite=Lax; Max-Age=900"
        );
        let secure = session_cookie("abc", Duration::from_secs(900), true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false);
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("access_token=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("HttpOnly"));
        assert!(clear_session_cookie(true).to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn reads_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; access_token=tok123; lang=pt"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("access_token="));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok456"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok456"));
    }

    #[test]
    fn missing_token_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_session_token(&headers), None);
    }
}
