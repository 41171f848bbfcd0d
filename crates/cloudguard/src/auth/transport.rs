//! Where session tokens travel: the Authorization header and the session cookie.

use axum::http::{
    HeaderMap, Uri,
    header::{AUTHORIZATION, COOKIE},
};
use chrono::{DateTime, Utc};

use super::AuthError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

const BEARER_PREFIX: &str = "Bearer ";
const FORWARDED_PROTO: &str = "x-forwarded-proto";
const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A place a client may put its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    AuthorizationHeader,
    SessionCookie,
}

/// Sources consulted for a token, in precedence order. First present source wins.
pub const TOKEN_SOURCES: [TokenSource; 2] =
    [TokenSource::AuthorizationHeader, TokenSource::SessionCookie];

impl TokenSource {
    /// Look for a token in this source.
    ///
    /// `None` means the source is absent and the next one should be tried.
    /// An empty Authorization header counts as absent.
    /// `Some(Err(_))` means the source is present but unusable.
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Option<Result<&'a str, AuthError>> {
        match self {
            TokenSource::AuthorizationHeader => {
                let value = headers.get(AUTHORIZATION).filter(|v| !v.is_empty())?;
                Some(
                    value
                        .to_str()
                        .map_err(|_| AuthError::InvalidAuthHeader)
                        .and_then(bearer_token_from_header),
                )
            }
            TokenSource::SessionCookie => headers
                .get_all(COOKIE)
                .iter()
                .filter_map(|h| h.to_str().ok())
                .find_map(|cookie_header| token_from_cookie_header(cookie_header, SESSION_COOKIE))
                .map(Ok),
        }
    }
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::AuthorizationHeader => write!(f, "authorization header"),
            TokenSource::SessionCookie => write!(f, "session cookie"),
        }
    }
}

/// Pick the token from the first source that is present.
pub fn extract_token(headers: &HeaderMap) -> Result<(TokenSource, &str), AuthError> {
    for source in TOKEN_SOURCES {
        if let Some(found) = source.extract(headers) {
            return found.map(|token| (source, token));
        }
    }
    Err(AuthError::MissingCredentials)
}

/// Extract the token from an Authorization header value.
/// Only the exact `Bearer ` prefix is accepted.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let token = header_value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::InvalidAuthHeader)?;

    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Find a non-empty cookie value by name.
fn token_from_cookie_header<'a>(cookie_header: &'a str, cookie_name: &str) -> Option<&'a str> {
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        let value = value.trim();
        if name.trim() == cookie_name && !value.is_empty() {
            Some(value)
        } else {
            None
        }
    })
}

/// Whether the inbound connection was encrypted.
///
/// `X-Forwarded-Proto` is only honoured when the deployment says a proxy sets it.
pub fn connection_is_encrypted(headers: &HeaderMap, uri: &Uri, trust_forwarded_proto: bool) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }

    trust_forwarded_proto
        && headers
            .get(FORWARDED_PROTO)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn session_cookie(token: &str, expires_at: DateTime<Utc>, secure: bool) -> String {
    let secure_flag = if secure { " Secure;" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict;{secure_flag} Expires={}",
        expires_at.format(COOKIE_DATE_FORMAT)
    )
}

/// `Set-Cookie` value that empties the session cookie and expires it immediately.
pub fn clear_session_cookie(secure: bool) -> String {
    let secure_flag = if secure { " Secure;" } else { "" };
    format!(
        "{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict;{secure_flag} Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_bearer_token_from_header_valid() {
        assert_eq!(
            bearer_token_from_header("Bearer abc.def.ghi").unwrap(),
            "abc.def.ghi"
        );
    }

    #[test]
    fn test_bearer_token_from_header_invalid() {
        let cases = [
            "",
            "Bearer",
            "Bearer ",
            "bearer abc.def.ghi",
            "BEARER abc.def.ghi",
            "Token something",
            "Basic dXNlcjpwYXNz",
            "abc.def.ghi",
        ];

        for case in cases {
            assert!(
                bearer_token_from_header(case).is_err(),
                "{case} should fail"
            );
        }
    }

    #[test]
    fn test_header_takes_precedence_over_cookie() {
        let map = headers(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "session=from-cookie"),
        ]);
        let (source, token) = extract_token(&map).unwrap();
        assert_eq!(source, TokenSource::AuthorizationHeader);
        assert_eq!(token, "from-header");
    }

    #[test]
    fn test_malformed_header_does_not_fall_back_to_cookie() {
        let map = headers(&[
            ("authorization", "Token from-header"),
            ("cookie", "session=from-cookie"),
        ]);
        assert!(matches!(
            extract_token(&map),
            Err(AuthError::InvalidAuthHeader)
        ));
    }

    #[test]
    fn test_empty_header_falls_back_to_cookie() {
        let map = headers(&[("authorization", ""), ("cookie", "session=from-cookie")]);
        let (source, token) = extract_token(&map).unwrap();
        assert_eq!(source, TokenSource::SessionCookie);
        assert_eq!(token, "from-cookie");

        let header_only = headers(&[("authorization", "")]);
        assert!(matches!(
            extract_token(&header_only),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_cookie_used_without_header() {
        let map = headers(&[("cookie", "theme=dark; session=from-cookie; lang=en")]);
        let (source, token) = extract_token(&map).unwrap();
        assert_eq!(source, TokenSource::SessionCookie);
        assert_eq!(token, "from-cookie");
    }

    #[test]
    fn test_cookie_across_multiple_headers() {
        let map = headers(&[("cookie", "theme=dark"), ("cookie", "session=second")]);
        assert_eq!(extract_token(&map).unwrap().1, "second");
    }

    #[test]
    fn test_no_credentials() {
        assert!(matches!(
            extract_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));

        let empty_cookie = headers(&[("cookie", "session=; theme=dark")]);
        assert!(matches!(
            extract_token(&empty_cookie),
            Err(AuthError::MissingCredentials)
        ));

        let other_cookie = headers(&[("cookie", "sessionid=abc")]);
        assert!(matches!(
            extract_token(&other_cookie),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_source_order() {
        assert_eq!(
            TOKEN_SOURCES,
            [TokenSource::AuthorizationHeader, TokenSource::SessionCookie]
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        let expires = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let cookie = session_cookie("tok", expires, false);
        assert_eq!(
            cookie,
            "session=tok; Path=/; HttpOnly; SameSite=Strict; Expires=Tue, 14 Nov 2023 22:13:20 GMT"
        );

        let secure = session_cookie("tok", expires, true);
        assert!(secure.contains("; Secure;"));
    }

    #[test]
    fn test_clear_session_cookie() {
        let cookie = clear_session_cookie(false);
        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_connection_is_encrypted() {
        let plain: Uri = "/api/login".parse().unwrap();
        let https: Uri = "https://example.com/api/login".parse().unwrap();
        let forwarded = headers(&[("x-forwarded-proto", "https")]);

        assert!(!connection_is_encrypted(&HeaderMap::new(), &plain, false));
        assert!(connection_is_encrypted(&HeaderMap::new(), &https, false));
        assert!(!connection_is_encrypted(&forwarded, &plain, false));
        assert!(connection_is_encrypted(&forwarded, &plain, true));
    }
}
