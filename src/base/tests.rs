use crate::base::cookieerror::CookieError;
use crate::cookies::canonical_cookie::{CanonicalCookie, SESSION_MAX_AGE};

#[test]
fn test_busy_add_returns_cookie() {
    let cookie = CanonicalCookie::new("sid", "abc", Some("example.com"), Some("/"), SESSION_MAX_AGE);
    let err = CookieError::busy_add(cookie);

    assert!(err.is_busy());
    let back = err.into_rejected().unwrap();
    assert_eq!(back.name(), "sid");
    assert_eq!(back.value(), "abc");
}

#[test]
fn test_busy_delete_has_no_cookie() {
    let err = CookieError::busy();
    assert!(err.is_busy());
    assert!(err.into_rejected().is_none());
}

#[test]
fn test_parse_errors_are_not_busy() {
    let err = CookieError::invalid_set_cookie("=", "missing name");
    assert!(!err.is_busy());
    assert_eq!(
        err.to_string(),
        "Invalid Set-Cookie header \"=\": missing name"
    );
    assert!(err.into_rejected().is_none());
}

#[test]
fn test_missing_host_message() {
    let url = url::Url::parse("data:text/plain,hello").unwrap();
    let err = CookieError::missing_host(&url);
    assert!(matches!(err, CookieError::MissingHost { .. }));
    assert!(err.to_string().starts_with("URL has no host: data:"));
}
