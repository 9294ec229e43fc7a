use crate::base::cookieerror::CookieError;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use url::Url;

/// `max_age` value for a session cookie (no expiry of its own).
pub const SESSION_MAX_AGE: i64 = -1;

/// A single cookie as held by the jar.
///
/// Equality (`==`) compares `name`, `value` and `path` only. The domain is
/// deliberately left out: two cookies that differ only in domain compare
/// equal even though the jar files them under different keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalCookie {
    name: String,
    value: String,
    domain: String,
    path: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    expires: Option<OffsetDateTime>,
    secure: bool,
    http_only: bool,
}

impl CanonicalCookie {
    /// Creates a cookie.
    ///
    /// `max_age` follows the Max-Age convention: [`SESSION_MAX_AGE`] for a
    /// session cookie, `0` for an already expired one, otherwise the number
    /// of seconds from now.
    ///
    /// A missing `domain` is accepted with a warning and stored empty; set it
    /// with [`set_domain`](Self::set_domain) before handing the cookie to a jar.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: Option<&str>,
        path: Option<&str>,
        max_age: i64,
    ) -> Self {
        let name = name.into();
        if domain.is_none() {
            tracing::warn!(name = %name, "cookie created without a domain");
        }

        let mut cookie = Self {
            name,
            value: value.into(),
            domain: domain.unwrap_or_default().to_string(),
            path: path.map(str::to_string),
            expires: None,
            secure: false,
            http_only: false,
        };
        cookie.set_max_age(max_age);
        cookie
    }

    /// Builds a cookie from one `Set-Cookie` header value received for `url`.
    ///
    /// An explicit `Domain` attribute yields a `.`-prefixed (suffix matching)
    /// domain; without one the cookie is bound to the exact request host.
    /// `Max-Age` takes precedence over `Expires`.
    pub fn parse(url: &Url, line: &str) -> Result<Self, CookieError> {
        let parsed =
            cookie::Cookie::parse(line).map_err(|e| CookieError::invalid_set_cookie(line, e))?;
        let host = url.host_str().ok_or_else(|| CookieError::missing_host(url))?;

        let domain = match parsed.domain().map(|d| d.trim_start_matches('.')) {
            Some(d) if !d.is_empty() => format!(".{}", d.to_ascii_lowercase()),
            _ => host.to_ascii_lowercase(),
        };

        let mut cookie = Self::new(
            parsed.name(),
            parsed.value(),
            Some(&domain),
            parsed.path(),
            SESSION_MAX_AGE,
        );

        if let Some(max_age) = parsed.max_age() {
            cookie.set_max_age(max_age.whole_seconds());
        } else if let Some(expires) = parsed.expires().and_then(|e| e.datetime()) {
            cookie.expires = Some(expires.to_offset(UtcOffset::UTC));
        }

        cookie.secure = parsed.secure().unwrap_or(false);
        cookie.http_only = parsed.http_only().unwrap_or(false);

        Ok(cookie)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = domain.into();
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: Option<&str>) {
        self.path = path.map(str::to_string);
    }

    pub fn expires(&self) -> Option<OffsetDateTime> {
        self.expires
    }

    pub fn set_expires(&mut self, expires: Option<OffsetDateTime>) {
        self.expires = expires;
    }

    /// Recomputes the expiry from a Max-Age value, see [`new`](Self::new).
    ///
    /// `0` maps to the Unix epoch rather than "now" so a client with a slow
    /// clock still treats the cookie as expired.
    pub fn set_max_age(&mut self, max_age: i64) {
        self.expires = match max_age {
            SESSION_MAX_AGE => None,
            0 => Some(OffsetDateTime::UNIX_EPOCH),
            secs => {
                let expiry = OffsetDateTime::now_utc().checked_add(Duration::seconds(secs));
                Some(expiry.unwrap_or_else(|| {
                    if secs > 0 {
                        PrimitiveDateTime::MAX.assume_utc()
                    } else {
                        OffsetDateTime::UNIX_EPOCH
                    }
                }))
            }
        };
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    pub fn set_http_only(&mut self, http_only: bool) {
        self.http_only = http_only;
    }

    /// True when the cookie has no expiry of its own.
    pub fn is_session(&self) -> bool {
        self.expires.is_none()
    }

    /// True when the domain is a `.`-prefixed suffix pattern rather than an
    /// exact host.
    pub fn is_domain_cookie(&self) -> bool {
        self.domain.starts_with('.')
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        match self.expires {
            Some(expiry) => expiry < now,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Whether `other` occupies the same slot in a domain bucket, i.e. has
    /// the same name and path.
    pub fn same_slot(&self, other: &CanonicalCookie) -> bool {
        self.name == other.name && self.path == other.path
    }
}

impl PartialEq for CanonicalCookie {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value && self.path == other.path
    }
}

impl Eq for CanonicalCookie {}
