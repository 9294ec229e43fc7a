use crate::cookies::canonical_cookie::CanonicalCookie;
use thiserror::Error;

/// Errors produced by the cookie jar and cookie parsing.
#[derive(Debug, Error)]
pub enum CookieError {
    /// Another add/delete is already in flight on this jar, typically because
    /// a change listener called back into the jar it is observing.
    ///
    /// A rejected `add` hands the cookie back in `rejected`; a rejected
    /// `delete` or `clear` carries `None`.
    #[error("Cookie jar busy: a mutation is already in flight")]
    Busy {
        rejected: Option<Box<CanonicalCookie>>,
    },

    #[error("Invalid Set-Cookie header {line:?}: {reason}")]
    InvalidSetCookie { line: String, reason: String },

    #[error("URL has no host: {url}")]
    MissingHost { url: String },
}

impl CookieError {
    pub(crate) fn busy_add(cookie: CanonicalCookie) -> Self {
        CookieError::Busy {
            rejected: Some(Box::new(cookie)),
        }
    }

    pub(crate) fn busy() -> Self {
        CookieError::Busy { rejected: None }
    }

    pub fn invalid_set_cookie(line: impl Into<String>, reason: impl ToString) -> Self {
        CookieError::InvalidSetCookie {
            line: line.into(),
            reason: reason.to_string(),
        }
    }

    pub fn missing_host(url: &url::Url) -> Self {
        CookieError::MissingHost {
            url: url.as_str().to_string(),
        }
    }

    /// True for contention errors. Callers that need the mutation applied
    /// retry once the current mutation has finished.
    pub fn is_busy(&self) -> bool {
        matches!(self, CookieError::Busy { .. })
    }

    /// Takes back ownership of a cookie whose `add` was rejected.
    pub fn into_rejected(self) -> Option<CanonicalCookie> {
        match self {
            CookieError::Busy { rejected } => rejected.map(|c| *c),
            _ => None,
        }
    }
}
