//! Change events emitted by [`CookieJar`](crate::cookies::jar::CookieJar).

use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::jar::CookieJar;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque identity of whoever initiated a mutation.
///
/// The jar only passes it through to listeners, which use it to skip
/// changes they made themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Author(u64);

impl Author {
    /// Author for callers without an identity of their own.
    pub const ANONYMOUS: Author = Author(0);

    /// Mints an author token distinct from every other one in the process.
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Author(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Author {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Replaced,
    Deleted,
}

/// One mutation of the jar.
///
/// - added: `old` is `None`, `new` holds the stored cookie
/// - replaced: both are set
/// - deleted: `old` holds the removed cookie, `new` is `None`
#[derive(Debug, Clone)]
pub struct CookieChange {
    pub author: Author,
    pub old: Option<CanonicalCookie>,
    pub new: Option<CanonicalCookie>,
}

impl CookieChange {
    pub fn kind(&self) -> ChangeKind {
        match (&self.old, &self.new) {
            (None, _) => ChangeKind::Added,
            (Some(_), Some(_)) => ChangeKind::Replaced,
            (Some(_), None) => ChangeKind::Deleted,
        }
    }
}

/// Handle returned by [`CookieJar::on_changed`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Change subscriber. Runs synchronously on the mutating thread while the jar
/// lock is held; calling `add`/`delete` on the same jar from here yields
/// [`CookieError::Busy`](crate::base::cookieerror::CookieError::Busy).
pub type Listener = Arc<dyn Fn(&CookieJar, &CookieChange) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::canonical_cookie::SESSION_MAX_AGE;

    fn cookie(value: &str) -> CanonicalCookie {
        CanonicalCookie::new("a", value, Some("example.com"), None, SESSION_MAX_AGE)
    }

    #[test]
    fn test_authors_are_unique() {
        let a = Author::new();
        let b = Author::new();
        assert_ne!(a, b);
        assert_ne!(a, Author::ANONYMOUS);
    }

    #[test]
    fn test_change_kind() {
        let author = Author::ANONYMOUS;
        let added = CookieChange { author, old: None, new: Some(cookie("1")) };
        let replaced = CookieChange { author, old: Some(cookie("1")), new: Some(cookie("2")) };
        let deleted = CookieChange { author, old: Some(cookie("2")), new: None };

        assert_eq!(added.kind(), ChangeKind::Added);
        assert_eq!(replaced.kind(), ChangeKind::Replaced);
        assert_eq!(deleted.kind(), ChangeKind::Deleted);
    }
}
