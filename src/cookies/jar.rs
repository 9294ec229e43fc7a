//! The cookie jar: a domain-indexed cookie store with change notification.
//!
//! # Locking
//!
//! One re-entrant lock guards the whole jar. Other threads block on it, so
//! mutations from different threads are serialized. The thread holding it
//! may take it again, which happens when a change listener calls back into
//! the jar: reads are fine, but a nested `add`/`delete`/`clear` finds the
//! mutation flag set and fails with [`CookieError::Busy`] instead of
//! deadlocking or corrupting the index.

use crate::base::cookieerror::CookieError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::change::{Author, CookieChange, Listener, ListenerId};
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// What `add` did with the cookie it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stored as a new cookie.
    Added,
    /// Replaced a cookie with the same name and path and a different value.
    Replaced,
    /// Replaced a cookie with the same name, path and value. No event fired.
    Unchanged,
    /// Was already expired and removed the cookie with the same name and path.
    Expired,
    /// Was already expired and matched nothing; dropped.
    Discarded,
}

struct Entry {
    cookie: CanonicalCookie,
    serial: u64,
}

#[derive(Default)]
struct JarState {
    // Keyed by the ASCII-lowercased domain, buckets keep arrival order.
    by_domain: HashMap<String, Vec<Entry>>,
    next_serial: u64,
}

fn domain_key(domain: &str) -> String {
    domain.to_ascii_lowercase()
}

fn bump(next_serial: &mut u64) -> u64 {
    *next_serial += 1;
    *next_serial
}

impl JarState {
    fn add(
        &mut self,
        author: Author,
        cookie: CanonicalCookie,
        now: OffsetDateTime,
    ) -> (AddOutcome, Option<CookieChange>) {
        let key = domain_key(cookie.domain());
        let expired = cookie.is_expired_at(now);
        let JarState {
            by_domain,
            next_serial,
        } = self;

        if let Some(bucket) = by_domain.get_mut(&key) {
            if let Some(idx) = bucket.iter().position(|e| e.cookie.same_slot(&cookie)) {
                if expired {
                    let old = bucket.remove(idx).cookie;
                    if bucket.is_empty() {
                        by_domain.remove(&key);
                    }
                    tracing::debug!(domain = %key, name = %old.name(), "expired cookie removed");
                    let change = CookieChange {
                        author,
                        old: Some(old),
                        new: None,
                    };
                    return (AddOutcome::Expired, Some(change));
                }

                let serial = bump(next_serial);
                let new = (bucket[idx].cookie.value() != cookie.value()).then(|| cookie.clone());
                let old = std::mem::replace(&mut bucket[idx], Entry { cookie, serial }).cookie;
                tracing::debug!(domain = %key, name = %old.name(), serial, "cookie replaced");

                return match new {
                    Some(new) => {
                        let change = CookieChange {
                            author,
                            old: Some(old),
                            new: Some(new),
                        };
                        (AddOutcome::Replaced, Some(change))
                    }
                    None => (AddOutcome::Unchanged, None),
                };
            }
        }

        if expired {
            tracing::debug!(domain = %key, name = %cookie.name(), "expired cookie discarded");
            return (AddOutcome::Discarded, None);
        }

        let serial = bump(next_serial);
        let new = cookie.clone();
        tracing::debug!(domain = %key, name = %cookie.name(), serial, "cookie added");
        by_domain.entry(key).or_default().push(Entry { cookie, serial });

        let change = CookieChange {
            author,
            old: None,
            new: Some(new),
        };
        (AddOutcome::Added, Some(change))
    }

    fn remove(&mut self, author: Author, cookie: &CanonicalCookie) -> Option<CookieChange> {
        let key = domain_key(cookie.domain());
        let bucket = self.by_domain.get_mut(&key)?;
        let idx = bucket.iter().position(|e| e.cookie == *cookie)?;

        let old = bucket.remove(idx).cookie;
        if bucket.is_empty() {
            self.by_domain.remove(&key);
        }
        tracing::debug!(domain = %key, name = %old.name(), "cookie deleted");

        Some(CookieChange {
            author,
            old: Some(old),
            new: None,
        })
    }

    /// Empties the index, oldest cookie first.
    fn drain(&mut self, author: Author) -> Vec<CookieChange> {
        let mut entries: Vec<Entry> = std::mem::take(&mut self.by_domain)
            .into_values()
            .flatten()
            .collect();
        entries.sort_by_key(|e| e.serial);

        entries
            .into_iter()
            .map(|e| CookieChange {
                author,
                old: Some(e.cookie),
                new: None,
            })
            .collect()
    }

    fn find(&self, cookie: &CanonicalCookie) -> Option<&Entry> {
        self.by_domain
            .get(&domain_key(cookie.domain()))?
            .iter()
            .find(|e| e.cookie.same_slot(cookie))
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.by_domain.values().flatten()
    }
}

struct Guarded {
    state: RefCell<JarState>,
    in_flight: Cell<bool>,
}

/// Clears the mutation flag when the mutation ends, including by unwinding
/// out of a listener.
struct MutationGuard<'a> {
    in_flight: &'a Cell<bool>,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.set(false);
    }
}

impl Guarded {
    fn begin_mutation(&self) -> Option<MutationGuard<'_>> {
        if self.in_flight.replace(true) {
            return None;
        }
        Some(MutationGuard {
            in_flight: &self.in_flight,
        })
    }
}

/// An in-memory cookie store keyed by domain.
///
/// Cookies with the same name and path within one domain occupy the same
/// slot: adding one replaces the other, adding an expired one removes it.
/// Every mutation is reported to the listeners registered with
/// [`on_changed`](Self::on_changed), and every stored cookie carries a
/// serial that grows with each add or replace, giving eviction and
/// persistence layers a recency order.
///
/// # Example
/// ```
/// use cookiejar::cookies::{Author, CanonicalCookie, CookieJar, SESSION_MAX_AGE};
///
/// let jar = CookieJar::new();
/// jar.on_changed(|_jar, change| println!("{:?}", change.kind()));
///
/// let cookie = CanonicalCookie::new("sid", "abc", Some("example.com"), Some("/"), SESSION_MAX_AGE);
/// jar.add(Author::new(), cookie)?;
/// assert_eq!(jar.len(), 1);
/// # Ok::<(), cookiejar::base::cookieerror::CookieError>(())
/// ```
pub struct CookieJar {
    inner: ReentrantMutex<Guarded>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener_id: AtomicU64,
    // False while the builder seeds the jar; listeners are skipped until then.
    ready: AtomicBool,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Creates an empty, ready jar.
    pub fn new() -> Self {
        CookieJarBuilder::default().build()
    }

    pub fn builder() -> CookieJarBuilder {
        CookieJarBuilder::default()
    }

    fn constructing() -> Self {
        Self {
            inner: ReentrantMutex::new(Guarded {
                state: RefCell::new(JarState::default()),
                in_flight: Cell::new(false),
            }),
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            ready: AtomicBool::new(false),
        }
    }

    /// Stores `cookie`, replacing or expiring the cookie in the same slot.
    ///
    /// Fails only when called while another mutation of this jar is in
    /// flight on the same thread; the cookie is then handed back inside the
    /// error (see [`CookieError::into_rejected`]).
    pub fn add(&self, author: Author, cookie: CanonicalCookie) -> Result<AddOutcome, CookieError> {
        let guarded = self.inner.lock();
        let Some(_mutation) = guarded.begin_mutation() else {
            tracing::warn!(
                domain = %cookie.domain(),
                name = %cookie.name(),
                "cookie jar busy, add rejected"
            );
            return Err(CookieError::busy_add(cookie));
        };

        let now = OffsetDateTime::now_utc();
        let (outcome, change) = guarded.state.borrow_mut().add(author, cookie, now);
        if let Some(change) = change {
            self.changed(&change);
        }
        Ok(outcome)
    }

    /// Parses a `Set-Cookie` header value received for `url` and adds it.
    pub fn add_from_header(
        &self,
        author: Author,
        url: &Url,
        set_cookie: &str,
    ) -> Result<AddOutcome, CookieError> {
        let cookie = CanonicalCookie::parse(url, set_cookie)?;
        self.add(author, cookie)
    }

    /// Removes the stored cookie equal to `cookie` (same name, value and
    /// path) in its domain. Returns whether one was found.
    pub fn delete(&self, author: Author, cookie: &CanonicalCookie) -> Result<bool, CookieError> {
        let guarded = self.inner.lock();
        let Some(_mutation) = guarded.begin_mutation() else {
            tracing::warn!(
                domain = %cookie.domain(),
                name = %cookie.name(),
                "cookie jar busy, delete rejected"
            );
            return Err(CookieError::busy());
        };

        let change = guarded.state.borrow_mut().remove(author, cookie);
        match change {
            Some(change) => {
                self.changed(&change);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes every cookie as one mutation, reporting a deletion per cookie
    /// (oldest first). Returns how many were removed.
    pub fn clear(&self, author: Author) -> Result<usize, CookieError> {
        let guarded = self.inner.lock();
        let Some(_mutation) = guarded.begin_mutation() else {
            tracing::warn!("cookie jar busy, clear rejected");
            return Err(CookieError::busy());
        };

        let changes = guarded.state.borrow_mut().drain(author);
        tracing::debug!(count = changes.len(), "cookie jar cleared");
        for change in &changes {
            self.changed(change);
        }
        Ok(changes.len())
    }

    /// Copies of every stored cookie. Order across domains is unspecified;
    /// within a domain it is arrival order.
    pub fn all_cookies(&self) -> Vec<CanonicalCookie> {
        let guarded = self.inner.lock();
        let state = guarded.state.borrow();
        state.entries().map(|e| e.cookie.clone()).collect()
    }

    /// Copies of the cookies filed under `domain` (case-insensitive), in
    /// arrival order.
    pub fn cookies_for_domain(&self, domain: &str) -> Vec<CanonicalCookie> {
        let guarded = self.inner.lock();
        let state = guarded.state.borrow();
        state
            .by_domain
            .get(&domain_key(domain))
            .map(|bucket| bucket.iter().map(|e| e.cookie.clone()).collect())
            .unwrap_or_default()
    }

    /// Copies of every stored cookie with its serial, least recent first.
    pub fn cookies_by_recency(&self) -> Vec<(u64, CanonicalCookie)> {
        let guarded = self.inner.lock();
        let state = guarded.state.borrow();
        let mut cookies: Vec<_> = state
            .entries()
            .map(|e| (e.serial, e.cookie.clone()))
            .collect();
        cookies.sort_by_key(|(serial, _)| *serial);
        cookies
    }

    /// Serial of the stored cookie in the same domain and slot as `cookie`.
    pub fn serial(&self, cookie: &CanonicalCookie) -> Option<u64> {
        let guarded = self.inner.lock();
        let state = guarded.state.borrow();
        state.find(cookie).map(|e| e.serial)
    }

    pub fn len(&self) -> usize {
        let guarded = self.inner.lock();
        let state = guarded.state.borrow();
        state.by_domain.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while the calling thread is inside a mutation of this jar, i.e.
    /// from within a change listener.
    pub fn is_mutating(&self) -> bool {
        self.inner.lock().in_flight.get()
    }

    /// Registers a change listener. Listeners run in registration order.
    pub fn on_changed<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CookieJar, &CookieChange) + Send + Sync + 'static,
    {
        self.register(Arc::new(listener))
    }

    fn register(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn changed(&self, change: &CookieChange) {
        if !self.ready.load(Ordering::Acquire) {
            return;
        }

        // Snapshot so listeners may (un)register listeners.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        tracing::trace!(kind = ?change.kind(), listeners = listeners.len(), "cookie jar changed");
        for listener in listeners {
            listener(self, change);
        }
    }
}

/// Configures and seeds a [`CookieJar`].
///
/// Cookies given here go through the regular add rules (expired ones are
/// dropped, later ones replace earlier ones in the same slot) and receive
/// serials, but listeners are not told about them.
#[derive(Default)]
pub struct CookieJarBuilder {
    cookies: Vec<CanonicalCookie>,
    listeners: Vec<Listener>,
}

impl CookieJarBuilder {
    pub fn cookie(mut self, cookie: CanonicalCookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn cookies<I>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = CanonicalCookie>,
    {
        self.cookies.extend(cookies);
        self
    }

    pub fn listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&CookieJar, &CookieChange) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn build(self) -> CookieJar {
        let jar = CookieJar::constructing();
        for listener in self.listeners {
            jar.register(listener);
        }
        for cookie in self.cookies {
            if let Err(err) = jar.add(Author::ANONYMOUS, cookie) {
                tracing::warn!(error = %err, "failed to seed cookie jar");
            }
        }
        jar.ready.store(true, Ordering::Release);
        jar
    }
}
