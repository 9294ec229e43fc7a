//! Cookie storage.
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`CanonicalCookie`] | Single cookie: identity, value, expiry and flags |
//! | [`CookieJar`] | Domain-indexed store with add/replace/expire rules |
//! | [`CookieJarBuilder`] | Jar configuration and silent seeding |
//! | [`CookieChange`] | Mutation event handed to listeners |
//!
//! # Add rules
//!
//! Within one domain (compared case-insensitively) a cookie's slot is its
//! name plus path:
//!
//! | Slot taken? | Incoming expired? | Result |
//! |-------------|-------------------|--------|
//! | yes | yes | stored cookie removed, deletion reported |
//! | yes | no | replaced in place, reported if the value changed |
//! | no | yes | dropped, nothing reported |
//! | no | no | appended, addition reported |
//!
//! # Example
//!
//! ```rust
//! use cookiejar::cookies::{Author, CookieJar};
//! use url::Url;
//!
//! let me = Author::new();
//! let jar = CookieJar::new();
//! jar.on_changed(move |_jar, change| {
//!     if change.author != me {
//!         println!("someone else changed a cookie: {:?}", change.kind());
//!     }
//! });
//!
//! let url = Url::parse("https://www.example.com/").unwrap();
//! jar.add_from_header(me, &url, "sid=abc; Domain=example.com; Path=/")?;
//! assert_eq!(jar.cookies_for_domain(".example.com").len(), 1);
//! # Ok::<(), cookiejar::base::cookieerror::CookieError>(())
//! ```

pub mod canonical_cookie;
pub mod change;
pub mod jar;

pub use canonical_cookie::{CanonicalCookie, SESSION_MAX_AGE};
pub use change::{Author, ChangeKind, CookieChange, Listener, ListenerId};
pub use jar::{AddOutcome, CookieJar, CookieJarBuilder};
