//! # cookiejar
//!
//! An in-memory HTTP cookie jar.
//!
//! The jar holds the cookies a client has received, indexed by the domain
//! that set them, and applies RFC 6265 style add/replace/expire rules.
//! Every mutation is reported synchronously to registered listeners, which
//! is where persistence or eviction layers hook in.
//!
//! ## Quick Start
//!
//! ```rust
//! use cookiejar::cookies::{Author, CanonicalCookie, CookieJar, SESSION_MAX_AGE};
//!
//! let jar = CookieJar::builder()
//!     .listener(|_jar, change| println!("{:?}", change.kind()))
//!     .build();
//!
//! let cookie = CanonicalCookie::new("sid", "abc", Some("example.com"), Some("/"), SESSION_MAX_AGE);
//! jar.add(Author::new(), cookie)?;
//!
//! for cookie in jar.all_cookies() {
//!     println!("{}={}", cookie.name(), cookie.value());
//! }
//! # Ok::<(), cookiejar::base::cookieerror::CookieError>(())
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`cookies`] - Cookies, the jar and change events
//!
//! Matching cookies to requests, `Cookie:` header serialization, public
//! suffix checks and durable storage are left to callers.

pub mod base;
pub mod cookies;
