//! Base types and error handling.
//!
//! - [`CookieError`](cookieerror::CookieError): contention and parse errors

pub mod cookieerror;

#[cfg(test)]
mod tests;
