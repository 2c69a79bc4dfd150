//! # cookiestore
//!
//! An in-memory HTTP cookie store for Rust HTTP clients.
//!
//! `cookiestore` keeps the cookies a client receives from servers and
//! answers which of them apply to an outgoing request. It does no I/O and
//! no header parsing: callers hand it cookie records and get records back.
//!
//! ## Features
//!
//! - **Indexed lookup**: Cookies are indexed by declared domain and by the origin that set them
//! - **Domain matching**: Lenient Netscape rule for version 0, RFC 2965 for version 1+
//! - **Lazy expiry**: Expired and replaced cookies are purged by the reads that find them
//! - **Thread safety**: One lock per store, linearizable operations
//! - **Policies**: Accept-all, accept-none and accept-original-server
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cookiestore::cookies::httpcookie::HttpCookie;
//! use cookiestore::cookies::store::{CookieStore, InMemoryCookieStore};
//! use url::Url;
//!
//! let store = InMemoryCookieStore::new();
//! let origin = Url::parse("https://example.com/")?;
//! store.add(Some(&origin), Arc::new(HttpCookie::new("id", "42").with_secure(true)))?;
//!
//! assert_eq!(store.get(&Url::parse("https://example.com/account")?)?.len(), 1);
//! assert!(store.get(&Url::parse("http://example.com/account")?)?.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`cookies`] - Cookie records, matching rules, policies and the store

pub mod base;
pub mod cookies;
