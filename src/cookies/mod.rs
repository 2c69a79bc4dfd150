//! Cookie storage and matching.
//!
//! This module provides the in-memory cookie store used when preparing
//! requests and processing responses:
//!
//! - **Records**: Immutable cookie values ([`HttpCookie`](httpcookie::HttpCookie))
//! - **Storage**: Indexed, thread-safe store ([`InMemoryCookieStore`](store::InMemoryCookieStore))
//! - **Matching**: Netscape and RFC 2965 domain rules ([`domainmatch`])
//! - **Policy**: Accept/reject decisions for received cookies ([`policy`])
//!
//! # Architecture
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`CookieStore`](store::CookieStore) | Store interface held by HTTP clients |
//! | [`InMemoryCookieStore`](store::InMemoryCookieStore) | Primary collection plus domain and URI indices |
//! | [`HttpCookie`](httpcookie::HttpCookie) | Single cookie record and its RFC 2965 domain-match |
//! | [`DomainMatchRule`](domainmatch::DomainMatchRule) | Version-based choice of matching rule |
//!
//! # Storing and retrieving
//!
//! ```rust
//! use std::sync::Arc;
//! use cookiestore::cookies::httpcookie::HttpCookie;
//! use cookiestore::cookies::store::{CookieStore, InMemoryCookieStore};
//! use url::Url;
//!
//! let store = InMemoryCookieStore::new();
//! let origin = Url::parse("http://www.example.com/login")?;
//!
//! let cookie = HttpCookie::new("session", "abc123")
//!     .with_domain(".example.com")
//!     .with_version(0);
//! store.add(Some(&origin), Arc::new(cookie))?;
//!
//! let request = Url::parse("http://static.cdn.example.com/app.js")?;
//! let cookies = store.get(&request)?;
//! assert_eq!(cookies.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Sharing a store
//!
//! There is no process-wide default store. Create one and hand it to every
//! component that needs it, either by cloning [`InMemoryCookieStore`] or as a
//! [`CookieStoreHandle`](store::CookieStoreHandle).
//!
//! [`InMemoryCookieStore`]: store::InMemoryCookieStore

pub mod domainmatch;
pub mod httpcookie;
pub mod policy;
pub mod store;
