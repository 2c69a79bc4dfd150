//! Cookie acceptance policy and store configuration.

use crate::cookies::httpcookie::HttpCookie;
use url::Url;

/// Decides whether a cookie received from `origin` should be stored at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookiePolicy {
    /// Store every cookie.
    AcceptAll,
    /// Store nothing.
    AcceptNone,
    /// Store only cookies whose domain covers the server that sent them.
    #[default]
    AcceptOriginalServer,
}

impl CookiePolicy {
    pub fn should_accept(&self, origin: &Url, cookie: &HttpCookie) -> bool {
        match self {
            CookiePolicy::AcceptAll => true,
            CookiePolicy::AcceptNone => false,
            CookiePolicy::AcceptOriginalServer => {
                let Some(host) = origin.host_str() else {
                    return false;
                };
                // Without a Domain attribute the cookie belongs to the origin host.
                match cookie.domain.as_deref() {
                    Some(domain) => HttpCookie::domain_matches(domain, host),
                    None => true,
                }
            }
        }
    }
}

/// Configuration for [`InMemoryCookieStore`](crate::cookies::store::InMemoryCookieStore).
#[derive(Debug, Clone, Default)]
pub struct CookieStoreConfig {
    /// Policy applied by `offer`. `add` stores unconditionally.
    pub policy: CookiePolicy,
}

impl CookieStoreConfig {
    pub fn with_policy(mut self, policy: CookiePolicy) -> Self {
        self.policy = policy;
        self
    }
}
