//! In-memory cookie store with domain and origin indices.
//!
//! The store keeps three structures behind one lock:
//!
//! - the primary collection, one record per cookie identity,
//! - a domain index, keyed by the literal `Domain` attribute,
//! - a URI index, keyed by the effective URI of the response that set the cookie.
//!
//! Index entries are never cleaned up eagerly. Removing or replacing a
//! record only touches the primary collection; readers check every index
//! entry they visit against it and drop the ones that are stale or expired.
//! There is no background sweep, so an expired cookie occupies memory until
//! a read touches it.

use crate::base::neterror::NetError;
use crate::cookies::domainmatch::DomainMatchRule;
use crate::cookies::httpcookie::{CookieKey, HttpCookie};
use crate::cookies::policy::CookieStoreConfig;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use url::Url;

/// Storage for cookies received from servers.
///
/// Implementations must be internally synchronized; every method takes `&self`.
pub trait CookieStore: Send + Sync {
    /// Store `cookie`, replacing any cookie with the same identity.
    ///
    /// `origin` is the URL of the response that carried the cookie, or `None`
    /// for cookies added administratively. A cookie with `max_age == 0` is not
    /// stored; it only removes the cookie it replaces.
    fn add(&self, origin: Option<&Url>, cookie: Arc<HttpCookie>) -> Result<(), NetError>;

    /// Cookies to send with a request to `uri`.
    ///
    /// Secure cookies are only returned for `https` URLs. Order is unspecified.
    fn get(&self, uri: &Url) -> Result<Vec<Arc<HttpCookie>>, NetError>;

    /// Every unexpired cookie in the store.
    fn all_cookies(&self) -> Vec<Arc<HttpCookie>>;

    /// Effective URIs that still have at least one cookie associated with them.
    fn all_origins(&self) -> Vec<Url>;

    /// Remove the cookie with the same identity as `cookie`.
    fn remove(&self, cookie: &HttpCookie) -> bool;

    /// Remove every cookie. Returns `false` if the store was already empty.
    fn remove_all(&self) -> bool;
}

/// A shared, type-erased cookie store.
pub type CookieStoreHandle = Arc<dyn CookieStore>;

/// An index entry carries the identity it was filed under, so readers can
/// look the record up in the primary collection without rebuilding the key.
struct IndexEntry {
    key: CookieKey,
    cookie: Arc<HttpCookie>,
}

type Index<K> = HashMap<K, Vec<IndexEntry>>;

#[derive(Default)]
struct CookieJar {
    cookies: HashMap<CookieKey, Arc<HttpCookie>>,
    domain_index: Index<String>,
    uri_index: Index<Url>,
}

/// Thread-safe in-memory [`CookieStore`].
///
/// Clones share the same underlying storage.
#[derive(Clone)]
pub struct InMemoryCookieStore {
    jar: Arc<Mutex<CookieJar>>,
    config: CookieStoreConfig,
}

impl Default for InMemoryCookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCookieStore {
    pub fn new() -> Self {
        Self::with_config(CookieStoreConfig::default())
    }

    pub fn with_config(config: CookieStoreConfig) -> Self {
        Self {
            jar: Arc::new(Mutex::new(CookieJar::default())),
            config,
        }
    }

    pub fn config(&self) -> &CookieStoreConfig {
        &self.config
    }

    /// Store `cookie` if the configured policy accepts it from `origin`.
    ///
    /// Returns whether the cookie was accepted.
    pub fn offer(&self, origin: &Url, cookie: Arc<HttpCookie>) -> Result<bool, NetError> {
        if !self.config.policy.should_accept(origin, &cookie) {
            tracing::debug!(
                origin = %origin,
                name = %cookie.name,
                policy = ?self.config.policy,
                "cookie rejected by policy"
            );
            return Ok(false);
        }

        self.add(Some(origin), cookie)?;
        Ok(true)
    }

    /// Number of records in the primary collection, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cookies.is_empty()
    }

    // A panic while holding the lock cannot leave a dangling reference:
    // index entries are allowed to be stale and are checked on every read.
    fn lock(&self) -> MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add_to_index<K: Eq + Hash>(
        index: &mut Index<K>,
        key: K,
        identity: &CookieKey,
        cookie: &Arc<HttpCookie>,
    ) {
        let bucket = index.entry(key).or_default();
        bucket.retain(|entry| entry.key != *identity);
        bucket.push(IndexEntry {
            key: identity.clone(),
            cookie: Arc::clone(cookie),
        });
    }
}

impl CookieStore for InMemoryCookieStore {
    fn add(&self, origin: Option<&Url>, cookie: Arc<HttpCookie>) -> Result<(), NetError> {
        let effective = origin.map(effective_uri).transpose()?;
        let identity = cookie.key();

        let mut jar = self.lock();
        let replaced = jar.cookies.remove(&identity).is_some();

        if cookie.max_age == 0 {
            tracing::debug!(
                name = %cookie.name,
                domain = ?cookie.domain,
                replaced,
                "cookie deleted by max-age=0"
            );
            return Ok(());
        }

        if let Some(domain) = cookie.domain.as_deref().filter(|d| !d.is_empty()) {
            Self::add_to_index(&mut jar.domain_index, domain.to_string(), &identity, &cookie);
        }
        if let Some(uri) = effective {
            Self::add_to_index(&mut jar.uri_index, uri, &identity, &cookie);
        }

        tracing::trace!(name = %cookie.name, domain = ?cookie.domain, replaced, "cookie stored");
        jar.cookies.insert(identity, cookie);
        Ok(())
    }

    fn get(&self, uri: &Url) -> Result<Vec<Arc<HttpCookie>>, NetError> {
        let host = uri.host_str().ok_or(NetError::InvalidArgument)?;
        let effective = effective_uri(uri)?;
        let secure_link = uri.scheme().eq_ignore_ascii_case("https");
        let now = OffsetDateTime::now_utc();

        let mut jar = self.lock();
        let CookieJar {
            cookies,
            domain_index,
            uri_index,
        } = &mut *jar;
        let mut found = Found {
            secure_link,
            ..Found::default()
        };

        for (domain, bucket) in domain_index.iter_mut() {
            bucket.retain(|entry| {
                // Entries for other domains are left as they are.
                !DomainMatchRule::for_version(entry.cookie.version).matches(domain, host)
                    || found.collect(cookies, entry, now)
            });
        }
        domain_index.retain(|_, bucket| !bucket.is_empty());

        if let Some(bucket) = uri_index.get_mut(&effective) {
            bucket.retain(|entry| found.collect(cookies, entry, now));
        }

        Ok(found.cookies)
    }

    fn all_cookies(&self) -> Vec<Arc<HttpCookie>> {
        let now = OffsetDateTime::now_utc();
        let mut jar = self.lock();

        jar.cookies.retain(|_, cookie| {
            let expired = cookie.has_expired_at(now);
            if expired {
                tracing::debug!(
                    name = %cookie.name,
                    domain = ?cookie.domain,
                    "evicting expired cookie"
                );
            }
            !expired
        });

        jar.cookies.values().cloned().collect()
    }

    fn all_origins(&self) -> Vec<Url> {
        let now = OffsetDateTime::now_utc();
        let mut jar = self.lock();
        let CookieJar {
            cookies, uri_index, ..
        } = &mut *jar;

        uri_index.retain(|_, bucket| {
            bucket.retain(|entry| retain_live(cookies, entry, now));
            !bucket.is_empty()
        });

        uri_index.keys().cloned().collect()
    }

    fn remove(&self, cookie: &HttpCookie) -> bool {
        self.lock().cookies.remove(&cookie.key()).is_some()
    }

    fn remove_all(&self) -> bool {
        let mut jar = self.lock();
        let had_cookies = !jar.cookies.is_empty();

        jar.cookies.clear();
        jar.domain_index.clear();
        jar.uri_index.clear();

        tracing::debug!(had_cookies, "cookie store cleared");
        had_cookies
    }
}

/// Reduce `uri` to the key of the URI index: `http://<host>/`.
///
/// Scheme, port, user info, path, query and fragment are all dropped, so
/// `https://example.com:8443/a?b` and `http://example.com/` share a key.
pub fn effective_uri(uri: &Url) -> Result<Url, NetError> {
    let host = uri.host_str().ok_or(NetError::InvalidArgument)?;
    Ok(Url::parse(&format!("http://{host}/"))?)
}

/// Evict-if-stale-or-expired check for an index entry.
///
/// Returns `true` if `cookie` is still the live record for its identity.
/// An expired record is also removed from the primary collection; the
/// caller drops the index entry whenever this returns `false`.
fn retain_live(
    cookies: &mut HashMap<CookieKey, Arc<HttpCookie>>,
    entry: &IndexEntry,
    now: OffsetDateTime,
) -> bool {
    let cookie = &entry.cookie;
    match cookies.get(&entry.key) {
        Some(current) if Arc::ptr_eq(current, cookie) => {}
        _ => {
            tracing::trace!(
                name = %cookie.name,
                domain = ?cookie.domain,
                "purging stale index entry"
            );
            return false;
        }
    }

    if cookie.has_expired_at(now) {
        tracing::debug!(name = %cookie.name, domain = ?cookie.domain, "evicting expired cookie");
        cookies.remove(&entry.key);
        return false;
    }

    true
}

/// Cookies gathered by one `get`, deduplicated by record.
#[derive(Default)]
struct Found {
    secure_link: bool,
    seen: HashSet<*const HttpCookie>,
    cookies: Vec<Arc<HttpCookie>>,
}

impl Found {
    /// [`retain_live`] plus collection of the entry if the link may carry it.
    fn collect(
        &mut self,
        cookies: &mut HashMap<CookieKey, Arc<HttpCookie>>,
        entry: &IndexEntry,
        now: OffsetDateTime,
    ) -> bool {
        if !retain_live(cookies, entry, now) {
            return false;
        }

        let cookie = &entry.cookie;
        if (self.secure_link || !cookie.secure) && self.seen.insert(Arc::as_ptr(cookie)) {
            self.cookies.push(Arc::clone(cookie));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn domain_cookie(name: &str, domain: &str) -> Arc<HttpCookie> {
        Arc::new(HttpCookie::new(name, "v").with_domain(domain).with_path("/"))
    }

    fn expired(name: &str, domain: &str) -> Arc<HttpCookie> {
        Arc::new(
            HttpCookie::new(name, "old")
                .with_domain(domain)
                .with_max_age(60)
                .with_creation_time(OffsetDateTime::now_utc() - Duration::hours(1)),
        )
    }

    fn domain_entries(store: &InMemoryCookieStore) -> usize {
        store.lock().domain_index.values().map(Vec::len).sum()
    }

    fn uri_entries(store: &InMemoryCookieStore) -> usize {
        store.lock().uri_index.values().map(Vec::len).sum()
    }

    #[test]
    fn test_effective_uri() {
        let uri = url("https://user:pw@WWW.Example.com:8443/a/b?q=1#frag");
        let key = effective_uri(&uri).unwrap();
        assert_eq!(key.as_str(), "http://www.example.com/");
    }

    #[test]
    fn test_effective_uri_requires_host() {
        assert_eq!(
            effective_uri(&url("mailto:someone@example.com")),
            Err(NetError::InvalidArgument)
        );
    }

    #[test]
    fn test_add_indexes_by_domain_and_origin() {
        let store = InMemoryCookieStore::new();
        let origin = url("http://www.example.com/login");
        store.add(Some(&origin), domain_cookie("a", ".example.com")).unwrap();

        let jar = store.lock();
        assert_eq!(jar.cookies.len(), 1);
        assert_eq!(jar.domain_index[".example.com"].len(), 1);
        assert_eq!(jar.uri_index[&url("http://www.example.com/")].len(), 1);
    }

    #[test]
    fn test_index_entries_carry_identity() {
        let store = InMemoryCookieStore::new();
        let origin = url("http://www.example.com/");
        store.add(Some(&origin), domain_cookie("Sid", ".Example.com")).unwrap();

        let jar = store.lock();
        let entries = jar.domain_index.values().chain(jar.uri_index.values()).flatten();
        for entry in entries {
            assert_eq!(entry.key, entry.cookie.key());
            assert!(jar.cookies.contains_key(&entry.key));
        }
    }

    #[test]
    fn test_get_returns_each_record_once() {
        let store = InMemoryCookieStore::new();
        let origin = url("http://www.example.com/");
        for i in 0..50 {
            let cookie = HttpCookie::new(format!("c{i}"), "v")
                .with_domain(".example.com")
                .with_version(i % 2);
            store.add(Some(&origin), Arc::new(cookie)).unwrap();
        }

        let got = store.get(&origin).unwrap();
        assert_eq!(got.len(), 50);
        assert_eq!(uri_entries(&store), 50);
        assert_eq!(domain_entries(&store), 50);
    }

    #[test]
    fn test_domain_index_keeps_literal_case() {
        let store = InMemoryCookieStore::new();
        store.add(None, domain_cookie("a", ".Example.COM")).unwrap();

        assert!(store.lock().domain_index.contains_key(".Example.COM"));
        assert_eq!(store.get(&url("http://www.example.com/")).unwrap().len(), 1);
    }

    #[test]
    fn test_hostless_origin_rejected_before_mutation() {
        let store = InMemoryCookieStore::new();
        let cookie = domain_cookie("a", ".example.com");
        store.add(None, Arc::clone(&cookie)).unwrap();

        let replacement = domain_cookie("a", ".example.com");
        let err = store.add(Some(&url("data:text/plain,x")), replacement);

        assert_eq!(err, Err(NetError::InvalidArgument));
        let all = store.all_cookies();
        assert_eq!(all.len(), 1);
        assert!(Arc::ptr_eq(&all[0], &cookie));
    }

    #[test]
    fn test_get_requires_host() {
        let store = InMemoryCookieStore::new();
        assert_eq!(
            store.get(&url("data:text/plain,x")).unwrap_err(),
            NetError::InvalidArgument
        );
    }

    #[test]
    fn test_expired_cookie_purged_from_indices() {
        let store = InMemoryCookieStore::new();
        let origin = url("http://www.example.com/");
        store.add(Some(&origin), expired("old", ".example.com")).unwrap();
        store.add(Some(&origin), domain_cookie("fresh", ".example.com")).unwrap();

        let all = store.all_cookies();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "fresh");
        assert_eq!(store.len(), 1);

        // Index entries survive until a read visits them.
        assert_eq!(domain_entries(&store), 2);
        assert_eq!(uri_entries(&store), 2);

        let got = store.get(&origin).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(domain_entries(&store), 1);
        assert_eq!(uri_entries(&store), 1);
    }

    #[test]
    fn test_get_evicts_expired_from_primary_collection() {
        let store = InMemoryCookieStore::new();
        store.add(None, expired("old", ".example.com")).unwrap();
        assert_eq!(store.len(), 1);

        assert!(store.get(&url("http://www.example.com/")).unwrap().is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(domain_entries(&store), 0);
    }

    #[test]
    fn test_non_matching_domains_are_not_touched() {
        let store = InMemoryCookieStore::new();
        store.add(None, expired("old", ".other.org")).unwrap();

        store.get(&url("http://www.example.com/")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(domain_entries(&store), 1);
    }

    #[test]
    fn test_removed_cookie_becomes_stale_entry() {
        let store = InMemoryCookieStore::new();
        let origin = url("http://www.example.com/");
        let cookie = domain_cookie("a", ".example.com");
        store.add(Some(&origin), Arc::clone(&cookie)).unwrap();

        assert!(store.remove(&cookie));
        assert!(!store.remove(&cookie));
        assert_eq!(domain_entries(&store), 1);
        assert_eq!(uri_entries(&store), 1);

        assert!(store.get(&origin).unwrap().is_empty());
        assert_eq!(domain_entries(&store), 0);
        assert_eq!(uri_entries(&store), 0);
    }

    #[test]
    fn test_replaced_generation_is_stale() {
        let store = InMemoryCookieStore::new();
        let first = HttpCookie::new("sid", "1").with_domain(".Example.com");
        let second = HttpCookie::new("sid", "2").with_domain(".example.com");
        store.add(None, Arc::new(first)).unwrap();
        store.add(None, Arc::new(second)).unwrap();

        // Same identity, but filed under two literal domain keys.
        assert_eq!(domain_entries(&store), 2);

        let got = store.get(&url("http://www.example.com/")).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, "2");
        assert_eq!(domain_entries(&store), 1);
    }

    #[test]
    fn test_same_bucket_replacement() {
        let store = InMemoryCookieStore::new();
        let origin = url("http://www.example.com/");
        store.add(Some(&origin), domain_cookie("a", ".example.com")).unwrap();
        store.add(Some(&origin), domain_cookie("A", ".example.com")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(domain_entries(&store), 1);
        assert_eq!(uri_entries(&store), 1);
    }

    #[test]
    fn test_cookie_in_both_indices_returned_once() {
        let store = InMemoryCookieStore::new();
        let origin = url("http://www.example.com/");
        store.add(Some(&origin), domain_cookie("a", ".example.com")).unwrap();

        assert_eq!(store.get(&origin).unwrap().len(), 1);
    }

    #[test]
    fn test_all_origins_prunes_dead_buckets() {
        let store = InMemoryCookieStore::new();
        let a = url("http://a.example.com/");
        let b = url("http://b.example.com/");
        let cookie = Arc::new(HttpCookie::new("x", "1"));
        store.add(Some(&a), Arc::clone(&cookie)).unwrap();
        store.add(Some(&b), Arc::new(HttpCookie::new("y", "1"))).unwrap();

        store.remove(&cookie);

        assert_eq!(store.all_origins(), vec![b]);
        assert_eq!(store.lock().uri_index.len(), 1);
    }

    #[test]
    fn test_offer_applies_policy() {
        use crate::cookies::policy::CookiePolicy;

        let store = InMemoryCookieStore::new();
        let origin = url("http://www.example.com/");

        assert!(store.offer(&origin, domain_cookie("own", ".example.com")).unwrap());
        assert!(!store.offer(&origin, domain_cookie("foreign", ".other.org")).unwrap());
        assert_eq!(store.len(), 1);

        let open = InMemoryCookieStore::with_config(
            CookieStoreConfig::default().with_policy(CookiePolicy::AcceptAll),
        );
        assert!(open.offer(&origin, domain_cookie("foreign", ".other.org")).unwrap());
        assert_eq!(open.config().policy, CookiePolicy::AcceptAll);
    }

    #[test]
    fn test_clones_share_state() {
        let store = InMemoryCookieStore::new();
        let other = store.clone();
        other.add(None, domain_cookie("a", ".example.com")).unwrap();

        assert!(!store.is_empty());
        assert!(store.remove_all());
        assert!(other.is_empty());
    }
}
