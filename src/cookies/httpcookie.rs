use crate::cookies::domainmatch::{has_embedded_dot, is_local_domain};
use time::OffsetDateTime;

/// `max_age` of a cookie that carries no Max-Age; it lives until the store is cleared.
pub const MAX_AGE_UNSPECIFIED: i64 = -1;

/// Represents a cookie as received from a server.
///
/// Records are immutable once handed to a store; the store shares them
/// through `Arc` rather than copying them.
#[derive(Debug, Clone)]
pub struct HttpCookie {
    pub name: String,
    pub value: String,
    /// Declared domain. An empty domain is stored as `None`.
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    /// 0 for Netscape-style cookies, 1 for RFC 2965 cookies.
    pub version: u32,
    /// Seconds from `creation_time`; see [`MAX_AGE_UNSPECIFIED`].
    pub max_age: i64,
    pub creation_time: OffsetDateTime,
}

/// Identity of a cookie: name and domain compared case-insensitively, path exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CookieKey {
    name: String,
    domain: Option<String>,
    path: Option<String>,
}

impl HttpCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: false,
            version: 1,
            max_age: MAX_AGE_UNSPECIFIED,
            creation_time: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.domain = (!domain.is_empty()).then_some(domain);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_creation_time(mut self, creation_time: OffsetDateTime) -> Self {
        self.creation_time = creation_time;
        self
    }

    /// Build a record from a cookie already parsed by the `cookie` crate.
    ///
    /// `Set-Cookie` cookies are Netscape-style, so the record gets version 0.
    /// The `cookie` crate drops the leading dot of `Domain`; it is put back,
    /// since `Domain=example.com` and `Domain=.example.com` mean the same.
    ///
    /// Max-Age wins over Expires. An `Expires` date becomes the number of
    /// seconds left until it, so a date in the past yields `max_age == 0`.
    /// With neither attribute the record gets [`MAX_AGE_UNSPECIFIED`].
    pub fn from_cookie(parsed: &cookie::Cookie<'_>) -> Self {
        let mut c = Self::new(parsed.name(), parsed.value())
            .with_secure(parsed.secure().unwrap_or(false))
            .with_version(0);
        let domain = parsed.domain().map(|d| d.trim_start_matches('.'));
        if let Some(domain) = domain.filter(|d| !d.is_empty()) {
            c = c.with_domain(format!(".{domain}"));
        }
        if let Some(path) = parsed.path() {
            c = c.with_path(path);
        }
        match (parsed.max_age(), parsed.expires_datetime()) {
            (Some(max_age), _) => c.max_age = max_age.whole_seconds().max(0),
            (None, Some(expires)) => {
                c.max_age = (expires - c.creation_time).whole_seconds().max(0);
            }
            (None, None) => {}
        }
        c
    }

    pub fn has_expired(&self) -> bool {
        self.has_expired_at(OffsetDateTime::now_utc())
    }

    /// Expiry test against an explicit clock reading.
    pub fn has_expired_at(&self, now: OffsetDateTime) -> bool {
        match self.max_age {
            0 => true,
            age if age < 0 => false,
            age => (now - self.creation_time).whole_seconds() > age,
        }
    }

    /// Whether `other` denotes the same stored cookie as `self`.
    pub fn same_identity(&self, other: &HttpCookie) -> bool {
        let domains_match = match (&self.domain, &other.domain) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        self.name.eq_ignore_ascii_case(&other.name) && domains_match && self.path == other.path
    }

    pub(crate) fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.to_ascii_lowercase(),
            domain: self.domain.as_deref().map(str::to_ascii_lowercase),
            path: self.path.clone(),
        }
    }

    /// RFC 2965 §3.3.2 domain-match.
    ///
    /// A host domain-matches when it is the domain itself, or one label
    /// directly beneath it (`www.example.com` for `.example.com`, but not
    /// `a.b.example.com`). Dotless hosts also match `.local` and `host.local`.
    pub fn domain_matches(domain: &str, host: &str) -> bool {
        let local = is_local_domain(domain);
        if !local && !has_embedded_dot(domain) {
            return false;
        }

        if !host.contains('.') && (local || Self::is_host_local(domain, host)) {
            return true;
        }

        let (domain, host) = (domain.as_bytes(), host.as_bytes());
        match host.len().checked_sub(domain.len()) {
            Some(0) => host.eq_ignore_ascii_case(domain),
            Some(diff) => {
                let (prefix, suffix) = host.split_at(diff);
                !prefix.contains(&b'.') && suffix.eq_ignore_ascii_case(domain)
            }
            None if domain.len() - host.len() == 1 => {
                domain[0] == b'.' && host.eq_ignore_ascii_case(&domain[1..])
            }
            None => false,
        }
    }

    fn is_host_local(domain: &str, host: &str) -> bool {
        domain.len() == host.len() + ".local".len()
            && domain.get(..host.len()).is_some_and(|h| h.eq_ignore_ascii_case(host))
            && domain.get(host.len()..).is_some_and(is_local_domain)
    }
}
