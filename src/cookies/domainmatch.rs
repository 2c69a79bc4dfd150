//! Domain matching between a cookie's declared domain and a request host.
//!
//! Two rules exist, chosen by the cookie's version:
//! - version 0 uses the lenient Netscape rule ([`netscape_domain_matches`]),
//! - version 1 and later use RFC 2965 ([`HttpCookie::domain_matches`]).
//!
//! All comparisons are ASCII case-insensitive. Hosts coming out of
//! [`url::Url`] are already IDNA-encoded, so byte-wise comparison is enough.

use crate::cookies::httpcookie::HttpCookie;

/// Domain-matching rule for a stored cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainMatchRule {
    /// Original Netscape cookie spec, used for version 0 cookies.
    Netscape,
    /// RFC 2965, used for version 1+ cookies.
    Rfc2965,
}

impl DomainMatchRule {
    pub fn for_version(version: u32) -> Self {
        if version == 0 {
            DomainMatchRule::Netscape
        } else {
            DomainMatchRule::Rfc2965
        }
    }

    pub fn matches(self, domain: &str, host: &str) -> bool {
        match self {
            DomainMatchRule::Netscape => netscape_domain_matches(domain, host),
            DomainMatchRule::Rfc2965 => HttpCookie::domain_matches(domain, host),
        }
    }
}

/// Netscape-style domain match.
///
/// Unlike RFC 2965 the part of `host` in front of `domain` is not inspected,
/// so `x.y.example.com` matches `.example.com`.
pub fn netscape_domain_matches(domain: &str, host: &str) -> bool {
    let local = is_local_domain(domain);
    if !local && !has_embedded_dot(domain) {
        return false;
    }

    if local && !host.contains('.') {
        return true;
    }

    let (domain, host) = (domain.as_bytes(), host.as_bytes());
    match host.len().checked_sub(domain.len()) {
        Some(0) => host.eq_ignore_ascii_case(domain),
        Some(diff) => host[diff..].eq_ignore_ascii_case(domain),
        None if domain.len() - host.len() == 1 => {
            domain[0] == b'.' && host.eq_ignore_ascii_case(&domain[1..])
        }
        None => false,
    }
}

/// True if `domain` has a dot past its optional leading dot that is not its last byte.
pub(crate) fn has_embedded_dot(domain: &str) -> bool {
    let bytes = domain.as_bytes();
    let start = usize::from(bytes.first() == Some(&b'.'));
    bytes[start..]
        .iter()
        .position(|&b| b == b'.')
        .is_some_and(|pos| start + pos != bytes.len() - 1)
}

pub(crate) fn is_local_domain(domain: &str) -> bool {
    domain.eq_ignore_ascii_case(".local")
}
