//! Domain grammar.
//!
//! A domain is a non-empty sequence of segments joined by [`SEPARATOR`], e.g.
//! `ch.tasoft.application`. Segments consist of ASCII letters, digits and `_`.
//!
//! The free functions here are structural and tolerant: they split and join on
//! the separator without judging the input. [`is_valid`] and the [`Domain`]
//! newtype apply the grammar.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Separator between domain segments
pub const SEPARATOR: char = '.';

/// Query token matching exactly one segment
pub const WILDCARD: &str = "*";

/// Grammar for a valid domain: one or more non-empty `[A-Za-z0-9_]` runs joined by single dots
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*$")
        .expect("DOMAIN_PATTERN: hardcoded regex is invalid")
});

/// Divide a domain into its segments.
///
/// `explode("")` yields a single empty segment, so that [`implode`] restores it.
pub fn explode(domain: &str) -> Vec<&str> {
    domain.split(SEPARATOR).collect()
}

/// Join segments into a domain.
pub fn implode<S: AsRef<str>>(segments: &[S]) -> String {
    let mut domain = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            domain.push(SEPARATOR);
        }
        domain.push_str(segment.as_ref());
    }
    domain
}

/// Split off the last segment. Returns `(last, parent)`.
///
/// For a single-segment domain the parent is empty.
pub fn get_last(domain: &str) -> (&str, &str) {
    match domain.rsplit_once(SEPARATOR) {
        Some((parent, last)) => (last, parent),
        None => (domain, ""),
    }
}

/// Split off the parent domain. Returns `(parent, last)`.
pub fn get_parent(domain: &str) -> (&str, &str) {
    let (last, parent) = get_last(domain);
    (parent, last)
}

/// Check a domain against the grammar.
pub fn is_valid(domain: &str) -> bool {
    DOMAIN_PATTERN.is_match(domain)
}

/// Check whether `sub_domain` lies strictly below `domain`.
///
/// `is_sub_domain("ch.tasoft", "ch.tasoft.app", false)` is true, while a domain
/// is never a sub domain of itself.
pub fn is_sub_domain(domain: &str, sub_domain: &str, case_sensitive: bool) -> bool {
    let n = domain.len();
    if n == 0 || sub_domain.len() <= n + 1 {
        return false;
    }

    let (head, rest) = sub_domain.as_bytes().split_at(n);
    if rest[0] != SEPARATOR as u8 {
        return false;
    }

    if case_sensitive {
        head == domain.as_bytes()
    } else {
        head.eq_ignore_ascii_case(domain.as_bytes())
    }
}

/// A domain string known to satisfy the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    /// Validate and wrap a domain string.
    pub fn new(domain: impl Into<String>) -> Result<Self> {
        let domain = domain.into();
        if is_valid(&domain) {
            Ok(Self(domain))
        } else {
            Err(DomainError::InvalidDomain(domain))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the segments, root first.
    pub fn segments(&self) -> std::str::Split<'_, char> {
        self.0.split(SEPARATOR)
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.matches(SEPARATOR).count() + 1
    }

    /// The last segment.
    pub fn last(&self) -> &str {
        get_last(&self.0).0
    }

    /// The parent domain, or `None` for a single-segment domain.
    pub fn parent(&self) -> Option<Domain> {
        self.0
            .rsplit_once(SEPARATOR)
            .map(|(parent, _)| Domain(parent.to_string()))
    }

    /// Append one segment.
    pub fn child(&self, segment: &str) -> Result<Domain> {
        Domain::new(format!("{}{}{}", self.0, SEPARATOR, segment))
    }

    /// Case-sensitive check whether `other` lies strictly below this domain.
    pub fn is_ancestor_of(&self, other: &Domain) -> bool {
        is_sub_domain(&self.0, &other.0, true)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Domain::new(s)
    }
}

impl TryFrom<String> for Domain {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Domain::new(value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.0
    }
}
