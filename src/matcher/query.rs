use std::fmt;

use crate::domain::{SEPARATOR, WILDCARD};

/// One segment of a compiled domain query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySegment {
    /// Matches exactly this segment (under the query's case rule)
    Literal(String),
    /// `*`: matches any one non-empty segment
    Any,
}

impl QuerySegment {
    /// Match a single domain segment.
    #[inline]
    pub fn matches(&self, segment: &str, case_sensitive: bool) -> bool {
        match self {
            QuerySegment::Any => !segment.is_empty(),
            QuerySegment::Literal(literal) if case_sensitive => literal == segment,
            QuerySegment::Literal(literal) => literal.eq_ignore_ascii_case(segment),
        }
    }
}

/// What a query requires after its last segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTail {
    /// The domain ends exactly where the query ends: `a.b.c`
    Exact,
    /// The domain continues by at least one more segment: `a.b.`
    Descendants,
}

/// A parsed domain query.
///
/// Compile once with [`DomainQuery::new`], then test any number of domains
/// with [`DomainQuery::matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainQuery {
    raw: String,
    segments: Vec<QuerySegment>,
    tail: QueryTail,
    case_sensitive: bool,
}

impl DomainQuery {
    /// Parse a query string.
    ///
    /// The first empty segment terminates the query as a descendants wildcard,
    /// anything after it is ignored.
    pub fn new(query: &str, case_sensitive: bool) -> Self {
        let mut segments = Vec::new();
        let mut tail = QueryTail::Exact;

        for part in query.split(SEPARATOR) {
            if part.is_empty() {
                tail = QueryTail::Descendants;
                break;
            }
            if part == WILDCARD {
                segments.push(QuerySegment::Any);
            } else {
                segments.push(QuerySegment::Literal(part.to_string()));
            }
        }

        Self {
            raw: query.to_string(),
            segments,
            tail,
            case_sensitive,
        }
    }

    /// Check whether `domain` matches this query.
    pub fn matches(&self, domain: &str) -> bool {
        if self.is_empty() {
            return false;
        }

        let mut parts = domain.split(SEPARATOR);
        for segment in &self.segments {
            match parts.next() {
                Some(part) if segment.matches(part, self.case_sensitive) => {}
                _ => return false,
            }
        }

        match self.tail {
            QueryTail::Exact => parts.next().is_none(),
            QueryTail::Descendants => parts.next().is_some(),
        }
    }

    /// An empty query matches nothing.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn segments(&self) -> &[QuerySegment] {
        &self.segments
    }

    pub fn tail(&self) -> QueryTail {
        self.tail
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for DomainQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Check whether `domain` matches the domain query `query`.
///
/// - `*` matches exactly one segment: `ch.*` matches `ch.apps`, not `ch.apps.test`
/// - a trailing dot matches every deeper domain: `ch.` matches `ch.apps` and
///   `ch.apps.test`, but not `ch` itself
/// - an empty query never matches
///
/// Without `case_sensitive`, literals compare with ASCII case folding.
pub fn matches(domain: &str, query: &str, case_sensitive: bool) -> bool {
    if query.is_empty() {
        return false;
    }
    DomainQuery::new(query, case_sensitive).matches(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = "ch.tasoft.application";

    #[test]
    fn test_exact_match() {
        assert!(matches(APP, "ch.tasoft.application", false));
        assert!(!matches(APP, "ch", false));
        assert!(!matches(APP, "ch.tasoft", false));
        assert!(!matches(APP, "ch.tasoft.app", false));
        assert!(!matches(APP, "ch.tasoft.application.test", false));
    }

    #[test]
    fn test_empty_query_never_matches() {
        assert!(!matches(APP, "", false));
        assert!(!matches("", "", false));
        assert!(!DomainQuery::new("", true).matches(""));
    }

    #[test]
    fn test_single_level_wildcard() {
        assert!(matches(APP, "ch.tasoft.*", false));
        assert!(matches(APP, "ch.*.application", false));
        assert!(matches("ch.test.application", "ch.*.application", false));
        assert!(matches("ch.abc.application.hello", "ch.*.application.*", false));
        assert!(matches(
            "ch.tasoft.application.test._2",
            "ch.*.application.*._2",
            false
        ));

        assert!(!matches(APP, "ch.*", false));
        assert!(!matches(APP, "ch.tasoft.application.*", false));
    }

    #[test]
    fn test_wildcard_needs_non_empty_segment() {
        assert!(!matches("ch..app", "ch.*.app", false));
        assert!(!matches("", "*", false));
    }

    #[test]
    fn test_wildcard_only_as_whole_segment() {
        // "app*" is a literal, not a glob
        assert!(!matches(APP, "ch.tasoft.app*", false));
        assert!(matches("ch.tasoft.app*", "ch.tasoft.app*", false));
    }

    #[test]
    fn test_descendants_wildcard() {
        assert!(matches(APP, "ch.", false));
        assert!(matches(APP, "ch.tasoft.", false));
        assert!(matches(
            "ch.test.application.hello.world",
            "ch.*.application.",
            false
        ));
        assert!(matches(APP, ".", false));
    }

    #[test]
    fn test_descendants_wildcard_excludes_the_prefix_itself() {
        assert!(!matches(APP, "ch.tasoft.application.", false));
        assert!(!matches("ch", "ch.", false));
        assert!(!matches(APP, "de.", false));
    }

    #[test]
    fn test_empty_segment_terminates_query() {
        let query = DomainQuery::new("ch..ignored", false);
        assert_eq!(query.tail(), QueryTail::Descendants);
        assert_eq!(query.segments().len(), 1);
        assert!(query.matches(APP));
    }

    #[test]
    fn test_case_folding() {
        assert!(matches("CH.abc.APPlicatiON.hello", "CH.*.APPlicatiON.*", false));
        assert!(matches("CH.abc.APPlicatiON.hello", "ch.*.application.*", false));
        assert!(matches("CH.abc.APP.hello", "ch.*.app.*", false));

        assert!(!matches("CH.abc.APPlicatiON.hello", "ch.*.application.*", true));
        assert!(!matches("CH.abc.APP.hello", "ch.*.app.*", true));
        assert!(matches("CH.abc.APP.hello", "CH.*.APP.*", true));
    }

    #[test]
    fn test_malformed_domain_is_matched_structurally() {
        // " abc" is just another segment to the wildcard
        assert!(matches("ch. abc.application.hello", "ch.*.application.*", false));
        assert!(matches("ch.tasoft.", "ch.tasoft.", false));
        assert!(!matches("ch. abc", "ch.abc", false));
    }

    #[test]
    fn test_compiled_query_is_reusable() {
        let query = DomainQuery::new("ch.*", false);
        assert_eq!(query.segments(), &[QuerySegment::Literal("ch".into()), QuerySegment::Any]);
        assert_eq!(query.tail(), QueryTail::Exact);
        assert_eq!(query.to_string(), "ch.*");

        assert!(query.matches("ch.tasoft"));
        assert!(query.matches("CH.apps"));
        assert!(!query.matches("ch.apps.test"));
        assert!(!query.matches("ch"));
    }
}
