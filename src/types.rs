use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Options for collection queries.
///
/// Deserializes from partial configuration, missing fields take their defaults:
///
/// ```
/// use strdom::QueryOptions;
///
/// let options: QueryOptions = serde_json::from_str(r#"{"leaves_only": true}"#).unwrap();
/// assert!(options.leaves_only);
/// assert!(!options.case_sensitive);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Compare literal segments byte-for-byte instead of ASCII case-insensitively
    pub case_sensitive: bool,
    /// Tree collections only: on an exact-depth match, skip nodes that have
    /// deeper domains below them
    pub leaves_only: bool,
}

impl QueryOptions {
    /// Create default query options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set leaves-only matching.
    pub fn with_leaves_only(mut self, leaves_only: bool) -> Self {
        self.leaves_only = leaves_only;
        self
    }
}

/// One query result: an element and the domain it is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit<'a, T> {
    /// Owning domain
    pub domain: Cow<'a, str>,
    /// The stored element
    pub element: &'a T,
}

impl<'a, T> Hit<'a, T> {
    pub fn new(domain: impl Into<Cow<'a, str>>, element: &'a T) -> Self {
        Self {
            domain: domain.into(),
            element,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}
