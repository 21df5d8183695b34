//! Collections indexing elements by domain.
//!
//! - [`DomainCollection`] keeps a flat, insertion-ordered map from domain to
//!   elements and answers queries by scanning every key.
//! - [`DomainTreeCollection`] keeps a segment-keyed tree and answers queries by
//!   walking only the branches the query can reach.
//!
//! Both answer the same queries with the same results (order aside), see
//! [`crate::matcher`] for the query syntax.

mod entries;
mod flat;
mod tree;

pub use entries::EntryKey;
pub use flat::{DomainCollection, Query};
pub use tree::{DomainTreeCollection, TreeQuery};

use crate::error::Result;
use crate::types::{Hit, QueryOptions};

/// Capabilities shared by all domain-indexed collections
pub trait DomainIndex<T> {
    /// Append `element` under `domain`. Fails with `InvalidDomain` for a domain
    /// outside the grammar.
    fn insert(&mut self, domain: &str, element: T) -> Result<()>;

    /// Append `elements` under `domain` in order. The domain's bucket exists
    /// afterwards even when `elements` is empty.
    fn extend(&mut self, domain: &str, elements: Vec<T>) -> Result<()>;

    /// Remove elements stored under `domain`. Returns whether anything was removed.
    fn remove(&mut self, domain: &str) -> bool;

    /// Total number of stored elements
    fn count(&self) -> usize;

    /// All elements whose domain matches `query`, paired with their domain.
    fn query<'a>(
        &'a self,
        query: &str,
        options: &QueryOptions,
    ) -> Box<dyn Iterator<Item = Hit<'a, T>> + 'a>
    where
        T: 'a;
}
