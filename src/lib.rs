//! strdom - hierarchical string domains with wildcard queries
//!
//! This library provides:
//! - Structural helpers for dot-separated domains (`ch.tasoft.application`)
//! - A domain query language with single-segment and subtree wildcards
//! - Collections that index arbitrary elements by domain and return them by query
//!
//! # Example
//!
//! ```rust
//! use strdom::{DomainCollection, DomainTreeCollection, QueryOptions};
//!
//! let mut flat = DomainCollection::new();
//! flat.insert("ch.tasoft", 1).unwrap();
//! flat.insert("ch.apps", 2).unwrap();
//! flat.insert("ch.apps.test", 3).unwrap();
//!
//! let options = QueryOptions::default();
//! let children: Vec<i32> = flat.query("ch.*", &options).map(|hit| *hit.element).collect();
//! assert_eq!(children, vec![1, 2]);
//!
//! let (tree, skipped) = DomainTreeCollection::from_entries(vec![
//!     ("ch.tasoft", 1),
//!     ("ch.apps", 2),
//!     ("ch. apps", 17), // invalid, reported in `skipped`
//! ]);
//! assert_eq!(tree.count(), 2);
//! assert_eq!(skipped.len(), 1);
//! ```
//!
//! # Query Syntax
//!
//! | Query | Description |
//! |-------|-------------|
//! | `ch.tasoft` | Exact domain |
//! | `ch.*` | `*` stands for exactly one segment |
//! | `ch.` | Every domain below `ch` (not `ch` itself) |
//! | `ch.*.app.` | Forms combine freely |
//!
//! Literal segments compare ASCII case-insensitively unless
//! [`QueryOptions::case_sensitive`] is set. An empty query matches nothing.
//!
//! # Domain Grammar
//!
//! Valid domains are non-empty runs of `[A-Za-z0-9_]` joined by single dots.
//! Collections reject anything else with [`DomainError::InvalidDomain`]; the
//! matcher itself accepts any string and compares it segment by segment.

pub mod collection;
pub mod domain;
pub mod error;
pub mod matcher;
pub mod types;

// Re-export commonly used items
pub use collection::{DomainCollection, DomainIndex, DomainTreeCollection, EntryKey};
pub use domain::{
    explode, get_last, get_parent, implode, is_sub_domain, is_valid, Domain, SEPARATOR, WILDCARD,
};
pub use error::{DomainError, ErrorKind, Result};
pub use matcher::{matches, DomainQuery, QueryCache, DEFAULT_CACHE_SIZE};
pub use types::{Hit, QueryOptions};
