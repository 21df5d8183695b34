//! Domain query matching.
//!
//! A domain query is a domain-shaped pattern with two wildcard forms:
//!
//! | Query | Matches |
//! |-------|---------|
//! | `ch.tasoft.application` | exactly that domain |
//! | `ch.*.application` | any one segment in place of `*` |
//! | `ch.tasoft.` | every domain strictly below `ch.tasoft` |
//!
//! The forms compose, e.g. `ch.*.application.*.`.
//!
//! ## Example
//!
//! ```
//! use strdom::matcher::{matches, DomainQuery};
//!
//! assert!(matches("ch.tasoft.application", "ch.*.application", false));
//! assert!(!matches("ch.tasoft.application", "ch.*", false));
//!
//! let query = DomainQuery::new("ch.", false);
//! assert!(query.matches("CH.apps.test"));
//! assert!(!query.matches("ch"));
//! ```

mod cache;
mod query;

pub use cache::{QueryCache, DEFAULT_CACHE_SIZE};
pub use query::{matches, DomainQuery, QuerySegment, QueryTail};
