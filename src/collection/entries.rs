use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::DomainIndex;
use crate::domain::is_valid;
use crate::error::{DomainError, Result};

/// Key of an initial construction entry.
///
/// Only text keys can name a domain; index keys (as produced by a JSON array)
/// are rejected with `InvalidKeyType`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Text(String),
    Index(i64),
}

impl From<&str> for EntryKey {
    fn from(key: &str) -> Self {
        EntryKey::Text(key.to_string())
    }
}

impl From<String> for EntryKey {
    fn from(key: String) -> Self {
        EntryKey::Text(key)
    }
}

impl From<i64> for EntryKey {
    fn from(key: i64) -> Self {
        EntryKey::Index(key)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Text(key) => f.write_str(key),
            EntryKey::Index(key) => write!(f, "{}", key),
        }
    }
}

/// Fill `index` from key/bucket pairs, skipping entries with unusable keys.
///
/// Returns the skipped entries' errors in input order.
pub(crate) fn populate<T, I, K>(
    index: &mut I,
    entries: impl IntoIterator<Item = (K, Vec<T>)>,
) -> Vec<DomainError>
where
    I: DomainIndex<T>,
    K: Into<EntryKey>,
{
    let mut skipped = Vec::new();
    let mut accepted = 0usize;

    for (key, elements) in entries {
        let domain = match key.into() {
            EntryKey::Text(domain) if is_valid(&domain) => domain,
            EntryKey::Text(domain) => {
                warn!(domain = %domain, "invalid domain, entry skipped");
                skipped.push(DomainError::InvalidDomain(domain));
                continue;
            }
            EntryKey::Index(key) => {
                warn!(key, "key must be a domain string, entry skipped");
                skipped.push(DomainError::InvalidKeyType(key.to_string()));
                continue;
            }
        };

        match index.extend(&domain, elements) {
            Ok(()) => accepted += 1,
            Err(err) => skipped.push(err),
        }
    }

    debug!(accepted, skipped = skipped.len(), "domain collection populated");
    skipped
}

/// Split a JSON construction input into key/bucket pairs.
///
/// An object maps each key to one element or to an array of elements. A
/// top-level array has index keys only.
pub(crate) fn json_entries<T: DeserializeOwned>(
    value: &Value,
) -> Result<(Vec<(EntryKey, Vec<T>)>, Vec<DomainError>)> {
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    match value {
        Value::Object(map) => {
            for (key, item) in map {
                match json_elements(item) {
                    Ok(elements) => entries.push((EntryKey::Text(key.clone()), elements)),
                    Err(err) => {
                        warn!(domain = %key, error = %err, "invalid element, entry skipped");
                        skipped.push(DomainError::InvalidElement {
                            domain: key.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
        Value::Array(items) => {
            // Elements are irrelevant: every key is rejected by populate()
            for i in 0..items.len() {
                entries.push((EntryKey::Index(i as i64), Vec::new()));
            }
        }
        other => {
            return Err(DomainError::InvalidInput(format!(
                "expected a JSON object keyed by domain, got {}",
                json_type_name(other)
            )))
        }
    }

    Ok((entries, skipped))
}

fn json_elements<T: DeserializeOwned>(item: &Value) -> serde_json::Result<Vec<T>> {
    match item {
        Value::Array(items) => items.iter().map(T::deserialize).collect(),
        single => Ok(vec![T::deserialize(single)?]),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
