use std::collections::HashMap;
use std::slice;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::entries::{json_entries, populate, EntryKey};
use super::DomainIndex;
use crate::domain::is_valid;
use crate::error::{DomainError, Result};
use crate::matcher::DomainQuery;
use crate::types::{Hit, QueryOptions};

/// Flat domain collection.
///
/// Maps each domain to an ordered bucket of elements. Buckets keep insertion
/// order, domains keep the order in which they were first inserted. Queries
/// test every stored domain against the compiled query.
#[derive(Debug, Clone)]
pub struct DomainCollection<T> {
    /// (domain, bucket) in first-insertion order
    buckets: Vec<(String, Vec<T>)>,
    /// domain -> position in `buckets`
    positions: HashMap<String, usize>,
}

impl<T> Default for DomainCollection<T> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T> DomainCollection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `domain -> element` pairs.
    ///
    /// Entries whose key is not a valid domain string are skipped; their errors
    /// are returned alongside the collection.
    pub fn from_entries<K: Into<EntryKey>>(
        entries: impl IntoIterator<Item = (K, T)>,
    ) -> (Self, Vec<DomainError>) {
        Self::from_buckets(entries.into_iter().map(|(key, element)| (key, vec![element])))
    }

    /// Build from `domain -> elements` pairs, skipping unusable keys like
    /// [`DomainCollection::from_entries`].
    pub fn from_buckets<K: Into<EntryKey>>(
        entries: impl IntoIterator<Item = (K, Vec<T>)>,
    ) -> (Self, Vec<DomainError>) {
        let mut collection = Self::new();
        let skipped = populate(&mut collection, entries);
        (collection, skipped)
    }

    /// Build from a JSON object mapping domains to an element or an array of elements.
    pub fn from_json(value: &Value) -> Result<(Self, Vec<DomainError>)>
    where
        T: DeserializeOwned,
    {
        let (entries, mut skipped) = json_entries(value)?;
        let (collection, rejected) = Self::from_buckets(entries);
        skipped.extend(rejected);
        Ok((collection, skipped))
    }

    /// Append an element to the domain's bucket.
    pub fn insert(&mut self, domain: &str, element: T) -> Result<()> {
        self.bucket_mut(domain)?.push(element);
        Ok(())
    }

    /// Append several elements to the domain's bucket, in order.
    pub fn extend(&mut self, domain: &str, elements: impl IntoIterator<Item = T>) -> Result<()> {
        self.bucket_mut(domain)?.extend(elements);
        Ok(())
    }

    /// Replace the domain's bucket.
    pub fn set(&mut self, domain: &str, elements: Vec<T>) -> Result<()> {
        *self.bucket_mut(domain)? = elements;
        Ok(())
    }

    /// Elements stored under exactly `domain`.
    pub fn get(&self, domain: &str) -> Option<&[T]> {
        self.positions
            .get(domain)
            .map(|&pos| self.buckets[pos].1.as_slice())
    }

    /// Remove the domain's bucket, returning its elements.
    pub fn remove(&mut self, domain: &str) -> Option<Vec<T>> {
        let pos = self.positions.remove(domain)?;
        let (_, bucket) = self.buckets.remove(pos);

        for (key, _) in &self.buckets[pos..] {
            if let Some(p) = self.positions.get_mut(key) {
                *p -= 1;
            }
        }

        Some(bucket)
    }

    /// Remove every element equal to `element` from all buckets.
    ///
    /// Emptied buckets stay in place.
    pub fn remove_element<F>(&mut self, element: &T, eq: F)
    where
        F: Fn(&T, &T) -> bool,
    {
        for (_, bucket) in &mut self.buckets {
            bucket.retain(|stored| !eq(stored, element));
        }
    }

    /// Total number of elements across all buckets
    pub fn count(&self) -> usize {
        self.buckets.iter().map(|(_, bucket)| bucket.len()).sum()
    }

    /// Number of stored domains, including empty buckets
    pub fn len_domains(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Stored domains in first-insertion order
    pub fn domains(&self) -> impl Iterator<Item = &str> + '_ {
        self.buckets.iter().map(|(domain, _)| domain.as_str())
    }

    /// Every element with its domain
    pub fn iter(&self) -> impl Iterator<Item = Hit<'_, T>> + '_ {
        self.buckets.iter().flat_map(|(domain, bucket)| {
            bucket
                .iter()
                .map(move |element| Hit::new(domain.as_str(), element))
        })
    }

    /// Elements whose domain matches `query`, paired with their domain.
    ///
    /// The iterator reads the collection as it is when enumerated; query again
    /// to see later changes.
    pub fn query(&self, query: &str, options: &QueryOptions) -> Query<'_, T> {
        Query {
            query: DomainQuery::new(query, options.case_sensitive),
            buckets: self.buckets.iter(),
            current: None,
        }
    }

    /// Elements whose domain matches `query`
    pub fn elements_by_query(&self, query: &str, options: &QueryOptions) -> Vec<&T> {
        self.query(query, options).map(|hit| hit.element).collect()
    }

    fn bucket_mut(&mut self, domain: &str) -> Result<&mut Vec<T>> {
        if !is_valid(domain) {
            return Err(DomainError::InvalidDomain(domain.to_string()));
        }

        let pos = match self.positions.get(domain) {
            Some(&pos) => pos,
            None => {
                self.buckets.push((domain.to_string(), Vec::new()));
                let pos = self.buckets.len() - 1;
                self.positions.insert(domain.to_string(), pos);
                pos
            }
        };

        Ok(&mut self.buckets[pos].1)
    }
}

impl<T> DomainIndex<T> for DomainCollection<T> {
    fn insert(&mut self, domain: &str, element: T) -> Result<()> {
        DomainCollection::insert(self, domain, element)
    }

    fn extend(&mut self, domain: &str, elements: Vec<T>) -> Result<()> {
        DomainCollection::extend(self, domain, elements)
    }

    fn remove(&mut self, domain: &str) -> bool {
        DomainCollection::remove(self, domain).is_some()
    }

    fn count(&self) -> usize {
        DomainCollection::count(self)
    }

    fn query<'a>(
        &'a self,
        query: &str,
        options: &QueryOptions,
    ) -> Box<dyn Iterator<Item = Hit<'a, T>> + 'a>
    where
        T: 'a,
    {
        Box::new(DomainCollection::query(self, query, options))
    }
}

/// Lazy query over a [`DomainCollection`]
pub struct Query<'a, T> {
    query: DomainQuery,
    buckets: slice::Iter<'a, (String, Vec<T>)>,
    current: Option<(&'a str, slice::Iter<'a, T>)>,
}

impl<'a, T> Iterator for Query<'a, T> {
    type Item = Hit<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((domain, elements)) = &mut self.current {
                if let Some(element) = elements.next() {
                    return Some(Hit::new(*domain, element));
                }
                self.current = None;
            }

            let (domain, bucket) = self.buckets.next()?;
            if !bucket.is_empty() && self.query.matches(domain) {
                self.current = Some((domain.as_str(), bucket.iter()));
            }
        }
    }
}
