use std::collections::HashMap;
use std::slice;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::entries::{json_entries, populate, EntryKey};
use super::DomainIndex;
use crate::domain::{is_valid, SEPARATOR};
use crate::error::{DomainError, Result};
use crate::matcher::{DomainQuery, QuerySegment, QueryTail};
use crate::types::{Hit, QueryOptions};

/// One trie node: children keyed by segment, plus the elements of the domain
/// ending here (`None` for pure routing nodes).
#[derive(Debug, Clone)]
struct TreeNode<T> {
    /// (segment, child) in first-insertion order
    children: Vec<(String, TreeNode<T>)>,
    /// segment -> position in `children`
    positions: HashMap<String, usize>,
    elements: Option<Vec<T>>,
}

impl<T> TreeNode<T> {
    fn new() -> Self {
        Self {
            children: Vec::new(),
            positions: HashMap::new(),
            elements: None,
        }
    }

    fn child(&self, segment: &str) -> Option<&TreeNode<T>> {
        self.positions
            .get(segment)
            .map(|&pos| &self.children[pos].1)
    }

    fn child_or_insert(&mut self, segment: &str) -> &mut TreeNode<T> {
        let pos = match self.positions.get(segment) {
            Some(&pos) => pos,
            None => {
                self.children.push((segment.to_string(), TreeNode::new()));
                let pos = self.children.len() - 1;
                self.positions.insert(segment.to_string(), pos);
                pos
            }
        };
        &mut self.children[pos].1
    }

    fn remove_child(&mut self, segment: &str) -> Option<TreeNode<T>> {
        let pos = self.positions.remove(segment)?;
        let (_, child) = self.children.remove(pos);

        for (key, _) in &self.children[pos..] {
            if let Some(p) = self.positions.get_mut(key) {
                *p -= 1;
            }
        }

        Some(child)
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn count(&self) -> usize {
        let own = self.elements.as_ref().map_or(0, Vec::len);
        own + self.children.iter().map(|(_, c)| c.count()).sum::<usize>()
    }

    fn retain<F: FnMut(&T) -> bool>(&mut self, keep: &mut F) {
        if let Some(elements) = &mut self.elements {
            elements.retain(|e| keep(e));
        }
        for (_, child) in &mut self.children {
            child.retain(keep);
        }
    }

    fn collect_domains(&self, path: &str, out: &mut Vec<String>) {
        for (segment, child) in &self.children {
            let domain = join(path, segment);
            if child.elements.is_some() {
                out.push(domain.clone());
            }
            child.collect_domains(&domain, out);
        }
    }
}

fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", parent, SEPARATOR, segment)
    }
}

/// Tree domain collection.
///
/// Stores elements at the node reached by walking a domain's segments from the
/// root, so `ch.apps.test` lives below `ch` and `ch.apps`. Queries descend only
/// into children that agree with the query's segments; a trailing-dot query
/// switches to visiting the whole subtree below the matched node.
///
/// ```
/// use strdom::{DomainTreeCollection, QueryOptions};
///
/// let mut tree = DomainTreeCollection::new();
/// tree.insert("ch.tasoft", 1).unwrap();
/// tree.insert("ch.apps", 2).unwrap();
/// tree.insert("ch.apps.test", 3).unwrap();
///
/// assert_eq!(tree.lookup("ch.tasoft"), Some(&[1][..]));
///
/// let options = QueryOptions::new().with_leaves_only(true);
/// let leaves: Vec<i32> = tree.query("ch.*", &options).map(|hit| *hit.element).collect();
/// assert_eq!(leaves, vec![1]);
/// ```
#[derive(Debug, Clone)]
pub struct DomainTreeCollection<T> {
    root: TreeNode<T>,
}

impl<T> Default for DomainTreeCollection<T> {
    fn default() -> Self {
        Self {
            root: TreeNode::new(),
        }
    }
}

impl<T> DomainTreeCollection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `domain -> element` pairs, skipping and reporting entries
    /// whose key is not a valid domain string.
    pub fn from_entries<K: Into<EntryKey>>(
        entries: impl IntoIterator<Item = (K, T)>,
    ) -> (Self, Vec<DomainError>) {
        Self::from_buckets(entries.into_iter().map(|(key, element)| (key, vec![element])))
    }

    /// Build from `domain -> elements` pairs.
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

    /// Append an element at the domain's node, creating the path as needed.
    pub fn insert(&mut self, domain: &str, element: T) -> Result<()> {
        self.elements_mut(domain)?.push(element);
        Ok(())
    }

    /// Append several elements at the domain's node, in order.
    pub fn extend(&mut self, domain: &str, elements: impl IntoIterator<Item = T>) -> Result<()> {
        self.elements_mut(domain)?.extend(elements);
        Ok(())
    }

    /// Replace the elements at the domain's node.
    pub fn set(&mut self, domain: &str, elements: Vec<T>) -> Result<()> {
        *self.elements_mut(domain)? = elements;
        Ok(())
    }

    /// Elements stored at exactly `domain`.
    ///
    /// `None` when the path does not exist or only routes to deeper domains.
    pub fn lookup(&self, domain: &str) -> Option<&[T]> {
        let mut node = &self.root;
        for segment in domain.split(SEPARATOR) {
            node = node.child(segment)?;
        }
        node.elements.as_deref()
    }

    /// Remove the whole top-level branch containing `domain`.
    ///
    /// Only the first segment is considered: removing `ch.apps` drops every
    /// domain below `ch`, including `ch.tasoft`.
    pub fn remove(&mut self, domain: &str) -> bool {
        let top = domain.split(SEPARATOR).next().unwrap_or(domain);
        match self.root.remove_child(top) {
            Some(branch) => {
                debug!(domain, branch = top, elements = branch.count(), "removed top-level branch");
                true
            }
            None => false,
        }
    }

    /// Remove every element equal to `element` from all nodes.
    pub fn remove_element<F>(&mut self, element: &T, eq: F)
    where
        F: Fn(&T, &T) -> bool,
    {
        self.root.retain(&mut |stored: &T| !eq(stored, element));
    }

    /// Total number of elements in the tree
    pub fn count(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Domains with elements attached, in depth-first order
    pub fn domains(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_domains("", &mut out);
        out
    }

    /// Every element with its domain, in depth-first order
    pub fn iter(&self) -> TreeQuery<'_, T> {
        TreeQuery::new(&self.root, DomainQuery::new(".", true), false)
    }

    /// Elements whose domain matches `query`, paired with their domain.
    ///
    /// With `leaves_only`, an exact-depth match is skipped when deeper domains
    /// exist below it; trailing-dot matches are always yielded.
    pub fn query(&self, query: &str, options: &QueryOptions) -> TreeQuery<'_, T> {
        TreeQuery::new(
            &self.root,
            DomainQuery::new(query, options.case_sensitive),
            options.leaves_only,
        )
    }

    /// Elements whose domain matches `query`
    pub fn elements_by_query(&self, query: &str, options: &QueryOptions) -> Vec<&T> {
        self.query(query, options).map(|hit| hit.element).collect()
    }

    fn elements_mut(&mut self, domain: &str) -> Result<&mut Vec<T>> {
        if !is_valid(domain) {
            return Err(DomainError::InvalidDomain(domain.to_string()));
        }

        let mut node = &mut self.root;
        for segment in domain.split(SEPARATOR) {
            node = node.child_or_insert(segment);
        }
        Ok(node.elements.get_or_insert_with(Vec::new))
    }
}

impl<T> DomainIndex<T> for DomainTreeCollection<T> {
    fn insert(&mut self, domain: &str, element: T) -> Result<()> {
        DomainTreeCollection::insert(self, domain, element)
    }

    fn extend(&mut self, domain: &str, elements: Vec<T>) -> Result<()> {
        DomainTreeCollection::extend(self, domain, elements)
    }

    fn remove(&mut self, domain: &str) -> bool {
        DomainTreeCollection::remove(self, domain)
    }

    fn count(&self) -> usize {
        DomainTreeCollection::count(self)
    }

    fn query<'a>(
        &'a self,
        query: &str,
        options: &QueryOptions,
    ) -> Box<dyn Iterator<Item = Hit<'a, T>> + 'a>
    where
        T: 'a,
    {
        Box::new(DomainTreeCollection::query(self, query, options))
    }
}

/// How to continue below a visited node
#[derive(Debug, Clone, Copy)]
enum Descend {
    /// Query exhausted
    Stop,
    /// Match children against the query segment at this index
    Segment(usize),
    /// Visit and yield the whole subtree
    All,
}

struct Frame<'a, T> {
    node: &'a TreeNode<T>,
    path: String,
    emit: bool,
    descend: Descend,
}

/// Lazy depth-first query over a [`DomainTreeCollection`]
pub struct TreeQuery<'a, T> {
    query: DomainQuery,
    leaves_only: bool,
    stack: Vec<Frame<'a, T>>,
    pending: Option<(String, slice::Iter<'a, T>)>,
}

impl<'a, T> TreeQuery<'a, T> {
    fn new(root: &'a TreeNode<T>, query: DomainQuery, leaves_only: bool) -> Self {
        let descend = if query.segments().is_empty() {
            Descend::All
        } else {
            Descend::Segment(0)
        };

        let mut stack = Vec::new();
        if !query.is_empty() {
            stack.push(Frame {
                node: root,
                path: String::new(),
                emit: false,
                descend,
            });
        }

        Self {
            query,
            leaves_only,
            stack,
            pending: None,
        }
    }

    /// Children of `frame` to visit, in sibling order.
    fn expand(&self, frame: &Frame<'a, T>) -> Vec<Frame<'a, T>> {
        let depth = match frame.descend {
            Descend::Stop => return Vec::new(),
            Descend::All => {
                return frame
                    .node
                    .children
                    .iter()
                    .map(|(segment, child)| Frame {
                        node: child,
                        path: join(&frame.path, segment),
                        emit: true,
                        descend: Descend::All,
                    })
                    .collect();
            }
            Descend::Segment(depth) => depth,
        };

        let segments = self.query.segments();
        let last = depth + 1 == segments.len();
        let (emit_exact, descend) = match (last, self.query.tail()) {
            (false, _) => (false, Descend::Segment(depth + 1)),
            (true, QueryTail::Descendants) => (false, Descend::All),
            (true, QueryTail::Exact) => (true, Descend::Stop),
        };

        let visit = |segment: &str, child: &'a TreeNode<T>| Frame {
            node: child,
            path: join(&frame.path, segment),
            emit: emit_exact && (!self.leaves_only || child.is_leaf()),
            descend,
        };

        let case_sensitive = self.query.case_sensitive();
        match &segments[depth] {
            QuerySegment::Literal(literal) if case_sensitive => frame
                .node
                .child(literal)
                .map(|child| visit(literal, child))
                .into_iter()
                .collect(),
            segment => frame
                .node
                .children
                .iter()
                .filter(|(key, _)| segment.matches(key, case_sensitive))
                .map(|(key, child)| visit(key, child))
                .collect(),
        }
    }
}

impl<'a, T> Iterator for TreeQuery<'a, T> {
    type Item = Hit<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((domain, elements)) = &mut self.pending {
                if let Some(element) = elements.next() {
                    return Some(Hit::new(domain.clone(), element));
                }
                self.pending = None;
            }

            let frame = self.stack.pop()?;
            let children = self.expand(&frame);
            self.stack.extend(children.into_iter().rev());

            if frame.emit {
                if let Some(elements) = &frame.node.elements {
                    self.pending = Some((frame.path, elements.iter()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample() -> DomainTreeCollection<i32> {
        let mut dt = DomainTreeCollection::new();
        dt.insert("ch.tasoft", 1).unwrap();
        dt.insert("ch.apps", 2).unwrap();
        dt.insert("ch.apps.test", 3).unwrap();
        dt
    }

    fn elements(dt: &DomainTreeCollection<i32>, query: &str, options: &QueryOptions) -> Vec<i32> {
        dt.elements_by_query(query, options)
            .into_iter()
            .copied()
            .collect()
    }

    #[test]
    fn test_lookup() {
        let dt = sample();
        assert_eq!(dt.lookup("ch.tasoft"), Some(&[1][..]));
        assert_eq!(dt.lookup("ch.apps.test"), Some(&[3][..]));
        assert_eq!(dt.lookup("ch.missing"), None);
        assert_eq!(dt.lookup("ch"), None, "routing node has no elements");
        assert_eq!(dt.lookup(""), None);
    }

    #[test]
    fn test_count() {
        let mut dt = sample();
        assert_eq!(dt.count(), 3);
        dt.extend("ch.tasoft.app", [4, 5, 6]).unwrap();
        assert_eq!(dt.count(), 6);
        dt.set("ch.apps", vec![2, 3]).unwrap();
        assert_eq!(dt.count(), 7);
        assert_eq!(dt.lookup("ch.apps"), Some(&[2, 3][..]));
    }

    #[test]
    fn test_insert_rejects_invalid_domain() {
        let mut dt = sample();
        let err = dt.insert("ch..apps", 9).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDomain);
        assert_eq!(dt.count(), 3);
        assert_eq!(dt.lookup("ch"), None, "failed insert must not create nodes");
    }

    #[test]
    fn test_query_exact_and_wildcards() {
        let dt = sample();
        let options = QueryOptions::default();

        assert_eq!(elements(&dt, "ch.tasoft", &options), vec![1]);
        assert_eq!(elements(&dt, "ch.*", &options), vec![1, 2]);
        assert_eq!(elements(&dt, "ch.", &options), vec![1, 2, 3]);
        assert_eq!(elements(&dt, "ch.*.*", &options), vec![3]);
        assert_eq!(elements(&dt, "*.apps.", &options), vec![3]);
        assert_eq!(elements(&dt, ".", &options), vec![1, 2, 3]);
        assert!(elements(&dt, "ch", &options).is_empty());
        assert!(elements(&dt, "", &options).is_empty());
    }

    #[test]
    fn test_descendants_query_excludes_matched_node() {
        let dt = sample();
        let options = QueryOptions::default();
        assert_eq!(elements(&dt, "ch.apps.", &options), vec![3]);
        assert!(elements(&dt, "ch.apps.test.", &options).is_empty());
    }

    #[test]
    fn test_query_reconstructs_domains() {
        let dt = sample();
        let domains: Vec<String> = dt
            .query("ch.", &QueryOptions::default())
            .map(|hit| hit.domain().to_string())
            .collect();
        assert_eq!(domains, vec!["ch.tasoft", "ch.apps", "ch.apps.test"]);
    }

    #[test]
    fn test_leaves_only() {
        let dt = sample();
        let leaves = QueryOptions::new().with_leaves_only(true);

        // ch.apps has ch.apps.test below it
        assert_eq!(elements(&dt, "ch.*", &leaves), vec![1]);
        assert!(elements(&dt, "ch.apps", &leaves).is_empty());
        // descendants mode ignores leaves_only
        assert_eq!(elements(&dt, "ch.", &leaves), vec![1, 2, 3]);
    }

    #[test]
    fn test_query_case_rule() {
        let mut dt = DomainTreeCollection::new();
        dt.insert("CH.Apps.test", 1).unwrap();
        let sensitive = QueryOptions::new().with_case_sensitive(true);

        assert_eq!(elements(&dt, "ch.apps.test", &QueryOptions::default()), vec![1]);
        assert!(elements(&dt, "ch.apps.test", &sensitive).is_empty());
        assert_eq!(elements(&dt, "CH.Apps.test", &sensitive), vec![1]);
        assert_eq!(elements(&dt, "CH.*.", &sensitive), vec![1]);
    }

    #[test]
    fn test_remove_drops_top_level_branch() {
        let mut dt = sample();
        dt.insert("de.apps", 4).unwrap();

        assert!(dt.remove("ch.apps"));
        assert_eq!(dt.count(), 1);
        assert_eq!(dt.lookup("ch.tasoft"), None);
        assert_eq!(dt.lookup("de.apps"), Some(&[4][..]));

        assert!(!dt.remove("ch"));
        assert!(!dt.remove("missing"));
    }

    #[test]
    fn test_remove_element() {
        let mut dt = sample();
        dt.insert("ch.apps.test", 1).unwrap();
        dt.remove_element(&1, |a, b| a == b);

        assert_eq!(dt.count(), 2);
        assert_eq!(dt.lookup("ch.tasoft"), Some(&[][..]));
        assert_eq!(dt.lookup("ch.apps.test"), Some(&[3][..]));
    }

    #[test]
    fn test_domains_and_iter() {
        let mut dt = sample();
        dt.insert("de", 4).unwrap();

        assert_eq!(dt.domains(), vec!["ch.tasoft", "ch.apps", "ch.apps.test", "de"]);
        let all: Vec<i32> = dt.iter().map(|hit| *hit.element).collect();
        assert_eq!(all, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_from_entries() {
        let (dt, skipped) = DomainTreeCollection::from_entries(vec![
            (EntryKey::from("ch.tasoft"), 1),
            (EntryKey::from("ch.apps"), 2),
            (EntryKey::from("ch.apps.test"), 3),
            (EntryKey::Index(56), 17),
        ]);
        assert_eq!(dt.count(), 3);
        assert_eq!(dt.lookup("ch.tasoft"), Some(&[1][..]));
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn test_from_json() {
        let value = serde_json::json!({ "ch.apps": ["a", "b"], "ch": "c" });
        let (dt, skipped) = DomainTreeCollection::<String>::from_json(&value).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(dt.count(), 3);
        assert_eq!(dt.lookup("ch"), Some(&["c".to_string()][..]));
    }
}
