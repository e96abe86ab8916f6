//! Weak, lifetime-bound text cache
//!
//! Entries are keyed by [`NodeRef`], which never keeps a node alive: the document owns every
//! node, and a reference to a removed node simply stops resolving. Every read validates the
//! key against the document, so an entry for a dropped node is never observed even before
//! [`TextCache::prune`] removes it.

use std::collections::HashMap;

use rtlify_dom::{Document, NodeRef};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry {
    text: String,
    processed: bool,
}

#[derive(Debug, Default)]
pub struct TextCache {
    entries: HashMap<NodeRef, CacheEntry>,
}

impl TextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last extracted text of a live node
    pub fn get<'a>(&'a self, doc: &Document, node: NodeRef) -> Option<&'a str> {
        if !doc.is_live(node) {
            return None;
        }
        self.entries.get(&node).map(|entry| entry.text.as_str())
    }

    /// Overwrite the cached text. A changed text clears the processed flag.
    /// Returns whether the text differed from the cached one.
    pub fn store(&mut self, node: NodeRef, text: String) -> bool {
        match self.entries.get_mut(&node) {
            Some(entry) if entry.text == text => false,
            Some(entry) => {
                entry.text = text;
                entry.processed = false;
                true
            }
            None => {
                self.entries.insert(
                    node,
                    CacheEntry {
                        text,
                        processed: false,
                    },
                );
                true
            }
        }
    }

    pub fn mark_processed(&mut self, node: NodeRef) {
        if let Some(entry) = self.entries.get_mut(&node) {
            entry.processed = true;
        }
    }

    pub fn is_processed(&self, doc: &Document, node: NodeRef) -> bool {
        doc.is_live(node) && self.entries.get(&node).is_some_and(|entry| entry.processed)
    }

    /// Whether the node was processed with exactly `text`
    pub fn is_current(&self, doc: &Document, node: NodeRef, text: &str) -> bool {
        doc.is_live(node)
            && self
                .entries
                .get(&node)
                .is_some_and(|entry| entry.processed && entry.text == text)
    }

    /// Drop the entry for a node. Returns whether there was one.
    pub fn invalidate(&mut self, node: NodeRef) -> bool {
        self.entries.remove(&node).is_some()
    }

    /// Drop the entries of every node that no longer exists. Returns the number removed.
    pub fn prune(&mut self, doc: &Document) -> usize {
        let before = self.entries.len();
        self.entries.retain(|node, _| doc.is_live(*node));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
