//! Mutation-driven change detection
//!
//! The watcher holds a single document-wide observer. Each call to [`ChangeWatcher::collect`]
//! drains the observer, turns the records into a set of affected elements and restarts the
//! debounce timer. Once the document has been quiet for the configured delay,
//! [`ChangeWatcher::poll`] hands the accumulated set over for reprocessing.

use std::time::Duration;

use indexmap::IndexSet;
use rtlify_dom::{
    Document, DomError, MutationKind, MutationObserverInit, MutationRecord, NodeRef, ObserverId,
    TreeTraverser,
};
use smol_str::SmolStr;

use crate::TextCache;
use crate::category::candidate_category;

/// Attributes whose changes alter the text an element presents
pub const WATCHED_ATTRIBUTES: [&str; 3] = ["value", "placeholder", "contenteditable"];

pub fn observer_init() -> MutationObserverInit {
    MutationObserverInit {
        child_list: true,
        character_data: true,
        attributes: true,
        attribute_filter: Some(WATCHED_ATTRIBUTES.iter().map(SmolStr::new).collect()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceState {
    #[default]
    Idle,
    /// Changes are accumulating; flush once `deadline` passes without further changes
    PendingTimer { deadline: Duration },
    /// The accumulated set has been handed out and is being reprocessed
    Flushing,
}

#[derive(Debug)]
pub struct ChangeWatcher {
    observer: Option<ObserverId>,
    delay: Duration,
    state: DebounceState,
    pending: IndexSet<NodeRef>,
}

impl ChangeWatcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            observer: None,
            delay,
            state: DebounceState::Idle,
            pending: IndexSet::new(),
        }
    }

    /// Register the document-wide observer. Subscribing twice is a no-op.
    pub fn subscribe(&mut self, doc: &mut Document) -> Result<(), DomError> {
        if self.observer.is_none() {
            self.observer = Some(doc.observe(observer_init())?);
        }
        Ok(())
    }

    pub fn unsubscribe(&mut self, doc: &mut Document) {
        if let Some(observer) = self.observer.take() {
            if let Err(err) = doc.disconnect(observer) {
                tracing::debug!("Observer already gone: {err}");
            }
        }
        self.cancel();
    }

    pub fn is_subscribed(&self) -> bool {
        self.observer.is_some()
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn deadline(&self) -> Option<Duration> {
        match self.state {
            DebounceState::PendingTimer { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drain and drop undelivered records. Returns the number dropped.
    pub fn discard(&mut self, doc: &mut Document) -> usize {
        let Some(observer) = self.observer else {
            return 0;
        };
        match doc.take_records(observer) {
            Ok(records) => records.len(),
            Err(err) => {
                tracing::warn!("Lost mutation observer: {err}");
                self.observer = None;
                0
            }
        }
    }

    /// Drain undelivered records into the pending set, restarting the debounce timer when
    /// anything was observed. Returns the number of records consumed.
    pub fn collect(&mut self, doc: &mut Document, cache: &mut TextCache, now: Duration) -> usize {
        let Some(observer) = self.observer else {
            return 0;
        };
        let records = match doc.take_records(observer) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!("Lost mutation observer: {err}");
                self.observer = None;
                return 0;
            }
        };
        if records.is_empty() {
            return 0;
        }

        let affected = affected(doc, &records, cache);
        tracing::trace!(
            "{} mutation records touched {} elements",
            records.len(),
            affected.len()
        );
        self.pending.extend(affected);
        self.state = DebounceState::PendingTimer {
            deadline: now + self.delay,
        };
        records.len()
    }

    /// Hand out the pending set once the debounce deadline has passed
    pub fn poll(&mut self, now: Duration) -> Option<Vec<NodeRef>> {
        match self.state {
            DebounceState::PendingTimer { deadline } if now >= deadline => {
                self.state = DebounceState::Flushing;
                Some(self.pending.drain(..).collect())
            }
            _ => None,
        }
    }

    /// The flushed set has been forwarded; return to idle
    pub fn flushed(&mut self) {
        if self.state == DebounceState::Flushing {
            self.state = DebounceState::Idle;
        }
    }

    /// Forget pending work and stop the timer
    pub fn cancel(&mut self) {
        self.pending.clear();
        self.state = DebounceState::Idle;
    }
}

/// Elements whose presented text may have changed because of `records`.
///
/// Changed elements lose their cache entry so they are reclassified even when their text
/// ends up identical. Removed subtrees are pruned from the cache.
pub fn affected(
    doc: &Document,
    records: &[MutationRecord],
    cache: &mut TextCache,
) -> IndexSet<NodeRef> {
    let mut out = IndexSet::new();
    let mut removed_any = false;

    for record in records {
        match &record.kind {
            MutationKind::ChildList { added, removed } => {
                // Any insertion changes the text content of the parent
                if !added.is_empty() {
                    touch(doc, record.target, cache, &mut out);
                }
                for node in added {
                    let Some(added) = doc.resolve(*node).filter(|n| n.is_element()) else {
                        continue;
                    };
                    for id in TreeTraverser::new_with_root(doc, added.id) {
                        if doc.get_node(id).is_some_and(|n| n.is_element()) {
                            if let Some(node) = doc.node_ref(id) {
                                out.insert(node);
                            }
                        }
                    }
                }
                if !removed.is_empty() {
                    removed_any = true;
                    touch(doc, record.target, cache, &mut out);
                }
            }
            MutationKind::CharacterData { .. } | MutationKind::Attributes { .. } => {
                touch(doc, record.target, cache, &mut out);
            }
        }
    }

    if removed_any {
        cache.prune(doc);
    }
    out
}

/// Invalidate the nearest element of `target` and the closest candidate containing it
fn touch(doc: &Document, target: NodeRef, cache: &mut TextCache, out: &mut IndexSet<NodeRef>) {
    let Some(node_id) = doc.resolve(target).map(|node| node.id) else {
        return;
    };
    let Some(element) = doc.nearest_element(node_id) else {
        return;
    };

    let candidate = std::iter::once(element)
        .chain(doc.ancestors(element))
        .find(|id| candidate_category(doc, *id).is_some());

    for id in std::iter::once(element).chain(candidate) {
        if let Some(node) = doc.node_ref(id) {
            cache.invalidate(node);
            out.insert(node);
        }
    }
}
