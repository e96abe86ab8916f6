//! Mutation records and observer registrations
//!
//! Observers are document-wide: every mutation of a node connected to the document root is
//! offered to every registered observer, which keeps it if its [`MutationObserverInit`] selects
//! the mutation type. Records accumulate until the observer drains them with
//! [`Document::take_records`](crate::Document::take_records).

use smol_str::SmolStr;

use crate::NodeRef;

/// Handle to a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) usize);

/// Which mutations an observer is interested in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    /// When set, only attribute mutations whose name is listed are recorded
    pub attribute_filter: Option<Vec<SmolStr>>,
}

impl MutationObserverInit {
    pub fn is_valid(&self) -> bool {
        self.child_list || self.character_data || self.attributes
    }

    pub fn matches(&self, record: &MutationRecord) -> bool {
        match &record.kind {
            MutationKind::ChildList { .. } => self.child_list,
            MutationKind::CharacterData { .. } => self.character_data,
            MutationKind::Attributes { name, .. } => {
                self.attributes
                    && self
                        .attribute_filter
                        .as_ref()
                        .is_none_or(|filter| filter.iter().any(|allowed| allowed == name))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were inserted into or removed from the target
    ChildList {
        added: Vec<NodeRef>,
        removed: Vec<NodeRef>,
    },
    /// The target text node's content changed
    CharacterData { old_value: String },
    /// An attribute of the target element changed
    Attributes {
        name: SmolStr,
        old_value: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeRef,
    pub kind: MutationKind,
}

#[derive(Debug)]
pub(crate) struct Observer {
    pub(crate) init: MutationObserverInit,
    pub(crate) records: Vec<MutationRecord>,
}
