use thiserror::Error;

/// Errors returned by tree operations on a [`Document`](crate::Document)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node id does not refer to a live node
    #[error("Node {0} does not exist")]
    UnknownNode(usize),

    /// The operation requires an element
    #[error("Node {0} is not an element")]
    NotAnElement(usize),

    /// The operation requires a text node
    #[error("Node {0} is not a text node")]
    NotATextNode(usize),

    /// The insertion would produce an invalid tree (cycle, non-container parent, root move)
    #[error("Invalid hierarchy: cannot insert node {child} into node {parent}")]
    HierarchyRequest { parent: usize, child: usize },

    /// The operation requires a frame element
    #[error("Node {0} is not a frame element")]
    NotAFrame(usize),

    /// The document root cannot be removed
    #[error("The document root cannot be removed")]
    RemoveRoot,

    /// The observer options select no mutation type
    #[error("Mutation observer must observe child list, character data or attributes")]
    InvalidObserverInit,

    /// The observer id is not registered on this document
    #[error("Mutation observer {0} is not registered")]
    UnknownObserver(usize),
}

/// Errors returned when reaching into an embedded frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameAccessError {
    #[error("Node {0} is not a frame element")]
    NotAFrame(usize),

    /// The frame's origin differs from the embedding document's origin
    #[error("Blocked access to cross-origin frame {0}")]
    CrossOrigin(String),

    /// The host has not created a document for the frame yet
    #[error("Frame has no content document")]
    NoContentDocument,
}
