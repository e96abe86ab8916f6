//! The document model driven by rtlify
//!
//! This crate implements a small headless DOM ([`Document`]) designed to be embedded in and
//! "driven" by external code: a host mirrors its rendered tree into it (elements, text, the
//! computed visibility inputs and layout sizes it has resolved) and the `rtlify` engine reads
//! and styles it.
//!
//! It includes a slab-backed tree with weak node references ([`NodeRef`]), attributes and
//! inline style, document-wide mutation observers, and embedded frames subject to a
//! same-origin check.

/// The DOM implementation.
///
/// This is the primary entry point for this crate.
mod document;

/// The nodes themselves, and their data.
pub mod node;

mod config;
mod debug;
mod error;
pub mod mutation;
pub mod traversal;

pub use config::DocumentConfig;
pub use document::{Document, SharedDocument};
pub use error::{DomError, FrameAccessError};
pub use mutation::{MutationKind, MutationObserverInit, MutationRecord, ObserverId};
pub use node::{
    Attribute, ComputedStyle, Display, ElementData, FrameContent, LayoutSize, Node, NodeData,
    NodeFlags, NodeRef, TextNodeData, Visibility,
};
pub use traversal::TreeTraverser;
