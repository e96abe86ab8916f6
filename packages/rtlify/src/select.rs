//! Target discovery
//!
//! Filtering is side-effect free: discovery reads the cache but never writes it.

use rtlify_dom::{Display, Document, NodeRef, TreeTraverser};

use crate::category::candidate_category;
use crate::extract::current_text;
use crate::TextCache;
use crate::style;

/// Whether an element is rendered.
///
/// An empty layout box, `display: none`, a hidden `visibility` or zero opacity hide the element,
/// as does `display: none` on an ancestor. Anything the host has not resolved counts as visible.
pub fn is_visible(doc: &Document, node_id: usize) -> bool {
    let Some(element) = doc.get_node(node_id).and_then(|node| node.element_data()) else {
        return false;
    };

    if element.layout_size.is_some_and(|size| size.is_empty()) {
        return false;
    }
    if element.computed.is_some_and(|style| style.hides_content()) {
        return false;
    }

    !doc.ancestors(node_id).any(|id| {
        doc.get_node(id)
            .and_then(|node| node.element_data())
            .and_then(|el| el.computed)
            .is_some_and(|style| style.display == Display::None)
    })
}

/// Whether a node should be (re)processed: eligible, visible, and not already processed with
/// the text it currently presents, or styled against an author override
pub fn accepts(doc: &Document, node: NodeRef, cache: &TextCache) -> bool {
    let Some(node_id) = doc
        .resolve(node)
        .filter(|n| n.is_in_document())
        .map(|n| n.id)
    else {
        return false;
    };

    if candidate_category(doc, node_id).is_none() || !is_visible(doc, node_id) {
        return false;
    }
    // A styled node that gained a left-to-right override must be reverted
    !cache.is_current(doc, node, &current_text(doc, node_id))
        || (style::has_ltr_override(doc, node_id) && style::is_styled(doc, node_id))
}

/// Every node in the subtree rooted at `root` (inclusive) that should be processed, in document order
pub fn discover(doc: &Document, root: usize, cache: &TextCache) -> Vec<NodeRef> {
    TreeTraverser::new_with_root(doc, root)
        .filter_map(|id| doc.node_ref(id))
        .filter(|node| accepts(doc, *node, cache))
        .collect()
}

/// Keep the candidates that should be processed
pub fn filter(
    doc: &Document,
    candidates: impl IntoIterator<Item = NodeRef>,
    cache: &TextCache,
) -> Vec<NodeRef> {
    candidates
        .into_iter()
        .filter(|node| accepts(doc, *node, cache))
        .collect()
}
