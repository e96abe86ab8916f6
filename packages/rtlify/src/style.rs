//! Style application and reversal
//!
//! The processed marker and the ratio attribute are the only durable artifacts of
//! classification. Every inline declaration written here is listed in [`MANAGED_PROPERTIES`]
//! so that [`revert`] can undo it.

use rtlify_dom::{Document, DomError, TreeTraverser};

use crate::TagCategory;
use crate::classify::{RATIO_EPSILON, round_ratio};

pub const PROCESSED_ATTR: &str = "data-rtl-processed";
pub const RATIO_ATTR: &str = "data-rtl-ratio";

pub const MANAGED_PROPERTIES: [&str; 4] = ["text-align", "direction", "unicode-bidi", "transition"];

const TRANSITION: &str = "text-align 0.3s ease";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Style declarations were written
    Styled,
    /// The node already carried an equivalent ratio; nothing was rewritten
    Unchanged,
    /// The node carries an explicit left-to-right direction and was left alone
    Overridden,
}

/// Whether the element carries `dir="ltr"`
pub fn has_ltr_override(doc: &Document, node_id: usize) -> bool {
    doc.get_node(node_id)
        .and_then(|node| node.attr("dir"))
        .is_some_and(|dir| dir.trim().eq_ignore_ascii_case("ltr"))
}

/// The ratio recorded by the last style application
pub fn applied_ratio(doc: &Document, node_id: usize) -> Option<f32> {
    doc.get_node(node_id)?.attr(RATIO_ATTR)?.parse().ok()
}

pub fn is_styled(doc: &Document, node_id: usize) -> bool {
    doc.get_node(node_id)
        .is_some_and(|node| node.attr(PROCESSED_ATTR).is_some() || node.attr(RATIO_ATTR).is_some())
}

/// Style an element for right-to-left content
pub fn apply(
    doc: &mut Document,
    node_id: usize,
    category: TagCategory,
    ratio: f32,
    visual_feedback: bool,
) -> Result<Applied, DomError> {
    if has_ltr_override(doc, node_id) {
        return Ok(Applied::Overridden);
    }

    let ratio = round_ratio(ratio);
    if applied_ratio(doc, node_id).is_some_and(|applied| (applied - ratio).abs() < RATIO_EPSILON) {
        if doc.attribute(node_id, PROCESSED_ATTR).is_none() {
            doc.set_attribute(node_id, PROCESSED_ATTR, "true")?;
        }
        return Ok(Applied::Unchanged);
    }

    doc.set_style_property(node_id, "text-align", category.text_align())?;
    if category == TagCategory::GenericContainer {
        // Containers may hold children with their own direction
        doc.set_style_property(node_id, "unicode-bidi", "plaintext")?;
    } else {
        doc.set_style_property(node_id, "direction", "rtl")?;
        doc.set_style_property(node_id, "unicode-bidi", "embed")?;
    }
    if visual_feedback {
        doc.set_style_property(node_id, "transition", TRANSITION)?;
    }

    doc.set_attribute(node_id, RATIO_ATTR, &format!("{ratio:.2}"))?;
    doc.set_attribute(node_id, PROCESSED_ATTR, "true")?;
    Ok(Applied::Styled)
}

/// Remove every declaration and attribute [`apply`] may have written
pub fn revert(doc: &mut Document, node_id: usize) -> Result<(), DomError> {
    for property in MANAGED_PROPERTIES {
        doc.remove_style_property(node_id, property)?;
    }
    doc.remove_attribute(node_id, RATIO_ATTR)?;
    doc.remove_attribute(node_id, PROCESSED_ATTR)?;
    Ok(())
}

/// Revert every element carrying the processed marker. Returns the number of elements reverted.
pub fn remove_all(doc: &mut Document) -> usize {
    let styled: Vec<usize> = TreeTraverser::new(doc)
        .filter(|id| {
            doc.get_node(*id)
                .is_some_and(|node| node.attr(PROCESSED_ATTR).is_some())
        })
        .collect();

    let mut reverted = 0;
    for node_id in styled {
        match revert(doc, node_id) {
            Ok(()) => reverted += 1,
            Err(err) => tracing::warn!("Failed to revert styling of node {node_id}: {err}"),
        }
    }
    reverted
}
