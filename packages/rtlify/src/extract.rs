//! Text extraction

use rtlify_dom::{Document, NodeRef};

use crate::TextCache;

/// The text a node currently presents, without touching the cache.
///
/// Text inputs contribute their value and placeholder; everything else its full text content.
pub fn current_text(doc: &Document, node_id: usize) -> String {
    let Some(element) = doc.get_node(node_id).and_then(|node| node.element_data()) else {
        return doc.text_content(node_id);
    };

    match element.name.as_str() {
        "input" | "textarea" => {
            let value = match element.attr("value") {
                Some(value) => value.to_string(),
                None if element.is("textarea") => doc.text_content(node_id),
                None => String::new(),
            };
            let placeholder = element.attr("placeholder").unwrap_or_default();
            format!("{value} {placeholder}").trim().to_string()
        }
        _ => doc.text_content(node_id),
    }
}

/// Extract a node's text and write it to the cache, replacing any stale entry.
/// Returns `None` if the node no longer exists.
pub fn extract(doc: &Document, node: NodeRef, cache: &mut TextCache) -> Option<String> {
    let node_id = doc.resolve(node)?.id;
    let text = current_text(doc, node_id);
    cache.store(node, text.clone());
    Some(text)
}
