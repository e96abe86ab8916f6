use crate::Document;

/// Pre-order, depth-first traversal of a subtree
pub struct TreeTraverser<'a> {
    doc: &'a Document,
    stack: Vec<usize>,
}

impl<'a> TreeTraverser<'a> {
    /// Traverse the whole document
    pub fn new(doc: &'a Document) -> Self {
        Self::new_with_root(doc, 0)
    }

    pub fn new_with_root(doc: &'a Document, root: usize) -> Self {
        let mut stack = Vec::with_capacity(32);
        if doc.get_node(root).is_some() {
            stack.push(root);
        }
        TreeTraverser { doc, stack }
    }
}

impl Iterator for TreeTraverser<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let Some(node) = self.doc.get_node(id) {
            self.stack.extend(node.children.iter().rev());
        }
        Some(id)
    }
}

/// Walks from a node's parent up to the document root
pub struct AncestorTraverser<'a> {
    doc: &'a Document,
    current: Option<usize>,
}

impl<'a> AncestorTraverser<'a> {
    pub fn new(doc: &'a Document, node_id: usize) -> Self {
        let current = doc.get_node(node_id).and_then(|node| node.parent);
        AncestorTraverser { doc, current }
    }
}

impl Iterator for AncestorTraverser<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.doc.get_node(id).and_then(|node| node.parent);
        Some(id)
    }
}
