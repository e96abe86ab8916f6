use crate::Document;

impl Document {
    /// Render the subtree rooted at `node_id` as an indented outline, one node per line
    pub fn debug_tree(&self, node_id: usize) -> String {
        fn walk(doc: &Document, node_id: usize, depth: usize, out: &mut String) {
            let Some(node) = doc.get_node(node_id) else {
                return;
            };
            out.push_str(&"  ".repeat(depth));
            out.push_str(&format!("{} {}\n", node.id, node.node_debug_str()));
            for child in &node.children {
                walk(doc, *child, depth + 1, out);
            }
        }

        let mut out = String::new();
        walk(self, node_id, 0, &mut out);
        out
    }

    pub fn print_tree(&self) {
        println!("{}", self.debug_tree(0));
    }
}
