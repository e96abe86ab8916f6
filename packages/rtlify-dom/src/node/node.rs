use bitflags::bitflags;

use super::ElementData;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u32 {
        /// Whether the node is connected to the document root
        const IS_IN_DOCUMENT = 0b0000_0001;
    }
}

impl NodeFlags {
    #[inline(always)]
    pub fn is_in_document(&self) -> bool {
        self.contains(Self::IS_IN_DOCUMENT)
    }
}

/// A weak reference to a node.
///
/// Slab slots are reused once a node is removed, but serials never are. Resolving a `NodeRef`
/// through [`Document::resolve`](crate::Document::resolve) therefore fails once the node it
/// was created from has been dropped, even if another node now occupies the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    id: usize,
    serial: u64,
}

impl NodeRef {
    pub(crate) fn new(id: usize, serial: u64) -> Self {
        Self { id, serial }
    }

    /// The slab slot the node occupied when this reference was taken
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

pub struct Node {
    /// Our Id
    pub id: usize,
    /// Document-unique creation counter, see [`NodeRef`]
    pub(crate) serial: u64,
    /// Our parent's ID
    pub parent: Option<usize>,
    /// What are our children?
    pub children: Vec<usize>,

    /// Node type (Element, Text, etc) specific data
    pub data: NodeData,

    pub flags: NodeFlags,

    /// Incremented on every inline style write, including writes of an identical value
    pub style_generation: u64,
}

impl Node {
    pub(crate) fn new(id: usize, serial: u64, data: NodeData) -> Self {
        Self {
            id,
            serial,
            parent: None,
            children: Vec::new(),
            data,
            flags: NodeFlags::empty(),
            style_generation: 0,
        }
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.id, self.serial)
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_text_node(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn element_data(&self) -> Option<&ElementData> {
        self.data.downcast_element()
    }

    pub fn element_data_mut(&mut self) -> Option<&mut ElementData> {
        self.data.downcast_element_mut()
    }

    pub fn text_data(&self) -> Option<&TextNodeData> {
        match &self.data {
            NodeData::Text(data) => Some(data),
            _ => None,
        }
    }

    /// The element's tag name, if this is an element
    pub fn local_name(&self) -> Option<&str> {
        self.element_data().map(|el| el.name.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element_data()?.attr(name)
    }

    pub fn is_in_document(&self) -> bool {
        self.flags.is_in_document()
    }

    pub fn node_debug_str(&self) -> String {
        match &self.data {
            NodeData::Document => "DOCUMENT".to_string(),
            NodeData::Comment => "COMMENT".to_string(),
            NodeData::Text(data) => {
                let mut preview: String = data.content.chars().take(20).collect();
                if data.content.chars().count() > 20 {
                    preview.push('…');
                }
                format!("TEXT {preview:?}")
            }
            NodeData::Element(el) => {
                let mut out = format!("<{}", el.name);
                for attr in el.attrs() {
                    out.push_str(&format!(" {}={:?}", attr.name, attr.value));
                }
                if !el.style.is_empty() {
                    out.push_str(&format!(" style={:?}", el.style.to_css_text()));
                }
                out.push('>');
                out
            }
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("data", &self.node_debug_str())
            .field("flags", &self.flags)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    /// The `Document` itself - the root node of a HTML document.
    Document,

    /// An element with attributes.
    Element(ElementData),

    /// A text node.
    Text(TextNodeData),

    /// A comment.
    Comment,
}

impl NodeData {
    pub fn downcast_element(&self) -> Option<&ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn downcast_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element_with_tag_name(&self, name: &str) -> bool {
        self.downcast_element().is_some_and(|el| el.is(name))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextNodeData {
    /// The textual content of the text node
    pub content: String,
}

impl TextNodeData {
    pub fn new(content: String) -> Self {
        Self { content }
    }
}
