use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rtlify_traits::{DummyShellProvider, ShellProvider};
use slab::Slab;
use smol_str::SmolStr;
use url::Url;

use crate::error::{DomError, FrameAccessError};
use crate::mutation::{MutationKind, MutationObserverInit, MutationRecord, Observer, ObserverId};
use crate::node::{
    Attribute, ComputedStyle, ElementData, FrameContent, InlineStyle, LayoutSize, NodeFlags,
};
use crate::traversal::{AncestorTraverser, TreeTraverser};
use crate::{DocumentConfig, Node, NodeData, NodeRef, TextNodeData};

/// A document shared between the host and the engines driving it
pub type SharedDocument = Rc<RefCell<Document>>;

pub struct Document {
    /// ID of the document
    id: usize,

    /// The document's url, which determines its origin
    url: Option<Url>,

    /// A slab-backed tree of nodes. Slot 0 is always the `Document` node.
    pub nodes: Box<Slab<Node>>,

    /// Next serial handed out by `create_node`
    next_serial: u64,

    /// Registered mutation observers and their undelivered records
    observers: Slab<Observer>,

    /// Notified when observers have records waiting
    shell_provider: Rc<dyn ShellProvider>,
}

impl Document {
    /// Create a new (empty) [`Document`] with the specified configuration
    pub fn new(config: DocumentConfig) -> Self {
        static ID_GENERATOR: AtomicUsize = AtomicUsize::new(1);

        let id = ID_GENERATOR.fetch_add(1, Ordering::SeqCst);
        let url = config.base_url.and_then(|url| match Url::parse(&url) {
            Ok(parsed) => Some(parsed),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to parse document url {url:?}: {_err}");
                None
            }
        });

        let shell_provider = config
            .shell_provider
            .unwrap_or_else(|| Rc::new(DummyShellProvider));

        let mut doc = Self {
            id,
            url,
            nodes: Box::new(Slab::new()),
            next_serial: 1,
            observers: Slab::new(),
            shell_provider,
        };

        // Initialise document with root Document node
        doc.create_node(NodeData::Document);
        doc.root_node_mut().flags.insert(NodeFlags::IS_IN_DOCUMENT);

        doc
    }

    pub fn set_shell_provider(&mut self, shell_provider: Rc<dyn ShellProvider>) {
        self.shell_provider = shell_provider;
    }

    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Whether content loaded from `url` shares this document's origin.
    /// A missing url (`about:blank`) inherits the embedding origin.
    pub fn is_same_origin(&self, url: Option<&Url>) -> bool {
        match (&self.url, url) {
            (_, None) => true,
            (Some(ours), Some(theirs)) => ours.origin() == theirs.origin(),
            (None, Some(_)) => false,
        }
    }

    pub fn tree(&self) -> &Slab<Node> {
        &self.nodes
    }

    pub fn get_node(&self, node_id: usize) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn get_node_mut(&mut self, node_id: usize) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn root_node_mut(&mut self) -> &mut Node {
        &mut self.nodes[0]
    }

    fn node(&self, node_id: usize) -> Result<&Node, DomError> {
        self.nodes.get(node_id).ok_or(DomError::UnknownNode(node_id))
    }

    fn element_mut(&mut self, node_id: usize) -> Result<&mut ElementData, DomError> {
        self.nodes
            .get_mut(node_id)
            .ok_or(DomError::UnknownNode(node_id))?
            .element_data_mut()
            .ok_or(DomError::NotAnElement(node_id))
    }

    pub fn node_ref(&self, node_id: usize) -> Option<NodeRef> {
        self.nodes.get(node_id).map(Node::node_ref)
    }

    /// Look up the node a [`NodeRef`] was taken from, if it is still alive
    pub fn resolve(&self, node: NodeRef) -> Option<&Node> {
        self.nodes
            .get(node.id())
            .filter(|candidate| candidate.serial == node.serial())
    }

    pub fn is_live(&self, node: NodeRef) -> bool {
        self.resolve(node).is_some()
    }

    /// Whether the referenced node is alive and connected to the document root
    pub fn is_connected(&self, node: NodeRef) -> bool {
        self.resolve(node).is_some_and(Node::is_in_document)
    }

    pub fn create_node(&mut self, node_data: NodeData) -> usize {
        let serial = self.next_serial;
        self.next_serial += 1;

        let entry = self.nodes.vacant_entry();
        let id = entry.key();
        entry.insert(Node::new(id, serial, node_data));
        id
    }

    pub fn create_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> usize {
        let attrs = attrs
            .iter()
            .map(|(name, value)| Attribute::new(name, *value))
            .collect();
        self.create_node(NodeData::Element(ElementData::new(name, attrs)))
    }

    pub fn create_text_node(&mut self, text: &str) -> usize {
        self.create_node(NodeData::Text(TextNodeData::new(text.to_string())))
    }

    /// Append `child_id` as the last child of `parent_id`, moving it out of its current parent
    pub fn append_child(&mut self, parent_id: usize, child_id: usize) -> Result<(), DomError> {
        let parent = self.node(parent_id)?;
        self.node(child_id)?;
        let hierarchy_error = DomError::HierarchyRequest {
            parent: parent_id,
            child: child_id,
        };
        if child_id == 0 || !matches!(parent.data, NodeData::Document | NodeData::Element(_)) {
            return Err(hierarchy_error);
        }
        if parent_id == child_id || self.ancestors(parent_id).any(|id| id == child_id) {
            return Err(hierarchy_error);
        }

        if self.nodes[child_id].parent.is_some() {
            self.detach(child_id);
        }

        self.nodes[child_id].parent = Some(parent_id);
        self.nodes[parent_id].children.push(child_id);

        let connected = self.nodes[parent_id].is_in_document();
        self.set_connected(child_id, connected);
        if connected {
            let target = self.nodes[parent_id].node_ref();
            let added = self.nodes[child_id].node_ref();
            self.queue_record(MutationRecord {
                target,
                kind: MutationKind::ChildList {
                    added: vec![added],
                    removed: Vec::new(),
                },
            });
        }
        Ok(())
    }

    /// Create an element and append it to `parent_id`
    pub fn append_element(
        &mut self,
        parent_id: usize,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<usize, DomError> {
        let id = self.create_element(name, attrs);
        self.append_child(parent_id, id)?;
        Ok(id)
    }

    /// Create a text node and append it to `parent_id`
    pub fn append_text(&mut self, parent_id: usize, text: &str) -> Result<usize, DomError> {
        let id = self.create_text_node(text);
        self.append_child(parent_id, id)?;
        Ok(id)
    }

    /// Unlink a node from its parent, keeping the node and its subtree alive
    fn detach(&mut self, node_id: usize) {
        let Some(parent_id) = self.nodes[node_id].parent.take() else {
            return;
        };
        let removed = self.nodes[node_id].node_ref();
        let was_connected = self.nodes[node_id].is_in_document();
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.retain(|id| *id != node_id);
        }
        self.set_connected(node_id, false);

        if was_connected {
            let target = self.nodes[parent_id].node_ref();
            self.queue_record(MutationRecord {
                target,
                kind: MutationKind::ChildList {
                    added: Vec::new(),
                    removed: vec![removed],
                },
            });
        }
    }

    /// Remove a node from the tree and drop it together with its subtree
    pub fn remove_node(&mut self, node_id: usize) -> Result<(), DomError> {
        if node_id == 0 {
            return Err(DomError::RemoveRoot);
        }
        self.node(node_id)?;
        self.detach(node_id);

        fn drop_subtree(doc: &mut Document, node_id: usize) {
            if let Some(node) = doc.nodes.try_remove(node_id) {
                for child in node.children {
                    drop_subtree(doc, child);
                }
            }
        }
        drop_subtree(self, node_id);

        #[cfg(feature = "tracing")]
        tracing::trace!("Removed node {node_id} from document {}", self.id);
        Ok(())
    }

    fn set_connected(&mut self, root_id: usize, connected: bool) {
        let subtree: Vec<usize> = TreeTraverser::new_with_root(self, root_id).collect();
        for id in subtree {
            let flags = &mut self.nodes[id].flags;
            flags.set(NodeFlags::IS_IN_DOCUMENT, connected);
        }
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, node_id: usize, text: &str) -> Result<(), DomError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or(DomError::UnknownNode(node_id))?;
        let NodeData::Text(data) = &mut node.data else {
            return Err(DomError::NotATextNode(node_id));
        };
        let old_value = std::mem::replace(&mut data.content, text.to_string());

        if node.is_in_document() {
            let target = node.node_ref();
            self.queue_record(MutationRecord {
                target,
                kind: MutationKind::CharacterData { old_value },
            });
        }
        Ok(())
    }

    /// Read an attribute, including a serialized `style` attribute
    pub fn attribute(&self, node_id: usize, name: &str) -> Option<String> {
        let element = self.nodes.get(node_id)?.element_data()?;
        if name.eq_ignore_ascii_case("style") {
            return (!element.style.is_empty()).then(|| element.style.to_css_text());
        }
        element.attr(name).map(str::to_string)
    }

    pub fn set_attribute(&mut self, node_id: usize, name: &str, value: &str) -> Result<(), DomError> {
        let old_value = if name.eq_ignore_ascii_case("style") {
            let element = self.element_mut(node_id)?;
            let old = (!element.style.is_empty()).then(|| element.style.to_css_text());
            element.style = InlineStyle::parse(value);
            self.nodes[node_id].style_generation += 1;
            old
        } else {
            self.element_mut(node_id)?.attrs.set(name, value)
        };
        self.queue_attribute_record(node_id, name, old_value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, node_id: usize, name: &str) -> Result<Option<String>, DomError> {
        let old_value = if name.eq_ignore_ascii_case("style") {
            let element = self.element_mut(node_id)?;
            let old = (!element.style.is_empty()).then(|| element.style.to_css_text());
            element.style = InlineStyle::default();
            old
        } else {
            self.element_mut(node_id)?.attrs.remove(name)
        };
        if old_value.is_some() {
            self.queue_attribute_record(node_id, name, old_value.clone());
        }
        Ok(old_value)
    }

    /// Set a single declaration of the element's inline style
    pub fn set_style_property(&mut self, node_id: usize, property: &str, value: &str) -> Result<(), DomError> {
        let element = self.element_mut(node_id)?;
        let old = (!element.style.is_empty()).then(|| element.style.to_css_text());
        element.style.set_property(property, value);
        self.nodes[node_id].style_generation += 1;
        self.queue_attribute_record(node_id, "style", old);
        Ok(())
    }

    /// Remove a single declaration of the element's inline style, returning its value
    pub fn remove_style_property(&mut self, node_id: usize, property: &str) -> Result<Option<String>, DomError> {
        let element = self.element_mut(node_id)?;
        let old = (!element.style.is_empty()).then(|| element.style.to_css_text());
        let removed = element.style.remove_property(property);
        if removed.is_some() {
            self.nodes[node_id].style_generation += 1;
            self.queue_attribute_record(node_id, "style", old);
        }
        Ok(removed)
    }

    fn queue_attribute_record(&mut self, node_id: usize, name: &str, old_value: Option<String>) {
        let node = &self.nodes[node_id];
        if !node.is_in_document() {
            return;
        }
        let target = node.node_ref();
        self.queue_record(MutationRecord {
            target,
            kind: MutationKind::Attributes {
                name: SmolStr::new(name.to_ascii_lowercase()),
                old_value,
            },
        });
    }

    /// Record the host's resolved visibility inputs for an element
    pub fn set_computed_style(&mut self, node_id: usize, style: ComputedStyle) -> Result<(), DomError> {
        self.element_mut(node_id)?.computed = Some(style);
        Ok(())
    }

    /// Record the host's layout result for an element
    pub fn set_layout_size(&mut self, node_id: usize, size: LayoutSize) -> Result<(), DomError> {
        self.element_mut(node_id)?.layout_size = Some(size);
        Ok(())
    }

    /// Concatenated content of every descendant text node, in document order
    pub fn text_content(&self, node_id: usize) -> String {
        let mut out = String::new();
        for id in TreeTraverser::new_with_root(self, node_id) {
            if let Some(text) = self.nodes[id].text_data() {
                out.push_str(&text.content);
            }
        }
        out
    }

    /// Whether the node has a child text node containing non-whitespace characters
    pub fn has_direct_text(&self, node_id: usize) -> bool {
        self.nodes.get(node_id).is_some_and(|node| {
            node.children.iter().any(|child| {
                self.nodes[*child]
                    .text_data()
                    .is_some_and(|text| !text.content.trim().is_empty())
            })
        })
    }

    /// The node itself if it is an element, otherwise its closest element ancestor
    pub fn nearest_element(&self, node_id: usize) -> Option<usize> {
        if self.nodes.get(node_id)?.is_element() {
            return Some(node_id);
        }
        self.ancestors(node_id)
            .find(|id| self.nodes[*id].is_element())
    }

    pub fn ancestors(&self, node_id: usize) -> AncestorTraverser<'_> {
        AncestorTraverser::new(self, node_id)
    }

    /// Ids of every connected frame element, in document order
    pub fn frame_elements(&self) -> Vec<usize> {
        TreeTraverser::new(self)
            .filter(|id| {
                self.nodes[*id]
                    .element_data()
                    .is_some_and(|el| el.frame.is_some())
            })
            .collect()
    }

    pub fn attach_frame(&mut self, node_id: usize, frame: FrameContent) -> Result<(), DomError> {
        self.element_mut(node_id)?.frame = Some(frame);
        Ok(())
    }

    /// Mark a frame's embedded document as fully loaded
    pub fn set_frame_loaded(&mut self, node_id: usize) -> Result<(), DomError> {
        match self.element_mut(node_id)?.frame.as_mut() {
            Some(frame) => {
                frame.loaded = true;
                Ok(())
            }
            None => Err(DomError::NotAFrame(node_id)),
        }
    }

    pub fn is_frame_loaded(&self, node_id: usize) -> bool {
        self.nodes
            .get(node_id)
            .and_then(Node::element_data)
            .and_then(|el| el.frame.as_ref())
            .is_some_and(|frame| frame.loaded)
    }

    /// The embedded document of a frame element, subject to the same-origin policy
    pub fn content_document(&self, node_id: usize) -> Result<SharedDocument, FrameAccessError> {
        let frame = self
            .nodes
            .get(node_id)
            .and_then(Node::element_data)
            .and_then(|el| el.frame.as_ref())
            .ok_or(FrameAccessError::NotAFrame(node_id))?;

        if !self.is_same_origin(frame.src.as_ref()) {
            let src = frame.src.as_ref().map(Url::to_string).unwrap_or_default();
            return Err(FrameAccessError::CrossOrigin(src));
        }

        frame
            .document
            .clone()
            .ok_or(FrameAccessError::NoContentDocument)
    }

    /// Register a document-wide mutation observer
    pub fn observe(&mut self, init: MutationObserverInit) -> Result<ObserverId, DomError> {
        if !init.is_valid() {
            return Err(DomError::InvalidObserverInit);
        }
        let key = self.observers.insert(Observer {
            init,
            records: Vec::new(),
        });
        Ok(ObserverId(key))
    }

    /// Unregister an observer, discarding its undelivered records
    pub fn disconnect(&mut self, observer: ObserverId) -> Result<(), DomError> {
        self.observers
            .try_remove(observer.0)
            .map(|_| ())
            .ok_or(DomError::UnknownObserver(observer.0))
    }

    /// Drain an observer's undelivered records, oldest first
    pub fn take_records(&mut self, observer: ObserverId) -> Result<Vec<MutationRecord>, DomError> {
        self.observers
            .get_mut(observer.0)
            .map(|observer| std::mem::take(&mut observer.records))
            .ok_or(DomError::UnknownObserver(observer.0))
    }

    pub fn has_pending_records(&self, observer: ObserverId) -> bool {
        self.observers
            .get(observer.0)
            .is_some_and(|observer| !observer.records.is_empty())
    }

    fn queue_record(&mut self, record: MutationRecord) {
        let mut delivered = false;
        for (_, observer) in self.observers.iter_mut() {
            if observer.init.matches(&record) {
                observer.records.push(record.clone());
                delivered = true;
            }
        }
        if delivered {
            self.shell_provider.request_frame();
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
