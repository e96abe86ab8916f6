use smol_str::SmolStr;
use url::Url;

use super::{Attribute, Attributes, InlineStyle};
use crate::SharedDocument;

#[derive(Debug, Clone)]
pub struct ElementData {
    /// The element's tag name, lowercased
    pub name: SmolStr,

    /// The element's attributes, excluding `style`
    pub attrs: Attributes,

    /// The element's parsed `style` attribute
    pub style: InlineStyle,

    /// Computed visibility inputs as reported by the host's style engine.
    /// `None` when the host has not resolved styles for this element.
    pub computed: Option<ComputedStyle>,

    /// The element's rendered border box. `None` when the element has not been laid out.
    pub layout_size: Option<LayoutSize>,

    /// The embedded document of an \<iframe\> or \<frame\> element
    pub frame: Option<FrameContent>,
}

impl ElementData {
    pub fn new(name: &str, attrs: Vec<Attribute>) -> Self {
        let mut style = InlineStyle::default();
        let attrs = attrs
            .into_iter()
            .filter(|attr| {
                if attr.name == "style" {
                    style = InlineStyle::parse(&attr.value);
                    false
                } else {
                    true
                }
            })
            .collect();

        ElementData {
            name: SmolStr::new(name.to_ascii_lowercase()),
            attrs: Attributes::new(attrs),
            style,
            computed: None,
            layout_size: None,
            frame: None,
        }
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    /// Detects the presence of the attribute, treating *any* value as truthy.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.get(name).is_some()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether the element is editable through the `contenteditable` attribute
    pub fn is_content_editable(&self) -> bool {
        match self.attr("contenteditable") {
            Some(value) => !value.eq_ignore_ascii_case("false"),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Inline,
    Block,
    InlineBlock,
    ListItem,
    TableCell,
    Flex,
    Grid,
    Contents,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

/// The subset of computed style needed to decide whether an element is rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::default(),
            visibility: Visibility::default(),
            opacity: 1.0,
        }
    }
}

impl ComputedStyle {
    pub fn hides_content(&self) -> bool {
        self.display == Display::None
            || self.visibility != Visibility::Visible
            || self.opacity <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutSize {
    pub width: f32,
    pub height: f32,
}

impl LayoutSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// The browsing context embedded by a frame element
#[derive(Debug, Clone, Default)]
pub struct FrameContent {
    /// The frame's source url. `None` for `about:blank` frames, which inherit the parent's origin.
    pub src: Option<Url>,
    /// The embedded document, once the host has created it
    pub document: Option<SharedDocument>,
    /// Whether the embedded document has finished loading
    pub loaded: bool,
}

impl FrameContent {
    pub fn new(src: Option<Url>, document: Option<SharedDocument>) -> Self {
        Self {
            src,
            document,
            loaded: false,
        }
    }
}
