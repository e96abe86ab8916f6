//! Semantic element categories and the skip rules applied before classification

use rtlify_dom::{Document, ElementData};
use serde::{Deserialize, Serialize};

/// Subtrees under these elements never carry prose
const SKIP_TAGS: &[&str] = &[
    "code", "pre", "script", "style", "noscript", "template", "kbd", "samp", "var", "svg", "math",
];

/// Elements (and their descendants) carrying this attribute are never processed
pub const OPT_OUT_ATTR: &str = "data-rtl-skip";

/// Input kinds holding free text. Every other kind is either sensitive (password, email, url,
/// tel, number, hidden) or not text at all.
const TEXT_INPUT_TYPES: &[&str] = &["text", "search"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagCategory {
    Paragraph,
    Heading,
    InputLike,
    Editable,
    Link,
    Label,
    Button,
    TableCell,
    ListItem,
    Span,
    GenericContainer,
    TextBlock,
}

impl TagCategory {
    /// Map a tag name to its category without looking at the element's content
    pub fn from_tag(name: &str) -> Option<Self> {
        let category = match name {
            "p" => Self::Paragraph,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Self::Heading,
            "input" | "textarea" => Self::InputLike,
            "a" => Self::Link,
            "label" => Self::Label,
            "button" => Self::Button,
            "td" | "th" => Self::TableCell,
            "li" | "dt" | "dd" => Self::ListItem,
            "span" => Self::Span,
            "div" => Self::GenericContainer,
            "blockquote" | "figcaption" | "caption" | "summary" | "legend" | "option" => {
                Self::TextBlock
            }
            _ => return None,
        };
        Some(category)
    }

    /// Category of an element for reporting purposes
    pub fn of_element(element: &ElementData) -> Self {
        if element.is_content_editable() && !matches!(element.name.as_str(), "input" | "textarea") {
            return Self::Editable;
        }
        Self::from_tag(&element.name).unwrap_or(Self::TextBlock)
    }

    /// Categories styled on any right-to-left content, regardless of the threshold
    pub fn always_check(self) -> bool {
        matches!(
            self,
            Self::Paragraph | Self::Heading | Self::Link | Self::Span
        )
    }

    /// Value of `text-align` applied to styled elements
    pub fn text_align(self) -> &'static str {
        match self {
            Self::Button => "center",
            Self::TableCell => "inherit",
            _ => "right",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::InputLike => "input-like",
            Self::Editable => "editable",
            Self::Link => "link",
            Self::Label => "label",
            Self::Button => "button",
            Self::TableCell => "table-cell",
            Self::ListItem => "list-item",
            Self::Span => "span",
            Self::GenericContainer => "generic-container",
            Self::TextBlock => "text-block",
        }
    }
}

impl std::fmt::Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_text_input(element: &ElementData) -> bool {
    match element.attr("type") {
        None => true,
        Some(kind) => TEXT_INPUT_TYPES
            .iter()
            .any(|allowed| kind.trim().eq_ignore_ascii_case(allowed)),
    }
}

/// The category of an element if it is eligible for classification by its own markup.
///
/// Generic containers only qualify when they hold text directly; containers that merely wrap
/// other blocks are left to their children.
pub fn categorize(doc: &Document, node_id: usize) -> Option<TagCategory> {
    let element = doc.get_node(node_id)?.element_data()?;
    match element.name.as_str() {
        "input" => is_text_input(element).then_some(TagCategory::InputLike),
        "textarea" => Some(TagCategory::InputLike),
        _ if element.is_content_editable() => Some(TagCategory::Editable),
        "div" => doc
            .has_direct_text(node_id)
            .then_some(TagCategory::GenericContainer),
        name => TagCategory::from_tag(name),
    }
}

fn opts_out(element: &ElementData) -> bool {
    element.has_attr(OPT_OUT_ATTR)
        || element
            .attr("translate")
            .is_some_and(|value| value.eq_ignore_ascii_case("no"))
        || SKIP_TAGS.contains(&element.name.as_str())
}

/// Whether the element or one of its ancestors is a code block, script, or opted out
pub fn is_excluded(doc: &Document, node_id: usize) -> bool {
    std::iter::once(node_id)
        .chain(doc.ancestors(node_id))
        .filter_map(|id| doc.get_node(id)?.element_data())
        .any(opts_out)
}

/// The category of an element that is eligible and not excluded
pub fn candidate_category(doc: &Document, node_id: usize) -> Option<TagCategory> {
    let category = categorize(doc, node_id)?;
    (!is_excluded(doc, node_id)).then_some(category)
}
