#![allow(clippy::module_inception)]

mod attributes;
pub mod element;
mod node;

pub use attributes::{Attribute, Attributes, InlineStyle};
pub use element::{ComputedStyle, Display, ElementData, FrameContent, LayoutSize, Visibility};
pub use node::*;
