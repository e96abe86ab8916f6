use std::ops::Deref;

use smol_str::SmolStr;

/// A single element attribute. Names are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: SmolStr::new(name.to_ascii_lowercase()),
            value: value.into(),
        }
    }
}

/// An element's attributes in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    inner: Vec<Attribute>,
}

impl Attributes {
    pub fn new(inner: Vec<Attribute>) -> Self {
        Self { inner }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, returning the previous value if there was one
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        match self
            .inner
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => Some(std::mem::replace(&mut attr.value, value)),
            None => {
                self.inner.push(Attribute::new(name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self
            .inner
            .iter()
            .position(|attr| attr.name.eq_ignore_ascii_case(name))?;
        Some(self.inner.remove(idx).value)
    }
}

impl Deref for Attributes {
    type Target = [Attribute];
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The declarations of an element's `style` attribute, in declaration order.
///
/// Property names are stored lowercased. Values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(SmolStr, String)>,
}

impl InlineStyle {
    /// Parse a `style` attribute value. Malformed declarations are dropped.
    pub fn parse(css: &str) -> Self {
        let mut style = Self::default();
        for declaration in css.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.is_empty() {
                continue;
            }
            style.set_property(name, value);
        }
        style
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(prop, _)| prop.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a declaration. Returns the previous value.
    pub fn set_property(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        match self
            .declarations
            .iter_mut()
            .find(|(prop, _)| prop.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.declarations
                    .push((SmolStr::new(name.to_ascii_lowercase()), value));
                None
            }
        }
    }

    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        let idx = self
            .declarations
            .iter()
            .position(|(prop, _)| prop.eq_ignore_ascii_case(name))?;
        Some(self.declarations.remove(idx).1)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Serialize back into `style` attribute syntax
    pub fn to_css_text(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
