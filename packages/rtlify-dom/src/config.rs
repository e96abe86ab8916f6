use std::rc::Rc;

use rtlify_traits::ShellProvider;

/// Options used when constructing a [`Document`](crate::Document)
#[derive(Default)]
pub struct DocumentConfig {
    /// The document's url. Its origin decides which embedded frames are same-origin.
    pub base_url: Option<String>,
    /// Asked for a frame whenever a mutation is delivered to an observer
    pub shell_provider: Option<Rc<dyn ShellProvider>>,
}

impl DocumentConfig {
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            base_url: Some(url.into()),
            ..Default::default()
        }
    }
}
