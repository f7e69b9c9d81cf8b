//! Renderer registry.
//!
//! Renderers are supplied by the host: each is registered under a name and
//! builds a [`Render`] function bound to one content page. Registration
//! happens at startup; compilation only reads the registry.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::context::Context;
use crate::error::RenderError;
use crate::renderers::{RawRenderer, TemplateRenderer};

/// A compiled content page, ready to render against a context.
pub trait Render: Send + Sync {
    /// Render the page.
    fn render(&self, context: &Context) -> Result<String, RenderError>;
}

impl<F> Render for F
where
    F: Fn(&Context) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, context: &Context) -> Result<String, RenderError> {
        self(context)
    }
}

/// Builds a [`Render`] function from a page body.
pub trait RendererFactory: Send + Sync {
    /// Compile `raw` (the page body from the file at `location`).
    fn make(&self, location: &Path, raw: &str) -> Result<Box<dyn Render>, RenderError>;
}

/// Renderer factories keyed by name.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    factories: HashMap<String, Arc<dyn RendererFactory>>,
}

impl RendererRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `raw` and `template` renderers.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new()
            .with_renderer("raw", RawRenderer)
            .with_renderer("template", TemplateRenderer)
    }

    /// Register a factory, replacing any previous one with the same name.
    #[must_use]
    pub fn with_renderer(mut self, name: &str, factory: impl RendererFactory + 'static) -> Self {
        self.register(name, factory);
        self
    }

    /// Register a factory, replacing any previous one with the same name.
    pub fn register(&mut self, name: &str, factory: impl RendererFactory + 'static) {
        self.factories.insert(name.to_owned(), Arc::new(factory));
    }

    /// Look up a factory by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn RendererFactory>> {
        self.factories.get(name).cloned()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("names", &self.names())
            .finish()
    }
}
