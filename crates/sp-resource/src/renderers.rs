//! Built-in renderers.
//!
//! - `raw`: the page body verbatim.
//! - `template`: a minijinja template over the context values.

use std::path::Path;

use minijinja::{AutoEscape, Environment};

use crate::context::Context;
use crate::error::RenderError;
use crate::registry::{Render, RendererFactory};

/// Factory for the `raw` renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRenderer;

impl RendererFactory for RawRenderer {
    fn make(&self, _location: &Path, raw: &str) -> Result<Box<dyn Render>, RenderError> {
        Ok(Box::new(Raw(raw.to_owned())))
    }
}

struct Raw(String);

impl Render for Raw {
    fn render(&self, _context: &Context) -> Result<String, RenderError> {
        Ok(self.0.clone())
    }
}

/// Factory for the `template` renderer.
///
/// Pages are minijinja templates rendered against the context values.
/// Output is not escaped and a trailing newline is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl RendererFactory for TemplateRenderer {
    fn make(&self, location: &Path, raw: &str) -> Result<Box<dyn Render>, RenderError> {
        let name = location.display().to_string();
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        env.add_template_owned(name.clone(), raw.to_owned())
            .map_err(|err| template_error(location, &err))?;
        Ok(Box::new(Template { env, name }))
    }
}

struct Template {
    env: Environment<'static>,
    name: String,
}

impl Render for Template {
    fn render(&self, context: &Context) -> Result<String, RenderError> {
        let location = Path::new(&self.name);
        self.env
            .get_template(&self.name)
            .and_then(|template| template.render(context.values()))
            .map_err(|err| template_error(location, &err))
    }
}

fn template_error(location: &Path, err: &minijinja::Error) -> RenderError {
    RenderError::new(format!("Template error in {}: {err}", location.display()))
}
