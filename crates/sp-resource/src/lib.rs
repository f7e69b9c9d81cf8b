//! Dynamic resources with content negotiation.
//!
//! A simplate is a source file made of pages separated by form feeds. The
//! first pages hold logic that builds a per-request [`Context`]; negotiated
//! resources follow them with content pages, each introduced by a specline
//! naming a renderer and a media type.
//!
//! # Architecture
//!
//! ```text
//! SourceFile ──► Resource::compile ──► Resource (shared, immutable)
//!                   │                      │
//!                   ├─► Specline::parse    ├─► LogicRunner (host) ──► Context
//!                   └─► RendererRegistry   ├─► negotiate / file extension
//!                                          └─► Render ──► Response
//! ```
//!
//! # Example
//!
//! ```
//! use sp_resource::{
//!     Context, Request, RequestError, Resource, ResourceConfig, ResourceKind,
//!     RendererRegistry, SourceFile,
//! };
//!
//! let source = SourceFile::from_bytes(
//!     "www/greeting",
//!     b"name = world\x0c text/plain\nhello {{ name }}\x0c #!raw text/html\n<p>hi</p>",
//! )?;
//! let registry = RendererRegistry::with_builtins();
//! let resource = Resource::compile(
//!     ResourceKind::Negotiated,
//!     &source,
//!     &registry,
//!     &ResourceConfig::default(),
//! )?;
//!
//! let logic = |source: &str, context: &mut Context| -> Result<(), RequestError> {
//!     if let Some((key, value)) = source.split_once('=') {
//!         context.insert(key.trim(), value.trim());
//!     }
//!     Ok(())
//! };
//!
//! let response = resource.respond(Request::default(), &logic)?;
//! assert_eq!(response.body.as_text(), Some("hello world"));
//! assert_eq!(response.content_type(), Some("text/plain; charset=UTF-8"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod context;
mod error;
mod message;
pub mod negotiation;
mod registry;
mod renderers;
mod resource;
mod source;
mod specline;

pub use context::{Context, LogicRunner};
pub use error::{CompileError, ErrorKind, RenderError, RequestError, SourceError};
pub use message::{Body, Request, Response};
pub use negotiation::{NotAcceptable, best_match, negotiate};
pub use registry::{Render, RendererFactory, RendererRegistry};
pub use renderers::{RawRenderer, TemplateRenderer};
pub use resource::{
    CALLBACK_PATTERN, CHARSET_PATTERN, JsonResource, NegotiatedResource, Resource, ResourceConfig, ResourceKind,
};
pub use source::{PAGE_BREAK, SourceFile};
pub use specline::{DEFAULT_RENDERER, MEDIA_TYPE_PATTERN, RENDERER_PATTERN, Specline};
