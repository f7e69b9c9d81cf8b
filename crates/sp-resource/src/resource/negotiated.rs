//! Negotiated resources.
//!
//! A negotiated resource has one logic page followed by two or more content
//! pages, each declaring its media type on a specline:
//!
//! ```text
//! greeting = "hello"
//! ^L text/plain
//! {{ greeting }}
//! ^L #!raw text/html
//! <p>static</p>
//! ```
//!
//! Per request, the `Accept` header (or the request path's file extension)
//! picks the content page to render.

use std::fmt;

use http::{HeaderValue, header};

use super::ResourceBase;
use crate::context::Context;
use crate::error::{CompileError, RequestError};
use crate::message::{Body, Request, Response};
use crate::negotiation::{NotAcceptable, negotiate};
use crate::registry::{Render, RendererRegistry};
use crate::source::PAGE_BREAK;
use crate::specline::Specline;

/// A compiled content page.
struct ContentPage {
    renderer: String,
    render: Box<dyn Render>,
    content_type: HeaderValue,
}

impl ContentPage {
    /// `Content-Type` for this page, with `charset` appended for `text/*`.
    ///
    /// Falls back to the bare media type when the charset cannot be sent.
    fn content_type(&self, media_type: &str, charset: Option<&str>) -> HeaderValue {
        let Some(charset) = charset.filter(|_| media_type.starts_with("text/")) else {
            return self.content_type.clone();
        };
        HeaderValue::from_str(&format!("{media_type}; charset={charset}")).unwrap_or_else(|_| {
            tracing::warn!(
                media_type = %media_type,
                charset = ?charset,
                "Dropping charset that is not valid header text"
            );
            self.content_type.clone()
        })
    }
}

/// Compiled negotiated resource.
pub struct NegotiatedResource {
    pub(super) base: ResourceBase,
    pages: Vec<ContentPage>,
    available_types: Vec<String>,
}

impl NegotiatedResource {
    pub(super) fn compile(
        base: ResourceBase,
        content_pages: &[String],
        registry: &RendererRegistry,
        default_renderer: &str,
    ) -> Result<Self, CompileError> {
        let mut resource = Self {
            base,
            pages: Vec::with_capacity(content_pages.len()),
            available_types: Vec::with_capacity(content_pages.len()),
        };
        for page in content_pages {
            resource.compile_page(page, registry, default_renderer)?;
        }
        Ok(resource)
    }

    /// Compile one content page and register it under its media type.
    fn compile_page(
        &mut self,
        page: &str,
        registry: &RendererRegistry,
        default_renderer: &str,
    ) -> Result<(), CompileError> {
        let (specline, raw) = split_page(page);
        let specline = Specline::parse(specline, default_renderer)?;
        let factory = specline.resolve(registry)?;

        let render =
            factory
                .make(&self.base.path, raw)
                .map_err(|source| CompileError::Renderer {
                    media_type: specline.media_type.clone(),
                    renderer: specline.renderer.clone(),
                    source,
                })?;

        if self.available_types.contains(&specline.media_type) {
            return Err(CompileError::DuplicateMediaType(specline.media_type));
        }

        let content_type = HeaderValue::from_str(&specline.media_type).map_err(|_| {
            CompileError::MalformedMediaType {
                media_type: specline.media_type.clone(),
                specline: specline.media_type.clone(),
            }
        })?;

        self.pages.push(ContentPage {
            renderer: specline.renderer,
            render,
            content_type,
        });
        self.available_types.push(specline.media_type);
        Ok(())
    }

    /// Media types in declaration order.
    #[must_use]
    pub fn available_types(&self) -> &[String] {
        &self.available_types
    }

    /// Name of the renderer compiled for `media_type`.
    #[must_use]
    pub fn renderer_for(&self, media_type: &str) -> Option<&str> {
        let index = self.available_types.iter().position(|t| t == media_type)?;
        self.pages.get(index).map(|page| page.renderer.as_str())
    }

    /// Index of the content page that serves `request`.
    ///
    /// A path extension with a known media type takes precedence over the
    /// `Accept` header. With neither, the first content page is used.
    pub fn select(&self, request: &Request) -> Result<usize, NotAcceptable> {
        let header = request.accept();
        let accept = request
            .extension()
            .and_then(|ext| mime_guess::from_ext(ext).first_raw())
            .or(header.as_deref());

        if accept.is_none() {
            tracing::debug!(
                path = %self.base.path.display(),
                media_type = ?self.available_types.first(),
                "No Accept header, using default representation"
            );
        }

        negotiate(&self.available_types, accept).inspect_err(|err| {
            tracing::debug!(
                path = %self.base.path.display(),
                accept = ?accept,
                "{err}"
            );
        })
    }

    /// Render the negotiated content page against `context`.
    ///
    /// Raises a 406 response when no content page is acceptable.
    pub fn get_response(&self, context: Context) -> Result<Response, RequestError> {
        let index = self
            .select(&context.request)
            .map_err(|err| RequestError::raise(err.into_response()))?;
        let media_type = &self.available_types[index];
        let page = &self.pages[index];
        let body = page.render.render(&context)?;

        let (_, mut response) = context.into_parts();
        response.body = Body::Text(body);

        if !response.headers.contains_key(header::CONTENT_TYPE) {
            let content_type = page.content_type(media_type, response.charset.as_deref());
            response.set_header(header::CONTENT_TYPE, content_type);
        }

        Ok(response)
    }
}

impl fmt::Debug for NegotiatedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiatedResource")
            .field("path", &self.base.path)
            .field("available_types", &self.available_types)
            .finish_non_exhaustive()
    }
}

/// Split a content page into its specline and body at the first newline.
///
/// A page without a newline has an empty specline.
fn split_page(page: &str) -> (&str, &str) {
    let (specline, raw) = page.split_once('\n').unwrap_or(("", page));
    let specline = specline.trim_matches(|c| c == PAGE_BREAK || c == ' ' || c == '\n');
    (specline, raw)
}
