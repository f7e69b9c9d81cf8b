//! Specline parsing.
//!
//! A specline is the first line of a content page in a negotiated resource:
//!
//! ```text
//! #!renderer media/type
//! media/type
//! ```
//!
//! The renderer is optional and falls back to a configured default.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::CompileError;
use crate::registry::{RendererFactory, RendererRegistry};

/// Pattern a media type must match.
pub const MEDIA_TYPE_PATTERN: &str = "[A-Za-z0-9.+-]+/[A-Za-z0-9.+-]+";

/// Pattern a renderer reference must match.
pub const RENDERER_PATTERN: &str = "#![a-z0-9.-]+";

/// Renderer used when a specline names only a media type.
pub const DEFAULT_RENDERER: &str = "template";

pub(crate) static MEDIA_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{MEDIA_TYPE_PATTERN}$")).unwrap());

static RENDERER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{RENDERER_PATTERN}$")).unwrap());

/// Parsed specline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specline {
    /// Renderer name, without the leading `#!`.
    pub renderer: String,
    /// Media type, `type/subtype`.
    pub media_type: String,
}

impl Specline {
    /// Parse a specline.
    ///
    /// One part is a media type rendered with `default_renderer`; two parts are
    /// a `#!renderer` reference followed by a media type.
    pub fn parse(specline: &str, default_renderer: &str) -> Result<Self, CompileError> {
        if specline.is_empty() {
            return Err(CompileError::EmptySpecline);
        }

        let parts: Vec<&str> = specline.split_whitespace().collect();
        let (renderer, media_type) = match parts.as_slice() {
            [media_type] => (None, *media_type),
            [renderer, media_type] => (Some(*renderer), *media_type),
            _ => return Err(CompileError::SpeclineParts(specline.to_owned())),
        };

        if !MEDIA_TYPE_RE.is_match(media_type) {
            return Err(CompileError::MalformedMediaType {
                media_type: media_type.to_owned(),
                specline: specline.to_owned(),
            });
        }

        let renderer = match renderer {
            Some(reference) => parse_renderer_reference(reference)?,
            None => default_renderer,
        };

        Ok(Self {
            renderer: renderer.to_owned(),
            media_type: media_type.to_owned(),
        })
    }

    /// Look up the renderer factory for this specline.
    pub fn resolve(
        &self,
        registry: &RendererRegistry,
    ) -> Result<Arc<dyn RendererFactory>, CompileError> {
        registry
            .get(&self.renderer)
            .ok_or_else(|| CompileError::UnknownRenderer {
                media_type: self.media_type.clone(),
                renderer: self.renderer.clone(),
            })
    }
}

/// Validate a `#!name` reference and strip the hashbang.
fn parse_renderer_reference(reference: &str) -> Result<&str, CompileError> {
    if !RENDERER_RE.is_match(reference) {
        return Err(CompileError::MalformedRenderer(reference.to_owned()));
    }
    Ok(&reference[2..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(specline: &str) -> Result<Specline, CompileError> {
        Specline::parse(specline, DEFAULT_RENDERER)
    }

    #[test]
    fn test_media_type_only_uses_default_renderer() {
        let specline = parse("text/plain").unwrap();
        assert_eq!(specline.renderer, DEFAULT_RENDERER);
        assert_eq!(specline.media_type, "text/plain");
    }

    #[test]
    fn test_default_renderer_is_overridable() {
        let specline = Specline::parse("application/xml", "raw").unwrap();
        assert_eq!(specline.renderer, "raw");
    }

    #[test]
    fn test_renderer_and_media_type() {
        let specline = parse("#!raw text/html").unwrap();
        assert_eq!(specline.renderer, "raw");
        assert_eq!(specline.media_type, "text/html");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let specline = parse("  #!raw\ttext/html  ").unwrap();
        assert_eq!(specline.media_type, "text/html");
    }

    #[test]
    fn test_media_type_with_punctuation() {
        for media_type in ["application/vnd.api+json", "image/svg+xml", "x-a.b/c-d"] {
            assert_eq!(parse(media_type).unwrap().media_type, media_type);
        }
    }

    #[test]
    fn test_empty_specline() {
        assert!(matches!(parse(""), Err(CompileError::EmptySpecline)));
    }

    #[test]
    fn test_blank_specline_has_no_parts() {
        assert!(matches!(parse("   "), Err(CompileError::SpeclineParts(_))));
    }

    #[test]
    fn test_too_many_parts() {
        let err = parse("#!raw text/plain extra").unwrap_err();
        assert!(matches!(err, CompileError::SpeclineParts(_)));
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_malformed_media_type() {
        for media_type in ["textplain", "text/", "/plain", "text/plain;charset=utf-8", "text/*x"] {
            let err = parse(media_type).unwrap_err();
            assert!(
                matches!(err, CompileError::MalformedMediaType { .. }),
                "{media_type}"
            );
            assert!(err.to_string().contains(media_type));
        }
    }

    #[test]
    fn test_malformed_renderer() {
        for renderer in ["raw", "#!Raw", "#!", "#!ra_w", "!#raw"] {
            let err = parse(&format!("{renderer} text/plain")).unwrap_err();
            assert!(
                matches!(err, CompileError::MalformedRenderer(ref r) if r == renderer),
                "{renderer}"
            );
        }
    }

    #[test]
    fn test_media_type_checked_before_renderer() {
        let err = parse("raw textplain").unwrap_err();
        assert!(matches!(err, CompileError::MalformedMediaType { .. }));
    }

    #[test]
    fn test_resolve_known_renderer() {
        let registry = RendererRegistry::with_builtins();
        let specline = parse("#!raw text/plain").unwrap();
        assert!(specline.resolve(&registry).is_ok());
    }

    #[test]
    fn test_resolve_unknown_renderer() {
        let registry = RendererRegistry::with_builtins();
        let specline = parse("#!jinja2 text/plain").unwrap();
        let err = specline.resolve(&registry).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "Unknown renderer for text/plain: jinja2.");
    }
}
