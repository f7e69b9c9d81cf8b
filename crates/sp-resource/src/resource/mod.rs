//! Compiled resources.
//!
//! A [`Resource`] is compiled once per source file and then shared, read-only,
//! across requests. Compilation validates the page count for the resource
//! kind, then compiles every page in declaration order. Any failure aborts
//! compilation; no partial resource is produced.
//!
//! # Request flow
//!
//! [`Resource::respond`] builds a fresh [`Context`], runs the logic pages
//! through the host's [`LogicRunner`], then hands the context to
//! [`Resource::get_response`]. A response raised by a logic page goes through
//! [`Resource::process_raised_response`] before it is returned.

mod json;
mod negotiated;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

pub use json::{CALLBACK_PATTERN, JsonResource};
pub use negotiated::NegotiatedResource;

use crate::context::{Context, LogicRunner};
use crate::error::{CompileError, RequestError};
use crate::message::{Request, Response};
use crate::negotiation::NotAcceptable;
use crate::registry::RendererRegistry;
use crate::source::SourceFile;
use crate::specline::{DEFAULT_RENDERER, MEDIA_TYPE_RE};

/// Pattern a charset must match (an RFC 7230 token).
pub const CHARSET_PATTERN: &str = "[!#$%&'*+.^_`|~0-9A-Za-z-]+";

static CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{CHARSET_PATTERN}$")).unwrap());

/// Host settings used while compiling and serving resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Media type of JSON responses.
    pub media_type_json: String,
    /// Media type of JSONP responses.
    pub media_type_jsonp: String,
    /// Renderer for speclines that only name a media type.
    pub default_renderer: String,
    /// Charset appended to `text/*` content types.
    pub charset: Option<String>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            media_type_json: "application/json".to_owned(),
            media_type_jsonp: "application/javascript".to_owned(),
            default_renderer: DEFAULT_RENDERER.to_owned(),
            charset: Some("UTF-8".to_owned()),
        }
    }
}

impl ResourceConfig {
    /// Check that the settings can be sent in response headers.
    pub fn validate(&self) -> Result<(), CompileError> {
        for (field, media_type) in [
            ("media_type_json", &self.media_type_json),
            ("media_type_jsonp", &self.media_type_jsonp),
        ] {
            if !MEDIA_TYPE_RE.is_match(media_type) {
                return Err(CompileError::InvalidSetting {
                    field,
                    value: media_type.clone(),
                });
            }
        }
        if let Some(charset) = &self.charset
            && !CHARSET_RE.is_match(charset)
        {
            return Err(CompileError::InvalidSetting {
                field: "charset",
                value: charset.clone(),
            });
        }
        Ok(())
    }
}

/// Shape of a resource, fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Two logic pages, JSON body.
    Json,
    /// One logic page and two or more content pages.
    Negotiated,
}

impl ResourceKind {
    /// Kind served for a file path: `.json` files are JSON resources and
    /// files without an extension are negotiated. Other extensions are not
    /// dynamic resources.
    #[must_use]
    pub fn for_path(path: &Path) -> Option<Self> {
        match path.extension() {
            None => Some(Self::Negotiated),
            Some(ext) if ext == "json" => Some(Self::Json),
            Some(_) => None,
        }
    }

    /// Minimum number of pages.
    #[must_use]
    pub const fn min_pages(self) -> usize {
        match self {
            Self::Json => 2,
            Self::Negotiated => 3,
        }
    }

    /// Maximum number of pages, if bounded.
    #[must_use]
    pub const fn max_pages(self) -> Option<usize> {
        match self {
            Self::Json => Some(2),
            Self::Negotiated => None,
        }
    }

    /// Number of leading logic pages.
    #[must_use]
    pub const fn logic_pages(self) -> usize {
        match self {
            Self::Json => 2,
            Self::Negotiated => 1,
        }
    }

    fn check_page_count(self, path: &Path, count: usize) -> Result<(), CompileError> {
        let too_few = count < self.min_pages();
        let too_many = self.max_pages().is_some_and(|max| count > max);
        if !too_few && !too_many {
            return Ok(());
        }

        let expected = match self.max_pages() {
            Some(max) if max == self.min_pages() => format!("{self} resources need exactly {max}"),
            Some(max) => format!("{self} resources need {} to {max}", self.min_pages()),
            None => format!("{self} resources need at least {}", self.min_pages()),
        };
        Err(CompileError::PageCount {
            path: path.to_path_buf(),
            count,
            expected,
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Negotiated => f.write_str("negotiated"),
        }
    }
}

/// State shared by every resource kind.
#[derive(Debug, Default)]
pub(crate) struct ResourceBase {
    path: PathBuf,
    logic_pages: Vec<String>,
    charset: Option<String>,
}

/// A compiled resource.
#[derive(Debug)]
pub enum Resource {
    /// JSON resource.
    Json(JsonResource),
    /// Negotiated resource.
    Negotiated(NegotiatedResource),
}

impl Resource {
    /// Compile a source file.
    pub fn compile(
        kind: ResourceKind,
        source: &SourceFile,
        registry: &RendererRegistry,
        config: &ResourceConfig,
    ) -> Result<Self, CompileError> {
        config.validate()?;
        let path = source.path();
        let pages = source.pages();
        kind.check_page_count(path, pages.len())?;

        let (logic_pages, content_pages) = pages.split_at(kind.logic_pages());
        let base = ResourceBase {
            path: path.to_path_buf(),
            logic_pages: logic_pages.to_vec(),
            charset: config.charset.clone(),
        };

        let resource = match kind {
            ResourceKind::Json => Self::Json(JsonResource::compile(
                base,
                content_pages,
                &config.media_type_json,
                &config.media_type_jsonp,
            )?),
            ResourceKind::Negotiated => Self::Negotiated(NegotiatedResource::compile(
                base,
                content_pages,
                registry,
                &config.default_renderer,
            )?),
        };

        tracing::debug!(
            path = %path.display(),
            kind = %kind,
            pages = pages.len(),
            available = ?resource.available_types(),
            "Compiled resource"
        );
        Ok(resource)
    }

    /// Kind of this resource.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Json(_) => ResourceKind::Json,
            Self::Negotiated(_) => ResourceKind::Negotiated,
        }
    }

    fn base(&self) -> &ResourceBase {
        match self {
            Self::Json(resource) => &resource.base,
            Self::Negotiated(resource) => &resource.base,
        }
    }

    /// Path of the source file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base().path
    }

    /// Logic pages in declaration order.
    #[must_use]
    pub fn logic_pages(&self) -> &[String] {
        &self.base().logic_pages
    }

    /// Media types this resource can serve, in declaration order.
    #[must_use]
    pub fn available_types(&self) -> &[String] {
        match self {
            Self::Json(resource) => resource.available_types(),
            Self::Negotiated(resource) => resource.available_types(),
        }
    }

    /// Media type that would be served for `request`.
    pub fn select(&self, request: &Request) -> Result<&str, NotAcceptable> {
        match self {
            Self::Json(resource) => Ok(resource.media_type()),
            Self::Negotiated(resource) => {
                let index = resource.select(request)?;
                Ok(resource.available_types()[index].as_str())
            }
        }
    }

    /// Build the response from a context prepared by the logic pages.
    pub fn get_response(&self, context: Context) -> Result<Response, RequestError> {
        match self {
            Self::Json(resource) => Ok(resource.get_response(context)),
            Self::Negotiated(resource) => resource.get_response(context),
        }
    }

    /// Adjust a response raised while serving `request`.
    pub fn process_raised_response(&self, request: &Request, response: &mut Response) {
        match self {
            Self::Json(resource) => resource.process_raised_response(request, response),
            Self::Negotiated(_) => {}
        }
    }

    /// Serve one request: run the logic pages, then build the response.
    pub fn respond(
        &self,
        request: Request,
        runner: &dyn LogicRunner,
    ) -> Result<Response, RequestError> {
        let response = Response::default().with_charset(self.base().charset.clone());
        let mut context = Context::new(request, response);

        for page in self.logic_pages() {
            match runner.run(page, &mut context) {
                Ok(()) => {}
                Err(RequestError::Raised(mut response)) => {
                    self.process_raised_response(&context.request, &mut response);
                    return Err(RequestError::Raised(response));
                }
                Err(err) => return Err(err),
            }
        }

        self.get_response(context)
    }
}

#[cfg(test)]
mod tests {
    // Compiled resources are shared across request threads
    static_assertions::assert_impl_all!(super::Resource: Send, Sync);

    use http::{HeaderValue, StatusCode, Uri, header};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;
    use crate::error::ErrorKind;
    use crate::message::Body;
    use crate::renderers::RawRenderer;

    /// Test logic runner: one `key = value` assignment per line.
    fn run_logic(source: &str, context: &mut Context) -> Result<(), RequestError> {
        for line in source.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "body" => {
                    let value: Value = serde_json::from_str(value)
                        .map_err(|err| RequestError::Execution(err.to_string()))?;
                    context.response.body = Body::Value(value);
                }
                "content_type" => {
                    let value = HeaderValue::from_str(value)
                        .map_err(|err| RequestError::Execution(err.to_string()))?;
                    context.response.set_header(header::CONTENT_TYPE, value);
                }
                "raise" => {
                    let status: u16 = value
                        .parse()
                        .map_err(|_| RequestError::Execution(value.to_owned()))?;
                    let status = StatusCode::from_u16(status)
                        .map_err(|err| RequestError::Execution(err.to_string()))?;
                    let response = Response::new(status)
                        .with_body(serde_json::json!({"status": status.as_u16()}));
                    return Err(RequestError::raise(response));
                }
                "fail" => return Err(RequestError::Execution(value.to_owned())),
                "enable_jsonp" | "enable_cors" => {
                    context
                        .request
                        .context
                        .insert(key.to_owned(), Value::Bool(value == "true"));
                }
                _ => {
                    context.insert(key, value);
                }
            }
        }
        Ok(())
    }

    fn registry() -> RendererRegistry {
        RendererRegistry::with_builtins().with_renderer("text", RawRenderer)
    }

    fn compile(kind: ResourceKind, pages: &[&str]) -> Result<Resource, CompileError> {
        compile_with(kind, pages, &ResourceConfig::default())
    }

    fn compile_with(
        kind: ResourceKind,
        pages: &[&str],
        config: &ResourceConfig,
    ) -> Result<Resource, CompileError> {
        let pages = pages.iter().map(|&p| p.to_owned()).collect();
        let source = SourceFile::from_pages("www/resource", pages);
        Resource::compile(kind, &source, &registry(), config)
    }

    fn request(uri: &'static str) -> Request {
        Request::new(Uri::from_static(uri))
    }

    fn accepting(accept: &'static str) -> Request {
        request("/resource").with_header(header::ACCEPT, HeaderValue::from_static(accept))
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    #[test]
    fn test_kind_for_path() {
        assert_eq!(
            ResourceKind::for_path(Path::new("www/data.json")),
            Some(ResourceKind::Json)
        );
        assert_eq!(
            ResourceKind::for_path(Path::new("www/index")),
            Some(ResourceKind::Negotiated)
        );
        assert_eq!(ResourceKind::for_path(Path::new("www/style.css")), None);
    }

    #[test]
    fn test_json_page_count() {
        for count in [0, 1, 3, 4] {
            let pages = vec!["x = 1"; count];
            let err = compile(ResourceKind::Json, &pages).unwrap_err();
            assert!(matches!(err, CompileError::PageCount { .. }), "{count}");
            assert_eq!(err.kind(), ErrorKind::Syntax);
        }
        assert!(compile(ResourceKind::Json, &["", ""]).is_ok());
    }

    #[test]
    fn test_json_page_count_message() {
        let err = compile(ResourceKind::Json, &["", "", "text/plain\nx"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "www/resource has 3 pages; JSON resources need exactly 2"
        );
    }

    #[test]
    fn test_negotiated_page_count() {
        let err = compile(ResourceKind::Negotiated, &["", "text/plain\nx"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "www/resource has 2 pages; negotiated resources need at least 3"
        );

        let pages = ["", "text/plain\na", "text/html\nb", "text/xml\nc", "text/csv\nd"];
        let resource = compile(ResourceKind::Negotiated, &pages).unwrap();
        assert_eq!(resource.available_types().len(), 4);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let pages = ["", "text/plain\na", "text/html\nb"];
        for (config, field) in [
            (
                ResourceConfig {
                    charset: Some("utf\u{7f}8".to_owned()),
                    ..ResourceConfig::default()
                },
                "charset",
            ),
            (
                ResourceConfig {
                    charset: Some("utf 8".to_owned()),
                    ..ResourceConfig::default()
                },
                "charset",
            ),
            (
                ResourceConfig {
                    media_type_json: "json".to_owned(),
                    ..ResourceConfig::default()
                },
                "media_type_json",
            ),
        ] {
            let err = compile_with(ResourceKind::Negotiated, &pages, &config).unwrap_err();
            assert!(
                matches!(err, CompileError::InvalidSetting { field: f, .. } if f == field),
                "{field}"
            );
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn test_charset_disabled() {
        let config = ResourceConfig {
            charset: None,
            ..ResourceConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_compile_failure_is_fatal() {
        let err = compile(
            ResourceKind::Negotiated,
            &["", "text/plain\na", "#!nope text/html\nb"],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = compile(
            ResourceKind::Negotiated,
            &["", "text/plain\na", "text/plain\nb"],
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateMediaType(_)));
    }

    #[test]
    fn test_available_types() {
        let json = compile(ResourceKind::Json, &["", ""]).unwrap();
        assert_eq!(json.available_types(), ["application/json"]);
        assert_eq!(json.kind(), ResourceKind::Json);
        assert_eq!(json.path(), Path::new("www/resource"));
        assert_eq!(json.logic_pages().len(), 2);

        let negotiated =
            compile(ResourceKind::Negotiated, &["", "text/plain\na", "text/html\nb"]).unwrap();
        assert_eq!(negotiated.available_types(), ["text/plain", "text/html"]);
        assert_eq!(negotiated.logic_pages().len(), 1);
    }

    // ========================================================================
    // Negotiated requests
    // ========================================================================

    fn hello_resource(charset: Option<&str>) -> Resource {
        let config = ResourceConfig {
            charset: charset.map(str::to_owned),
            ..ResourceConfig::default()
        };
        compile_with(
            ResourceKind::Negotiated,
            &[
                "dump = {\"a\": 1}",
                "#!text text/plain\nhello",
                "text/json\n{{dump}}",
            ],
            &config,
        )
        .unwrap()
    }

    #[test]
    fn test_negotiated_accept_selects_page() {
        let response = hello_resource(None)
            .respond(accepting("text/json"), &run_logic)
            .unwrap();
        assert_eq!(response.body.as_text(), Some(r#"{"a": 1}"#));
        assert_eq!(response.content_type(), Some("text/json"));
    }

    #[test]
    fn test_charset_follows_text_prefix() {
        let response = hello_resource(Some("UTF-8"))
            .respond(accepting("text/json"), &run_logic)
            .unwrap();
        assert_eq!(response.content_type(), Some("text/json; charset=UTF-8"));
    }

    #[test]
    fn test_negotiated_default_representation() {
        let response = hello_resource(Some("UTF-8"))
            .respond(request("/resource"), &run_logic)
            .unwrap();
        assert_eq!(response.body.as_text(), Some("hello"));
        assert_eq!(response.content_type(), Some("text/plain; charset=UTF-8"));
    }

    #[test]
    fn test_negotiated_not_acceptable() {
        let err = hello_resource(Some("UTF-8"))
            .respond(accepting("image/png"), &run_logic)
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Raised(ref response) if response.status == StatusCode::NOT_ACCEPTABLE
        ));
        let response = err.into_response();
        assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            response.body.as_text(),
            Some("The following media types are available: text/plain, text/json.")
        );
    }

    #[test]
    fn test_negotiated_select() {
        let resource = hello_resource(Some("UTF-8"));
        assert_eq!(resource.select(&accepting("text/*")), Ok("text/plain"));
        assert_eq!(resource.select(&accepting("text/json")), Ok("text/json"));
        assert!(resource.select(&accepting("image/*")).is_err());
    }

    #[test]
    fn test_logic_content_type_is_kept() {
        let resource = compile(
            ResourceKind::Negotiated,
            &["content_type = text/x-special", "text/plain\na", "text/html\nb"],
        )
        .unwrap();
        let response = resource.respond(request("/"), &run_logic).unwrap();
        assert_eq!(response.content_type(), Some("text/x-special"));
    }

    #[test]
    fn test_logic_failure() {
        let resource = compile(
            ResourceKind::Negotiated,
            &["fail = boom", "text/plain\na", "text/html\nb"],
        )
        .unwrap();
        let err = resource.respond(request("/"), &run_logic).unwrap_err();
        assert!(matches!(err, RequestError::Execution(ref msg) if msg == "boom"));
    }

    #[test]
    fn test_negotiated_raised_response_untouched() {
        let resource = compile(
            ResourceKind::Negotiated,
            &["raise = 302", "text/plain\na", "text/html\nb"],
        )
        .unwrap();
        let response = resource
            .respond(request("/"), &run_logic)
            .unwrap_err()
            .into_response();
        assert_eq!(response.status, StatusCode::FOUND);
        assert!(response.content_type().is_none());
    }

    // ========================================================================
    // JSON requests
    // ========================================================================

    #[test]
    fn test_json_respond() {
        let resource = compile(ResourceKind::Json, &["", "body = {\"a\": 1}"]).unwrap();
        let response = resource.respond(request("/data.json"), &run_logic).unwrap();
        assert_eq!(response.body.as_text(), Some(r#"{"a":1}"#));
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_json_jsonp_and_cors_from_logic() {
        let resource = compile(
            ResourceKind::Json,
            &["enable_jsonp = true\nenable_cors = true", "body = {\"a\": 1}"],
        )
        .unwrap();
        let response = resource
            .respond(request("/data.json?callback=foo"), &run_logic)
            .unwrap();
        assert_eq!(response.body.as_text(), Some(r#"foo({"a":1})"#));
        assert_eq!(response.content_type(), Some("application/javascript"));
        assert_eq!(
            response.header(&header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some("*")
        );
    }

    #[test]
    fn test_json_raised_response_is_processed() {
        let resource = compile(ResourceKind::Json, &["enable_cors = true", "raise = 404"]).unwrap();
        let err = resource
            .respond(request("/data.json"), &run_logic)
            .unwrap_err();
        let RequestError::Raised(response) = err else {
            panic!("expected raised response");
        };
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body.as_text(), Some(r#"{"status":404}"#));
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(
            response.header(&header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some("*")
        );
    }

    #[test]
    fn test_respond_is_repeatable() {
        let resource = hello_resource(Some("UTF-8"));
        for _ in 0..3 {
            let response = resource
                .respond(accepting("text/json"), &run_logic)
                .unwrap();
            assert_eq!(response.body.as_text(), Some(r#"{"a": 1}"#));
        }
    }

    #[test]
    fn test_respond_from_threads() {
        let resource = std::sync::Arc::new(hello_resource(Some("UTF-8")));
        let handles: Vec<_> = ["text/plain", "text/json"]
            .into_iter()
            .map(|accept| {
                let resource = std::sync::Arc::clone(&resource);
                std::thread::spawn(move || {
                    resource
                        .respond(accepting(accept), &run_logic)
                        .unwrap()
                        .content_type()
                        .map(str::to_owned)
                })
            })
            .collect();
        let content_types: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            content_types,
            vec![
                Some("text/plain; charset=UTF-8".to_owned()),
                Some("text/json; charset=UTF-8".to_owned())
            ]
        );
    }
}
