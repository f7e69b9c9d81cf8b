//! JSON resources.
//!
//! A JSON resource has two logic pages and no content pages. Its body is
//! whatever the logic pages leave in `response.body`, serialized to JSON when
//! it is not already text. JSONP and CORS are opt-in per request through the
//! `enable_jsonp` and `enable_cors` flags.

use std::sync::LazyLock;

use http::{HeaderValue, header};
use regex::Regex;

use super::ResourceBase;
use crate::context::Context;
use crate::error::CompileError;
use crate::message::{Body, Request, Response};

/// Pattern a JSONP callback name must match.
pub const CALLBACK_PATTERN: &str = "[_A-Za-z0-9]+";

static CALLBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{CALLBACK_PATTERN}$")).unwrap());

/// Compiled JSON resource.
#[derive(Debug)]
pub struct JsonResource {
    pub(super) base: ResourceBase,
    media_type: String,
    content_type: HeaderValue,
    jsonp_content_type: HeaderValue,
}

impl JsonResource {
    pub(super) fn compile(
        base: ResourceBase,
        content_pages: &[String],
        media_type: &str,
        media_type_jsonp: &str,
    ) -> Result<Self, CompileError> {
        if !content_pages.is_empty() {
            return Err(CompileError::ContentPagesUnsupported);
        }
        Ok(Self {
            base,
            media_type: media_type.to_owned(),
            content_type: header_value("media_type_json", media_type)?,
            jsonp_content_type: header_value("media_type_jsonp", media_type_jsonp)?,
        })
    }

    /// Media type served for plain JSON responses.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Media types this resource serves: only the JSON media type.
    #[must_use]
    pub fn available_types(&self) -> &[String] {
        std::slice::from_ref(&self.media_type)
    }

    /// Finish the response built by the logic pages.
    #[must_use]
    pub fn get_response(&self, context: Context) -> Response {
        let (request, mut response) = context.into_parts();
        self.process(&request, &mut response);
        response
    }

    /// Apply the same JSON treatment to a response raised by a logic page.
    pub fn process_raised_response(&self, request: &Request, response: &mut Response) {
        self.process(request, response);
    }

    fn process(&self, request: &Request, response: &mut Response) {
        if let Body::Value(value) = &response.body {
            response.body = Body::Text(value.to_string());
        }
        response.set_header(header::CONTENT_TYPE, self.content_type.clone());

        if request.flag("enable_jsonp")
            && let Some(callback) = request.query_param("callback")
        {
            if CALLBACK_RE.is_match(&callback) {
                response.body = wrap(&callback, &response.body);
                response.set_header(header::CONTENT_TYPE, self.jsonp_content_type.clone());
            } else {
                tracing::warn!(
                    path = %self.base.path.display(),
                    callback = %callback,
                    "Ignoring malformed JSONP callback"
                );
            }
        }

        if request.flag("enable_cors") {
            response.set_header(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }
    }
}

fn header_value(field: &'static str, value: &str) -> Result<HeaderValue, CompileError> {
    HeaderValue::from_str(value).map_err(|_| CompileError::InvalidSetting {
        field,
        value: value.to_owned(),
    })
}

/// Wrap a body as `callback(body)`.
fn wrap(callback: &str, body: &Body) -> Body {
    match body {
        Body::Text(text) => Body::Text(format!("{callback}({text})")),
        Body::Value(value) => Body::Text(format!("{callback}({value})")),
        Body::Bytes(bytes) => {
            let mut wrapped = Vec::with_capacity(callback.len() + bytes.len() + 2);
            wrapped.extend_from_slice(callback.as_bytes());
            wrapped.push(b'(');
            wrapped.extend_from_slice(bytes);
            wrapped.push(b')');
            Body::Bytes(wrapped)
        }
    }
}
