//! Error types for resource compilation and request handling.
//!
//! Compile-time failures ([`CompileError`]) are fatal for one source file and
//! never produce a partial resource. Request-time failures ([`RequestError`])
//! are scoped to a single request and always convert back to a [`Response`].

use std::path::PathBuf;

use http::StatusCode;

use crate::message::Response;
use crate::specline::{MEDIA_TYPE_PATTERN, RENDERER_PATTERN};

/// Broad category of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source file is structurally malformed.
    Syntax,
    /// The source file refers to something the host has not configured.
    Configuration,
}

/// Error raised while compiling a source file into a resource.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Page count outside the range allowed for the resource kind.
    #[error("{} has {count} pages; {expected}", .path.display())]
    PageCount {
        /// Source file path.
        path: PathBuf,
        /// Number of pages found.
        count: usize,
        /// Human readable page range.
        expected: String,
    },
    /// Content page without a specline.
    #[error("Content pages in negotiated resources must have a specline.")]
    EmptySpecline,
    /// Specline with zero or more than two parts.
    #[error(
        "A negotiated resource specline must have one or two parts: #!renderer media/type. Yours is: {0}."
    )]
    SpeclineParts(String),
    /// Media type failing the media type pattern.
    #[error(
        "Malformed media type {media_type} in specline {specline}. It must match {}.",
        MEDIA_TYPE_PATTERN
    )]
    MalformedMediaType {
        /// Offending media type.
        media_type: String,
        /// Full specline.
        specline: String,
    },
    /// Renderer reference failing the renderer pattern.
    #[error("Malformed renderer {}. It must match {}.", .0, RENDERER_PATTERN)]
    MalformedRenderer(String),
    /// Two content pages declare the same media type.
    #[error("Two content pages defined for {0}.")]
    DuplicateMediaType(String),
    /// JSON resource given explicit content pages.
    #[error("JSON resources should only have logic pages")]
    ContentPagesUnsupported,
    /// Renderer name missing from the registry.
    #[error("Unknown renderer for {media_type}: {renderer}.")]
    UnknownRenderer {
        /// Media type of the content page.
        media_type: String,
        /// Renderer name as written in the specline.
        renderer: String,
    },
    /// Host setting that cannot be used in a response header.
    #[error("Invalid {field}: {value:?}")]
    InvalidSetting {
        /// Name of the setting.
        field: &'static str,
        /// Rejected value.
        value: String,
    },
    /// Renderer factory rejected the page body.
    #[error("Renderer {renderer} failed for {media_type}: {source}")]
    Renderer {
        /// Media type of the content page.
        media_type: String,
        /// Renderer name.
        renderer: String,
        /// Underlying renderer error.
        #[source]
        source: RenderError,
    },
}

impl CompileError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownRenderer { .. } | Self::Renderer { .. } | Self::InvalidSetting { .. } => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::Syntax,
        }
    }
}

/// Error reading or decoding a source file.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error reading the file.
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        /// Source file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Content is not valid UTF-8.
    #[error("{} is not valid UTF-8 (page {page})", .path.display())]
    Encoding {
        /// Source file path.
        path: PathBuf,
        /// Zero-based index of the offending page.
        page: usize,
    },
}

/// Error produced by a renderer factory or render function.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RenderError(String);

impl RenderError {
    /// Create a render error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error interrupting a single request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// A response raised as an early exit.
    #[error("Response raised with status {}", .0.status)]
    Raised(Box<Response>),
    /// A logic page failed to execute.
    #[error("Logic page failed: {0}")]
    Execution(String),
    /// Rendering the selected content page failed.
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
}

impl RequestError {
    /// Raise `response` as an early exit.
    #[must_use]
    pub fn raise(response: Response) -> Self {
        Self::Raised(Box::new(response))
    }

    /// Convert into the response the client should see.
    ///
    /// Raised responses are returned as-is; execution and render failures
    /// become a plain 500.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self {
            Self::Raised(response) => *response,
            other => Response::new(StatusCode::INTERNAL_SERVER_ERROR).with_body(other.to_string()),
        }
    }
}

impl From<Response> for RequestError {
    fn from(response: Response) -> Self {
        Self::raise(response)
    }
}
