//! Per-request rendering context and the logic-page capability.

use serde_json::{Map, Value};

use crate::error::RequestError;
use crate::message::{Request, Response};

/// Per-request mapping built by a resource's logic pages.
///
/// Holds the request, the response under construction, and whatever values
/// the logic pages add. Never shared between requests.
#[derive(Debug, Default)]
pub struct Context {
    /// The request being served.
    pub request: Request,
    /// The response being built.
    pub response: Response,
    values: Map<String, Value>,
}

impl Context {
    /// Create a fresh context for one request.
    #[must_use]
    pub fn new(request: Request, response: Response) -> Self {
        Self {
            request,
            response,
            values: Map::new(),
        }
    }

    /// Look up a value set by a logic page.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// All values set by logic pages.
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Split into the request and the response being built.
    #[must_use]
    pub fn into_parts(self) -> (Request, Response) {
        (self.request, self.response)
    }
}

/// Host capability that executes one logic page against a context.
///
/// Logic pages run per request, in declaration order. A runner may short-circuit
/// the request by returning [`RequestError::Raised`].
pub trait LogicRunner: Send + Sync {
    /// Execute `source` against `context`.
    fn run(&self, source: &str, context: &mut Context) -> Result<(), RequestError>;
}

impl<F> LogicRunner for F
where
    F: Fn(&str, &mut Context) -> Result<(), RequestError> + Send + Sync,
{
    fn run(&self, source: &str, context: &mut Context) -> Result<(), RequestError> {
        self(source, context)
    }
}
