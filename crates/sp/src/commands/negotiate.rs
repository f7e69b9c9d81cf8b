//! `sp negotiate` command implementation.

use std::path::PathBuf;

use clap::Args;
use http::{HeaderValue, Uri, header};
use sp_resource::{NotAcceptable, Request, Resource};

use super::{Compiler, GlobalArgs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the negotiate command.
#[derive(Args)]
pub(crate) struct NegotiateArgs {
    /// Simplate file to negotiate against.
    file: PathBuf,

    /// Accept header sent by the client (default: no header).
    #[arg(short, long)]
    accept: Option<String>,

    /// Request path. A known file extension takes precedence over Accept.
    #[arg(short, long, default_value = "/")]
    path: String,
}

impl NegotiateArgs {
    /// Execute the negotiate command.
    ///
    /// # Errors
    ///
    /// Returns an error if the file fails to compile or no representation
    /// is acceptable.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let compiler = Compiler::from_args(global)?;
        let resource = compiler.compile(&self.file)?;
        let request = build_request(self.accept.as_deref(), &self.path)?;

        match describe(&resource, &request) {
            Ok(line) => {
                output.selected(&line);
                Ok(())
            }
            Err(err) => {
                output.not_acceptable();
                Err(err.into())
            }
        }
    }
}

/// Build a request for `path` carrying an optional `Accept` header.
fn build_request(accept: Option<&str>, path: &str) -> Result<Request, CliError> {
    let uri: Uri = path
        .parse()
        .map_err(|err| CliError::Validation(format!("Invalid request path {path}: {err}")))?;
    let mut request = Request::new(uri);
    if let Some(accept) = accept {
        let value = HeaderValue::from_str(accept)
            .map_err(|err| CliError::Validation(format!("Invalid Accept header {accept}: {err}")))?;
        request = request.with_header(header::ACCEPT, value);
    }
    Ok(request)
}

/// Media type served for `request`, with its renderer when negotiated.
fn describe(resource: &Resource, request: &Request) -> Result<String, NotAcceptable> {
    let media_type = resource.select(request)?;
    let line = match resource {
        Resource::Negotiated(negotiated) => match negotiated.renderer_for(media_type) {
            Some(renderer) => format!("{media_type} (renderer: {renderer})"),
            None => media_type.to_owned(),
        },
        Resource::Json(_) => media_type.to_owned(),
    };
    Ok(line)
}
