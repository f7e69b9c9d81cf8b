//! CLI error types.

use sp_config::ConfigError;
use sp_resource::{CompileError, NotAcceptable, SourceError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    NotAcceptable(#[from] NotAcceptable),

    #[error("{0}")]
    Validation(String),
}
