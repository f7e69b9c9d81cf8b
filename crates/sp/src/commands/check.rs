//! `sp check` command implementation.

use std::path::PathBuf;

use clap::Args;
use sp_resource::ErrorKind;

use super::{Compiler, GlobalArgs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Simplate files to compile.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or any file fails to compile.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let compiler = Compiler::from_args(global)?;

        let mut failed = 0;
        for path in &self.files {
            match compiler.compile(path) {
                Ok(resource) => {
                    output.compiled(path, resource.kind(), resource.available_types());
                }
                Err(err) => {
                    failed += 1;
                    output.failed(path, error_label(&err), &err);
                }
            }
        }

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} files failed to compile",
                self.files.len()
            )));
        }
        output.info(&format!("{} files compiled", self.files.len()));
        Ok(())
    }
}

/// Short label describing why a file failed.
fn error_label(err: &CliError) -> &'static str {
    match err {
        CliError::Compile(err) => match err.kind() {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Configuration => "configuration error",
        },
        CliError::Source(_) => "read error",
        _ => "error",
    }
}
