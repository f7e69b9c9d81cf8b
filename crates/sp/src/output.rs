//! Colored terminal output utilities.

use std::path::Path;

use console::{Style, Term};
use sp_resource::ResourceKind;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Report a compiled resource and its media types.
    pub(crate) fn compiled(&self, path: &Path, kind: ResourceKind, media_types: &[String]) {
        let line = format!("{}: {kind} resource", path.display());
        let _ = self.term.write_line(&self.green.apply_to(line).to_string());
        self.info(&format!("  media types: {}", media_types.join(", ")));
    }

    /// Report a file that failed to compile.
    pub(crate) fn failed(&self, path: &Path, label: &str, err: &dyn std::fmt::Display) {
        self.error(&format!("{}: {label}: {err}", path.display()));
    }

    /// Print the negotiated representation (cyan bold).
    pub(crate) fn selected(&self, line: &str) {
        let _ = self.term.write_line(&self.cyan_bold.apply_to(line).to_string());
    }

    /// Print the 406 status line (yellow).
    pub(crate) fn not_acceptable(&self) {
        let _ = self
            .term
            .write_line(&self.yellow.apply_to("406 Not Acceptable").to_string());
    }
}
