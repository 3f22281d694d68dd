pub mod ast;
pub mod tokens;
pub mod translate;

use std::fs;
use std::path::Path;
use std::process::exit;

use anyhow::Context;
use colored::Colorize;

use crate::core::diagnostics::{print_error, Span};
use crate::core::error::TranslateError;

pub(crate) fn read_source(input: &Path) -> anyhow::Result<String> {
    fs::read_to_string(input).with_context(|| format!("Could not read '{}'", input.display()))
}

/// Reports a failed unit and exits; no partial output is written for it.
pub(crate) fn fail(input: &Path, source: &str, err: &TranslateError, pretty: bool) -> ! {
    match (pretty, err.line()) {
        (true, Some(line)) => print_error(
            &input.display().to_string(),
            source,
            &err.to_string(),
            Span::whole_line(source, line),
        ),
        _ => eprintln!("{} {}", "error:".bright_red().bold(), err),
    }
    exit(1);
}
