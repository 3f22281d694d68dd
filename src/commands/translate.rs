use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use tracing::info;

use crate::config::TranslatorConfig;
use crate::core::compiler::{Compiler, LogWarnings, TracingWarnings};
use crate::core::diagnostics::print_undeclared;
use crate::core::formatter::render;
use crate::io::atomic::atomic_write;

/// Translates one file. Output goes to `out` when given (written atomically), otherwise
/// to stdout. Undeclared-variable warnings are logged, pretty-printed or emitted as
/// JSON on stderr depending on the flags.
pub fn translate_file(
    input: &Path,
    out: Option<&Path>,
    config: &TranslatorConfig,
    pretty: bool,
    json_diagnostics: bool,
) -> anyhow::Result<()> {
    let source = super::read_source(input)?;

    let quiet = |_: &str| {};
    let logger: &dyn LogWarnings = if pretty || json_diagnostics { &quiet } else { &TracingWarnings };
    let program = match Compiler::new(config).translate(&source, logger) {
        Ok(p) => p,
        Err(e) => super::fail(input, &source, &e, pretty),
    };

    if json_diagnostics {
        eprintln!("{}", serde_json::to_string_pretty(&program.diagnostics)?);
    } else if pretty {
        print_undeclared(&input.display().to_string(), &source, &program.diagnostics);
    }

    let text = render(&program, config);
    match out {
        Some(out) => {
            atomic_write(out, &text).with_context(|| format!("Failed to write '{}'", out.display()))?;
            info!(output = %out.display(), warnings = program.diagnostics.len(), "translation written");
            println!("{} wrote C# to '{}'.", "ok:".green().bold(), out.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
