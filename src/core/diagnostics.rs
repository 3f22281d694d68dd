// src/core/diagnostics.rs
//! Pretty, colored, file+line diagnostics for the CLI.

use colored::{ColoredString, Colorize};

use crate::core::code_generator::UndeclaredVariable;

pub struct Span {
    pub line: usize,
    pub col: usize,
    pub len: usize, // underline length (use 1 if unknown)
}

impl Span {
    pub fn single(line: usize, col: usize) -> Self {
        Self { line, col, len: 1 }
    }

    /// Underlines the whole statement text of `line`, ignoring indentation.
    pub fn whole_line(source: &str, line: usize) -> Self {
        let text = nth_line(source, line).unwrap_or_default();
        let indent = text.len() - text.trim_start().len();
        Self { line, col: indent + 1, len: text.trim().chars().count().max(1) }
    }
}

pub fn print_error(filename: &str, source: &str, title: &str, span: Span) {
    eprint!("{}", render(filename, source, "error:".bright_red().bold(), title, &span, true));
}

pub fn print_warning(filename: &str, source: &str, title: &str, span: Span) {
    eprint!("{}", render(filename, source, "warning:".yellow().bold(), title, &span, true));
}

/// One colored warning per undeclared-variable use.
pub fn print_undeclared(filename: &str, source: &str, diagnostics: &[UndeclaredVariable]) {
    for d in diagnostics {
        let title = format!("undeclared variable \"{}\"", d.name);
        print_warning(filename, source, &title, Span::whole_line(source, d.line));
    }
}

fn render(filename: &str, source: &str, label: ColoredString, title: &str, span: &Span, colored: bool) -> String {
    let mut out = String::new();
    let paint = |s: ColoredString| if colored { s.to_string() } else { s.clear().to_string() };
    out.push_str(&format!("{} {}\n", paint(label), paint(title.bright_white())));
    let (ln, col) = (span.line, span.col);
    let line_text = nth_line(source, ln).unwrap_or_default();

    // line number gutter
    let ln_str = format!("{:>4}", ln);
    out.push_str(&format!(
        "{} {}\n",
        paint("-->".bright_blue()),
        paint(format!("{}:{}:{}", filename, ln, col).bright_white())
    ));
    out.push_str(&format!(" {} {}\n", paint(ln_str.dimmed()), paint("|".dimmed())));
    out.push_str(&format!("{} {} {}\n", paint(ln_str.dimmed()), paint("|".dimmed()), line_text));

    // underline with ^^^^^
    let underline = " ".repeat(col.saturating_sub(1)) + &"^".repeat(span.len.max(1));
    out.push_str(&format!(
        " {} {} {}\n\n",
        paint(" ".repeat(ln_str.len()).dimmed()),
        paint("|".dimmed()),
        paint(underline.bright_red())
    ));
    out
}

fn nth_line(src: &str, n: usize) -> Option<String> {
    src.lines().nth(n.saturating_sub(1)).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_line_span_skips_indentation() {
        let span = Span::whole_line("a = 1\n    b = 22\n", 2);
        assert_eq!((span.line, span.col, span.len), (2, 5, 6));
    }

    #[test]
    fn plain_rendering_points_at_the_line() {
        let text = render("t.vbs", "x = 1\ny = z\n", "warning:".yellow(), "undeclared", &Span::whole_line("x = 1\ny = z\n", 2), false);
        assert!(text.starts_with("warning: undeclared\n"));
        assert!(text.contains("--> t.vbs:2:1\n"));
        assert!(text.contains("   2 | y = z\n"));
        assert!(text.contains("^^^^^"));
    }
}
