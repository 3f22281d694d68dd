// src/core/compiler.rs
//! VBScript to C# pipeline.
//! Runs validation, atomizing, literal reconstruction, block parsing and code generation.

use tracing::{debug, warn};

use crate::config::TranslatorConfig;
use crate::core::{
    ast::CodeBlock,
    code_generator::{CodeGenerator, TranslatedProgram},
    error::TranslateError,
    lexer::Lexer,
    number_rebuilder,
    parser,
    token::Token,
};

/// Receives one message per undeclared-variable use.
pub trait LogWarnings {
    fn warn(&self, message: &str);
}

/// Default sink: `tracing::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarnings;

impl LogWarnings for TracingWarnings {
    fn warn(&self, message: &str) {
        warn!("{}", message);
    }
}

impl<F: Fn(&str)> LogWarnings for F {
    fn warn(&self, message: &str) {
        self(message)
    }
}

pub struct Compiler<'c> {
    config: &'c TranslatorConfig,
}

impl<'c> Compiler<'c> {
    pub fn new(config: &'c TranslatorConfig) -> Self {
        Compiler { config }
    }

    /// Validates input before anything else runs.
    pub fn validate_and_summarize(&self, source: &str) -> Result<String, TranslateError> {
        if source.trim().is_empty() {
            return Err(TranslateError::EmptySource);
        }
        let lines = source.lines().count();
        let chars = source.chars().count();
        Ok(format!("Validation complete: {} lines, {} characters.", lines, chars))
    }

    /// Disambiguated token stream.
    pub fn tokens(&self, source: &str) -> Result<Vec<Token>, TranslateError> {
        let raw = Lexer::new(source).tokenize()?;
        debug!(tokens = raw.len(), "atomized source");
        let tokens = number_rebuilder::rebuild(&raw);
        debug!(tokens = tokens.len(), "rebuilt literals");
        Ok(tokens)
    }

    pub fn parse(&self, source: &str) -> Result<Vec<CodeBlock>, TranslateError> {
        let tokens = self.tokens(source)?;
        let blocks = parser::parse(&tokens)?;
        debug!(blocks = blocks.len(), "parsed block tree");
        Ok(blocks)
    }

    /// Full pipeline. Undeclared-variable warnings go to `logger`, one per use.
    pub fn translate(&self, source: &str, logger: &dyn LogWarnings) -> Result<TranslatedProgram, TranslateError> {
        let summary = self.validate_and_summarize(source)?;
        debug!("{}", summary);
        let blocks = self.parse(source)?;
        let program = CodeGenerator::new(self.config).translate_program(&blocks)?;
        for diagnostic in &program.diagnostics {
            logger.warn(&diagnostic.to_string());
        }
        debug!(lines = program.statements().count(), "code generation complete");
        Ok(program)
    }
}

/// Convenience wrapper over [`Compiler::translate`].
pub fn translate(
    source: &str,
    config: &TranslatorConfig,
    logger: &dyn LogWarnings,
) -> Result<TranslatedProgram, TranslateError> {
    Compiler::new(config).translate(source, logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn empty_source_is_rejected() {
        let config = TranslatorConfig::default();
        let compiler = Compiler::new(&config);
        assert!(matches!(compiler.validate_and_summarize("  \n"), Err(TranslateError::EmptySource)));
    }

    #[test]
    fn validation_summary_counts_lines() {
        let config = TranslatorConfig::default();
        let compiler = Compiler::new(&config);
        assert_eq!(
            compiler.validate_and_summarize("x = 1\ny = 2").unwrap(),
            "Validation complete: 2 lines, 11 characters."
        );
    }

    #[test]
    fn each_undeclared_use_is_logged() {
        let config = TranslatorConfig::default();
        let seen = RefCell::new(Vec::new());
        let logger = |m: &str| seen.borrow_mut().push(m.to_string());
        translate("x = y\nx = y", &config, &logger).unwrap();
        assert_eq!(
            seen.into_inner(),
            vec![
                "Undeclared variable: \"y\" (line 1)",
                "Undeclared variable: \"x\" (line 1)",
                "Undeclared variable: \"y\" (line 2)",
                "Undeclared variable: \"x\" (line 2)",
            ]
        );
    }

    #[test]
    fn structural_errors_propagate() {
        let config = TranslatorConfig::default();
        let err = translate("If a Then\nb", &config, &TracingWarnings).unwrap_err();
        assert!(matches!(err, TranslateError::Parse(_)));
    }
}
