use std::path::Path;

use crate::config::TranslatorConfig;
use crate::core::compiler::Compiler;

/// Dumps the disambiguated token stream, one token per line.
pub fn main(input: &Path, config: &TranslatorConfig, pretty: bool) -> anyhow::Result<()> {
    let source = super::read_source(input)?;
    let tokens = match Compiler::new(config).tokens(&source) {
        Ok(t) => t,
        Err(e) => super::fail(input, &source, &e, pretty),
    };
    for token in &tokens {
        println!("{:>4}  {:<32} {}", token.line, format!("{:?}", token.kind), token.content);
    }
    Ok(())
}
