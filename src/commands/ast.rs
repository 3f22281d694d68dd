use std::path::Path;

use crate::config::TranslatorConfig;
use crate::core::compiler::Compiler;

/// Dumps the block tree as JSON.
pub fn main(input: &Path, config: &TranslatorConfig, pretty: bool) -> anyhow::Result<()> {
    let source = super::read_source(input)?;
    let blocks = match Compiler::new(config).parse(&source) {
        Ok(b) => b,
        Err(e) => super::fail(input, &source, &e, pretty),
    };
    println!("{}", serde_json::to_string_pretty(&blocks)?);
    Ok(())
}
