//! vbs2cs main: VBScript to C# translator.
use clap::Parser; // trait import enables Vbs2CsCli::parse()

use vbs2cs::cli::{Command, Vbs2CsCli};
use vbs2cs::commands;
use vbs2cs::config::TranslatorConfig;

fn main() -> anyhow::Result<()> {
    let args = Vbs2CsCli::parse();
    vbs2cs::core::debug::init_logging(args.verbose);

    let mut config = TranslatorConfig::resolve(&args.config)?;

    match args.cmd {
        Command::Translate { input, out, no_scaffold, json_diagnostics } => {
            if no_scaffold {
                config.scaffold = false;
            }
            commands::translate::translate_file(&input, out.as_deref(), &config, args.pretty_errors, json_diagnostics)
        }
        Command::Tokens { input } => commands::tokens::main(&input, &config, args.pretty_errors),
        Command::Ast { input } => commands::ast::main(&input, &config, args.pretty_errors),
    }
}
