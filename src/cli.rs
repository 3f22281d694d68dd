use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "vbs2cs",
    about = "Translate VBScript into C# that runs against the VBScript compatibility layer",
    version,
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Vbs2CsCli {
    /// Global: pretty diagnostics
    #[arg(long = "pretty-errors", action = ArgAction::SetTrue, global = true)]
    pub pretty_errors: bool,

    /// Global: path to config (TOML); default: ~/.vbs2cs/config.toml
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Global: debug logging for every pipeline stage (same as VBS2CS_DEBUG=1)
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Translate a script to C#
    ///
    /// Examples:
    ///   vbs2cs translate script.vbs -o Script.cs
    ///   vbs2cs translate script.vbs --no-scaffold --json-diagnostics
    Translate {
        /// Input file (.vbs)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file path (short: -o). Prints to stdout when omitted.
        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Emit only the translated statements, without the surrounding program
        #[arg(long = "no-scaffold", action = ArgAction::SetTrue)]
        no_scaffold: bool,

        /// Print undeclared-variable diagnostics to stderr as JSON
        #[arg(long = "json-diagnostics", action = ArgAction::SetTrue)]
        json_diagnostics: bool,
    },

    /// Debug helpers
    Tokens {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    Ast {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}
