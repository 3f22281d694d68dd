// Make the same modules available from the library crate so integration tests and
// embedders can reach the pipeline via `vbs2cs::...`.
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;

pub use crate::config::TranslatorConfig;
pub use crate::core::compiler::{translate, Compiler, LogWarnings, TracingWarnings};
pub use crate::core::formatter::render;
