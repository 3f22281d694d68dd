//! Core module tree for the vbs2cs translator.
//! Only declare modules that exist in the src/core/ directory.

pub mod ast;
pub mod code_generator;
pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod expression;
pub mod formatter;
pub mod lexer;
pub mod number_rebuilder;
pub mod parser;
pub mod token;
pub use token::TokenKind; // Re-export only TokenKind; Token is reached through core::token
pub mod debug; // tracing subscriber setup, VBS2CS_DEBUG=1 raises the level
