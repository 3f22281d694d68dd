//! Scope-aware C# code generator.
//!
//! Walks the syntax tree with an immutable [`ScopeContext`] and produces indented
//! statement lines plus undeclared-variable diagnostics. Everything a call produces is
//! in its [`TranslationResult`]; the only state on the generator itself is the per-run
//! temporary name counter.

pub mod names;
pub mod scope;

mod blocks;
mod expressions;
mod routines;
mod statements;
mod trapping;

use serde::Serialize;
use tracing::debug;

use crate::config::TranslatorConfig;
use crate::core::ast::{contains_resume_next, CodeBlock, NameToken};
use crate::core::error::TranslateError;

use names::{rewrite_name, TempNameGenerator};
use scope::{Frame, ScopeContext};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedStatement {
    pub content: String,
    pub indentation_depth: usize,
}

impl TranslatedStatement {
    pub fn new(content: impl Into<String>, indentation_depth: usize) -> Self {
        Self { content: content.into(), indentation_depth }
    }

    pub fn blank() -> Self {
        Self::new("", 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndeclaredVariable {
    pub name: String,
    pub line: usize,
}

impl std::fmt::Display for UndeclaredVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Undeclared variable: \"{}\" (line {})", self.name, self.line)
    }
}

/// Output of translating one node or sequence.
#[derive(Debug, Clone, Default)]
pub struct TranslationResult {
    pub statements: Vec<TranslatedStatement>,
    /// Undeclared names still waiting for the enclosing routine (or the outer
    /// environment) to give them a home
    pub undeclared: Vec<NameToken>,
    /// One entry per undeclared use, kept after hoisting
    pub diagnostics: Vec<UndeclaredVariable>,
}

impl TranslationResult {
    pub fn from_statements(statements: Vec<TranslatedStatement>) -> Self {
        Self { statements, ..Self::default() }
    }

    pub fn add(&mut self, content: impl Into<String>, depth: usize) {
        self.statements.push(TranslatedStatement::new(content, depth));
    }

    pub fn note_undeclared(&mut self, names: Vec<NameToken>) {
        for n in names {
            self.diagnostics.push(UndeclaredVariable { name: n.name.clone(), line: n.line });
            self.undeclared.push(n);
        }
    }

    /// Appends another result's lines and carries its pending names and diagnostics.
    pub fn merge(&mut self, other: TranslationResult) {
        self.statements.extend(other.statements);
        self.undeclared.extend(other.undeclared);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Lines only, dropping names and diagnostics (used when wrapping).
    pub fn take_statements(&mut self) -> Vec<TranslatedStatement> {
        std::mem::take(&mut self.statements)
    }

    /// Attaches a trailing `//comment` to the last emitted line.
    pub fn append_inline_comment(&mut self, comment: &str) -> bool {
        match self.statements.last_mut() {
            Some(last) => {
                last.content.push_str(" //");
                last.content.push_str(comment);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartKind {
    /// Outermost-level executable statements
    Statement,
    Routine,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramPart {
    pub kind: PartKind,
    pub statements: Vec<TranslatedStatement>,
}

/// A whole translated source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedProgram {
    pub parts: Vec<ProgramPart>,
    /// Outermost declared variables and constants (members of the outer references)
    pub global_names: Vec<String>,
    /// Host-provided and undeclared outermost names (members of the environment references)
    pub environment_names: Vec<String>,
    pub diagnostics: Vec<UndeclaredVariable>,
}

impl TranslatedProgram {
    pub fn statements(&self) -> impl Iterator<Item = &TranslatedStatement> {
        self.parts.iter().flat_map(|p| p.statements.iter())
    }

    /// Trimmed non-blank lines in order, with no scaffolding.
    pub fn lines(&self) -> Vec<String> {
        self.statements()
            .map(|s| s.content.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

pub struct CodeGenerator<'c> {
    pub(crate) config: &'c TranslatorConfig,
    pub(crate) temps: TempNameGenerator,
}

impl<'c> CodeGenerator<'c> {
    pub fn new(config: &'c TranslatorConfig) -> Self {
        Self { config, temps: TempNameGenerator::new() }
    }

    pub(crate) fn support(&self) -> &str {
        &self.config.support_ref
    }

    pub fn translate_program(&self, blocks: &[CodeBlock]) -> Result<TranslatedProgram, TranslateError> {
        let frame = Frame::outermost(blocks, &self.config.external_dependencies);
        let global_names: Vec<String> = frame.variable_names().map(rewrite_name).collect();
        let mut scope = ScopeContext::outermost(frame, &self.config.env_ref, &self.config.outer_ref);

        let mut parts: Vec<ProgramPart> = Vec::new();
        let mut pending = TranslationResult::default();
        let mut diagnostics = Vec::new();
        let mut environment_names: Vec<String> =
            self.config.external_dependencies.iter().map(|e| rewrite_name(e)).collect();

        let token = if contains_resume_next(blocks) {
            let token = self.temps.next("errOn", &scope);
            pending.add(format!("var {} = {}.GETERRORTRAPPINGTOKEN();", token, self.support()), 0);
            scope = scope.with_error_token(&token);
            Some(token)
        } else {
            None
        };

        let mut live = false;
        for block in blocks {
            let kind = match block {
                CodeBlock::Routine(_) => PartKind::Routine,
                CodeBlock::Class { .. } => PartKind::Class,
                CodeBlock::InlineComment { content, .. } => {
                    let attached = pending.append_inline_comment(content)
                        || parts
                            .last_mut()
                            .and_then(|p| p.statements.last_mut())
                            .map(|s| {
                                s.content.push_str(" //");
                                s.content.push_str(content);
                            })
                            .is_some();
                    if !attached {
                        pending.add(format!("//{}", content), 0);
                    }
                    continue;
                }
                _ => PartKind::Statement,
            };
            if kind != PartKind::Statement {
                self.flush_statements(&mut parts, &mut pending, &mut diagnostics, &mut environment_names);
                let result = match block {
                    CodeBlock::Routine(r) => self.translate_routine(r, &scope, 0)?,
                    CodeBlock::Class { name, members } => self.translate_class(name, members, &scope, 0)?,
                    _ => return Err(TranslateError::invariant("routine or class expected")),
                };
                absorb_environment_names(result.undeclared, &mut environment_names);
                diagnostics.extend(result.diagnostics);
                parts.push(ProgramPart { kind, statements: result.statements });
                continue;
            }
            let (result, live_after) = self.translate_block(block, &scope, 0, live)?;
            live = live_after;
            pending.merge(result);
        }
        if let Some(token) = token {
            pending.add(format!("{}.RELEASEERRORTRAPPINGTOKEN({});", self.support(), token), 0);
        }
        self.flush_statements(&mut parts, &mut pending, &mut diagnostics, &mut environment_names);

        debug!(
            parts = parts.len(),
            undeclared = diagnostics.len(),
            "translated program"
        );
        Ok(TranslatedProgram { parts, global_names, environment_names, diagnostics })
    }

    fn flush_statements(
        &self,
        parts: &mut Vec<ProgramPart>,
        pending: &mut TranslationResult,
        diagnostics: &mut Vec<UndeclaredVariable>,
        environment_names: &mut Vec<String>,
    ) {
        absorb_environment_names(std::mem::take(&mut pending.undeclared), environment_names);
        diagnostics.append(&mut pending.diagnostics);
        if !pending.statements.is_empty() {
            parts.push(ProgramPart { kind: PartKind::Statement, statements: pending.take_statements() });
        }
    }
}

/// Undeclared names outside any routine become environment members.
fn absorb_environment_names(names: Vec<NameToken>, environment_names: &mut Vec<String>) {
    for name in names {
        let rewritten = rewrite_name(&name.name);
        if !environment_names.contains(&rewritten) {
            environment_names.push(rewritten);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexer::Lexer;
    use crate::core::number_rebuilder::rebuild;
    use crate::core::parser::parse;

    pub(crate) fn translate(src: &str) -> TranslatedProgram {
        let config = TranslatorConfig::default();
        let tokens = rebuild(&Lexer::new(src).tokenize().unwrap());
        let blocks = parse(&tokens).unwrap();
        CodeGenerator::new(&config).translate_program(&blocks).unwrap()
    }

    pub(crate) fn lines(src: &str) -> Vec<String> {
        translate(src).lines()
    }

    #[test]
    fn outer_undeclared_goes_to_environment() {
        let program = translate("WScript.Echo i");
        assert_eq!(
            program.lines(),
            vec!["_.CALL(this, _env.wscript, \"Echo\", _.ARGS.Ref(_env.i, v1 => { _env.i = v1; }));"]
        );
        assert_eq!(program.environment_names, vec!["wscript", "i"]);
        assert_eq!(program.diagnostics, vec![UndeclaredVariable { name: "i".into(), line: 1 }]);
    }

    #[test]
    fn outer_const_and_dim() {
        let program = translate("Dim a\nconst SOME_CONSTANT = &H0001");
        assert_eq!(program.lines(), vec!["_outer.some_constant = (Int16)1;"]);
        assert_eq!(program.global_names, vec!["a", "some_constant"]);
    }

    #[test]
    fn parts_follow_source_order() {
        let program = translate("Test1\nFunction Test1()\nEnd Function\nx = 1");
        let kinds: Vec<PartKind> = program.parts.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PartKind::Statement, PartKind::Routine, PartKind::Statement]);
    }

    #[test]
    fn outer_trapping_token_wraps_the_outer_statements() {
        let out = lines("On Error Resume Next\nx = 1");
        assert_eq!(
            out,
            vec![
                "var errOn1 = _.GETERRORTRAPPINGTOKEN();",
                "_.STARTERRORTRAPPINGANDCLEARANYERROR(errOn1);",
                "_.HANDLEERROR(errOn1, () => {",
                "_env.x = (Int16)1;",
                "});",
                "_.RELEASEERRORTRAPPINGTOKEN(errOn1);",
            ]
        );
    }

    #[test]
    fn inline_comment_attaches_to_previous_line() {
        assert_eq!(lines("x = 1 ' one"), vec!["_env.x = (Int16)1; // one"]);
    }
}
