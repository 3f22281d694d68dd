// src/core/ast.rs
//! Syntax tree produced by the block parser.
//!
//! Compound nodes own their bodies; expressions are kept as the token runs they were
//! parsed from and only broken down into operator trees by the code generator.

use serde::Serialize;

use crate::core::token::Token;

/// A run of tokens forming a single expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub tokens: Vec<Token>,
}

impl Expression {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn line(&self) -> usize {
        self.tokens.first().map(|t| t.line).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameToken {
    pub name: String,
    pub line: usize,
}

impl NameToken {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self { name: name.into(), line }
    }

    pub fn from_token(token: &Token) -> Self {
        Self::new(token.content.clone(), token.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeclarationScope {
    Dim,
    Private,
    Public,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclaration {
    pub name: NameToken,
    /// `None` for a scalar, `Some(vec![])` for `Dim a()`
    pub dimensions: Option<Vec<Expression>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantDeclaration {
    pub name: NameToken,
    pub value: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitKind {
    Do,
    For,
    Function,
    Sub,
    Property,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalClause {
    pub condition: Expression,
    pub body: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CaseSegment {
    Values { values: Vec<Expression>, body: Vec<CodeBlock> },
    Else { body: Vec<CodeBlock> },
}

impl CaseSegment {
    pub fn body(&self) -> &[CodeBlock] {
        match self {
            CaseSegment::Values { body, .. } | CaseSegment::Else { body } => body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoutineKind {
    Function,
    Sub,
    PropertyGet,
    PropertyLet,
    PropertySet,
}

impl RoutineKind {
    pub fn has_return_value(self) -> bool {
        matches!(self, RoutineKind::Function | RoutineKind::PropertyGet)
    }

    pub fn is_property(self) -> bool {
        matches!(self, RoutineKind::PropertyGet | RoutineKind::PropertyLet | RoutineKind::PropertySet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: NameToken,
    pub by_ref: bool,
    /// Declared with trailing `()`
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineBlock {
    pub kind: RoutineKind,
    pub name: NameToken,
    pub is_public: bool,
    pub is_default: bool,
    pub parameters: Vec<Parameter>,
    pub body: Vec<CodeBlock>,
}

impl RoutineBlock {
    /// Properties taking arguments beyond the assigned value.
    pub fn is_indexed_property(&self) -> bool {
        match self.kind {
            RoutineKind::PropertyGet => !self.parameters.is_empty(),
            RoutineKind::PropertyLet | RoutineKind::PropertySet => self.parameters.len() > 1,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CodeBlock {
    BlankLine,
    Comment { content: String, line: usize },
    InlineComment { content: String, line: usize },
    OptionExplicit,
    OnErrorResumeNext { line: usize },
    OnErrorGoto0 { line: usize },
    Statement { expression: Expression, call_keyword: bool },
    ValueSetting { target: Expression, value: Expression, is_set: bool },
    Dim { scope: DeclarationScope, variables: Vec<VariableDeclaration> },
    Const { scope: DeclarationScope, values: Vec<ConstantDeclaration> },
    ReDim { preserve: bool, variables: Vec<VariableDeclaration> },
    Exit { kind: ExitKind, line: usize },
    Randomize { seed: Option<Expression>, line: usize },
    If { clauses: Vec<ConditionalClause>, else_body: Option<Vec<CodeBlock>> },
    Select { expression: Expression, opening_comments: Vec<CodeBlock>, segments: Vec<CaseSegment> },
    /// Covers `Do .. Loop` in all its forms as well as `While .. Wend`.
    Do {
        condition: Option<Expression>,
        is_pre_condition: bool,
        is_until: bool,
        supports_exit: bool,
        body: Vec<CodeBlock>,
    },
    For {
        variable: NameToken,
        start: Expression,
        end: Expression,
        step: Option<Expression>,
        body: Vec<CodeBlock>,
    },
    ForEach { variable: NameToken, collection: Expression, body: Vec<CodeBlock> },
    /// `With target .. End With`; a leading `.member` in the body refers to `target`.
    With { target: Expression, body: Vec<CodeBlock>, line: usize },
    Routine(RoutineBlock),
    Class { name: NameToken, members: Vec<CodeBlock> },
}

impl CodeBlock {
    /// Child block sequences in source order (case/clause bodies, loop bodies, members).
    pub fn child_sequences(&self) -> Vec<&[CodeBlock]> {
        match self {
            CodeBlock::If { clauses, else_body } => {
                let mut out: Vec<&[CodeBlock]> = clauses.iter().map(|c| c.body.as_slice()).collect();
                if let Some(e) = else_body {
                    out.push(e);
                }
                out
            }
            CodeBlock::Select { segments, .. } => segments.iter().map(|s| s.body()).collect(),
            CodeBlock::Do { body, .. }
            | CodeBlock::For { body, .. }
            | CodeBlock::ForEach { body, .. }
            | CodeBlock::With { body, .. } => {
                vec![body.as_slice()]
            }
            CodeBlock::Routine(r) => vec![r.body.as_slice()],
            CodeBlock::Class { members, .. } => vec![members.as_slice()],
            _ => Vec::new(),
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, CodeBlock::Do { .. } | CodeBlock::For { .. } | CodeBlock::ForEach { .. })
    }
}

/// True if the sequence contains `On Error Resume Next` at any depth, not counting nested
/// routines and classes (they get their own trapping scope).
pub fn contains_resume_next(blocks: &[CodeBlock]) -> bool {
    blocks.iter().any(|b| match b {
        CodeBlock::OnErrorResumeNext { .. } => true,
        CodeBlock::Routine(_) | CodeBlock::Class { .. } => false,
        other => other.child_sequences().into_iter().any(contains_resume_next),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_next_found_in_nested_blocks_but_not_routines() {
        let nested = CodeBlock::If {
            clauses: vec![ConditionalClause {
                condition: Expression::new(vec![Token::atom("a", 1)]),
                body: vec![CodeBlock::OnErrorResumeNext { line: 2 }],
            }],
            else_body: None,
        };
        assert!(contains_resume_next(&[nested]));

        let routine = CodeBlock::Routine(RoutineBlock {
            kind: RoutineKind::Sub,
            name: NameToken::new("S", 1),
            is_public: true,
            is_default: false,
            parameters: vec![],
            body: vec![CodeBlock::OnErrorResumeNext { line: 2 }],
        });
        assert!(!contains_resume_next(&[routine]));
    }

    #[test]
    fn indexed_property_counts_the_value_argument() {
        let mut p = RoutineBlock {
            kind: RoutineKind::PropertyLet,
            name: NameToken::new("Item", 1),
            is_public: true,
            is_default: false,
            parameters: vec![Parameter { name: NameToken::new("v", 1), by_ref: false, is_array: false }],
            body: vec![],
        };
        assert!(!p.is_indexed_property());
        p.kind = RoutineKind::PropertyGet;
        assert!(p.is_indexed_property());
    }
}
