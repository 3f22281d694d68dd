//! Expression translation: operator trees to runtime support calls.

use crate::core::ast::NameToken;
use crate::core::code_generator::names::{
    builtin_constant, builtin_function, escape_csharp, numeric_literal, rewrite_name, string_literal,
};
use crate::core::code_generator::scope::{Resolution, ScopeContext};
use crate::core::code_generator::CodeGenerator;
use crate::core::error::TranslateError;
use crate::core::expression::{Chain, ChainHead, Expr, Keyword, Segment, StatementCall, UnaryOp};

/// What the head of a chain turned out to be.
enum Reference {
    Value(String),
    Result { variable: String, owner: String, member: String },
    Routine { owner: String, member: String },
    Builtin(String),
    Constant(&'static str),
    Err,
    Class(String),
}

/// Target of a runtime `CALL` plus member names not yet applied to it.
struct CallTarget {
    target: String,
    members: Vec<String>,
}

fn is_builtin_name(scope: &ScopeContext, name: &str) -> bool {
    matches!(scope.resolve(name), Resolution::Undeclared)
        && (builtin_function(name).is_some() || builtin_constant(name).is_some() || name.eq_ignore_ascii_case("err"))
}

fn unbracketed(expr: &Expr) -> &Expr {
    match expr {
        Expr::Bracketed(inner) => unbracketed(inner),
        other => other,
    }
}

pub(crate) struct ExpressionTranslator<'g, 'c> {
    generator: &'g CodeGenerator<'c>,
    scope: &'g ScopeContext,
    undeclared: Vec<NameToken>,
}

impl<'g, 'c> ExpressionTranslator<'g, 'c> {
    pub fn new(generator: &'g CodeGenerator<'c>, scope: &'g ScopeContext) -> Self {
        Self { generator, scope, undeclared: Vec::new() }
    }

    /// Undeclared names met along the way, one entry per use.
    pub fn finish(self) -> Vec<NameToken> {
        self.undeclared
    }

    fn support(&self) -> &str {
        self.generator.support()
    }

    fn reference(&mut self, name: &str, line: usize) -> Reference {
        match self.scope.resolve(name) {
            Resolution::Variable { access, .. } => Reference::Value(access),
            Resolution::Result { variable, owner, member } => Reference::Result { variable, owner, member },
            Resolution::Routine { owner, member } => Reference::Routine { owner, member },
            Resolution::Class { name } => Reference::Class(name),
            Resolution::Undeclared => {
                if let Some(member) = builtin_function(name) {
                    Reference::Builtin(member)
                } else if let Some(constant) = builtin_constant(name) {
                    Reference::Constant(constant)
                } else if name.eq_ignore_ascii_case("err") {
                    Reference::Err
                } else {
                    self.undeclared.push(NameToken::new(name, line));
                    Reference::Value(self.scope.undeclared_access(name))
                }
            }
        }
    }

    pub fn value(&mut self, expr: &Expr) -> Result<String, TranslateError> {
        let s = self.support().to_string();
        Ok(match expr {
            Expr::Number(n) => numeric_literal(n),
            Expr::Str(text) => string_literal(text),
            Expr::Date(text) => format!("{}.DATE({})", s, string_literal(text)),
            Expr::Keyword(k) => match k {
                Keyword::True => "true".into(),
                Keyword::False => "false".into(),
                Keyword::Empty => "null".into(),
                Keyword::Null => "DBNull.Value".into(),
                Keyword::Nothing => "VBScriptConstants.Nothing".into(),
            },
            Expr::Chain(chain) => self.chain_value(chain)?,
            Expr::New { class_name, .. } => {
                let class = match self.scope.resolve(class_name) {
                    Resolution::Class { name } => name,
                    _ => rewrite_name(class_name),
                };
                let config = self.generator.config;
                format!("new {}({}, {}, {})", class, s, config.env_ref, config.outer_ref)
            }
            Expr::Unary { op: UnaryOp::Neg, operand } => match operand.as_ref() {
                Expr::Number(n) if !n.starts_with('-') => numeric_literal(&format!("-{}", n)),
                other => format!("{}.NEG({})", s, self.value(other)?),
            },
            Expr::Unary { op: UnaryOp::Not, operand } => format!("{}.NOT({})", s, self.value(operand)?),
            Expr::Binary { op, lhs, rhs } => {
                let l = self.value(lhs)?;
                let r = self.value(rhs)?;
                format!("{}.{}({}, {})", s, op.runtime_name(), l, r)
            }
            Expr::Concat(parts) => {
                let values = parts.iter().map(|p| self.value(p)).collect::<Result<Vec<_>, _>>()?;
                format!("{}.CONCAT({})", s, values.join(", "))
            }
            Expr::Bracketed(inner) => self.value(inner)?,
            Expr::CalledLiteral { description } => self.called_like_function(description),
        })
    }

    fn called_like_function(&self, description: &str) -> String {
        let message = format!("'{}' is called like a function", description);
        format!(
            "{}.RAISEERROR(new TypeMismatchException(\"{}\"))",
            self.support(),
            escape_csharp(&message)
        )
    }

    /// Value for the right-hand side of an assignment: `_.VAL(..)` around references,
    /// `_.OBJ(..)` for `Set`.
    pub fn wrapped_value(&mut self, expr: &Expr, is_set: bool) -> Result<String, TranslateError> {
        let content = self.value(expr)?;
        let inner = unbracketed(expr);
        if is_set {
            return Ok(match inner {
                Expr::New { .. } | Expr::Keyword(Keyword::Nothing) => content,
                _ => format!("{}.OBJ({})", self.support(), content),
            });
        }
        let needs_val = match inner {
            Expr::Chain(chain) => match &chain.head {
                ChainHead::Name { name, .. } if is_builtin_name(self.scope, name) => {
                    chain.segments.iter().any(|seg| matches!(seg, Segment::Member(_)))
                }
                _ => true,
            },
            _ => false,
        };
        Ok(if needs_val { format!("{}.VAL({})", self.support(), content) } else { content })
    }

    fn head_target(&mut self, chain: &Chain, prefer_call: bool) -> Result<(CallTarget, usize), TranslateError> {
        let (name, line) = match &chain.head {
            ChainHead::Me => return Ok((CallTarget { target: "this".into(), members: Vec::new() }, 0)),
            ChainHead::With { line } => {
                let target = self.scope.with_target().ok_or_else(|| {
                    TranslateError::invalid_expression(*line, "member access with no enclosing \"With\"")
                })?;
                return Ok((CallTarget { target: target.to_string(), members: Vec::new() }, 0));
            }
            ChainHead::Name { name, line } => (name, *line),
        };
        let first_call = match chain.segments.first() {
            Some(Segment::Call(args)) => Some(args),
            _ => None,
        };
        let target = |target: String| CallTarget { target, members: Vec::new() };
        Ok(match self.reference(name, line) {
            Reference::Value(access) => (target(access), 0),
            Reference::Result { variable, owner, member } => {
                if prefer_call || first_call.is_some() {
                    (CallTarget { target: owner, members: vec![string_literal(&member)] }, 0)
                } else {
                    (target(variable), 0)
                }
            }
            Reference::Routine { owner, member } => {
                (CallTarget { target: owner, members: vec![string_literal(&member)] }, 0)
            }
            Reference::Builtin(member) => match first_call {
                Some(args) => (target(self.builtin_call(&member, args)?), 1),
                None => (target(format!("{}.{}()", self.support(), member)), 0),
            },
            Reference::Constant(constant) => match first_call {
                Some(_) => (target(self.called_like_function(name)), 1),
                None => (target(format!("VBScriptConstants.{}", constant)), 0),
            },
            Reference::Err => (target(format!("{}.ERR", self.support())), 0),
            Reference::Class(class) => (target(class), 0),
        })
    }

    /// Built-ins take their arguments by value and need no argument builder.
    fn builtin_call(&mut self, member: &str, args: &[Expr]) -> Result<String, TranslateError> {
        let values = args.iter().map(|a| self.value(a)).collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{}.{}({})", self.support(), member, values.join(", ")))
    }

    fn fold_segments(&mut self, mut current: CallTarget, segments: &[Segment]) -> Result<CallTarget, TranslateError> {
        for segment in segments {
            match segment {
                Segment::Member(m) => current.members.push(string_literal(m)),
                Segment::Call(args) => {
                    let call = self.call_expression(&current, Some(args))?;
                    current = CallTarget { target: call, members: Vec::new() };
                }
            }
        }
        Ok(current)
    }

    fn call_expression(&mut self, target: &CallTarget, args: Option<&[Expr]>) -> Result<String, TranslateError> {
        let mut parts = vec!["this".to_string(), target.target.clone()];
        parts.extend(target.members.iter().cloned());
        if let Some(args) = args {
            parts.push(self.argument_list(args)?);
        }
        Ok(format!("{}.CALL({})", self.support(), parts.join(", ")))
    }

    fn finish_value(&mut self, target: CallTarget) -> Result<String, TranslateError> {
        if target.members.is_empty() {
            Ok(target.target)
        } else {
            self.call_expression(&target, None)
        }
    }

    fn chain_value(&mut self, chain: &Chain) -> Result<String, TranslateError> {
        let (head, consumed) = self.head_target(chain, false)?;
        let folded = self.fold_segments(head, &chain.segments[consumed..])?;
        self.finish_value(folded)
    }

    /// `_.ARGS.Ref(x, v1 => { x = v1; }).Val(..)`; no arguments at all is
    /// `_.ARGS.ForceBrackets()`.
    fn argument_list(&mut self, args: &[Expr]) -> Result<String, TranslateError> {
        let mut out = format!("{}.ARGS", self.support());
        if args.is_empty() {
            out.push_str(".ForceBrackets()");
            return Ok(out);
        }
        for arg in args {
            match self.ref_target(arg) {
                Some(access) => {
                    let v = self.generator.temps.next("v", self.scope);
                    out.push_str(&format!(".Ref({a}, {v} => {{ {a} = {v}; }})", a = access, v = v));
                }
                None => {
                    let value = self.value(arg)?;
                    out.push_str(&format!(".Val({})", value));
                }
            }
        }
        Ok(out)
    }

    /// Access path when `arg` is a bare variable that can be passed by reference.
    fn ref_target(&mut self, arg: &Expr) -> Option<String> {
        let Expr::Chain(chain) = arg else { return None };
        let name = chain.simple_name()?;
        let line = match &chain.head {
            ChainHead::Name { line, .. } => *line,
            ChainHead::Me | ChainHead::With { .. } => return None,
        };
        match self.scope.resolve(name) {
            Resolution::Variable { access, .. } => Some(access),
            Resolution::Result { variable, .. } => Some(variable),
            Resolution::Routine { .. } | Resolution::Class { .. } => None,
            Resolution::Undeclared => {
                if is_builtin_name(self.scope, name) {
                    None
                } else {
                    self.undeclared.push(NameToken::new(name, line));
                    Some(self.scope.undeclared_access(name))
                }
            }
        }
    }

    /// Access path of a loop variable.
    pub fn variable_access(&mut self, name: &str, line: usize) -> Result<String, TranslateError> {
        match self.reference(name, line) {
            Reference::Value(access) => Ok(access),
            Reference::Result { variable, .. } => Ok(variable),
            _ => Err(TranslateError::invalid_expression(line, format!("\"{}\" is not a variable", name))),
        }
    }

    /// Statement-form call: `f x, y`, `a.b(1).c`, `Call F(x)`.
    pub fn statement_call(&mut self, call: &StatementCall) -> Result<String, TranslateError> {
        if let Some(name) = call.target.simple_name() {
            if matches!(self.scope.resolve(name), Resolution::Undeclared) {
                if let Some(member) = builtin_function(name) {
                    let args = call.arguments.as_deref().unwrap_or(&[]);
                    return self.builtin_call(&member, args);
                }
            }
        }
        let (head, consumed) = self.head_target(&call.target, true)?;
        let folded = self.fold_segments(head, &call.target.segments[consumed..])?;
        self.call_expression(&folded, call.arguments.as_deref())
    }

    /// Assignment of an already translated value to `target`.
    pub fn assignment(&mut self, target: &Chain, value: &str, line: usize) -> Result<String, TranslateError> {
        let s = self.support().to_string();
        if target.segments.is_empty() {
            let ChainHead::Name { name, line } = &target.head else {
                return Err(TranslateError::invalid_expression(line, "cannot assign to \"Me\""));
            };
            return match self.reference(name, *line) {
                Reference::Value(access) => Ok(format!("{} = {};", access, value)),
                Reference::Result { variable, .. } => Ok(format!("{} = {};", variable, value)),
                Reference::Routine { owner, member } => {
                    Ok(format!("{}.SET({}, this, {}, {});", s, value, owner, string_literal(&member)))
                }
                _ => Err(TranslateError::invalid_expression(*line, format!("cannot assign to \"{}\"", name))),
            };
        }

        let n = target.segments.len();
        let (prefix_len, member, args) = match &target.segments[n - 1] {
            Segment::Member(m) => (n - 1, Some(m.as_str()), None),
            Segment::Call(args) => match n.checked_sub(2).map(|i| &target.segments[i]) {
                Some(Segment::Member(m)) => (n - 2, Some(m.as_str()), Some(args)),
                _ => (n - 1, None, Some(args)),
            },
        };
        let prefix = Chain { head: target.head.clone(), segments: target.segments[..prefix_len].to_vec() };
        let (head, consumed) = self.head_target(&prefix, false)?;
        let folded = self.fold_segments(head, &prefix.segments[consumed.min(prefix.segments.len())..])?;
        let target_value = self.finish_value(folded)?;
        let member = member.map(string_literal).unwrap_or_else(|| "null".to_string());
        let mut parts = vec![value.to_string(), "this".into(), target_value, member];
        if let Some(args) = args {
            parts.push(self.argument_list(args)?);
        }
        Ok(format!("{}.SET({});", s, parts.join(", ")))
    }
}

/// Byref parameters of the enclosing routine that a region would have to capture,
/// as (source name, access path) in order of first use. A parameter is captured when
/// it is handed to a non-built-in callee by reference, or used at all inside a
/// deferred (guarded) unit.
pub(crate) struct ByRefScan<'s> {
    scope: &'s ScopeContext,
    deferred: bool,
    found: Vec<(String, String)>,
}

impl<'s> ByRefScan<'s> {
    pub fn new(scope: &'s ScopeContext, deferred: bool) -> Self {
        Self { scope, deferred, found: Vec::new() }
    }

    pub fn finish(self) -> Vec<(String, String)> {
        self.found
    }

    fn note(&mut self, name: &str) {
        if let Resolution::Variable { access, byref_parameter: true } = self.scope.resolve(name) {
            let lower = name.to_lowercase();
            if !self.found.iter().any(|(n, _)| *n == lower) {
                self.found.push((lower, access));
            }
        }
    }

    pub fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Chain(chain) => self.chain(chain, None),
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            Expr::Concat(parts) => parts.iter().for_each(|p| self.expr(p)),
            Expr::Bracketed(inner) => self.expr(inner),
            _ => {}
        }
    }

    pub fn chain(&mut self, chain: &Chain, trailing: Option<&[Expr]>) {
        let builtin_head = match &chain.head {
            ChainHead::Name { name, .. } => is_builtin_name(self.scope, name),
            ChainHead::Me | ChainHead::With { .. } => false,
        };
        if self.deferred {
            if let ChainHead::Name { name, .. } = &chain.head {
                self.note(name);
            }
        }
        let mut first_call = true;
        for segment in &chain.segments {
            if let Segment::Call(args) = segment {
                self.arguments(args, builtin_head && first_call);
                first_call = false;
            }
        }
        if let Some(args) = trailing {
            self.arguments(args, builtin_head && first_call);
        }
    }

    pub fn statement_call(&mut self, call: &StatementCall) {
        self.chain(&call.target, call.arguments.as_deref());
    }

    fn arguments(&mut self, args: &[Expr], by_value: bool) {
        for arg in args {
            if !by_value {
                if let Some(name) = arg.as_chain().and_then(Chain::simple_name) {
                    self.note(name);
                }
            }
            self.expr(arg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslatorConfig;
    use crate::core::code_generator::scope::{Frame, FrameKind};
    use crate::core::expression::{parse_expression, parse_statement_call};
    use crate::core::lexer::Lexer;
    use crate::core::number_rebuilder::rebuild;
    use crate::core::token::Token;

    fn toks(src: &str) -> Vec<Token> {
        rebuild(&Lexer::new(src).tokenize().unwrap())
    }

    fn outer_scope() -> ScopeContext {
        let mut frame = Frame::new(FrameKind::Outer);
        frame.declare_external("wscript");
        ScopeContext::outermost(frame, "_env", "_outer")
    }

    fn routine_scope() -> ScopeContext {
        let mut frame = Frame::new(FrameKind::Routine);
        frame.declare_parameter("x", true);
        frame.declare_parameter("y", false);
        outer_scope().extend(frame)
    }

    fn value(src: &str) -> String {
        let config = TranslatorConfig::default();
        let generator = CodeGenerator::new(&config);
        let scope = outer_scope();
        let mut t = ExpressionTranslator::new(&generator, &scope);
        t.wrapped_value(&parse_expression(&toks(src)).unwrap(), false).unwrap()
    }

    #[test]
    fn zero_argument_brackets_are_forced_only_when_written() {
        assert_eq!(value("b"), "_.VAL(_env.b)");
        assert_eq!(value("b()"), "_.VAL(_.CALL(this, _env.b, _.ARGS.ForceBrackets()))");
        assert_eq!(value("b.Name(1)"), "_.VAL(_.CALL(this, _env.b, \"Name\", _.ARGS.Val((Int16)1)))");
    }

    #[test]
    fn operators_and_literals_are_not_wrapped() {
        assert_eq!(value("1 + 2"), "_.ADD((Int16)1, (Int16)2)");
        assert_eq!(value("Not True"), "_.NOT(true)");
        assert_eq!(value("-x"), "_.NEG(_env.x)");
        assert_eq!(value("UCase(\"a\")"), "_.UCASE(\"a\")");
        assert_eq!(value("vbCrLf"), "VBScriptConstants.vbCrLf");
        assert_eq!(value("Null"), "DBNull.Value");
    }

    #[test]
    fn called_constant_raises() {
        assert_eq!(
            value("vbObjectError()"),
            "_.RAISEERROR(new TypeMismatchException(\"'vbObjectError' is called like a function\"))"
        );
    }

    #[test]
    fn statement_arguments_by_bracketing() {
        let config = TranslatorConfig::default();
        let generator = CodeGenerator::new(&config);
        let scope = outer_scope();
        let mut t = ExpressionTranslator::new(&generator, &scope);
        let call = parse_statement_call(&toks("func (x), y"), false).unwrap();
        assert_eq!(
            t.statement_call(&call).unwrap(),
            "_.CALL(this, _env.func, _.ARGS.Val(_env.x).Ref(_env.y, v1 => { _env.y = v1; }))"
        );
        let names: Vec<String> = t.finish().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["func", "x", "y"]);
    }

    #[test]
    fn byref_scan_ignores_direct_builtin_arguments() {
        let scope = routine_scope();
        let direct = parse_expression(&toks("TypeName(x)")).unwrap();
        let mut scan = ByRefScan::new(&scope, false);
        scan.expr(&direct);
        assert!(scan.finish().is_empty());

        let nested = parse_expression(&toks("TypeName(F2(x, y))")).unwrap();
        let mut scan = ByRefScan::new(&scope, false);
        scan.expr(&nested);
        assert_eq!(scan.finish(), vec![("x".to_string(), "x".to_string())]);
    }

    #[test]
    fn byref_scan_captures_everything_when_deferred() {
        let scope = routine_scope();
        let expr = parse_expression(&toks("x + y")).unwrap();
        let mut scan = ByRefScan::new(&scope, true);
        scan.expr(&expr);
        assert_eq!(scan.finish(), vec![("x".to_string(), "x".to_string())]);
    }
}
