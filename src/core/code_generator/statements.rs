//! Single-statement translation: calls, assignments, declarations and directives.

use crate::core::ast::{CodeBlock, ConstantDeclaration, ExitKind, Expression, NameToken, VariableDeclaration};
use crate::core::code_generator::expressions::{ByRefScan, ExpressionTranslator};
use crate::core::code_generator::names::rewrite_name;
use crate::core::code_generator::scope::ScopeContext;
use crate::core::code_generator::{CodeGenerator, TranslationResult};
use crate::core::error::TranslateError;
use crate::core::expression::{parse_expression, parse_statement_call, parse_target, Chain, Expr};

impl<'c> CodeGenerator<'c> {
    /// Translates one executable unit: byref aliasing outside, error guard inside.
    ///
    /// `scan` reports the expressions the unit evaluates so captured byref parameters
    /// can be found before any output is produced; `emit` then writes the lines.
    pub(crate) fn translate_unit<S, E>(
        &self,
        scope: &ScopeContext,
        depth: usize,
        live: bool,
        scan: S,
        emit: E,
    ) -> Result<TranslationResult, TranslateError>
    where
        S: FnOnce(&mut ByRefScan<'_>),
        E: FnOnce(&mut ExpressionTranslator<'_, 'c>) -> Result<Vec<String>, TranslateError>,
    {
        let token = self.live_token(scope, live);
        let mut scanner = ByRefScan::new(scope, token.is_some());
        scan(&mut scanner);
        let aliases = self.allocate_aliases(&scanner.finish(), scope);
        let inner_scope = self.aliased_scope(scope, &aliases);

        let mut undeclared = Vec::new();
        let mut out = self.wrap_aliases(&aliases, depth, |d| {
            self.guard(token, d, |d| {
                let mut translator = ExpressionTranslator::new(self, &inner_scope);
                let lines = emit(&mut translator)?;
                undeclared = translator.finish();
                let mut result = TranslationResult::default();
                for line in lines {
                    result.add(line, d);
                }
                Ok(result)
            })
        })?;
        out.note_undeclared(undeclared);
        Ok(out)
    }

    /// Non-compound blocks. Returns the result and whether trapping is live afterwards.
    pub(crate) fn translate_statement_block(
        &self,
        block: &CodeBlock,
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<(TranslationResult, bool), TranslateError> {
        let s = self.support();
        let mut out = TranslationResult::default();
        match block {
            CodeBlock::BlankLine => out.add("", depth),
            CodeBlock::OptionExplicit => {}
            CodeBlock::Comment { content, .. } | CodeBlock::InlineComment { content, .. } => {
                out.add(format!("//{}", content), depth)
            }
            CodeBlock::OnErrorResumeNext { .. } => {
                if let Some(token) = scope.error_token() {
                    out.add(format!("{}.STARTERRORTRAPPINGANDCLEARANYERROR({});", s, token), depth);
                    return Ok((out, true));
                }
            }
            CodeBlock::OnErrorGoto0 { .. } => {
                if let Some(token) = scope.error_token() {
                    out.add(format!("{}.STOPERRORTRAPPINGANDCLEARANYERROR({});", s, token), depth);
                }
                return Ok((out, false));
            }
            CodeBlock::Statement { expression, call_keyword } => {
                let call = parse_statement_call(&expression.tokens, *call_keyword)?;
                out = self.translate_unit(
                    scope,
                    depth,
                    live,
                    |scan| scan.statement_call(&call),
                    |t| Ok(vec![format!("{};", t.statement_call(&call)?)]),
                )?;
            }
            CodeBlock::ValueSetting { target, value, is_set } => {
                let line = target.line();
                let target = parse_target(&target.tokens)?;
                let value = parse_expression(&value.tokens)?;
                out = self.translate_unit(
                    scope,
                    depth,
                    live,
                    |scan| {
                        scan.expr(&value);
                        scan.chain(&target, None);
                    },
                    |t| {
                        let value = t.wrapped_value(&value, *is_set)?;
                        Ok(vec![t.assignment(&target, &value, line)?])
                    },
                )?;
            }
            CodeBlock::Dim { variables, .. } => {
                // Routine locals are hoisted and class fields become properties; only
                // outermost arrays need a statement where they are declared.
                if !scope.in_routine() && !scope.in_class() {
                    for v in variables.iter().filter(|v| v.dimensions.is_some()) {
                        let (init, undeclared) = self.dim_initialiser(v, scope)?;
                        let access = format!("{}.{}", self.config.outer_ref, rewrite_name(&v.name.name));
                        out.add(format!("{} = {};", access, init), depth);
                        out.note_undeclared(undeclared);
                    }
                }
            }
            CodeBlock::Const { values, .. } => {
                // routine constants are declared with the hoisted locals
                if !scope.in_routine() {
                    for c in values {
                        let (value, undeclared) = self.constant_value(c, scope)?;
                        let name = rewrite_name(&c.name.name);
                        out.add(format!("{}.{} = {};", self.config.outer_ref, name, value), depth);
                        out.note_undeclared(undeclared);
                    }
                }
            }
            CodeBlock::ReDim { preserve, variables } => {
                let dims = variables
                    .iter()
                    .map(|v| parse_dimensions(v).map(|d| (v, d)))
                    .collect::<Result<Vec<_>, _>>()?;
                out = self.translate_unit(
                    scope,
                    depth,
                    live,
                    |scan| {
                        for (v, d) in &dims {
                            scan.chain(&Chain::simple(&v.name.name, v.name.line), None);
                            d.iter().for_each(|e| scan.expr(e));
                        }
                    },
                    |t| {
                        let mut lines = Vec::new();
                        for (v, d) in &dims {
                            let target = Chain::simple(&v.name.name, v.name.line);
                            let bounds = d.iter().map(|e| t.value(e)).collect::<Result<Vec<_>, _>>()?;
                            let bounds = format!("new object[] {{ {} }}", bounds.join(", "));
                            let value = if *preserve {
                                let current = t.value(&Expr::Chain(target.clone()))?;
                                format!("{}.RESIZEARRAY({}, {})", s, current, bounds)
                            } else {
                                format!("{}.NEWARRAY({})", s, bounds)
                            };
                            lines.push(t.assignment(&target, &value, v.name.line)?);
                        }
                        Ok(lines)
                    },
                )?;
            }
            CodeBlock::Exit { kind, .. } => match kind {
                ExitKind::Do | ExitKind::For => out.add("break;", depth),
                ExitKind::Function | ExitKind::Sub | ExitKind::Property => {
                    if scope.in_routine() {
                        if let Some(token) = scope.error_token() {
                            out.statements.push(self.release_token(token, depth));
                        }
                    }
                    match scope.result_variable() {
                        Some(result) => out.add(format!("return {};", result), depth),
                        None => out.add("return;", depth),
                    }
                }
            },
            CodeBlock::Randomize { seed, .. } => {
                let seed = seed.as_ref().map(|e| parse_expression(&e.tokens)).transpose()?;
                out = self.translate_unit(
                    scope,
                    depth,
                    live,
                    |scan| seed.iter().for_each(|e| scan.expr(e)),
                    |t| {
                        let seed = seed.as_ref().map(|e| t.value(e)).transpose()?.unwrap_or_default();
                        Ok(vec![format!("{}.RANDOMIZE({});", s, seed)])
                    },
                )?;
            }
            _ => return Err(TranslateError::invariant("compound block passed to statement translation")),
        }
        Ok((out, live))
    }

    /// Initial value of a declared variable: `null`, `new object[0]` for `a()`, or a
    /// `NEWARRAY` call for explicit bounds.
    pub(crate) fn dim_initialiser(
        &self,
        variable: &VariableDeclaration,
        scope: &ScopeContext,
    ) -> Result<(String, Vec<NameToken>), TranslateError> {
        let dimensions = parse_dimensions(variable)?;
        match &variable.dimensions {
            None => Ok(("null".to_string(), Vec::new())),
            Some(d) if d.is_empty() => Ok(("new object[0]".to_string(), Vec::new())),
            Some(_) => {
                let mut t = ExpressionTranslator::new(self, scope);
                let bounds = dimensions.iter().map(|e| t.value(e)).collect::<Result<Vec<_>, _>>()?;
                let init = format!("{}.NEWARRAY(new object[] {{ {} }})", self.support(), bounds.join(", "));
                Ok((init, t.finish()))
            }
        }
    }

    pub(crate) fn constant_value(
        &self,
        constant: &ConstantDeclaration,
        scope: &ScopeContext,
    ) -> Result<(String, Vec<NameToken>), TranslateError> {
        let expr = parse_expression(&constant.value.tokens)?;
        let mut t = ExpressionTranslator::new(self, scope);
        let value = t.value(&expr)?;
        Ok((value, t.finish()))
    }
}

fn parse_dimensions(variable: &VariableDeclaration) -> Result<Vec<Expr>, TranslateError> {
    variable
        .dimensions
        .iter()
        .flatten()
        .map(|e: &Expression| parse_expression(&e.tokens))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::core::code_generator::tests::lines;

    #[test]
    fn assignments_wrap_references_only() {
        assert_eq!(lines("a = b"), vec!["_env.a = _.VAL(_env.b);"]);
        assert_eq!(lines("a = 1 + 2"), vec!["_env.a = _.ADD((Int16)1, (Int16)2);"]);
        assert_eq!(lines("Set a = b"), vec!["_env.a = _.OBJ(_env.b);"]);
    }

    #[test]
    fn member_and_indexed_assignments_use_set() {
        assert_eq!(
            lines("a.Name.Length = 1"),
            vec!["_.SET((Int16)1, this, _.CALL(this, _env.a, \"Name\"), \"Length\");"]
        );
        assert_eq!(lines("a(1) = 2"), vec!["_.SET((Int16)2, this, _env.a, null, _.ARGS.Val((Int16)1));"]);
        assert_eq!(lines("a.b(1) = 2"), vec!["_.SET((Int16)2, this, _env.a, \"b\", _.ARGS.Val((Int16)1));"]);
    }

    #[test]
    fn outer_arrays_are_initialised_in_place() {
        assert_eq!(lines("Dim a(10)"), vec!["_outer.a = _.NEWARRAY(new object[] { (Int16)10 });"]);
        assert_eq!(lines("Dim a()"), vec!["_outer.a = new object[0];"]);
        assert!(lines("Dim a").is_empty());
    }

    #[test]
    fn redim_and_randomize() {
        assert_eq!(
            lines("Dim a()\nReDim a(5)"),
            vec!["_outer.a = new object[0];", "_outer.a = _.NEWARRAY(new object[] { (Int16)5 });"]
        );
        assert_eq!(
            lines("Dim a()\nReDim Preserve a(5)"),
            vec!["_outer.a = new object[0];", "_outer.a = _.RESIZEARRAY(_outer.a, new object[] { (Int16)5 });"]
        );
        assert_eq!(lines("Randomize"), vec!["_.RANDOMIZE();"]);
        assert_eq!(lines("Randomize 3"), vec!["_.RANDOMIZE((Int16)3);"]);
    }

    #[test]
    fn argument_passing_follows_bracketing() {
        assert_eq!(lines("Dim x\nfunc x"), vec!["_.CALL(this, _env.func, _.ARGS.Ref(_outer.x, v1 => { _outer.x = v1; }));"]);
        assert_eq!(lines("Dim x\nfunc (x)"), vec!["_.CALL(this, _env.func, _.ARGS.Val(_outer.x));"]);
        assert_eq!(
            lines("Dim x\nCall func(x)"),
            vec!["_.CALL(this, _env.func, _.ARGS.Ref(_outer.x, v1 => { _outer.x = v1; }));"]
        );
    }

    #[test]
    fn builtins_take_values_directly() {
        assert_eq!(lines("Dim x\nMsgBox x"), vec!["_.MSGBOX(_outer.x);"]);
        assert_eq!(lines("x = Now"), vec!["_env.x = _.NOW();"]);
    }

    #[test]
    fn goto_zero_without_token_emits_nothing() {
        assert!(lines("On Error Goto 0").is_empty());
    }
}
