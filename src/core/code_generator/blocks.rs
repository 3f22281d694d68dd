//! Compound blocks: conditionals, case dispatch and loops.

use crate::core::ast::{contains_resume_next, CaseSegment, CodeBlock, ConditionalClause, Expression, NameToken};
use crate::core::code_generator::expressions::{ByRefScan, ExpressionTranslator};
use crate::core::code_generator::names::numeric_literal;
use crate::core::code_generator::scope::ScopeContext;
use crate::core::code_generator::trapping::ByRefAlias;
use crate::core::code_generator::{CodeGenerator, TranslationResult};
use crate::core::error::TranslateError;
use crate::core::expression::{parse_expression, Expr};

fn split_leading_comment(body: &[CodeBlock]) -> (Option<&str>, &[CodeBlock]) {
    match body.first() {
        Some(CodeBlock::InlineComment { content, .. }) => (Some(content), &body[1..]),
        _ => (None, body),
    }
}

fn parse_all(expressions: &[Expression]) -> Result<Vec<Expr>, TranslateError> {
    expressions.iter().map(|e| parse_expression(&e.tokens)).collect()
}

impl<'c> CodeGenerator<'c> {
    /// Returns the translation and whether trapping is live after the block.
    pub(crate) fn translate_block(
        &self,
        block: &CodeBlock,
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<(TranslationResult, bool), TranslateError> {
        let result = match block {
            CodeBlock::If { clauses, else_body } => {
                self.translate_if(clauses, else_body.as_deref(), scope, depth, live)?
            }
            CodeBlock::Select { expression, opening_comments, segments } => {
                self.translate_select(expression, opening_comments, segments, scope, depth, live)?
            }
            CodeBlock::Do { condition, is_pre_condition, is_until, body, .. } => self.translate_do(
                condition.as_ref(),
                *is_pre_condition,
                *is_until,
                body,
                scope,
                depth,
                live,
            )?,
            CodeBlock::For { variable, start, end, step, body } => {
                self.translate_for(variable, start, end, step.as_ref(), body, scope, depth, live)?
            }
            CodeBlock::ForEach { variable, collection, body } => {
                self.translate_for_each(variable, collection, body, scope, depth, live)?
            }
            CodeBlock::With { target, body, .. } => self.translate_with(target, body, scope, depth, live)?,
            CodeBlock::Routine(_) | CodeBlock::Class { .. } => {
                return Err(TranslateError::invariant("routine or class inside executable code"))
            }
            other => return self.translate_statement_block(other, scope, depth, live),
        };
        let live_after = live || contains_resume_next(std::slice::from_ref(block));
        Ok((result, live_after))
    }

    /// A run of blocks at one level, with inline comments attached to the line before.
    pub(crate) fn translate_sequence(
        &self,
        blocks: &[CodeBlock],
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<(TranslationResult, bool), TranslateError> {
        let mut out = TranslationResult::default();
        let mut live = live;
        for block in blocks {
            if let CodeBlock::InlineComment { content, .. } = block {
                if !out.append_inline_comment(content) {
                    out.add(format!("//{}", content), depth);
                }
                continue;
            }
            let (result, after) = self.translate_block(block, scope, depth, live)?;
            live = after;
            out.merge(result);
        }
        Ok((out, live))
    }

    /// `{ .. }` after a header line already in `out`; a leading inline comment in the
    /// body goes on the header.
    fn translate_body(
        &self,
        body: &[CodeBlock],
        scope: &ScopeContext,
        depth: usize,
        live: bool,
        out: &mut TranslationResult,
    ) -> Result<(), TranslateError> {
        let (comment, rest) = split_leading_comment(body);
        if let Some(comment) = comment {
            out.append_inline_comment(comment);
        }
        out.add("{", depth);
        let (inner, _) = self.translate_sequence(rest, scope, depth + 1, live)?;
        out.merge(inner);
        out.add("}", depth);
        Ok(())
    }

    fn expression_value(
        &self,
        scope: &ScopeContext,
        expr: &Expr,
        wrapped: bool,
        out: &mut TranslationResult,
    ) -> Result<String, TranslateError> {
        let mut t = ExpressionTranslator::new(self, scope);
        let value = if wrapped { t.wrapped_value(expr, false)? } else { t.value(expr)? };
        out.note_undeclared(t.finish());
        Ok(value)
    }

    /// Aliases for byref parameters used by a block header, plus the scope the whole
    /// block is translated in.
    fn header_aliases(
        &self,
        scope: &ScopeContext,
        deferred: bool,
        headers: &[&Expr],
    ) -> (Vec<ByRefAlias>, ScopeContext) {
        let mut scan = ByRefScan::new(scope, deferred);
        headers.iter().for_each(|e| scan.expr(e));
        let aliases = self.allocate_aliases(&scan.finish(), scope);
        let inner = self.aliased_scope(scope, &aliases);
        (aliases, inner)
    }

    fn translate_if(
        &self,
        clauses: &[ConditionalClause],
        else_body: Option<&[CodeBlock]>,
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<TranslationResult, TranslateError> {
        let token = self.live_token(scope, live);
        let conditions = clauses
            .iter()
            .map(|c| parse_expression(&c.condition.tokens))
            .collect::<Result<Vec<_>, _>>()?;
        let headers: Vec<&Expr> = conditions.iter().collect();
        let (aliases, inner) = self.header_aliases(scope, token.is_some(), &headers);

        self.wrap_aliases(&aliases, depth, |depth| {
            let mut out = TranslationResult::default();
            for (i, (clause, condition)) in clauses.iter().zip(&conditions).enumerate() {
                let value = self.expression_value(&inner, condition, false, &mut out)?;
                let keyword = if i == 0 { "if" } else { "else if" };
                out.add(format!("{} ({})", keyword, self.condition(&value, token)), depth);
                self.translate_body(&clause.body, &inner, depth, live, &mut out)?;
            }
            if let Some(body) = else_body {
                out.add("else", depth);
                self.translate_body(body, &inner, depth, live, &mut out)?;
            }
            Ok(out)
        })
    }

    /// Comparison of the evaluated dispatch target against one case value.
    fn case_comparison(
        &self,
        scope: &ScopeContext,
        case_variable: &str,
        numeric_target: bool,
        value: &Expr,
        position: usize,
        out: &mut TranslationResult,
    ) -> Result<String, TranslateError> {
        let s = self.support();
        let v = self.expression_value(scope, value, false, out)?;
        Ok(if numeric_target {
            if value.is_numeric_literal() {
                format!("{}.EQ({}, {})", s, case_variable, v)
            } else if position > 0 {
                format!("{}.EQish({}, {})", s, case_variable, v)
            } else {
                format!("{}.EQ({}, {}.NUM({}))", s, case_variable, s, v)
            }
        } else if value.is_numeric_literal() {
            format!("{}.EQ({}.NUM({}), {})", s, s, case_variable, v)
        } else {
            format!("{}.EQ({}, {})", s, case_variable, v)
        })
    }

    fn translate_select(
        &self,
        expression: &Expression,
        opening_comments: &[CodeBlock],
        segments: &[CaseSegment],
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<TranslationResult, TranslateError> {
        let token = self.live_token(scope, live);
        let target = parse_expression(&expression.tokens)?;
        let values = segments
            .iter()
            .map(|segment| match segment {
                CaseSegment::Values { values, .. } => parse_all(values).map(Some),
                CaseSegment::Else { .. } => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut headers = vec![&target];
        headers.extend(values.iter().flatten().flatten());
        let (aliases, inner) = self.header_aliases(scope, token.is_some(), &headers);
        let numeric_target = target.is_numeric_literal();
        let s = self.support();

        self.wrap_aliases(&aliases, depth, |depth| {
            let mut out = TranslationResult::default();
            let case_variable = self.temps.next("selectCase", &inner);

            let Some(token) = token else {
                let value = self.expression_value(&inner, &target, true, &mut out)?;
                out.add(format!("object {} = {};", case_variable, value), depth);
                let (comments, _) = self.translate_sequence(opening_comments, &inner, depth, live)?;
                out.merge(comments);
                for (i, (segment, values)) in segments.iter().zip(&values).enumerate() {
                    match values {
                        Some(values) => {
                            let mut tests = Vec::new();
                            for (position, value) in values.iter().enumerate() {
                                let cmp = self.case_comparison(
                                    &inner,
                                    &case_variable,
                                    numeric_target,
                                    value,
                                    position,
                                    &mut out,
                                )?;
                                tests.push(self.condition(&cmp, None));
                            }
                            let test = if tests.len() == 1 {
                                tests.remove(0)
                            } else {
                                tests.iter().map(|t| format!("({})", t)).collect::<Vec<_>>().join(" || ")
                            };
                            let keyword = if i == 0 { "if" } else { "else if" };
                            out.add(format!("{} ({})", keyword, test), depth);
                            self.translate_body(segment.body(), &inner, depth, live, &mut out)?;
                        }
                        None if i == 0 => {
                            let (body, _) = self.translate_sequence(segment.body(), &inner, depth, live)?;
                            out.merge(body);
                        }
                        None => {
                            out.add("else", depth);
                            self.translate_body(segment.body(), &inner, depth, live, &mut out)?;
                        }
                    }
                }
                return Ok(out);
            };

            // Guarded comparisons cannot chain as else-if, so each later case opens a
            // nested else block that is closed at the end.
            let evaluated = self.temps.next("selectCaseEvaluated", &inner);
            out.add(format!("object {} = null;", case_variable), depth);
            out.add(format!("var {} = false;", evaluated), depth);
            let value = self.expression_value(&inner, &target, true, &mut out)?;
            out.add(format!("{}.HANDLEERROR({}, () => {{", s, token), depth);
            out.add(format!("{} = {};", case_variable, value), depth + 1);
            out.add(format!("{} = true;", evaluated), depth + 1);
            out.add("});", depth);
            let (comments, _) = self.translate_sequence(opening_comments, &inner, depth, live)?;
            out.merge(comments);
            if segments.is_empty() {
                return Ok(out);
            }

            out.add(format!("if ({})", evaluated), depth);
            out.add("{", depth);
            let mut level = depth + 1;
            let mut opened = 0;
            for (i, (segment, values)) in segments.iter().zip(&values).enumerate() {
                match values {
                    Some(values) => {
                        if i > 0 {
                            out.add("else", level);
                            out.add("{", level);
                            level += 1;
                            opened += 1;
                        }
                        let mut tests = Vec::new();
                        for (position, value) in values.iter().enumerate() {
                            let cmp =
                                self.case_comparison(&inner, &case_variable, numeric_target, value, position, &mut out)?;
                            tests.push(self.condition(&cmp, Some(token)));
                        }
                        if tests.len() == 1 {
                            out.add(format!("if ({})", tests[0]), level);
                        } else {
                            let last = tests.len() - 1;
                            for (k, test) in tests.iter().enumerate() {
                                let line = match k {
                                    0 => format!("if (({})", test),
                                    k if k == last => format!("|| ({}))", test),
                                    _ => format!("|| ({})", test),
                                };
                                out.add(line, level);
                            }
                        }
                        self.translate_body(segment.body(), &inner, level, live, &mut out)?;
                    }
                    None if i == 0 => {
                        let (body, _) = self.translate_sequence(segment.body(), &inner, level, live)?;
                        out.merge(body);
                    }
                    None => {
                        out.add("else", level);
                        self.translate_body(segment.body(), &inner, level, live, &mut out)?;
                    }
                }
            }
            for _ in 0..opened {
                level -= 1;
                out.add("}", level);
            }
            out.add("}", depth);
            Ok(out)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn translate_do(
        &self,
        condition: Option<&Expression>,
        is_pre_condition: bool,
        is_until: bool,
        body: &[CodeBlock],
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<TranslationResult, TranslateError> {
        let live = live || contains_resume_next(body);
        let token = self.live_token(scope, live);
        let condition = condition.map(|c| parse_expression(&c.tokens)).transpose()?;
        let headers: Vec<&Expr> = condition.iter().collect();
        let (aliases, inner) = self.header_aliases(scope, token.is_some(), &headers);

        self.wrap_aliases(&aliases, depth, |depth| {
            let mut out = TranslationResult::default();
            let test = match &condition {
                Some(c) => {
                    let value = self.expression_value(&inner, c, false, &mut out)?;
                    let test = self.condition(&value, token);
                    if is_until {
                        format!("!{}", test)
                    } else {
                        test
                    }
                }
                None => "true".to_string(),
            };
            if condition.is_none() || is_pre_condition {
                out.add(format!("while ({})", test), depth);
                self.translate_body(body, &inner, depth, live, &mut out)?;
            } else {
                out.add("do", depth);
                self.translate_body(body, &inner, depth, live, &mut out)?;
                out.add(format!("while ({});", test), depth);
            }
            Ok(out)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn translate_for(
        &self,
        variable: &NameToken,
        start: &Expression,
        end: &Expression,
        step: Option<&Expression>,
        body: &[CodeBlock],
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<TranslationResult, TranslateError> {
        let live = live || contains_resume_next(body);
        let token = self.live_token(scope, live);
        let start = parse_expression(&start.tokens)?;
        let end = parse_expression(&end.tokens)?;
        let step = step.map(|e| parse_expression(&e.tokens)).transpose()?;
        let mut headers = vec![&start, &end];
        headers.extend(step.iter());
        let (aliases, inner) = self.header_aliases(scope, token.is_some(), &headers);
        let s = self.support();

        self.wrap_aliases(&aliases, depth, |depth| {
            let mut out = TranslationResult::default();
            let loop_start = self.temps.next("loopStart", &inner);
            let loop_end = self.temps.next("loopEnd", &inner);
            let loop_step = self.temps.next("loopStep", &inner);

            let mut t = ExpressionTranslator::new(self, &inner);
            let v = t.variable_access(&variable.name, variable.line)?;
            let start_value = t.value(&start)?;
            let end_value = t.value(&end)?;
            let step_value = match &step {
                Some(e) => t.value(e)?,
                None => numeric_literal("1"),
            };
            out.note_undeclared(t.finish());

            let constraints = [(&loop_start, start_value), (&loop_end, end_value), (&loop_step, step_value)];
            let header = format!(
                "for ({v} = {a}; {s}.FORCONTINUE({v}, {b}, {c}); {v} = {s}.ADD({v}, {c}))",
                v = v,
                a = loop_start,
                b = loop_end,
                c = loop_step,
                s = s
            );
            let Some(token) = token else {
                for (name, value) in &constraints {
                    out.add(format!("var {} = {}.NUM({});", name, s, value), depth);
                }
                out.add(header, depth);
                self.translate_body(body, &inner, depth, live, &mut out)?;
                return Ok(out);
            };

            let initialised = self.temps.next("loopConstraintsInitialised", &inner);
            out.add(format!("var {} = false;", initialised), depth);
            for (name, _) in &constraints {
                out.add(format!("object {} = null;", name), depth);
            }
            out.add(format!("{}.HANDLEERROR({}, () => {{", s, token), depth);
            for (name, value) in &constraints {
                out.add(format!("{} = {}.NUM({});", name, s, value), depth + 1);
            }
            out.add(format!("{} = true;", initialised), depth + 1);
            out.add("});", depth);
            out.add(format!("if ({})", initialised), depth);
            out.add("{", depth);
            out.add(header, depth + 1);
            self.translate_body(body, &inner, depth + 1, live, &mut out)?;
            out.add("}", depth);
            Ok(out)
        })
    }

    fn translate_for_each(
        &self,
        variable: &NameToken,
        collection: &Expression,
        body: &[CodeBlock],
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<TranslationResult, TranslateError> {
        let live = live || contains_resume_next(body);
        let token = self.live_token(scope, live);
        let collection = parse_expression(&collection.tokens)?;
        let (aliases, inner) = self.header_aliases(scope, token.is_some(), &[&collection]);
        let s = self.support();

        self.wrap_aliases(&aliases, depth, |depth| {
            let mut out = TranslationResult::default();
            let mut t = ExpressionTranslator::new(self, &inner);
            let v = t.variable_access(&variable.name, variable.line)?;
            let content = t.value(&collection)?;
            out.note_undeclared(t.finish());
            let enumerable = format!("{}.ENUMERABLE({})", s, content);

            let (source, loop_depth) = match token {
                None => (enumerable, depth),
                Some(token) => {
                    let contents = self.temps.next("enumerationContent", &inner);
                    let evaluated = self.temps.next("enumerationContentEvaluated", &inner);
                    out.add(format!("IEnumerable {} = null;", contents), depth);
                    out.add(format!("var {} = false;", evaluated), depth);
                    out.add(format!("{}.HANDLEERROR({}, () => {{", s, token), depth);
                    out.add(format!("{} = {};", contents, enumerable), depth + 1);
                    out.add(format!("{} = true;", evaluated), depth + 1);
                    out.add("});", depth);
                    out.add(format!("if ({})", evaluated), depth);
                    out.add("{", depth);
                    (contents, depth + 1)
                }
            };
            let item = self.temps.next("loopItem", &inner);
            out.add(format!("foreach (var {} in {})", item, source), loop_depth);
            let (comment, rest) = split_leading_comment(body);
            if let Some(comment) = comment {
                out.append_inline_comment(comment);
            }
            out.add("{", loop_depth);
            out.add(format!("{} = {};", v, item), loop_depth + 1);
            let (inner_body, _) = self.translate_sequence(rest, &inner, loop_depth + 1, live)?;
            out.merge(inner_body);
            out.add("}", loop_depth);
            if token.is_some() {
                out.add("}", depth);
            }
            Ok(out)
        })
    }

    /// The object is evaluated once into a temporary that leading `.member` accesses in
    /// the body resolve to. The body stays at the same depth.
    fn translate_with(
        &self,
        target: &Expression,
        body: &[CodeBlock],
        scope: &ScopeContext,
        depth: usize,
        live: bool,
    ) -> Result<TranslationResult, TranslateError> {
        let token = self.live_token(scope, live);
        let target = parse_expression(&target.tokens)?;
        let (aliases, inner) = self.header_aliases(scope, token.is_some(), &[&target]);
        let s = self.support();

        self.wrap_aliases(&aliases, depth, |depth| {
            let mut out = TranslationResult::default();
            let variable = self.temps.next("with", &inner);
            let mut t = ExpressionTranslator::new(self, &inner);
            let value = t.wrapped_value(&target, true)?;
            out.note_undeclared(t.finish());
            match token {
                None => out.add(format!("var {} = {};", variable, value), depth),
                Some(token) => {
                    out.add(format!("object {} = null;", variable), depth);
                    out.add(format!("{}.HANDLEERROR({}, () => {{", s, token), depth);
                    out.add(format!("{} = {};", variable, value), depth + 1);
                    out.add("});", depth);
                }
            }
            let (inner_body, _) = self.translate_sequence(body, &inner.with_with_target(&variable), depth, live)?;
            out.merge(inner_body);
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::core::code_generator::tests::lines;

    #[test]
    fn if_chain_is_flat() {
        let out = lines("If a Then\nb\nElseIf c Then\nd\nElse\ne\nEnd If");
        assert_eq!(
            out,
            vec![
                "if (_.IF(_env.a))",
                "{",
                "_.CALL(this, _env.b);",
                "}",
                "else if (_.IF(_env.c))",
                "{",
                "_.CALL(this, _env.d);",
                "}",
                "else",
                "{",
                "_.CALL(this, _env.e);",
                "}",
            ]
        );
    }

    #[test]
    fn numeric_target_compares_first_value_strictly_and_later_values_loosely() {
        let out = lines("Select Case 1\nCase 1, x\na\nCase Else\nb\nEnd Select");
        assert_eq!(
            out,
            vec![
                "object selectCase1 = (Int16)1;",
                "if ((_.IF(_.EQ(selectCase1, (Int16)1))) || (_.IF(_.EQish(selectCase1, _env.x))))",
                "{",
                "_.CALL(this, _env.a);",
                "}",
                "else",
                "{",
                "_.CALL(this, _env.b);",
                "}",
            ]
        );
    }

    #[test]
    fn numeric_case_value_coerces_the_target() {
        let out = lines("Select Case x\nCase 1\na\nEnd Select");
        assert_eq!(out[0], "object selectCase1 = _.VAL(_env.x);");
        assert_eq!(out[1], "if (_.IF(_.EQ(_.NUM(selectCase1), (Int16)1)))");
    }

    #[test]
    fn negative_case_value_is_not_a_numeric_literal() {
        let out = lines("Select Case 1\nCase -1\na\nEnd Select");
        assert_eq!(out[1], "if (_.IF(_.EQ(selectCase1, _.NUM((Int16)(-1)))))");
    }

    #[test]
    fn select_without_cases_still_evaluates_the_target() {
        assert_eq!(lines("Select Case f()\nEnd Select"), vec![
            "object selectCase1 = _.VAL(_.CALL(this, _env.f, _.ARGS.ForceBrackets()));"
        ]);
    }

    #[test]
    fn guarded_select_nests_each_later_case() {
        let out = lines("On Error Resume Next\nSelect Case x\nCase 1\na\nCase 2\nb\nCase Else\nc\nEnd Select");
        let opens = out.iter().filter(|l| l.as_str() == "{").count();
        let closes = out.iter().filter(|l| l.as_str() == "}").count();
        assert_eq!(opens, closes);
        assert!(out.contains(&"var selectCaseEvaluated3 = false;".to_string()));
        assert!(out.contains(&"if (selectCaseEvaluated3)".to_string()));
        assert!(out.contains(&"if (_.IF(() => _.EQ(_.NUM(selectCase2), (Int16)2), errOn1))".to_string()));
        assert!(!out.iter().any(|l| l.starts_with("else if")));
    }

    #[test]
    fn for_loop_evaluates_constraints_once() {
        let out = lines("For i = 1 To 10\nNext");
        assert_eq!(
            out,
            vec![
                "var loopStart1 = _.NUM((Int16)1);",
                "var loopEnd2 = _.NUM((Int16)10);",
                "var loopStep3 = _.NUM((Int16)1);",
                "for (_env.i = loopStart1; _.FORCONTINUE(_env.i, loopEnd2, loopStep3); _env.i = _.ADD(_env.i, loopStep3))",
                "{",
                "}",
            ]
        );
    }

    #[test]
    fn guarded_for_loop_initialises_behind_a_flag() {
        let out = lines("On Error Resume Next\nFor i = 1 To 2\nNext");
        assert_eq!(out[2], "var loopConstraintsInitialised5 = false;");
        assert_eq!(out[6], "_.HANDLEERROR(errOn1, () => {");
        assert!(out.contains(&"if (loopConstraintsInitialised5)".to_string()));
    }

    #[test]
    fn for_each_assigns_the_item() {
        let out = lines("For Each x In c\nNext");
        assert_eq!(
            out,
            vec!["foreach (var loopItem1 in _.ENUMERABLE(_env.c))", "{", "_env.x = loopItem1;", "}"]
        );
    }

    #[test]
    fn do_loop_forms() {
        assert_eq!(lines("Do\nLoop")[0], "while (true)");
        assert_eq!(lines("Do Until a\nLoop")[0], "while (!_.IF(_env.a))");
        let post = lines("Do\nLoop While a");
        assert_eq!(post.first().map(String::as_str), Some("do"));
        assert_eq!(post.last().map(String::as_str), Some("while (_.IF(_env.a));"));
    }

    #[test]
    fn loop_containing_resume_next_guards_its_condition() {
        let out = lines("Do While a\nOn Error Resume Next\nLoop");
        assert_eq!(out[1], "while (_.IF(() => _env.a, errOn1))");
    }

    #[test]
    fn with_members_resolve_to_the_evaluated_object() {
        let out = lines("With a\n.Name = 1\nWith .Child\nx = .Size\nEnd With\nEnd With");
        assert_eq!(
            out,
            vec![
                "var with1 = _.OBJ(_env.a);",
                "_.SET((Int16)1, this, with1, \"Name\");",
                "var with2 = _.OBJ(_.CALL(this, with1, \"Child\"));",
                "_env.x = _.VAL(_.CALL(this, with2, \"Size\"));",
            ]
        );
    }

    #[test]
    fn guarded_with_evaluates_the_object_inside_the_handler() {
        let out = lines("On Error Resume Next\nWith a\n.Draw\nEnd With");
        assert_eq!(out[2], "object with2 = null;");
        assert_eq!(out[3], "_.HANDLEERROR(errOn1, () => {");
        assert_eq!(out[4], "with2 = _.OBJ(_env.a);");
        assert!(out.contains(&"_.CALL(this, with2, \"Draw\");".to_string()));
    }
}
