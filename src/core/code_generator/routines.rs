//! Functions, subs, properties and classes.

use crate::core::ast::{
    contains_resume_next, CodeBlock, ConstantDeclaration, DeclarationScope, NameToken, RoutineBlock, RoutineKind,
    VariableDeclaration,
};
use crate::core::code_generator::names::{rewrite_name, string_literal};
use crate::core::code_generator::scope::{Frame, ScopeContext};
use crate::core::code_generator::{CodeGenerator, TranslationResult};
use crate::core::error::TranslateError;

const COMPAT_INTERFACE: &str = "IProvideVBScriptCompatFunctionalityToIndividualRequests";

fn is_empty_body(body: &[CodeBlock]) -> bool {
    body.iter()
        .all(|b| matches!(b, CodeBlock::BlankLine | CodeBlock::Comment { .. } | CodeBlock::InlineComment { .. }))
}

/// A local the routine declares up front, wherever the declaration sits in its body.
enum Hoisted<'a> {
    Variable(&'a VariableDeclaration),
    Constant(&'a ConstantDeclaration),
}

impl Hoisted<'_> {
    fn name(&self) -> &str {
        match self {
            Hoisted::Variable(v) => &v.name.name,
            Hoisted::Constant(c) => &c.name.name,
        }
    }
}

/// `Dim`, `ReDim` and `Const` declarations of a routine body in source order; the first
/// declaration of a name wins.
fn hoisted_declarations<'a>(blocks: &'a [CodeBlock], out: &mut Vec<Hoisted<'a>>) {
    fn push<'a>(out: &mut Vec<Hoisted<'a>>, item: Hoisted<'a>) {
        if !out.iter().any(|d| d.name().eq_ignore_ascii_case(item.name())) {
            out.push(item);
        }
    }
    for block in blocks {
        match block {
            CodeBlock::Dim { variables, .. } | CodeBlock::ReDim { variables, .. } => {
                for v in variables {
                    push(out, Hoisted::Variable(v));
                }
            }
            CodeBlock::Const { values, .. } => {
                for c in values {
                    push(out, Hoisted::Constant(c));
                }
            }
            other => {
                for child in other.child_sequences() {
                    hoisted_declarations(child, out);
                }
            }
        }
    }
}

fn method_name(routine: &RoutineBlock) -> String {
    match routine.kind {
        RoutineKind::PropertyLet => format!("let_{}", routine.name.name.to_lowercase()),
        RoutineKind::PropertySet => format!("set_{}", routine.name.name.to_lowercase()),
        _ => rewrite_name(&routine.name.name),
    }
}

fn visibility(public: bool) -> &'static str {
    if public {
        "public"
    } else {
        "private"
    }
}

impl<'c> CodeGenerator<'c> {
    pub(crate) fn translate_routine(
        &self,
        routine: &RoutineBlock,
        scope: &ScopeContext,
        depth: usize,
    ) -> Result<TranslationResult, TranslateError> {
        let s = self.support();
        let mut out = TranslationResult::default();

        if routine.is_default {
            out.add("[CSharpSupport.Attributes.IsDefault]", depth);
        }
        if routine.kind.is_property() && routine.is_public && routine.is_indexed_property() {
            out.add(
                format!("[CSharpSupport.Attributes.TranslatedProperty({})]", string_literal(&routine.name.name)),
                depth,
            );
        }
        let parameters: Vec<String> = routine
            .parameters
            .iter()
            .map(|p| {
                let name = rewrite_name(&p.name.name);
                if p.by_ref {
                    format!("ref object {}", name)
                } else {
                    format!("object {}", name)
                }
            })
            .collect();
        let return_type = if routine.kind.has_return_value() { "object" } else { "void" };
        out.add(
            format!(
                "{} {} {}({})",
                visibility(routine.is_public),
                return_type,
                method_name(routine),
                parameters.join(", ")
            ),
            depth,
        );
        out.add("{", depth);
        let inner = depth + 1;

        let base = scope.without_error_token();
        let mut frame = Frame::for_routine(routine);

        if is_empty_body(&routine.body) {
            let (comments, _) = self.translate_sequence(&routine.body, &base.extend(frame), inner, false)?;
            out.merge(comments);
            if routine.kind.has_return_value() {
                out.add("return null;", inner);
            }
            out.add("}", depth);
            return Ok(out);
        }

        let result_variable = if routine.kind.has_return_value() {
            let variable = self.temps.next("retVal", &base.extend(frame.clone()));
            frame.set_result(&routine.name.name, &variable);
            Some(variable)
        } else {
            None
        };
        let mut routine_scope = base.extend(frame);
        if let Some(variable) = &result_variable {
            out.add(format!("object {} = null;", variable), inner);
        }
        let token = if contains_resume_next(&routine.body) {
            let token = self.temps.next("errOn", &routine_scope);
            out.add(format!("var {} = {}.GETERRORTRAPPINGTOKEN();", token, s), inner);
            routine_scope = routine_scope.with_error_token(&token);
            Some(token)
        } else {
            None
        };

        let mut declarations = Vec::new();
        hoisted_declarations(&routine.body, &mut declarations);
        let mut hoisted: Vec<String> = Vec::new();
        for declaration in &declarations {
            let (init, undeclared) = match declaration {
                Hoisted::Variable(v) => self.dim_initialiser(v, &routine_scope)?,
                Hoisted::Constant(c) => self.constant_value(c, &routine_scope)?,
            };
            let name = rewrite_name(declaration.name());
            out.add(format!("object {} = {};", name, init), inner);
            out.note_undeclared(undeclared);
            hoisted.push(name);
        }

        let (mut body, _) = self.translate_sequence(&routine.body, &routine_scope, inner, false)?;
        // Names nothing declared become locals, declared once each after the Dims.
        let mut pending = std::mem::take(&mut out.undeclared);
        pending.append(&mut body.undeclared);
        for name in pending {
            let local = rewrite_name(&name.name);
            if !hoisted.contains(&local) {
                out.add(format!("object {} = null; /* Undeclared in source */", local), inner);
                hoisted.push(local);
            }
        }
        out.statements.append(&mut body.statements);
        out.diagnostics.append(&mut body.diagnostics);

        if let Some(token) = &token {
            out.statements.push(self.release_token(token, inner));
        }
        if let Some(variable) = &result_variable {
            out.add(format!("return {};", variable), inner);
        }
        out.add("}", depth);
        Ok(out)
    }

    pub(crate) fn translate_class(
        &self,
        name: &NameToken,
        members: &[CodeBlock],
        scope: &ScopeContext,
        depth: usize,
    ) -> Result<TranslationResult, TranslateError> {
        let config = self.config;
        let class_name = rewrite_name(&name.name);
        let class_scope = scope.without_error_token().extend(Frame::for_class(members));
        let inner = depth + 1;
        let mut out = TranslationResult::default();

        out.add("[ComVisible(true)]", depth);
        out.add(format!("[SourceClassName({})]", string_literal(&name.name)), depth);
        out.add(format!("public sealed class {}", class_name), depth);
        out.add("{", depth);
        out.add(format!("private readonly {} {};", COMPAT_INTERFACE, config.support_ref), inner);
        out.add(format!("private readonly {} {};", config.env_class_name, config.env_ref), inner);
        out.add(format!("private readonly {} {};", config.outer_class_name, config.outer_ref), inner);
        out.add(
            format!(
                "public {}({} compatLayer, {} env, {} outer)",
                class_name, COMPAT_INTERFACE, config.env_class_name, config.outer_class_name
            ),
            inner,
        );
        out.add("{", inner);
        for argument in ["compatLayer", "env", "outer"] {
            out.add(format!("if ({} == null)", argument), inner + 1);
            out.add(format!("throw new ArgumentNullException({});", string_literal(argument)), inner + 2);
        }
        out.add(format!("{} = compatLayer;", config.support_ref), inner + 1);
        out.add(format!("{} = env;", config.env_ref), inner + 1);
        out.add(format!("{} = outer;", config.outer_ref), inner + 1);
        // Array fields need the support layer, so they are sized once it is set.
        for member in members {
            if let CodeBlock::Dim { variables, .. } = member {
                for v in variables.iter().filter(|v| v.dimensions.is_some()) {
                    let (init, undeclared) = self.dim_initialiser(v, &class_scope)?;
                    out.add(format!("{} = {};", rewrite_name(&v.name.name), init), inner + 1);
                    out.note_undeclared(undeclared);
                }
            }
        }
        out.add("}", inner);
        out.add("", inner);

        for member in members {
            match member {
                CodeBlock::Dim { scope: declared, variables } => {
                    let access = visibility(*declared != DeclarationScope::Private);
                    for v in variables {
                        out.add(format!("{} object {} {{ get; set; }}", access, rewrite_name(&v.name.name)), inner);
                    }
                }
                CodeBlock::Const { scope: declared, values } => {
                    let access = visibility(*declared != DeclarationScope::Private);
                    for c in values {
                        let (value, undeclared) = self.constant_value(c, &class_scope)?;
                        out.add(
                            format!(
                                "{} object {} {{ get {{ return {}; }} }}",
                                access,
                                rewrite_name(&c.name.name),
                                value
                            ),
                            inner,
                        );
                        out.note_undeclared(undeclared);
                    }
                }
                CodeBlock::Routine(r) => {
                    let routine = self.translate_routine(r, &class_scope, inner)?;
                    out.merge(routine);
                }
                CodeBlock::InlineComment { content, .. } => {
                    if !out.append_inline_comment(content) {
                        out.add(format!("//{}", content), inner);
                    }
                }
                CodeBlock::Comment { content, .. } => out.add(format!("//{}", content), inner),
                CodeBlock::BlankLine => out.add("", inner),
                _ => {
                    return Err(TranslateError::invariant(format!(
                        "unexpected member in class \"{}\"",
                        name.name
                    )))
                }
            }
        }
        out.add("}", depth);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::code_generator::tests::{lines, translate};

    #[test]
    fn locals_are_hoisted_and_undeclared_names_declared_once() {
        let out = lines("Function Test1(x)\nDim i\ni = x\nj = 1\nj = 2\nTest1 = i\nEnd Function");
        assert_eq!(
            out,
            vec![
                "public object test1(ref object x)",
                "{",
                "object retVal1 = null;",
                "object i = null;",
                "object j = null; /* Undeclared in source */",
                "i = _.VAL(x);",
                "j = (Int16)1;",
                "j = (Int16)2;",
                "retVal1 = _.VAL(i);",
                "return retVal1;",
                "}",
            ]
        );
    }

    #[test]
    fn every_undeclared_use_is_reported() {
        let program = translate("Function Test1()\nj = 1\nj = 2\nEnd Function");
        let reported: Vec<usize> = program.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(reported, vec![2, 3]);
        assert!(program.environment_names.iter().all(|n| n != "j"));
    }

    #[test]
    fn empty_function_returns_null() {
        assert_eq!(lines("Function F()\nEnd Function"), vec!["public object f()", "{", "return null;", "}"]);
        assert_eq!(lines("Private Sub S()\nEnd Sub"), vec!["private void s()", "{", "}"]);
    }

    #[test]
    fn byref_argument_is_aliased_around_the_call() {
        let out = lines("Function F1(x)\nF2 x\nEnd Function\nFunction F2(y)\nEnd Function");
        assert_eq!(
            &out[..9],
            &[
                "public object f1(ref object x)",
                "{",
                "object retVal1 = null;",
                "object byrefalias2 = x;",
                "try",
                "{",
                "_.CALL(this, _outer, \"F2\", _.ARGS.Ref(byrefalias2, v3 => { byrefalias2 = v3; }));",
                "}",
                "finally { x = byrefalias2; }",
            ]
        );
    }

    #[test]
    fn byval_parameter_needs_no_alias() {
        let out = lines("Function F1(ByVal x)\nF2 x\nEnd Function\nFunction F2(y)\nEnd Function");
        assert!(!out.iter().any(|l| l.contains("byrefalias")));
        assert!(out.contains(&"public object f1(object x)".to_string()));
    }

    #[test]
    fn trapping_routine_guards_statements_and_releases_its_token() {
        let out = lines("Function F1(x)\nOn Error Resume Next\nx = 1\nEnd Function");
        assert_eq!(
            out,
            vec![
                "public object f1(ref object x)",
                "{",
                "object retVal1 = null;",
                "var errOn2 = _.GETERRORTRAPPINGTOKEN();",
                "_.STARTERRORTRAPPINGANDCLEARANYERROR(errOn2);",
                "object byrefalias3 = x;",
                "try",
                "{",
                "_.HANDLEERROR(errOn2, () => {",
                "byrefalias3 = (Int16)1;",
                "});",
                "}",
                "finally { x = byrefalias3; }",
                "_.RELEASEERRORTRAPPINGTOKEN(errOn2);",
                "return retVal1;",
                "}",
            ]
        );
    }

    #[test]
    fn exit_releases_the_token_before_returning() {
        let out = lines("Sub S()\nOn Error Resume Next\nExit Sub\nEnd Sub");
        let release = out.iter().filter(|l| l.starts_with("_.RELEASEERRORTRAPPINGTOKEN")).count();
        assert_eq!(release, 2);
        let exit = out.iter().position(|l| l == "return;").unwrap();
        assert_eq!(out[exit - 1], "_.RELEASEERRORTRAPPINGTOKEN(errOn1);");
    }

    #[test]
    fn sibling_routine_without_directive_has_no_trapping() {
        let out = lines("Sub A()\nOn Error Resume Next\nEnd Sub\nSub B()\nx = 1\nEnd Sub");
        let b = out.iter().position(|l| l == "public void b()").unwrap();
        assert!(!out[b..].iter().any(|l| l.contains("ERROR")));
    }

    #[test]
    fn class_members_translate_in_place() {
        let out = lines(
            "Class C1\nPublic Name\nPrivate mValue\nFunction GetSomething()\nGetSomething = Name\nEnd Function\nEnd Class",
        );
        assert_eq!(out[0], "[ComVisible(true)]");
        assert_eq!(out[1], "[SourceClassName(\"C1\")]");
        assert_eq!(out[2], "public sealed class c1");
        assert!(out.contains(&"public object name { get; set; }".to_string()));
        assert!(out.contains(&"private object mvalue { get; set; }".to_string()));
        assert!(out.contains(&"retVal1 = _.VAL(name);".to_string()));
        assert_eq!(out.last().map(String::as_str), Some("}"));
    }

    #[test]
    fn own_name_with_arguments_is_a_recursive_call_inside_a_class() {
        let out = lines("Class C1\nFunction F(a)\nF = F(1)\nEnd Function\nEnd Class");
        assert!(out.contains(&"retVal1 = _.VAL(_.CALL(this, this, \"F\", _.ARGS.Val((Int16)1)));".to_string()));
    }

    #[test]
    fn properties_get_prefixed_method_names() {
        let out = lines(
            "Class C1\nPublic Default Property Get Item(i)\nItem = i\nEnd Property\nPublic Property Let Name(v)\nEnd Property\nEnd Class",
        );
        assert!(out.contains(&"[CSharpSupport.Attributes.IsDefault]".to_string()));
        assert!(out.contains(&"[CSharpSupport.Attributes.TranslatedProperty(\"Item\")]".to_string()));
        assert!(out.contains(&"public object item(ref object i)".to_string()));
        assert!(out.contains(&"public void let_name(ref object v)".to_string()));
    }

    #[test]
    fn constant_inside_a_block_is_declared_for_the_whole_routine() {
        let out = lines("Sub S()\nIf a Then\nConst C = 1\nEnd If\nWScript.Echo C\nEnd Sub");
        assert_eq!(
            out,
            vec![
                "public void s()",
                "{",
                "object c = (Int16)1;",
                "object a = null; /* Undeclared in source */",
                "if (_.IF(a))",
                "{",
                "}",
                "_.CALL(this, _env.wscript, \"Echo\", _.ARGS.Ref(c, v1 => { c = v1; }));",
                "}",
            ]
        );
    }

    #[test]
    fn constant_read_before_its_declaration_line() {
        let out = lines("Function F()\nF = C\nConst C = 2\nEnd Function");
        let declared = out.iter().position(|l| l == "object c = (Int16)2;").unwrap();
        let read = out.iter().position(|l| l == "retVal1 = _.VAL(c);").unwrap();
        assert!(declared < read);
        assert_eq!(out.iter().filter(|l| l.contains("(Int16)2")).count(), 1);
    }

    #[test]
    fn new_instances_receive_the_references() {
        let out = lines("Class C1\nEnd Class\nSet x = New C1");
        assert!(out.contains(&"_env.x = new c1(_, _env, _outer);".to_string()));
    }
}
