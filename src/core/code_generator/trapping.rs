//! Error-trapping guards and byref alias wrapping.

use crate::core::code_generator::scope::{Frame, ScopeContext};
use crate::core::code_generator::{CodeGenerator, TranslatedStatement, TranslationResult};
use crate::core::error::TranslateError;

/// A byref parameter copied into a local for the duration of a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ByRefAlias {
    /// Source name of the parameter
    pub parameter: String,
    /// C# access path of the parameter
    pub access: String,
    pub alias: String,
}

impl<'c> CodeGenerator<'c> {
    /// The trapping token to guard with, when trapping is live here.
    pub(crate) fn live_token<'s>(&self, scope: &'s ScopeContext, live: bool) -> Option<&'s str> {
        if live {
            scope.error_token()
        } else {
            None
        }
    }

    /// Wraps lines produced at `depth + 1` in `HANDLEERROR(token, () => { .. });` when a
    /// token is given; otherwise produces them at `depth` unchanged.
    pub(crate) fn guard<F>(
        &self,
        token: Option<&str>,
        depth: usize,
        inner: F,
    ) -> Result<TranslationResult, TranslateError>
    where
        F: FnOnce(usize) -> Result<TranslationResult, TranslateError>,
    {
        let Some(token) = token else {
            return inner(depth);
        };
        let mut body = inner(depth + 1)?;
        let mut out = TranslationResult::default();
        out.add(format!("{}.HANDLEERROR({}, () => {{", self.support(), token), depth);
        out.statements.append(&mut body.statements);
        out.add("});", depth);
        out.undeclared = body.undeclared;
        out.diagnostics = body.diagnostics;
        Ok(out)
    }

    /// Allocates alias names for the given parameters (in order of first use).
    pub(crate) fn allocate_aliases(&self, parameters: &[(String, String)], scope: &ScopeContext) -> Vec<ByRefAlias> {
        parameters
            .iter()
            .map(|(parameter, access)| ByRefAlias {
                parameter: parameter.clone(),
                access: access.clone(),
                alias: self.temps.next("byrefalias", scope),
            })
            .collect()
    }

    /// Scope in which the aliased parameters resolve to their local copies.
    pub(crate) fn aliased_scope(&self, scope: &ScopeContext, aliases: &[ByRefAlias]) -> ScopeContext {
        if aliases.is_empty() {
            return scope.clone();
        }
        let pairs: Vec<(String, String)> =
            aliases.iter().map(|a| (a.parameter.clone(), a.alias.clone())).collect();
        scope.extend(Frame::for_aliases(&pairs))
    }

    /// ```text
    /// object byrefalias2 = x;
    /// try
    /// {
    ///     ...
    /// }
    /// finally { x = byrefalias2; }
    /// ```
    pub(crate) fn wrap_aliases<F>(
        &self,
        aliases: &[ByRefAlias],
        depth: usize,
        inner: F,
    ) -> Result<TranslationResult, TranslateError>
    where
        F: FnOnce(usize) -> Result<TranslationResult, TranslateError>,
    {
        if aliases.is_empty() {
            return inner(depth);
        }
        let mut body = inner(depth + 1)?;
        let mut out = TranslationResult::default();
        for a in aliases {
            out.add(format!("object {} = {};", a.alias, a.access), depth);
        }
        out.add("try", depth);
        out.add("{", depth);
        out.statements.append(&mut body.statements);
        out.add("}", depth);
        let restore: Vec<String> = aliases.iter().map(|a| format!("{} = {};", a.access, a.alias)).collect();
        out.add(format!("finally {{ {} }}", restore.join(" ")), depth);
        out.undeclared = body.undeclared;
        out.diagnostics = body.diagnostics;
        Ok(out)
    }

    /// `_.IF(cond)`, or `_.IF(() => cond, errOn)` under live trapping.
    pub(crate) fn condition(&self, content: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("{}.IF(() => {}, {})", self.support(), content, token),
            None => format!("{}.IF({})", self.support(), content),
        }
    }

    pub(crate) fn release_token(&self, token: &str, depth: usize) -> TranslatedStatement {
        TranslatedStatement::new(format!("{}.RELEASEERRORTRAPPINGTOKEN({});", self.support(), token), depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslatorConfig;
    use crate::core::code_generator::scope::FrameKind;

    #[test]
    fn guard_without_token_is_transparent() {
        let config = TranslatorConfig::default();
        let generator = CodeGenerator::new(&config);
        let out = generator
            .guard(None, 2, |d| Ok(TranslationResult::from_statements(vec![TranslatedStatement::new("a();", d)])))
            .unwrap();
        assert_eq!(out.statements, vec![TranslatedStatement::new("a();", 2)]);
    }

    #[test]
    fn alias_wrapper_restores_every_parameter() {
        let config = TranslatorConfig::default();
        let generator = CodeGenerator::new(&config);
        let scope = ScopeContext::outermost(Frame::new(FrameKind::Outer), "_env", "_outer");
        let aliases = generator.allocate_aliases(&[("x".into(), "x".into()), ("y".into(), "y".into())], &scope);
        let out = generator
            .wrap_aliases(&aliases, 1, |d| {
                Ok(TranslationResult::from_statements(vec![TranslatedStatement::new("f();", d)]))
            })
            .unwrap();
        let contents: Vec<&str> = out.statements.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "object byrefalias1 = x;",
                "object byrefalias2 = y;",
                "try",
                "{",
                "f();",
                "}",
                "finally { x = byrefalias1; y = byrefalias2; }",
            ]
        );
        assert_eq!(out.statements[4].indentation_depth, 2);
    }
}
