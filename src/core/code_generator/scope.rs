//! Immutable scope chain threaded through translation.
//!
//! A [`ScopeContext`] is a cheap handle on a linked list of frames. Descending into a
//! class, routine or aliased block pushes a new frame and returns a new handle; the
//! parent handle is untouched, so sibling branches can share it freely.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::ast::{CodeBlock, RoutineBlock};
use crate::core::code_generator::names::rewrite_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Outer,
    Class,
    Routine,
    /// Byref parameters temporarily replaced by local copies
    Alias,
}

/// Names declared at one lexical level. Keys are lower-cased source names.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    variables: BTreeMap<String, ()>,
    /// value: whether passed by reference
    parameters: BTreeMap<String, bool>,
    /// value: declared spelling, used as the member name in runtime calls
    routines: BTreeMap<String, String>,
    classes: BTreeMap<String, ()>,
    externals: BTreeMap<String, ()>,
    aliases: BTreeMap<String, String>,
    /// (lower-cased routine name, result variable)
    result: Option<(String, String)>,
}

impl Frame {
    pub fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            variables: BTreeMap::new(),
            parameters: BTreeMap::new(),
            routines: BTreeMap::new(),
            classes: BTreeMap::new(),
            externals: BTreeMap::new(),
            aliases: BTreeMap::new(),
            result: None,
        }
    }

    pub fn declare_variable(&mut self, name: &str) {
        self.variables.insert(name.to_lowercase(), ());
    }

    pub fn declare_parameter(&mut self, name: &str, by_ref: bool) {
        self.parameters.insert(name.to_lowercase(), by_ref);
    }

    pub fn declare_routine(&mut self, name: &str) {
        self.routines.entry(name.to_lowercase()).or_insert_with(|| name.to_string());
    }

    pub fn declare_class(&mut self, name: &str) {
        self.classes.insert(name.to_lowercase(), ());
    }

    pub fn declare_external(&mut self, name: &str) {
        self.externals.insert(name.to_lowercase(), ());
    }

    pub fn set_result(&mut self, routine_name: &str, variable: &str) {
        self.result = Some((routine_name.to_lowercase(), variable.to_string()));
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(&name.to_lowercase())
    }

    /// Variables and constants declared at this level, lower-cased, in name order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Declarations found anywhere in a body (loops and conditionals do not open
    /// a new level); nested routines and classes are skipped.
    pub fn declare_from_body(&mut self, blocks: &[CodeBlock]) {
        for block in blocks {
            match block {
                CodeBlock::Dim { variables, .. } | CodeBlock::ReDim { variables, .. } => {
                    for v in variables {
                        self.declare_variable(&v.name.name);
                    }
                }
                CodeBlock::Const { values, .. } => {
                    for c in values {
                        self.declare_variable(&c.name.name);
                    }
                }
                CodeBlock::Routine(_) | CodeBlock::Class { .. } => {}
                other => {
                    for child in other.child_sequences() {
                        self.declare_from_body(child);
                    }
                }
            }
        }
    }

    /// Frame for the outermost level: variables, routines, classes and host names.
    pub fn outermost(blocks: &[CodeBlock], externals: &[String]) -> Self {
        let mut frame = Frame::new(FrameKind::Outer);
        frame.declare_from_body(blocks);
        for block in blocks {
            match block {
                CodeBlock::Routine(r) => frame.declare_routine(&r.name.name),
                CodeBlock::Class { name, .. } => frame.declare_class(&name.name),
                _ => {}
            }
        }
        for e in externals {
            frame.declare_external(e);
        }
        frame
    }

    pub fn for_class(members: &[CodeBlock]) -> Self {
        let mut frame = Frame::new(FrameKind::Class);
        frame.declare_from_body(members);
        for member in members {
            if let CodeBlock::Routine(r) = member {
                frame.declare_routine(&r.name.name);
            }
        }
        frame
    }

    pub fn for_routine(routine: &RoutineBlock) -> Self {
        let mut frame = Frame::new(FrameKind::Routine);
        for p in &routine.parameters {
            frame.declare_parameter(&p.name.name, p.by_ref);
        }
        frame.declare_from_body(&routine.body);
        frame
    }

    pub fn for_aliases(aliases: &[(String, String)]) -> Self {
        let mut frame = Frame::new(FrameKind::Alias);
        for (parameter, alias) in aliases {
            frame.aliases.insert(parameter.to_lowercase(), alias.clone());
        }
        frame
    }

    fn declares(&self, lower: &str) -> bool {
        self.variables.contains_key(lower)
            || self.parameters.contains_key(lower)
            || self.routines.contains_key(lower)
            || self.classes.contains_key(lower)
            || self.externals.contains_key(lower)
            || self.aliases.values().any(|a| a.to_lowercase() == lower)
            || self.result.as_ref().map(|(_, v)| v.to_lowercase() == lower).unwrap_or(false)
    }
}

/// What a source name refers to from a given point in the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Readable and assignable value: local, parameter, field, outer variable, host name
    Variable { access: String, byref_parameter: bool },
    /// The enclosing routine's own name: its result variable, or a call to it
    Result { variable: String, owner: String, member: String },
    Routine { owner: String, member: String },
    Class { name: String },
    Undeclared,
}

#[derive(Debug)]
struct FrameNode {
    frame: Frame,
    parent: Option<Arc<FrameNode>>,
}

#[derive(Debug, Clone)]
pub struct ScopeContext {
    node: Arc<FrameNode>,
    error_token: Option<Arc<str>>,
    /// Temporary holding the object of the innermost `With` block
    with_target: Option<Arc<str>>,
    env_ref: Arc<str>,
    outer_ref: Arc<str>,
}

impl ScopeContext {
    pub fn outermost(frame: Frame, env_ref: &str, outer_ref: &str) -> Self {
        Self {
            node: Arc::new(FrameNode { frame, parent: None }),
            error_token: None,
            with_target: None,
            env_ref: env_ref.into(),
            outer_ref: outer_ref.into(),
        }
    }

    pub fn extend(&self, frame: Frame) -> Self {
        Self {
            node: Arc::new(FrameNode { frame, parent: Some(Arc::clone(&self.node)) }),
            error_token: self.error_token.clone(),
            with_target: self.with_target.clone(),
            env_ref: Arc::clone(&self.env_ref),
            outer_ref: Arc::clone(&self.outer_ref),
        }
    }

    pub fn with_error_token(&self, token: &str) -> Self {
        Self { error_token: Some(token.into()), ..self.clone() }
    }

    /// Routines and classes start without a trapping token of their own.
    pub fn without_error_token(&self) -> Self {
        Self { error_token: None, ..self.clone() }
    }

    pub fn error_token(&self) -> Option<&str> {
        self.error_token.as_deref()
    }

    pub fn with_with_target(&self, variable: &str) -> Self {
        Self { with_target: Some(variable.into()), ..self.clone() }
    }

    /// What a leading `.member` refers to.
    pub fn with_target(&self) -> Option<&str> {
        self.with_target.as_deref()
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        let mut next = Some(self.node.as_ref());
        std::iter::from_fn(move || {
            let node = next?;
            next = node.parent.as_deref();
            Some(&node.frame)
        })
    }

    pub fn in_routine(&self) -> bool {
        self.frames().any(|f| f.kind == FrameKind::Routine)
    }

    pub fn in_class(&self) -> bool {
        self.frames().any(|f| f.kind == FrameKind::Class)
    }

    /// Result variable of the innermost routine, if it yields a value.
    pub fn result_variable(&self) -> Option<&str> {
        self.frames()
            .find(|f| f.kind == FrameKind::Routine)
            .and_then(|f| f.result.as_ref())
            .map(|(_, v)| v.as_str())
    }

    /// True if `candidate` would collide with a name visible here (after rewriting).
    pub fn is_declared(&self, candidate: &str) -> bool {
        let lower = candidate.to_lowercase();
        self.frames().any(|f| f.declares(&lower))
    }

    pub fn resolve(&self, name: &str) -> Resolution {
        let lower = name.to_lowercase();
        let rewritten = rewrite_name(name);
        // Routines live on the class when there is one, otherwise on the outer references.
        let routine_owner = if self.in_class() { "this".to_string() } else { self.outer_ref.to_string() };
        let mut seen_routine = false;
        for frame in self.frames() {
            match frame.kind {
                FrameKind::Alias => {
                    if let Some(alias) = frame.aliases.get(&lower) {
                        return Resolution::Variable { access: alias.clone(), byref_parameter: false };
                    }
                }
                FrameKind::Routine => {
                    // Only the innermost routine's locals are visible.
                    if seen_routine {
                        continue;
                    }
                    seen_routine = true;
                    if let Some(by_ref) = frame.parameters.get(&lower) {
                        return Resolution::Variable { access: rewritten, byref_parameter: *by_ref };
                    }
                    if frame.variables.contains_key(&lower) {
                        return Resolution::Variable { access: rewritten, byref_parameter: false };
                    }
                    if let Some((routine, variable)) = &frame.result {
                        if *routine == lower {
                            return Resolution::Result {
                                variable: variable.clone(),
                                owner: routine_owner,
                                member: name.to_string(),
                            };
                        }
                    }
                }
                FrameKind::Class => {
                    if frame.variables.contains_key(&lower) {
                        return Resolution::Variable { access: rewritten, byref_parameter: false };
                    }
                    if let Some(member) = frame.routines.get(&lower) {
                        return Resolution::Routine { owner: "this".into(), member: member.clone() };
                    }
                }
                FrameKind::Outer => {
                    if frame.variables.contains_key(&lower) {
                        return Resolution::Variable {
                            access: format!("{}.{}", self.outer_ref, rewritten),
                            byref_parameter: false,
                        };
                    }
                    if let Some(member) = frame.routines.get(&lower) {
                        return Resolution::Routine { owner: self.outer_ref.to_string(), member: member.clone() };
                    }
                    if frame.classes.contains_key(&lower) {
                        return Resolution::Class { name: rewritten };
                    }
                    if frame.externals.contains_key(&lower) {
                        return Resolution::Variable {
                            access: format!("{}.{}", self.env_ref, rewritten),
                            byref_parameter: false,
                        };
                    }
                }
            }
        }
        Resolution::Undeclared
    }

    /// Access path for a name nothing declares: a routine-local hoist inside routines,
    /// an environment reference at the outermost level.
    pub fn undeclared_access(&self, name: &str) -> String {
        if self.in_routine() {
            rewrite_name(name)
        } else {
            format!("{}.{}", self.env_ref, rewrite_name(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outer() -> ScopeContext {
        let mut frame = Frame::new(FrameKind::Outer);
        frame.declare_variable("i");
        frame.declare_routine("Test1");
        frame.declare_external("wscript");
        ScopeContext::outermost(frame, "_env", "_outer")
    }

    #[test]
    fn outer_names_resolve_through_references() {
        let scope = outer();
        assert_eq!(scope.resolve("I"), Resolution::Variable { access: "_outer.i".into(), byref_parameter: false });
        assert_eq!(scope.resolve("test1"), Resolution::Routine { owner: "_outer".into(), member: "Test1".into() });
        assert_eq!(
            scope.resolve("WScript"),
            Resolution::Variable { access: "_env.wscript".into(), byref_parameter: false }
        );
        assert_eq!(scope.resolve("j"), Resolution::Undeclared);
        assert_eq!(scope.undeclared_access("j"), "_env.j");
    }

    #[test]
    fn routine_frame_shadows_outer_and_parent_is_unchanged() {
        let scope = outer();
        let mut frame = Frame::new(FrameKind::Routine);
        frame.declare_parameter("i", true);
        let inner = scope.extend(frame);
        assert_eq!(inner.resolve("i"), Resolution::Variable { access: "i".into(), byref_parameter: true });
        assert_eq!(scope.resolve("i"), Resolution::Variable { access: "_outer.i".into(), byref_parameter: false });
        assert_eq!(inner.undeclared_access("j"), "j");
    }

    #[test]
    fn aliases_replace_byref_parameters() {
        let mut frame = Frame::new(FrameKind::Routine);
        frame.declare_parameter("x", true);
        let routine = outer().extend(frame);
        let aliased = routine.extend(Frame::for_aliases(&[("x".into(), "byrefalias2".into())]));
        assert_eq!(
            aliased.resolve("X"),
            Resolution::Variable { access: "byrefalias2".into(), byref_parameter: false }
        );
        assert!(aliased.is_declared("byrefalias2"));
        assert!(!routine.is_declared("byrefalias2"));
    }

    #[test]
    fn class_routines_are_called_on_this() {
        let mut class = Frame::new(FrameKind::Class);
        class.declare_routine("GetSomething");
        class.declare_variable("mName");
        let scope = outer().extend(class);
        assert_eq!(scope.resolve("getsomething"), Resolution::Routine { owner: "this".into(), member: "GetSomething".into() });
        assert_eq!(scope.resolve("MNAME"), Resolution::Variable { access: "mname".into(), byref_parameter: false });
    }

    #[test]
    fn error_token_is_carried_by_extension() {
        let scope = outer().with_error_token("errOn1");
        let inner = scope.extend(Frame::new(FrameKind::Alias));
        assert_eq!(inner.error_token(), Some("errOn1"));
        assert_eq!(inner.without_error_token().error_token(), None);
    }
}
