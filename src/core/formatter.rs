//! Renders translated statements as C# source text.
//!
//! Design notes:
//! - Indentation is `indent_width` spaces per depth; blank statements stay empty.
//! - Without scaffolding the output is the bare statement list, routines and classes
//!   in source order.
//! - With scaffolding, outermost statements run inside `Runner.Go`, routines and
//!   outermost variables live on the outer references class, and host or undeclared
//!   names become properties of the environment references class.

use std::fmt::Write as _;

use crate::config::TranslatorConfig;
use crate::core::code_generator::{PartKind, TranslatedProgram, TranslatedStatement};

const COMPAT_INTERFACE: &str = "IProvideVBScriptCompatFunctionalityToIndividualRequests";

const USINGS: &[&str] = &[
    "using System;",
    "using System.Collections;",
    "using System.Runtime.InteropServices;",
    "using CSharpSupport;",
    "using CSharpSupport.Attributes;",
    "using CSharpSupport.Exceptions;",
];

struct Writer<'c> {
    out: String,
    indent: usize,
    config: &'c TranslatorConfig,
}

impl<'c> Writer<'c> {
    fn new(config: &'c TranslatorConfig) -> Self {
        Self { out: String::new(), indent: config.indent_width, config }
    }

    fn line(&mut self, depth: usize, content: &str) {
        if content.is_empty() {
            self.out.push('\n');
        } else {
            let _ = writeln!(self.out, "{}{}", " ".repeat(depth * self.indent), content);
        }
    }

    fn statements<'a>(&mut self, base: usize, statements: impl Iterator<Item = &'a TranslatedStatement>) {
        for s in statements {
            self.line(base + s.indentation_depth, &s.content);
        }
    }

    fn null_check(&mut self, depth: usize, argument: &str) {
        self.line(depth, &format!("if ({} == null)", argument));
        self.line(depth + 1, &format!("throw new ArgumentNullException(\"{}\");", argument));
    }

    fn finish(mut self) -> String {
        while self.out.ends_with("\n\n") {
            self.out.pop();
        }
        self.out
    }
}

pub fn render(program: &TranslatedProgram, config: &TranslatorConfig) -> String {
    if config.scaffold {
        render_scaffolded(program, config)
    } else {
        let mut w = Writer::new(config);
        w.statements(0, program.statements());
        w.finish()
    }
}

fn render_scaffolded(program: &TranslatedProgram, config: &TranslatorConfig) -> String {
    let mut w = Writer::new(config);
    let (s, env, outer) = (&config.support_ref, &config.env_ref, &config.outer_ref);
    let (env_class, outer_class) = (&config.env_class_name, &config.outer_class_name);
    let part_statements = |kind: PartKind| {
        program.parts.iter().filter(move |p| p.kind == kind).flat_map(|p| p.statements.iter())
    };

    for using in USINGS {
        w.line(0, using);
    }
    w.line(0, "");
    w.line(0, "namespace TranslatedProgram");
    w.line(0, "{");
    w.line(1, "public class Runner");
    w.line(1, "{");
    w.line(2, &format!("private readonly {} {};", COMPAT_INTERFACE, s));
    w.line(2, &format!("public Runner({} compatLayer)", COMPAT_INTERFACE));
    w.line(2, "{");
    w.null_check(3, "compatLayer");
    w.line(3, &format!("{} = compatLayer;", s));
    w.line(2, "}");
    w.line(0, "");
    w.line(2, "public void Go()");
    w.line(2, "{");
    w.line(3, &format!("Go(new {}());", env_class));
    w.line(2, "}");
    w.line(2, &format!("public void Go({} env)", env_class));
    w.line(2, "{");
    w.null_check(3, "env");
    w.line(0, "");
    w.line(3, &format!("var {} = env;", env));
    w.line(3, &format!("var {} = new {}({}, {});", outer, outer_class, s, env));
    w.line(0, "");
    w.statements(3, part_statements(PartKind::Statement));
    w.line(2, "}");
    w.line(0, "");

    w.line(2, &format!("public class {}", outer_class));
    w.line(2, "{");
    w.line(3, &format!("private readonly {} {};", COMPAT_INTERFACE, s));
    w.line(3, &format!("private readonly {} {};", outer_class, outer));
    w.line(3, &format!("private readonly {} {};", env_class, env));
    w.line(3, &format!("public {}({} compatLayer, {} env)", outer_class, COMPAT_INTERFACE, env_class));
    w.line(3, "{");
    w.null_check(4, "compatLayer");
    w.null_check(4, "env");
    w.line(4, &format!("{} = compatLayer;", s));
    w.line(4, &format!("{} = env;", env));
    w.line(4, &format!("{} = this;", outer));
    for name in &program.global_names {
        w.line(4, &format!("{} = null;", name));
    }
    w.line(3, "}");
    for name in &program.global_names {
        w.line(3, &format!("public object {} {{ get; set; }}", name));
    }
    w.line(0, "");
    w.statements(3, part_statements(PartKind::Routine));
    w.line(2, "}");
    w.line(0, "");

    w.line(2, &format!("public sealed class {}", env_class));
    w.line(2, "{");
    for name in &program.environment_names {
        w.line(3, &format!("public object {} {{ get; set; }}", name));
    }
    w.line(2, "}");
    w.line(0, "");

    w.statements(2, part_statements(PartKind::Class));
    w.line(1, "}");
    w.line(0, "}");
    w.finish()
}
