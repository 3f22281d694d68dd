use vbs2cs::{render, translate, TracingWarnings, TranslatorConfig};

fn flat(src: &str) -> String {
    let config = TranslatorConfig { scaffold: false, ..TranslatorConfig::default() };
    let program = translate(src, &config, &TracingWarnings).expect("translate");
    render(&program, &config)
}

#[test]
fn snapshot_routine_with_hoisted_locals() {
    let out = flat("Function Test1(x)\n  Dim i\n  i = x\n  j = 1\n  Test1 = i\nEnd Function\n");
    insta::assert_snapshot!(out, @r###"
    public object test1(ref object x)
    {
        object retVal1 = null;
        object i = null;
        object j = null; /* Undeclared in source */
        i = _.VAL(x);
        j = (Int16)1;
        retVal1 = _.VAL(i);
        return retVal1;
    }
    "###);
}

#[test]
fn snapshot_trapping_routine() {
    let out = flat("Sub S()\nOn Error Resume Next\nx = 1\nEnd Sub\n");
    insta::assert_snapshot!(out, @r###"
    public void s()
    {
        var errOn1 = _.GETERRORTRAPPINGTOKEN();
        object x = null; /* Undeclared in source */
        _.STARTERRORTRAPPINGANDCLEARANYERROR(errOn1);
        _.HANDLEERROR(errOn1, () => {
            x = (Int16)1;
        });
        _.RELEASEERRORTRAPPINGTOKEN(errOn1);
    }
    "###);
}

#[test]
fn snapshot_for_loop() {
    let out = flat("For i = 1 To 10\nNext\n");
    insta::assert_snapshot!(out, @r###"
    var loopStart1 = _.NUM((Int16)1);
    var loopEnd2 = _.NUM((Int16)10);
    var loopStep3 = _.NUM((Int16)1);
    for (_env.i = loopStart1; _.FORCONTINUE(_env.i, loopEnd2, loopStep3); _env.i = _.ADD(_env.i, loopStep3))
    {
    }
    "###);
}

#[test]
fn scaffold_wraps_outer_statements_in_runner() {
    let config = TranslatorConfig::default();
    let program = translate("Dim a\na = 1\nWScript.Echo a", &config, &TracingWarnings).unwrap();
    let text = render(&program, &config);
    assert!(text.starts_with("using System;\n"));
    assert!(text.contains("    public class Runner\n"));
    assert!(text.contains("            _outer.a = (Int16)1;\n"));
    assert!(text.contains("            public object a { get; set; }\n"));
    assert!(text.contains("            public object wscript { get; set; }\n"));
}
