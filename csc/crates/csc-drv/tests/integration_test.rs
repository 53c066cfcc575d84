//! End-to-end scenarios from the language's acceptance set, driven
//! through the public `compile` API.

use csc_drv::{compile, CompileOptions, Report};

fn full_options() -> CompileOptions {
    CompileOptions {
        return_ast_dot: true,
        generate_tac: true,
        annotate_memory: true,
    }
}

fn run(source: &str) -> Report {
    compile(source, &full_options())
}

fn tac_text(report: &Report) -> String {
    report
        .tac
        .as_ref()
        .expect("TAC section expected")
        .code
        .join("\n")
}

// ----------------------------------------------------------------------
// S1: simple arithmetic with print
// ----------------------------------------------------------------------

#[test]
fn s1_simple_arithmetic_with_print() {
    let report = run("var x: integer = 10;\nvar y: integer = x + 5;\nprint(y);");
    assert!(report.ok, "{:?}", report.diagnostics);
    assert!(report.diagnostics.is_empty());

    let tac = tac_text(&report);
    assert!(tac.contains("t0 = x + 5"));
    assert!(tac.contains("y = t0"));
    assert!(tac.contains("param y"));
    assert!(tac.contains("call print, 1"));
}

// ----------------------------------------------------------------------
// S2: short-circuit
// ----------------------------------------------------------------------

#[test]
fn s2_short_circuit() {
    let report = run(
        "var a: boolean = true; var b: boolean = false;\n\
         if (a && b) { print(\"no\"); } else { print(\"yes\"); }",
    );
    assert!(report.ok);

    let tac = tac_text(&report);
    // `ifFalse a` jumps straight to the else label; `b` is only evaluated
    // after `a` was true.
    let if_false_a = tac.find("ifFalse a goto Lelse").expect("test on a");
    let if_false_b = tac.find("ifFalse b goto Lelse").expect("test on b");
    assert!(if_false_a < if_false_b);
}

// ----------------------------------------------------------------------
// S3: inheritance + method call
// ----------------------------------------------------------------------

#[test]
fn s3_inheritance_and_method_call() {
    let report = run(
        r#"
        class Animal { var name: string;
          function constructor(n: string) { this.name = n; }
          function speak(): string { return this.name; } }
        class Dog : Animal {
          function speak(): string { return this.name + " barks"; } }
        var d: Dog = new Dog("Rex");
        print(d.speak());
        "#,
    );
    assert!(report.ok, "{:?}", report.diagnostics);
    assert!(report.diagnostics.is_empty());

    let tac = tac_text(&report);
    assert!(tac.contains("new Dog, 1"));
    assert!(tac.contains("param d"));
    assert!(tac.contains("call Dog_speak, 1"));
}

// ----------------------------------------------------------------------
// S4: built-in clash
// ----------------------------------------------------------------------

#[test]
fn s4_builtin_clash() {
    let source = "function print(m: string): void { }";
    let report = run(source);
    assert!(!report.ok);
    assert_eq!(report.diagnostics.len(), 1);

    let diag = &report.diagnostics[0];
    assert_eq!(diag.code, Some(csc_util::ErrorCode::BuiltinClash));
    // The span highlights the `print` identifier.
    assert_eq!(diag.span.snippet(source), "print");
}

// ----------------------------------------------------------------------
// S5: break outside loop
// ----------------------------------------------------------------------

#[test]
fn s5_break_outside_loop() {
    let source = "function f(): void { break; }";
    let report = run(source);
    assert!(!report.ok);
    assert_eq!(report.diagnostics.len(), 1);

    let diag = &report.diagnostics[0];
    assert_eq!(diag.code, Some(csc_util::ErrorCode::InvalidJump));
    assert_eq!(diag.span.snippet(source), "break");
}

// ----------------------------------------------------------------------
// S6: heterogeneous array
// ----------------------------------------------------------------------

#[test]
fn s6_heterogeneous_array() {
    let source = "var m = [1, \"hi\", true];";
    let report = run(source);
    assert!(!report.ok);

    let mismatch: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.code == Some(csc_util::ErrorCode::TypeMismatch))
        .collect();
    assert!(!mismatch.is_empty());
    // The first mismatch points at the literal.
    assert!(diag_snippet(source, mismatch[0]).starts_with('['));
}

fn diag_snippet<'a>(source: &'a str, diag: &csc_util::Diagnostic) -> &'a str {
    diag.span.snippet(source)
}

// ----------------------------------------------------------------------
// Diagnostic location accuracy
// ----------------------------------------------------------------------

#[test]
fn diagnostic_spans_are_substrings_of_the_offense() {
    let cases = [
        ("print(missing);", "missing"),
        ("var x: integer = 1; var x: float = 2.0;", "x"),
        ("const c: integer = 1; c = 2;", "c"),
        ("continue;", "continue"),
    ];
    for (source, expected) in cases {
        let report = run(source);
        assert!(!report.ok, "expected failure for {:?}", source);
        let diag = report.diagnostics.first().unwrap();
        let snippet = diag.span.snippet(source);
        assert!(
            !snippet.is_empty() && snippet.contains(expected),
            "bad span {:?} for {:?}",
            snippet,
            source
        );
    }
}

// ----------------------------------------------------------------------
// Report shape
// ----------------------------------------------------------------------

#[test]
fn report_serializes_with_wire_shapes() {
    let report = run("var x: integer = 1; print(undefined_name);");
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ok"], false);
    let diag = &json["diagnostics"][0];
    assert_eq!(diag["kind"], "semantic");
    assert!(diag["line"].is_u64());
    assert!(diag["column"].is_u64());
    assert!(diag["length"].is_u64());
    // No TAC section on a failed compile.
    assert!(json.get("tac").is_none());
}

#[test]
fn tac_report_counts_are_consistent() {
    let report = run("function f(a: integer): integer { return a + 1; } print(f(41));");
    assert!(report.ok);
    let tac = report.tac.unwrap();
    assert_eq!(tac.functions_registered, 2); // main + f
    assert!(tac.instruction_count > 0);
    assert!(tac.validation_errors.is_empty());
    // Code listing holds at least one line per counted instruction.
    assert!(tac.code.len() > tac.instruction_count);
}

#[test]
fn lex_errors_reported_with_lex_kind() {
    let report = run("var § = 1;");
    assert!(!report.ok);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.phase == csc_util::Phase::Lex));
}

#[test]
fn multiple_errors_are_all_reported() {
    let report = run(
        "var a: integer = \"s\"; var b: boolean = 3; print(nope); break;",
    );
    assert!(!report.ok);
    assert!(report.diagnostics.len() >= 4);
}
