//! Whole-pipeline properties: determinism, scope round-trips, storage
//! annotation as seen through the public API.

use csc_drv::{compile, CompileOptions};
use csc_sem::ScopeNode;

fn full_options() -> CompileOptions {
    CompileOptions {
        return_ast_dot: true,
        generate_tac: true,
        annotate_memory: true,
    }
}

const PROGRAM: &str = r#"
class Point {
  var x: integer;
  var y: integer;
  function constructor(x0: integer, y0: integer) { this.x = x0; this.y = y0; }
  function sum(): integer { return this.x + this.y; }
}

function scale(v: integer, k: integer): integer {
  var r: integer = v * k;
  return r;
}

var p: Point = new Point(2, 3);
var total: integer = scale(p.sum(), 10);
print(total);

var values: integer[] = [1, 2, 3];
var acc: integer = 0;
foreach (v in values) {
  acc = acc + v;
}
print(acc);
"#;

#[test]
fn determinism_across_runs() {
    let first = compile(PROGRAM, &full_options());
    let second = compile(PROGRAM, &full_options());
    assert!(first.ok, "{:?}", first.diagnostics);

    let first_tac = first.tac.as_ref().unwrap();
    let second_tac = second.tac.as_ref().unwrap();
    assert_eq!(first_tac.code, second_tac.code);
    assert_eq!(first_tac.temporaries_used, second_tac.temporaries_used);

    let first_scopes = serde_json::to_string(&first.scopes).unwrap();
    let second_scopes = serde_json::to_string(&second.scopes).unwrap();
    assert_eq!(first_scopes, second_scopes);

    assert_eq!(first.ast_dot, second.ast_dot);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn scopes_json_round_trips() {
    let report = compile(PROGRAM, &full_options());
    let scopes = report.scopes.expect("scope tree");
    let json = serde_json::to_string(&scopes).unwrap();
    let parsed: ScopeNode = serde_json::from_str(&json).unwrap();
    assert_eq!(scopes, parsed);
}

#[test]
fn annotated_addresses_follow_the_storage_model() {
    let report = compile(PROGRAM, &full_options());
    let scopes = report.scopes.expect("scope tree");

    // Globals in declaration order.
    assert_eq!(scopes.symbols["p"].address, "global[0]");
    assert_eq!(scopes.symbols["total"].address, "global[4]");
    assert_eq!(scopes.symbols["values"].address, "global[8]");

    // Class fields on the heap, methods' `this` as param 0.
    let point = scopes
        .children
        .iter()
        .find(|c| c.kind == "CLASS" && c.name == "Point")
        .unwrap();
    assert_eq!(point.symbols["x"].address, "heap+0");
    assert_eq!(point.symbols["y"].address, "heap+4");
    let sum = point
        .children
        .iter()
        .find(|c| c.name == "Point_sum")
        .unwrap();
    assert_eq!(sum.symbols["this"].address, "param[0]");

    // Function params and locals.
    let scale = scopes
        .children
        .iter()
        .find(|c| c.kind == "FUNCTION" && c.name == "scale")
        .unwrap();
    assert_eq!(scale.symbols["v"].address, "param[0]");
    assert_eq!(scale.symbols["k"].address, "param[1]");
    assert_eq!(scale.symbols["r"].address, "stack[-4]");
}

#[test]
fn unannotated_compile_reports_none_addresses() {
    let options = CompileOptions {
        annotate_memory: false,
        generate_tac: false,
        return_ast_dot: false,
    };
    let report = compile("var x: integer = 1;", &options);
    let scopes = report.scopes.expect("scope tree");
    assert_eq!(scopes.symbols["x"].address, "none");
}

#[test]
fn generated_functions_match_declarations() {
    let report = compile(PROGRAM, &full_options());
    let tac = report.tac.unwrap();
    // main, scale, Point_constructor, Point_sum.
    assert_eq!(tac.functions_registered, 4);
    let text = tac.code.join("\n");
    assert!(text.contains("@function main()"));
    assert!(text.contains("@function scale(v, k)"));
    assert!(text.contains("@function Point_constructor(this, x0, y0)"));
    assert!(text.contains("@function Point_sum(this)"));
}

#[test]
fn warnings_survive_into_a_passing_report() {
    let report = compile(
        "function f(): integer { return 1; print(2); }",
        &full_options(),
    );
    assert!(report.ok);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].code, Some(csc_util::ErrorCode::DeadCode));
    // TAC still generated despite the warning.
    assert!(report.tac.is_some());
}
