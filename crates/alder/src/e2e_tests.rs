//! End-to-end scenarios: surface syntax through the whole pipeline,
//! asserting on diagnostic categories and messages.

use alder_ast::FileId;
use alder_diag::Category;

use crate::{analyze_source, analyze_source_with, AnalyzedProgram, ModuleRegistry};

fn analyze(source: &str) -> Result<AnalyzedProgram, alder_diag::DiagnosticError> {
    analyze_source(source, FileId(0))
}

fn binding<'a>(analyzed: &'a AnalyzedProgram, name: &str) -> &'a str {
    analyzed
        .bindings
        .iter()
        .find(|b| b.name == name)
        .unwrap_or_else(|| panic!("binding `{name}` should exist"))
        .ty
        .as_str()
}

#[test]
fn annotated_const_resolves() {
    let analyzed = analyze("module A.B\nconst foo: number = 4").expect("program analyzes");
    assert_eq!(analyzed.namespace, "A.B");
    assert_eq!(binding(&analyzed, "foo"), "number");
}

#[test]
fn annotated_const_with_wrong_value_fails() {
    let err = analyze("module A.B\nconst foo: number = `bar`").unwrap_err();
    assert_eq!(err.category(), Some(Category::TypeMismatch));
    assert!(format!("{err}").contains("expected `number`, got `string`"));
}

#[test]
fn value_redeclaration_fails() {
    let err = analyze("module A.B\nconst foo = `bar`\nconst foo = `baz`").unwrap_err();
    assert_eq!(err.category(), Some(Category::Redeclaration));
    assert!(format!("{err}").contains("Cannot redeclare value symbol `foo`"));
}

#[test]
fn type_redeclaration_fails() {
    let err = analyze("module A.B\ntype Foo = string\ntype Foo = number").unwrap_err();
    assert_eq!(err.category(), Some(Category::Redeclaration));
    assert!(format!("{err}").contains("Cannot redeclare type symbol `Foo`"));
}

#[test]
fn function_types_are_inferred() {
    let analyzed = analyze(
        "module A.B\nconst multi = 4\nconst calc = (factor: number) => factor * multi",
    )
    .expect("program analyzes");
    assert_eq!(binding(&analyzed, "calc"), "(number) -> number");
    assert_eq!(binding(&analyzed, "multi"), "number");
}

#[test]
fn names_do_not_escape_their_function() {
    let err = analyze("module A.B\nconst foo = () => { const bar = 3 }\nconst x = bar")
        .unwrap_err();
    assert_eq!(err.category(), Some(Category::UnknownReference));
    assert!(format!("{err}").contains("Unknown reference `bar`"));
}

#[test]
fn duplicate_variant_members_fail() {
    let err = analyze("module A.B\ntype Foo = :Bar | :Bar").unwrap_err();
    assert_eq!(err.category(), Some(Category::DuplicateEnumMember));
}

#[test]
fn missing_module_declaration_fails() {
    let err = analyze("const foo = 4").unwrap_err();
    assert_eq!(err.category(), Some(Category::MissingModule));
}

#[test]
fn enum_round_trip() {
    let analyzed = analyze(
        "module A.B
         enum Option<T> { Some(T), None, }
         const opt = Option.Some(4)
         const Option.Some(x) = opt
         const doubled = x * 2",
    )
    .expect("program analyzes");
    assert_eq!(binding(&analyzed, "x"), "number");
    assert_eq!(binding(&analyzed, "doubled"), "number");
    assert_eq!(binding(&analyzed, "opt"), "Option.Some(number)");
}

#[test]
fn match_expression_resolves() {
    let analyzed = analyze(
        "module A.B
         enum Option<T> { Some(T), None, }
         const opt = Option.Some(4)
         const got = match opt {
           Option.Some(x) -> x
           Option.None -> 0
         }",
    )
    .expect("program analyzes");
    assert_eq!(binding(&analyzed, "got"), "number");
}

#[test]
fn mismatched_match_arms_fail() {
    let err = analyze(
        "module A.B
         enum Option<T> { Some(T), None, }
         const got = match Option.Some(4) {
           Option.Some(x) -> x
           Option.None -> `zero`
         }",
    )
    .unwrap_err();
    assert_eq!(err.category(), Some(Category::TypeMismatch));
}

#[test]
fn template_spans_are_checked() {
    let analyzed = analyze(
        "module A.B\nconst name = `World`\nconst greeting = `Hello ${name}!`",
    )
    .expect("program analyzes");
    assert_eq!(binding(&analyzed, "greeting"), "string");

    let err = analyze("module A.B\nconst bad = `n = ${4}`").unwrap_err();
    assert_eq!(err.category(), Some(Category::TypeMismatch));
}

#[test]
fn calling_a_non_function_fails() {
    let err = analyze("module A.B\nconst foo: number = 4\nconst bad = foo()").unwrap_err();
    assert_eq!(err.category(), Some(Category::NotCallable));
}

#[test]
fn unknown_enum_member_fails() {
    let err = analyze(
        "module A.B\nenum Status { Ok, Err, }\nconst s = Status.Meh",
    )
    .unwrap_err();
    assert_eq!(err.category(), Some(Category::UnknownEnumMember));
    assert!(format!("{err}").contains("Status.Meh"));
}

#[test]
fn syntax_errors_surface_as_diagnostics() {
    let err = analyze("module A.B\nconst = 4").unwrap_err();
    assert_eq!(err.category(), Some(Category::Syntax));
}

#[test]
fn unify_trace_is_captured_on_demand() {
    let (_, steps) = analyze_source_with("module A.B\nconst foo = 4", FileId(0), true)
        .expect("program analyzes");
    assert!(
        steps.iter().any(|s| s.detail.contains(":= number")),
        "expected a bind step in {steps:?}"
    );

    let (_, silent) = analyze_source_with("module A.B\nconst foo = 4", FileId(0), false)
        .expect("program analyzes");
    assert!(silent.is_empty());
}

#[test]
fn registry_rejects_duplicate_namespaces() {
    let mut registry = ModuleRegistry::new();
    registry
        .register(analyze("module A.B\nconst one = 1").expect("first program analyzes"))
        .expect("first registration succeeds");
    let err = registry
        .register(analyze("module A.B\nconst two = 2").expect("second program analyzes"))
        .unwrap_err();
    assert_eq!(err.category(), Some(Category::Redeclaration));
    assert!(format!("{err}").contains("already registered"));

    assert_eq!(registry.len(), 1);
    assert!(registry.get("A.B").is_some());
}

#[test]
fn registry_keeps_distinct_namespaces() {
    let mut registry = ModuleRegistry::new();
    registry
        .register(analyze("module A.B\nconst one = 1").expect("analyzes"))
        .expect("registers");
    registry
        .register(analyze("module A.C\nconst two = 2").expect("analyzes"))
        .expect("registers");
    let namespaces: Vec<&str> = registry.namespaces().collect();
    assert_eq!(namespaces, vec!["A.B", "A.C"]);
}

#[test]
fn larger_program_round_trips() {
    let analyzed = analyze(
        "module App.Main
         const limit = 10
         const classify = (x: number): string => if x > limit {
           `big`
         } else {
           `small`
         }
         const verdict = classify(50 - 8)",
    )
    .expect("program analyzes");
    assert_eq!(binding(&analyzed, "classify"), "(number) -> string");
    assert_eq!(binding(&analyzed, "verdict"), "string");
}
