mod common;

use pretty_assertions::assert_eq;

use rox::ast::ExprId;
use rox::parser::Parser;
use rox::resolver::{self, Resolution};

fn resolve(source: &str) -> Resolution {
    let tokens = common::tokens(source);
    let statements = Parser::new(&tokens).parse().expect("program should parse");

    resolver::resolve(&statements)
}

fn sorted_locals(resolution: &Resolution) -> Vec<(ExprId, usize)> {
    let mut locals: Vec<(ExprId, usize)> = resolution
        .locals
        .iter()
        .map(|(id, distance)| (*id, *distance))
        .collect();
    locals.sort();
    locals
}

#[test]
fn block_local_one_frame_out() {
    let resolution = resolve("{ var a = 1; { print a; } }");

    assert!(resolution.is_ok(), "{:?}", resolution.diagnostics);
    assert_eq!(sorted_locals(&resolution), vec![(ExprId(0), 1)]);
}

#[test]
fn globals_are_not_recorded() {
    let resolution = resolve("var g = 1; print g; g = 2;");

    assert!(resolution.is_ok());
    assert!(resolution.locals.is_empty());
}

#[test]
fn closure_captures_enclosing_function_frame() {
    let resolution = resolve(
        "fun outer() { var x = 1; fun inner() { return x; } return inner; }",
    );

    assert!(resolution.is_ok(), "{:?}", resolution.diagnostics);
    // `x` inside `inner` is one frame out; `inner` is in the current frame.
    assert_eq!(sorted_locals(&resolution), vec![(ExprId(0), 1), (ExprId(1), 0)]);
}

#[test]
fn this_and_super_distances_inside_methods() {
    let resolution = resolve(
        "class A { m() {} }\nclass B < A { m() { super.m(); return this; } }",
    );

    assert!(resolution.is_ok(), "{:?}", resolution.diagnostics);

    // ids: A (mixin) 0, super 1, this 2
    // method frame → `this` frame → `super` frame
    assert_eq!(sorted_locals(&resolution), vec![(ExprId(1), 2), (ExprId(2), 1)]);
}

#[test]
fn block_local_mixin_resolves_in_enclosing_frame() {
    let resolution = resolve(
        "{\n  class A { m() {} }\n  class B < A { m() { super.m(); } }\n}",
    );

    assert!(resolution.is_ok(), "{:?}", resolution.diagnostics);

    // ids: A (mixin) 0, super 1
    // the mixin is read from the block itself; `super` sits two frames
    // outside the method body (method → `this` → `super`)
    assert_eq!(sorted_locals(&resolution), vec![(ExprId(0), 0), (ExprId(1), 2)]);
}

#[test]
fn block_local_class_inheriting_from_itself() {
    assert_eq!(
        common::diagnostics("{ class A < A {} }"),
        vec!["[line 1] Error: A class cannot inherit from itself."]
    );
}

#[test]
fn reading_in_own_initializer() {
    assert_eq!(
        common::diagnostics("{ var x = x; }"),
        vec!["[line 1] Error: Cannot read local variable in its own initializer."]
    );
}

#[test]
fn global_self_reference_is_allowed_statically() {
    let resolution = resolve("var x = x;");

    assert!(resolution.is_ok());
}

#[test]
fn redeclaration_in_same_scope() {
    assert_eq!(
        common::diagnostics("{ var a = 1; var a = 2; print a; }"),
        vec!["[line 1] Error: Variable with this name already declared in this scope."]
    );
}

#[test]
fn unused_locals_in_source_order() {
    assert_eq!(
        common::diagnostics("{\n  var b = 1;\n  var a = 2;\n}"),
        vec![
            "[line 2] Error: Unused variable 'b'.",
            "[line 3] Error: Unused variable 'a'.",
        ]
    );
}

#[test]
fn unused_parameter() {
    assert_eq!(
        common::diagnostics("fun f(x) {}"),
        vec!["[line 1] Error: Unused variable 'x'."]
    );
}

#[test]
fn local_class_does_not_need_to_be_read() {
    let resolution = resolve("{ class A {} }");

    assert!(resolution.is_ok(), "{:?}", resolution.diagnostics);
}

#[test]
fn function_read_before_definition_completes() {
    let resolution = resolve("{ var f = fun () { return f; }; f(); }");

    assert!(resolution.is_ok(), "{:?}", resolution.diagnostics);
}

#[test]
fn return_outside_function() {
    assert_eq!(
        common::diagnostics("return 1;"),
        vec!["[line 1] Error: Cannot return from top-level code."]
    );
}

#[test]
fn return_inside_lambda_is_allowed() {
    let resolution = resolve("var f = fun () { return 1; };");

    assert!(resolution.is_ok(), "{:?}", resolution.diagnostics);
}

#[test]
fn value_returned_from_initializer() {
    assert_eq!(
        common::diagnostics("class A { init() { return 1; } }"),
        vec!["[line 1] Error: Cannot return a value from an initializer."]
    );
}

#[test]
fn this_outside_class() {
    assert_eq!(
        common::diagnostics("print this;"),
        vec!["[line 1] Error: Cannot use 'this' outside of a class."]
    );
}

#[test]
fn super_without_superclass() {
    assert_eq!(
        common::diagnostics("class A { m() { super.m(); } }\nsuper.m();"),
        vec![
            "[line 1] Error: Cannot use 'super' in a class with no superclass.",
            "[line 2] Error: Cannot use 'super' outside of a class.",
        ]
    );
}

#[test]
fn class_inheriting_from_itself() {
    assert_eq!(
        common::diagnostics("class A < A {}"),
        vec!["[line 1] Error: A class cannot inherit from itself."]
    );
}

#[test]
fn this_and_super_in_static_method() {
    assert_eq!(
        common::diagnostics(
            "class A {}\nclass B < A {\n  class make() { return this; }\n  class other() { return super.make; }\n}"
        ),
        vec![
            "[line 3] Error: Cannot use 'this' in a static method.",
            "[line 4] Error: Cannot use 'super' in a static method.",
        ]
    );
}

#[test]
fn break_and_continue_outside_loops() {
    assert_eq!(
        common::diagnostics("break;\ncontinue;"),
        vec![
            "[line 1] Error: Cannot use 'break' outside of a loop.",
            "[line 2] Error: Cannot use 'continue' outside of a loop.",
        ]
    );
}

#[test]
fn continue_inside_for_loop() {
    assert_eq!(
        common::diagnostics("for (var i = 0; i < 3; i = i + 1) { continue; }"),
        vec!["[line 1] Error: Cannot use 'continue' inside for loop."]
    );
}

#[test]
fn loop_does_not_extend_into_function_bodies() {
    assert_eq!(
        common::diagnostics("while (true) {\n  fun f() { break; }\n  f();\n}"),
        vec!["[line 2] Error: Cannot use 'break' outside of a loop."]
    );
}

#[test]
fn all_diagnostics_are_reported() {
    assert_eq!(
        common::diagnostics("return 1;\nprint this;\n{ var unused; }"),
        vec![
            "[line 1] Error: Cannot return from top-level code.",
            "[line 2] Error: Cannot use 'this' outside of a class.",
            "[line 3] Error: Unused variable 'unused'.",
        ]
    );
}
