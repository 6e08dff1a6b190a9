mod common;

use pretty_assertions::assert_eq;

use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::value::Value;

use common::{output, run, runtime_error};

#[test]
fn arithmetic_and_number_formatting() {
    assert_eq!(
        output("print 1 + 2;\nprint 7 / 2;\nprint 10 - 2 * 3;\nprint 1000000 * 1000000;\nprint -0.25;"),
        "3\n3.5\n4\n1000000000000\n-0.25\n"
    );
}

#[test]
fn string_concatenation_and_comparison() {
    assert_eq!(
        output("print \"foo\" + \"bar\";\nprint \"a\" < \"b\";\nprint \"b\" <= \"a\";\nprint \"abc\" >= \"abc\";"),
        "foobar\ntrue\nfalse\ntrue\n"
    );
}

#[test]
fn equality_never_coerces() {
    assert_eq!(
        output("print 1 == 1;\nprint \"a\" == \"a\";\nprint nil == false;\nprint 1 == \"1\";\nprint nil != nil;"),
        "true\ntrue\nfalse\nfalse\nfalse\n"
    );
}

#[test]
fn only_nil_and_false_are_falsy() {
    assert_eq!(
        output("print !nil;\nprint !false;\nprint !0;\nprint !\"\";"),
        "true\ntrue\nfalse\nfalse\n"
    );
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(
        output("print nil or \"x\";\nprint false and undefined;\nprint 1 and 2;\nprint 1 or undefined;"),
        "x\nfalse\n2\n1\n"
    );
}

#[test]
fn conditional_operator() {
    assert_eq!(
        output("print true ? 1 : 2;\nprint nil ? 1 : 2;\nprint false ? 1 : true ? 3 : 4;"),
        "1\n2\n3\n"
    );
}

#[test]
fn mixed_operand_errors() {
    assert_eq!(
        runtime_error("print 1 < \"a\";"),
        "Operands must be two numbers or two strings.\n[line 1]"
    );
    assert_eq!(
        runtime_error("print \"a\" + 1;"),
        "Operands must be two numbers or two strings.\n[line 1]"
    );
    assert_eq!(
        runtime_error("print \"a\" - 1;"),
        "Operands must be a number\n[line 1]"
    );
    assert_eq!(
        runtime_error("print -\"a\";"),
        "Operand must be a number.\n[line 1]"
    );
}

#[test]
fn error_reports_operator_line() {
    assert_eq!(
        runtime_error("var a = 1;\nprint a +\n  \"x\";"),
        "Operands must be two numbers or two strings.\n[line 2]"
    );
}

#[test]
fn runtime_error_keeps_earlier_output() {
    let outcome = run("print 1;\nprint -\"x\";\nprint 2;");

    assert_eq!(outcome.output, "1\n");
    assert_eq!(
        outcome.error.as_deref(),
        Some("Operand must be a number.\n[line 2]")
    );
}

#[test]
fn uninitialized_and_undefined_variables() {
    assert_eq!(
        runtime_error("var a;\nprint a;"),
        "Uninitialized variable 'a'.\n[line 2]"
    );
    assert_eq!(output("var a;\na = 1;\nprint a;"), "1\n");
    assert_eq!(runtime_error("print b;"), "Undefined variable 'b'.\n[line 1]");
    assert_eq!(runtime_error("b = 1;"), "Undefined variable 'b'.\n[line 1]");
}

#[test]
fn uninitialized_local_can_be_assigned() {
    assert_eq!(output("{\n  var a;\n  a = \"set\";\n  print a;\n}"), "set\n");
}

#[test]
fn block_shadowing() {
    assert_eq!(
        output("var a = 1;\n{ var a = 2; print a; }\nprint a;"),
        "2\n1\n"
    );
}

#[test]
fn closures_resolve_statically() {
    assert_eq!(
        output(
            "var a = \"global\";
{
  fun show() { print a; }
  show();
  var a = \"block\";
  show();
  print a;
}"
        ),
        "global\nglobal\nblock\n"
    );
}

#[test]
fn counter_closure() {
    assert_eq!(
        output(
            "fun makeCounter() {
  var i = 0;
  fun count() { i = i + 1; return i; }
  return count;
}
var c = makeCounter();
print c();
print c();"
        ),
        "1\n2\n"
    );
}

#[test]
fn closures_share_captured_frame() {
    assert_eq!(
        output(
            "var get;
var set;
fun make() {
  var x = 1;
  fun g() { return x; }
  fun s(v) { x = v; }
  get = g;
  set = s;
}
make();
set(5);
print get();"
        ),
        "5\n"
    );
}

#[test]
fn while_with_continue() {
    assert_eq!(
        output(
            "var i = 0;
var n = 0;
while (i < 5) {
  i = i + 1;
  if (i == 2) continue;
  if (i == 4) continue;
  n = n + 1;
}
print n;"
        ),
        "3\n"
    );
}

#[test]
fn for_with_break_and_missing_condition() {
    assert_eq!(
        output("for (var i = 0; ; i = i + 1) {\n  if (i == 3) break;\n  print i;\n}"),
        "0\n1\n2\n"
    );
}

#[test]
fn break_only_leaves_innermost_loop() {
    assert_eq!(
        output(
            "for (var i = 0; i < 2; i = i + 1) {
  while (true) { break; }
  print i;
}"
        ),
        "0\n1\n"
    );
}

#[test]
fn return_from_inside_loop() {
    assert_eq!(
        output(
            "fun find() {
  var i = 0;
  while (true) {
    if (i == 2) return i;
    i = i + 1;
  }
}
print find();"
        ),
        "2\n"
    );
}

#[test]
fn recursion() {
    assert_eq!(
        output(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
print fib(15);"
        ),
        "610\n"
    );
}

#[test]
fn functions_without_return_yield_nil() {
    assert_eq!(output("fun f() {}\nprint f();"), "nil\n");
}

#[test]
fn lambdas_are_values() {
    assert_eq!(
        output(
            "var add = fun (a, b) { return a + b; };
print add(1, 2);
print add;
fun apply(f, x) { return f(x); }
print apply(fun (n) { return n * 2; }, 21);"
        ),
        "3\n<lambda>\n42\n"
    );
}

#[test]
fn callable_display() {
    assert_eq!(
        output("fun f() {}\nprint f;\nprint clock;"),
        "<fn f>\n<native fn clock>\n"
    );
}

#[test]
fn call_errors() {
    assert_eq!(
        runtime_error("fun f(a) { return a; }\nf();"),
        "Expected 1 arguments but got 0.\n[line 2]"
    );
    assert_eq!(
        runtime_error("\"a\"();"),
        "Can only call functions and classes.\n[line 1]"
    );
}

#[test]
fn unbounded_recursion_overflows() {
    assert_eq!(
        runtime_error("fun f() { f(); }\nf();"),
        "Stack overflow.\n[line 1]"
    );
}

#[test]
fn evaluate_single_expression() {
    let tokens = common::tokens("(1 + 2) * 4 == 12 ? \"yes\" : \"no\"");
    let expr = Parser::new(&tokens).parse_expression().expect("parse");
    let mut interpreter = Interpreter::with_output(common::SharedBuffer::default());

    let value = interpreter.evaluate(&expr).expect("evaluate");

    assert_eq!(value, Value::String("yes".to_string()));
}

#[test]
fn natives_are_defined_as_globals() {
    let interpreter = Interpreter::with_output(common::SharedBuffer::default());
    let globals = interpreter.globals().borrow();

    for name in ["clock", "open", "close", "read", "write"] {
        let value = globals.get(name).expect("native should be defined");
        assert_eq!(value.to_string(), format!("<native fn {}>", name));
    }
}
