mod common;

use pretty_assertions::assert_eq;

use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver;
use rox::value::Value;

use common::{output, runtime_error};

#[test]
fn fields_methods_and_display() {
    assert_eq!(
        output(
            "class Point {
  init(x, y) { this.x = x; this.y = y; }
  sum() { return this.x + this.y; }
}
var p = Point(1, 2);
print p.sum();
print p;
print Point;"
        ),
        "3\nPoint instance\nPoint\n"
    );
}

#[test]
fn initializer_always_returns_instance() {
    assert_eq!(
        output(
            "class A {
  init() { this.v = 1; return; }
}
var a = A();
print a.init() == a;
print a.v;"
        ),
        "true\n1\n"
    );
}

#[test]
fn bound_methods_remember_their_instance() {
    assert_eq!(
        output(
            "class Named {
  init(n) { this.n = n; }
  name() { return this.n; }
}
var m = Named(\"first\").name;
print m();"
        ),
        "first\n"
    );
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        output(
            "class A { m() { return \"method\"; } }
var a = A();
a.m = fun () { return \"field\"; };
print a.m();"
        ),
        "field\n"
    );
}

#[test]
fn getters_run_on_access() {
    assert_eq!(
        output(
            "class Circle {
  init(r) { this.r = r; }
  area { return 3 * this.r * this.r; }
}
print Circle(2).area;"
        ),
        "12\n"
    );
}

#[test]
fn static_methods_live_on_the_class() {
    assert_eq!(
        output(
            "class Math {
  class square(n) { return n * n; }
}
print Math.square(3);"
        ),
        "9\n"
    );
}

#[test]
fn missing_static_is_an_error() {
    assert_eq!(
        runtime_error("class A {}\nA.nope;"),
        "Undefined property 'nope'.\n[line 2]"
    );
}

#[test]
fn first_mixin_wins() {
    assert_eq!(
        output(
            "class A { who() { return \"A\"; } onlyA() { return \"onlyA\"; } }
class B { who() { return \"B\"; } onlyB() { return \"onlyB\"; } }
class C < A, B {}
var c = C();
print c.who();
print c.onlyB();
print c.onlyA();"
        ),
        "A\nonlyB\nonlyA\n"
    );
}

#[test]
fn lookup_is_depth_first() {
    assert_eq!(
        output(
            "class Base { hello() { return \"base\"; } }
class A < Base {}
class B { hello() { return \"B\"; } }
class C < A, B {}
print C().hello();"
        ),
        "base\n"
    );
}

#[test]
fn own_methods_override_mixins() {
    assert_eq!(
        output(
            "class A { who() { return \"A\"; } }
class B < A { who() { return \"B\"; } }
print B().who();"
        ),
        "B\n"
    );
}

#[test]
fn super_is_the_first_mixin() {
    assert_eq!(
        output(
            "class A { greet() { return \"A\"; } }
class B { greet() { return \"B\"; } }
class C < A, B { greet() { return \"C+\" + super.greet(); } }
print C().greet();"
        ),
        "C+A\n"
    );
}

#[test]
fn block_local_subclass_finds_its_mixin() {
    assert_eq!(
        output(
            "{
  class A { f() { return \"A\"; } }
  class B < A { f() { return \"B+\" + super.f(); } }
  print B().f();
}"
        ),
        "B+A\n"
    );
}

#[test]
fn function_local_subclass_calls_super() {
    assert_eq!(
        output(
            "fun make() {
  class P { s() { return \"P\"; } }
  class Q < P { s() { return \"Q+\" + super.s(); } }
  return Q();
}
print make().s();"
        ),
        "Q+P\n"
    );
}

#[test]
fn super_initializer_chain() {
    assert_eq!(
        output(
            "class A { init() { this.tag = \"A\"; } }
class B < A {
  init() {
    super.init();
    this.tag = this.tag + \"B\";
  }
}
print B().tag;"
        ),
        "AB\n"
    );
}

#[test]
fn inherited_initializer_and_statics() {
    assert_eq!(
        output(
            "class A {
  init(v) { this.v = v; }
  class make() { return \"made\"; }
}
class B < A {}
print B(7).v;
print B.make();"
        ),
        "7\nmade\n"
    );
}

#[test]
fn instances_compare_by_identity() {
    assert_eq!(
        output("class A {}\nvar a = A();\nvar b = A();\nprint a == a;\nprint a == b;"),
        "true\nfalse\n"
    );
}

#[test]
fn superclass_must_be_a_class() {
    assert_eq!(
        runtime_error("var NotAClass = \"x\";\nclass A < NotAClass {}"),
        "Superclass must be a class.\n[line 2]"
    );
}

#[test]
fn property_access_errors() {
    assert_eq!(
        runtime_error("var s = \"x\";\nprint s.len;"),
        "Only instances have properties.\n[line 2]"
    );
    assert_eq!(
        runtime_error("var s = \"x\";\ns.len = 1;"),
        "Only instances have fields.\n[line 2]"
    );
    assert_eq!(
        runtime_error("class A {}\nprint A().nope;"),
        "Undefined property 'nope'.\n[line 2]"
    );
}

#[test]
fn constructor_arity() {
    assert_eq!(
        runtime_error("class P { init(x) { this.x = x; } }\nP();"),
        "Expected 1 arguments but got 0.\n[line 2]"
    );
    assert_eq!(
        runtime_error("class A {}\nA(1);"),
        "Expected 0 arguments but got 1.\n[line 2]"
    );
}

#[test]
fn class_value_exposes_mixins_and_member_kinds() {
    let tokens = common::tokens("class A { init() {} size { return 1; } }\nclass B < A {}");
    let statements = Parser::new(&tokens).parse().expect("program should parse");
    let resolution = resolver::resolve(&statements);
    let mut interpreter = Interpreter::with_output(common::SharedBuffer::default());

    interpreter
        .interpret(&statements, resolution.locals)
        .expect("program should run");

    let b = interpreter.globals().borrow().get("B").expect("B should be defined");
    let Value::Class(b) = b else {
        panic!("B should be a class");
    };

    let mixins: Vec<&str> = b.superclasses().iter().map(|c| c.name()).collect();
    assert_eq!(mixins, vec!["A"]);
    assert!(b.find_method("init").expect("inherited init").is_initializer());
    assert!(b.find_getter("size").expect("inherited getter").is_getter());
    assert!(b.find_static("size").is_none());
}
