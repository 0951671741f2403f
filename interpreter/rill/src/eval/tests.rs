// Integration tests for the evaluator.
//
// Coverage:
// - Literals, operators, truthiness
// - Binding forms (var, assignment, destructuring, map-ok)
// - Control flow (if, loops, switch, try/catch/finally)
// - Functions, closures, methods, variadics
// - The call bridge in both directions (coercion, error slots, &x)
// - Modules, structs, imports
// - Channels, spawn, cancellation

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use test_case::test_case;

use crate::eval::call::{NativeFn, ParamType};
use crate::eval::cancel::CancelSource;
use crate::eval::env::Env;
use crate::eval::errors::{ErrorKind, EvalError};
use crate::eval::value::Value;
use crate::packages;
use crate::parser::parse;

use super::{execute, execute_context, run, Options};

// ============================================================================
// Helpers
// ============================================================================

fn base_env() -> Env {
    let env = Env::new();
    packages::define_core(&env);
    env
}

fn eval_in(env: &Env, source: &str) -> Result<Value, EvalError> {
    execute(env, &Options::default(), source)
}

fn eval_ok(source: &str) -> Value {
    eval_in(&base_env(), source).expect("evaluation should succeed")
}

fn eval_err(source: &str) -> EvalError {
    eval_in(&base_env(), source).expect_err("evaluation should fail")
}

/// A `div(a, b) -> (int, error)`-shaped native for error-slot tests.
fn env_with_div() -> Env {
    let env = base_env();
    env.define_native(NativeFn::fallible(
        "div",
        vec![ParamType::Int, ParamType::Int],
        |call| {
            let (Value::Int(a), Value::Int(b)) = (&call.args[0], &call.args[1]) else {
                return Err("div expects ints".to_string());
            };
            if *b == 0 {
                return Err("division by zero".to_string());
            }
            Ok(Value::Int(a / b))
        },
    ));
    env
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn scenario_var_arithmetic() {
    assert_eq!(eval_ok("var a = 1; var b = 2; a + b"), Value::Int(3));
}

#[test]
fn scenario_function_call() {
    assert_eq!(
        eval_ok("func add(a, b) { return a + b }; add(2, 3)"),
        Value::Int(5)
    );
}

#[test]
fn scenario_for_over_sequence() {
    assert_eq!(
        eval_ok("var s = [1,2,3]; var t = 0; for x in s { t = t + x }; t"),
        Value::Int(6)
    );
}

#[test]
fn scenario_for_over_map() {
    assert_eq!(
        eval_ok("var m = {\"a\":1,\"b\":2}; var k = 0; for key, val in m { k = k + val }; k"),
        Value::Int(3)
    );
}

#[test]
fn scenario_try_catch() {
    assert_eq!(
        eval_ok("try { throw \"boom\" } catch e { e }"),
        Value::string("boom")
    );
}

#[test]
fn scenario_closure_counter() {
    assert_eq!(
        eval_ok(
            "func mk() { var x = 0; return func() { x = x + 1; return x } }; \
             var c = mk(); c(); c(); c()"
        ),
        Value::Int(3)
    );
}

#[test]
fn scenario_native_error_propagation() {
    let env = env_with_div();
    assert_eq!(
        eval_in(&env, "div(10, 2)?").expect("propagating call"),
        Value::Int(5)
    );
    let caught = eval_in(&env, "try { div(1, 0)? } catch e { e }").expect("caught");
    match caught {
        Value::Str(message) => assert!(!message.is_empty()),
        other => panic!("expected error string, got {other:?}"),
    }
}

#[test]
fn execute_and_run_agree() {
    let source = "var s = [1, 2, 3]; var t = 0; for x in s { t = t + x }; t";
    let program = parse(source).expect("parse");
    let from_execute = execute(&base_env(), &Options::default(), source).expect("execute");
    let from_run = run(&base_env(), &Options::default(), &program).expect("run");
    assert_eq!(from_execute, from_run);
}

// ============================================================================
// Operators
// ============================================================================

#[test_case("1 + 2" => Value::Int(3); "add int")]
#[test_case("7 / 2" => Value::Int(3); "div int")]
#[test_case("2 ** 10" => Value::Int(1024); "pow int")]
#[test_case("1 + 2.5" => Value::Float(3.5); "mixed widens")]
#[test_case("\"a\" + \"b\"" => Value::string("ab"); "string concat")]
#[test_case("1 < 2" => Value::Bool(true); "lt")]
#[test_case("\"a\" < \"b\"" => Value::Bool(true); "string lt")]
#[test_case("1 == 1.0" => Value::Bool(false); "int and float differ")]
#[test_case("nil == nil" => Value::Bool(true); "nil eq")]
#[test_case("!0" => Value::Bool(true); "not zero")]
#[test_case("-(3)" => Value::Int(-3); "neg")]
#[test_case("6 & 3" => Value::Int(2); "bitand")]
#[test_case("1 ? 10 : 20" => Value::Int(10); "ternary")]
fn operator_table(source: &str) -> Value {
    eval_ok(source)
}

#[test]
fn short_circuit_does_not_evaluate_rhs() {
    // `f` is never called, so no arity error surfaces.
    assert_eq!(
        eval_ok("func f() { throw \"no\" }; false && f()"),
        Value::Bool(false)
    );
    assert_eq!(
        eval_ok("func f() { throw \"no\" }; true || f()"),
        Value::Bool(true)
    );
}

#[test]
fn division_by_zero_is_caught_by_try() {
    assert_eq!(
        eval_ok("try { 1 / 0 } catch e { \"caught\" }"),
        Value::string("caught")
    );
}

// ============================================================================
// Bindings and assignment
// ============================================================================

#[test]
fn destructure_sequence() {
    assert_eq!(eval_ok("var a, b = [1, 2]; a + b"), Value::Int(3));
}

#[test]
fn destructure_value_is_last_element_of_full_sequence() {
    // More elements than names: the extras still decide the statement's
    // value, even though only the first two bind.
    assert_eq!(eval_ok("var a, b = [1, 2, 3]"), Value::Int(3));
    assert_eq!(eval_ok("var a, b = [1, 2, 3]; a + b"), Value::Int(3));
    assert_eq!(
        eval_ok("var a = 0; var b = 0; a, b = [5, 6, 7]"),
        Value::Int(7)
    );
}

#[test]
fn multi_var_and_multi_assign() {
    assert_eq!(eval_ok("var a, b = 1, 2; a, b = b, a; a"), Value::Int(2));
}

#[test]
fn too_many_rhs_values_fail() {
    assert_eq!(eval_err("var a = 1; var b = 2; a, b = 1, 2, 3").kind, ErrorKind::Arity);
}

#[test]
fn assignment_creates_binding_in_innermost_frame() {
    // `y` is created inside the if-branch scope and is gone afterwards.
    assert_eq!(eval_err("if true { y = 1 }; y").kind, ErrorKind::NotDeclared);
    // Assignment to an outer binding reuses it.
    assert_eq!(eval_ok("var x = 1; if true { x = 2 }; x"), Value::Int(2));
}

#[test]
fn map_ok_assignment() {
    assert_eq!(
        eval_ok("var m = {\"a\": 1}; var v = 0; var ok = false; v, ok = m[\"a\"]; ok"),
        Value::Bool(true)
    );
    assert_eq!(
        eval_ok("var m = {\"a\": 1}; var v = 0; var ok = true; v, ok = m[\"b\"]; ok"),
        Value::Bool(false)
    );
    assert_eq!(
        eval_ok("var m = {\"a\": 1}; var v = 0; var ok = true; v, ok = m[\"b\"]; v"),
        Value::Nil
    );
}

#[test]
fn index_and_member_assignment() {
    assert_eq!(eval_ok("var s = [1, 2]; s[0] = 9; s[0]"), Value::Int(9));
    // Writing one past the end appends.
    assert_eq!(eval_ok("var s = [1]; s[1] = 5; len(s)"), Value::Int(2));
    assert_eq!(
        eval_ok("var m = {}; m[\"k\"] = 3; m[\"k\"]"),
        Value::Int(3)
    );
    assert_eq!(eval_err("var s = [1]; s[5] = 0").kind, ErrorKind::Type);
}

#[test]
fn ref_deref_roundtrip() {
    assert_eq!(eval_ok("var x = 1; var r = &x; *r"), Value::Int(1));
    assert_eq!(eval_ok("var r = &0; *r = 7; *r"), Value::Int(7));
}

#[test]
fn delete_forms() {
    assert_eq!(
        eval_ok("var m = {\"a\": 1}; delete(m, \"a\"); len(m)"),
        Value::Int(0)
    );
    assert_eq!(
        eval_err("var x = 1; delete(\"x\"); x").kind,
        ErrorKind::NotDeclared
    );
    assert_eq!(eval_err("delete(1)").kind, ErrorKind::Type);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn if_chain() {
    assert_eq!(
        eval_ok("var x = 2; var r = 0; if x == 1 { r = 1 } else if x == 2 { r = 2 } else { r = 3 }; r"),
        Value::Int(2)
    );
}

#[test]
fn while_loop_with_break_continue() {
    assert_eq!(
        eval_ok(
            "var t = 0\nvar i = 0\nfor {\n  i = i + 1\n  if i > 5 { break }\n  if i % 2 == 0 { continue }\n  t = t + i\n}\nt"
        ),
        Value::Int(9)
    );
}

#[test]
fn three_part_for() {
    assert_eq!(
        eval_ok("var t = 0; for var i = 0; i < 5; i = i + 1 { t = t + i }; t"),
        Value::Int(10)
    );
}

#[test]
fn post_runs_after_continue() {
    assert_eq!(
        eval_ok(
            "var t = 0\nfor var i = 0; i < 4; i = i + 1 {\n  if i == 1 { continue }\n  t = t + i\n}\nt"
        ),
        Value::Int(5)
    );
}

#[test]
fn switch_matches_structurally() {
    assert_eq!(
        eval_ok("var x = 2; switch x { case 1: \"one\" case 2, 3: \"few\" default: \"many\" }"),
        Value::string("few")
    );
    assert_eq!(
        eval_ok("switch \"z\" { case \"a\": 1 default: 42 }"),
        Value::Int(42)
    );
}

#[test]
fn return_forms() {
    assert_eq!(eval_ok("func f() { return }; f()"), Value::Nil);
    assert_eq!(
        eval_ok("func f() { return 1, 2 }; f()"),
        Value::seq(vec![Value::Int(1), Value::Int(2)])
    );
    // A return-less body yields its last value.
    assert_eq!(eval_ok("func f() { 41 + 1 }; f()"), Value::Int(42));
}

#[test]
fn throw_coerces_to_string() {
    assert_eq!(
        eval_ok("try { throw 42 } catch e { e }"),
        Value::string("42")
    );
}

#[test]
fn finally_always_runs_and_replaces_errors() {
    assert_eq!(
        eval_ok(
            "var log = []\ntry { throw \"x\" } catch e { log[0] = \"c\" } finally { log[1] = \"f\" }\nlog"
        ),
        Value::seq(vec![Value::string("c"), Value::string("f")])
    );
    let err = eval_err("try { throw \"a\" } catch e { } finally { throw \"b\" }");
    assert_eq!(err.message, "b");
}

#[test]
fn try_without_catch_propagates_after_finally() {
    let err = eval_err("try { throw \"inner\" } finally { }");
    assert_eq!(err.message, "inner");
}

#[test]
fn return_passes_through_catch() {
    // `return` is a control signal, not an error: catch must not see it.
    assert_eq!(
        eval_ok("func f() { try { return 1 } catch e { return 2 } finally { } }; f()"),
        Value::Int(1)
    );
}

// ============================================================================
// Functions and closures
// ============================================================================

#[test]
fn closure_sees_last_values() {
    assert_eq!(
        eval_ok("var f = nil\nif true { var x = 1\n f = func() { return x }\n x = 2 }\nf()"),
        Value::Int(2)
    );
}

#[test]
fn wrong_arity_fails() {
    let err = eval_err("func f(a) { return a }; f(1, 2)");
    assert_eq!(err.kind, ErrorKind::Arity);
    assert!(err.message.contains("wants 1 arguments but received 2"));
}

#[test]
fn calling_a_non_function_fails() {
    let err = eval_err("var f = nil; f()");
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("cannot call type nil"));
}

#[test]
fn variadic_spread_equivalence() {
    let source = "func sum(xs...) { var t = 0; for x in xs { t = t + x }; return t };";
    assert_eq!(eval_ok(&format!("{source} sum(1, 2, 3)")), Value::Int(6));
    assert_eq!(
        eval_ok(&format!("{source} var xs = [1, 2, 3]; sum(xs...)")),
        Value::Int(6)
    );
    assert_eq!(eval_ok(&format!("{source} sum()")), Value::Int(0));
}

#[test]
fn variadic_with_fixed_params() {
    assert_eq!(
        eval_ok(
            "func scale(k, xs...) { var t = 0; for x in xs { t = t + k * x }; return t }; \
             scale(10, 1, 2)"
        ),
        Value::Int(30)
    );
}

#[test]
fn spread_into_non_variadic_is_rejected() {
    let err = eval_err("func f(a) { return a }; var xs = [1]; f(xs...)");
    assert_eq!(err.kind, ErrorKind::Arity);
}

#[test]
fn error_positions_layer_call_sites() {
    let err = eval_err("func inner() { throw \"deep\" }\nfunc outer() { return inner() }\nouter()");
    assert_eq!(err.kind, ErrorKind::Throw);
    assert_eq!(err.message, "deep");
    assert!(err.cause.is_some());
}

// ============================================================================
// Structs, methods, modules
// ============================================================================

#[test]
fn struct_record_and_method() {
    assert_eq!(
        eval_ok(
            "struct Point { x, y }\n\
             func Point.sum() { return self.x + self.y }\n\
             var p = Point{x: 1, y: 2}\n\
             p.sum()"
        ),
        Value::Int(3)
    );
}

#[test]
fn make_builds_nil_fields() {
    assert_eq!(
        eval_ok("struct T { a }; var t = make(T); t.a"),
        Value::Nil
    );
    assert_eq!(
        eval_ok("struct T { a }; var t = make(T); t.a = 5; t.a"),
        Value::Int(5)
    );
}

#[test]
fn unknown_field_fails() {
    assert_eq!(
        eval_err("struct T { a }; var t = make(T); t.b = 1").kind,
        ErrorKind::Type
    );
    assert_eq!(eval_err("struct T { a }; T{b: 1}").kind, ErrorKind::Type);
}

#[test]
fn record_equality_is_structural() {
    assert_eq!(
        eval_ok("struct P { x }; P{x: 1} == P{x: 1}"),
        Value::Bool(true)
    );
    assert_eq!(
        eval_ok("struct P { x }; P{x: 1} == P{x: 2}"),
        Value::Bool(false)
    );
}

#[test]
fn module_members() {
    assert_eq!(
        eval_ok("module m { var x = 5\n func get() { return x } }\nm.x + m.get()"),
        Value::Int(10)
    );
}

#[test]
fn module_assignment_deep_copies() {
    assert_eq!(
        eval_ok("module m { var x = 1 }\nvar n = m\nn.x = 9\nm.x"),
        Value::Int(1)
    );
}

// ============================================================================
// Imports
// ============================================================================

#[test]
fn import_from_registry() {
    packages::register_std();
    assert_eq!(
        eval_ok("import strings\nstrings.upper(\"ab\")"),
        Value::string("AB")
    );
    // Dotted paths normalize to slashes and alias to the last segment.
    assert_eq!(
        eval_ok("import math as m\nm.abs(0 - 4)"),
        Value::Int(4)
    );
}

#[test]
fn import_unknown_package_fails() {
    assert_eq!(
        eval_err("import no_such_package_anywhere").kind,
        ErrorKind::PackageNotFound
    );
}

#[test]
fn local_import_uses_resolver() {
    let options = Options {
        debug: false,
        import: Some(Arc::new(|name: &str| {
            let pack = Env::new();
            pack.define("name", Value::string(name.to_string()));
            pack.define("answer", Value::Int(42));
            Ok(pack)
        })),
    };
    let result = execute(&base_env(), &options, "import \"./lib\"\nlib.answer").expect("import");
    assert_eq!(result, Value::Int(42));
}

#[test]
fn local_import_without_resolver_fails() {
    assert_eq!(
        eval_err("import \"./lib\"").kind,
        ErrorKind::ImportUnavailable
    );
}

// ============================================================================
// Call bridge: natives
// ============================================================================

#[test]
fn native_arguments_are_coerced() {
    let env = base_env();
    env.define_native(NativeFn::new("want_float", vec![ParamType::Float], |call| {
        match call.args[0] {
            Value::Float(f) => Ok(Value::Float(f * 2.0)),
            _ => Err(EvalError::new(ErrorKind::Internal, "not coerced")),
        }
    }));
    assert_eq!(
        eval_in(&env, "want_float(21)").expect("coerced"),
        Value::Float(42.0)
    );
    let err = eval_in(&env, "want_float(\"x\")").expect_err("mismatch");
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err
        .message
        .contains("wants argument type float but received type string"));
}

#[test]
fn plain_call_exposes_error_slot() {
    let env = env_with_div();
    assert_eq!(
        eval_in(&env, "div(10, 2)").expect("plain call"),
        Value::seq(vec![Value::Int(5), Value::Nil])
    );
}

#[test]
fn propagating_call_raises_with_site() {
    let env = env_with_div();
    let err = eval_in(&env, "div(1, 0)?").expect_err("raise");
    assert_eq!(err.kind, ErrorKind::Throw);
    assert_eq!(err.message, "division by zero");
    assert!(err.pos.is_some());
}

#[test]
fn out_parameter_write_back() {
    let env = base_env();
    env.define_native(NativeFn::new("bump", vec![ParamType::Ref], |call| {
        if let Value::Ref(cell) = &call.args[0] {
            let next = match cell.read().unwrap_ref() {
                Value::Int(n) => Value::Int(n + 1),
                _ => Value::Nil,
            };
            *cell.write() = next;
        }
        Ok(Value::Nil)
    }));
    assert_eq!(
        eval_in(&env, "var x = 1; bump(&x); x").expect("write back"),
        Value::Int(2)
    );
}

#[test]
fn host_panic_is_contained() {
    let env = base_env();
    env.define_native(NativeFn::new("explode", vec![], |_call| panic!("kaboom")));
    let err = eval_in(&env, "explode()").expect_err("contained");
    assert_eq!(err.kind, ErrorKind::HostPanic);
    assert!(err.message.contains("kaboom"));
}

#[test]
fn host_calls_script_function() {
    let env = base_env();
    eval_in(&env, "func twice(x) { return x * 2 }").expect("define");
    let func = env.lookup("twice").expect("bound");
    let cancel = super::cancel::CancelToken::never();
    assert_eq!(
        crate::eval::call::call_value(&cancel, &func, vec![Value::Int(21)]).expect("call"),
        Value::Int(42)
    );
}

// ============================================================================
// Channels, spawn, cancellation
// ============================================================================

#[test]
fn spawn_and_rendezvous() {
    assert_eq!(
        eval_ok("var ch = make(chan)\ngo func(c) { c <- 41 }(ch)\nvar v = 0\nv <- ch\nv + 1"),
        Value::Int(42)
    );
}

#[test]
fn buffered_channel_for_loop() {
    assert_eq!(
        eval_ok(
            "var ch = make(chan, 3)\nch <- 1\nch <- 2\nclose(ch)\nvar t = 0\nfor x in ch { t = t + x }\nt"
        ),
        Value::Int(3)
    );
}

#[test]
fn receive_from_closed_channel_binds_ok_false() {
    assert_eq!(
        eval_ok("var ch = make(chan, 1)\nclose(ch)\nvar a = 99\nvar ok = true\na, ok <- ch\nok"),
        Value::Bool(false)
    );
    assert_eq!(
        eval_ok("var ch = make(chan, 1)\nclose(ch)\nvar a = 99\nvar ok = true\na, ok <- ch\na"),
        Value::Nil
    );
}

#[test]
fn spawned_task_shares_frames_by_reference() {
    assert_eq!(
        eval_ok(
            "var x = 1\nvar done = make(chan)\ngo func(d) { x = 99\n d <- true }(done)\nvar ok = false\nok <- done\nx"
        ),
        Value::Int(99)
    );
}

#[test]
fn channel_loop_interrupted_by_cancellation() {
    let (mut source, token) = CancelSource::new();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        source.cancel();
    });
    let err = execute_context(
        token,
        &base_env(),
        &Options::default(),
        "var ch = make(chan)\nfor x in ch { }",
    )
    .expect_err("interrupt");
    assert!(err.is_interrupt());
    canceller.join().expect("join");
}

#[test]
fn interrupt_bypasses_catch() {
    let (mut source, token) = CancelSource::new();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        source.cancel();
    });
    let err = execute_context(
        token,
        &base_env(),
        &Options::default(),
        "try { var ch = make(chan)\n var v = 0\n v <- ch } catch e { \"caught\" }",
    )
    .expect_err("interrupt");
    assert!(err.is_interrupt());
    canceller.join().expect("join");
}

// ============================================================================
// Environment visibility
// ============================================================================

#[test]
fn top_level_bindings_persist_in_host_env() {
    let env = base_env();
    eval_in(&env, "var a = 7; func f() { return a }").expect("run");
    assert_eq!(env.lookup("a").expect("binding"), Value::Int(7));
    assert!(env.lookup("f").is_ok());
}

#[test]
fn block_scopes_do_not_leak() {
    let env = base_env();
    eval_in(&env, "if true { var hidden = 1 }").expect("run");
    assert!(env.lookup("hidden").is_err());
}

// ============================================================================
// Indexing and slicing
// ============================================================================

#[test]
fn string_and_sequence_indexing() {
    assert_eq!(eval_ok("\"hello\"[1]"), Value::string("e"));
    assert_eq!(eval_ok("[10, 20, 30][2]"), Value::Int(30));
    assert_eq!(eval_err("[1][5]").kind, ErrorKind::Type);
}

#[test]
fn slices() {
    assert_eq!(
        eval_ok("var s = [1, 2, 3]; s[1:]"),
        Value::seq(vec![Value::Int(2), Value::Int(3)])
    );
    assert_eq!(eval_ok("\"hello\"[1:3]"), Value::string("el"));
}

#[test]
fn map_member_access_sugar() {
    assert_eq!(eval_ok("var m = {\"a\": 1}; m.a"), Value::Int(1));
    assert_eq!(eval_ok("var m = {}; m.missing"), Value::Nil);
}

#[test]
fn for_over_non_iterable_fails() {
    assert_eq!(eval_err("for x in 5 { }").kind, ErrorKind::NotIterable);
}

// ============================================================================
// Foreign values
// ============================================================================

struct Window {
    items: Vec<i64>,
}

impl crate::eval::value::Opaque for Window {
    fn type_name(&self) -> &str {
        "window"
    }

    fn as_indexable(&self) -> Option<&dyn crate::eval::value::Indexable> {
        Some(self)
    }
}

impl crate::eval::value::Indexable for Window {
    fn len(&self) -> i64 {
        self.items.len() as i64
    }

    fn index(&self, i: i64) -> Result<Value, EvalError> {
        self.items
            .get(i as usize)
            .map(|n| Value::Int(*n))
            .ok_or_else(|| EvalError::new(ErrorKind::Type, "index out of range"))
    }
}

#[test]
fn for_over_foreign_indexable() {
    let env = base_env();
    env.define("w", Value::foreign(Window { items: vec![1, 2, 3] }));
    assert_eq!(
        eval_in(&env, "var t = 0; for x in w { t = t + x }; t").expect("iterate"),
        Value::Int(6)
    );
}

#[test]
fn foreign_without_index_capability_fails() {
    struct Blob;
    impl crate::eval::value::Opaque for Blob {
        fn type_name(&self) -> &str {
            "blob"
        }
    }
    let env = base_env();
    env.define("b", Value::foreign(Blob));
    assert_eq!(
        eval_in(&env, "for x in b { }").expect_err("no capability").kind,
        ErrorKind::NotIterable
    );
}

// ============================================================================
// Remaining odds and ends
// ============================================================================

#[test]
fn delete_global_from_nested_scope() {
    assert_eq!(
        eval_err("var x = 1; if true { delete(\"x\", true) }; x").kind,
        ErrorKind::NotDeclared
    );
    // Frame-local delete inside a branch does not touch the outer binding.
    assert_eq!(
        eval_ok("var x = 1; if true { delete(\"x\") }; x"),
        Value::Int(1)
    );
}

#[test]
fn parenthesized_send_expression() {
    assert_eq!(
        eval_ok("var ch = make(chan, 1)\n(ch <- 5)\nvar v = 0\nv <- ch\nv"),
        Value::Int(5)
    );
}

#[test]
fn struct_field_types_resolve_builtins() {
    assert_eq!(
        eval_ok("struct P { x: int, y: float }; var p = P{x: 1, y: 2.0}; p.x"),
        Value::Int(1)
    );
}
