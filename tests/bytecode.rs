// Integration tests for the bytecode compiler and stack VM.
//
// Same black-box style as `tests/interpreter.rs`, but driving the
// `compile -> run` path and exercising a couple of behaviors that are
// specific to that back end (no short-circuit, no declare-before-use
// enforcement).

use wisplang::compiler::Compiler;
use wisplang::error::{Error, NameError};
use wisplang::opcode::Instruction;
use wisplang::vm::{compile_and_run_to, VirtualMachine};

fn run(source: &str) -> String {
    let mut buf = Vec::new();
    compile_and_run_to(source, &mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn operator_precedence() {
    assert_eq!(run("var x = 2 + 3 * 4; print x;"), "14\n");
}

#[test]
fn int_division_floors_float_division_does_not() {
    let out = run("var a = 10; var b = 3; print a / b; print 10.0 / 3;");
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("3"));
    let f: f64 = lines.next().unwrap().parse().unwrap();
    assert!((f - 10.0 / 3.0).abs() < 1e-9);
}

#[test]
fn factorial_via_while_loop() {
    let out = run("var n = 5; var f = 1; while (n > 1) { f = f * n; n = n - 1; } print f;");
    assert_eq!(out, "120\n");
}

#[test]
fn string_interpolation_with_arithmetic_inside() {
    let out = run(r#"var a = 2; var b = 3; print "sum is ${a + b * 2}"; "#);
    assert_eq!(out, "sum is 8\n");
}

#[test]
fn if_else_dispatch_inside_while() {
    let out = run(
        r#"var i = 1; while (i <= 5) { if (i == 3) { print "three"; } else { print i; } i = i + 1; }"#,
    );
    assert_eq!(out, "1\n2\nthree\n4\n5\n");
}

#[test]
fn and_or_do_not_short_circuit_on_the_vm() {
    // The VM always evaluates both operands of `&&`/`||`; dividing by
    // zero on the right side is always reached and always errors, even
    // when the left side alone already decides the result.
    assert!(compile_and_run_to("print 1 || (1 / 0);", &mut Vec::new()).is_err());
    assert!(compile_and_run_to("print 0 && (1 / 0);", &mut Vec::new()).is_err());
}

#[test]
fn declare_before_use_is_not_enforced_at_compile_time() {
    // Unlike the AST interpreter, reading a never-written variable
    // compiles fine on the VM path -- it only fails once the VM
    // actually executes the read.
    assert!(Compiler::compile("print x;").is_ok());
    assert!(matches!(
        compile_and_run_to("print x;", &mut Vec::new()),
        Err(Error::Name(NameError::Uninitialized(_)))
    ));
}

#[test]
fn repeated_variable_references_reuse_the_same_slot() {
    let program = Compiler::compile("var x = 1; x = 2; print x;").unwrap();
    assert_eq!(program.variable_table.len(), 1);
}

#[test]
fn compiled_program_can_be_run_more_than_once() {
    let program = Compiler::compile("var x = 1; print x;").unwrap();
    for _ in 0..3 {
        let mut out = Vec::new();
        let mut vm = VirtualMachine::new(&program);
        vm.run_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\n");
    }
}

#[test]
fn if_with_no_else_compiles_a_single_conditional_jump() {
    let program = Compiler::compile("if (1) { print 1; }").unwrap();
    let jumps = program
        .instructions
        .iter()
        .filter(|i| matches!(i, Instruction::JumpIfFalse(_)))
        .count();
    assert_eq!(jumps, 1);
}

#[test]
fn negative_undeclared_variable() {
    assert!(compile_and_run_to("print undefined;", &mut Vec::new()).is_err());
}

#[test]
fn negative_type_mismatch_string_plus_int() {
    assert!(
        compile_and_run_to(r#"var x = 1; var y = "a"; print x + y;"#, &mut Vec::new()).is_err()
    );
}

#[test]
fn negative_divide_by_zero() {
    assert!(compile_and_run_to("var x = 1 / 0;", &mut Vec::new()).is_err());
}

#[test]
fn negative_unterminated_string() {
    assert!(compile_and_run_to(r#"print "hi;"#, &mut Vec::new()).is_err());
}
