use super::*;
use crate::{
    error::{CompileError, CompileErrorKind},
    frontend::{SourceFile, parser::parse_source},
    middle::{ir::lowering::lower_module, type_checker::type_check_module},
};

fn run_with_input(source: &str, input: &str) -> Result<(Value, String), CompileError> {
    let module = parse_source(&SourceFile::from_memory(source))?;
    type_check_module(&module)?;
    let ir = lower_module(&module)?;

    let mut output = Vec::new();
    let value = interpret(&ir, input.as_bytes(), &mut output)?;

    Ok((value, String::from_utf8(output).unwrap()))
}

fn output_of(source: &str) -> String {
    run_with_input(source, "").unwrap().1
}

fn runtime_error(source: &str) -> CompileError {
    run_with_input(source, "").unwrap_err()
}

#[test]
fn test_prints_top_level_value() {
    assert_eq!(output_of("1 + 2 * 3"), "7\n");
    assert_eq!(output_of("1 < 2"), "true\n");
    assert_eq!(output_of("var x = 1"), "");
}

#[test]
fn test_assignments_update_variables() {
    let (value, output) =
        run_with_input("{ var x = 1; x = x * 10; x = x - 2; x = x / 2; x }", "").unwrap();

    assert_eq!(value, Value::Int(4));
    assert_eq!(output, "4\n");
}

#[test]
fn test_assignment_evaluates_to_right_hand_value() {
    let (value, _) = run_with_input("{ var x = 1; var y = (x = 3) + (x = 4); y }", "").unwrap();
    assert_eq!(value, Value::Int(7));

    assert_eq!(output_of("{ var a = 1; var b = 2; a = b = 5; a + b }"), "10\n");
    assert_eq!(
        output_of("{ var a = 1; var b = 2; var c = if true then a = b else 0; c }"),
        "2\n"
    );
}

#[test]
fn test_short_circuit_operators() {
    assert_eq!(output_of("false and { print_int(1); true }"), "false\n");
    assert_eq!(output_of("true or { print_int(1); false }"), "true\n");
    assert_eq!(output_of("true and { print_int(1); true }"), "1\ntrue\n");
}

#[test]
fn test_if_else_values() {
    assert_eq!(output_of("if 1 < 2 then 10 else 20"), "10\n");
    assert_eq!(output_of("{ var a = 3; var b = if false then a else 4; a + b }"), "7\n");
    assert_eq!(output_of("if false then print_int(1); 5"), "5\n");
}

#[test]
fn test_loops() {
    assert_eq!(
        output_of("{ var i = 0; var sum = 0; while i < 5 do { i = i + 1; sum = sum + i }; sum }"),
        "15\n"
    );
    assert_eq!(
        output_of(indoc::indoc! {"
            var i = 0;
            var odd = 0;
            while true do {
                i = i + 1;
                if i > 10 then break;
                if i % 2 == 0 then continue;
                odd = odd + 1
            }
            odd
        "}),
        "5\n"
    );
}

#[test]
fn test_functions_and_recursion() {
    assert_eq!(
        output_of(indoc::indoc! {"
            fun fact(n: Int): Int {
                if n <= 1 then { return 1 } else { return n * fact(n - 1) }
            }
            fact(5)
        "}),
        "120\n"
    );
    assert_eq!(
        output_of(indoc::indoc! {"
            fun is_even(n: Int): Bool {
                if n == 0 then true else is_odd(n - 1)
            }
            fun is_odd(n: Int): Bool {
                if n == 0 then false else is_even(n - 1)
            }
            is_even(10)
        "}),
        "true\n"
    );
}

#[test]
fn test_parameters_are_not_clobbered() {
    assert_eq!(
        output_of(indoc::indoc! {"
            fun pick(a: Int, flag: Bool): Int {
                var result = if flag then a else 0;
                a + result
            }
            pick(5, false)
        "}),
        "5\n"
    );
}

#[test]
fn test_integer_semantics() {
    assert_eq!(output_of("-7 / 2"), "-3\n");
    assert_eq!(output_of("-7 % 2"), "-1\n");
    assert_eq!(output_of("9223372036854775807 + 1"), "-9223372036854775808\n");
}

#[test]
fn test_read_int() {
    let (_, output) = run_with_input("read_int() * 2", "21\n").unwrap();
    assert_eq!(output, "42\n");

    let error = run_with_input("read_int()", "not a number\n").unwrap_err();
    assert_eq!(error.kind, CompileErrorKind::Runtime);

    let error = run_with_input("read_int()", "").unwrap_err();
    assert_eq!(error.kind, CompileErrorKind::Runtime);

    let (_, output) = run_with_input("read_int()", "  -5 \n").unwrap();
    assert_eq!(output, "-5\n");

    let error = run_with_input("read_int()", "1 2\n").unwrap_err();
    assert_eq!(error.kind, CompileErrorKind::Runtime);
}

#[test]
fn test_runtime_errors() {
    assert_eq!(runtime_error("1 / 0").kind, CompileErrorKind::Runtime);
    assert_eq!(runtime_error("1 % 0").kind, CompileErrorKind::Runtime);
}

#[test]
fn test_unbounded_recursion_is_reported() {
    // Test threads have small stacks, so run deep recursion on a roomier one
    let kind = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| runtime_error("fun forever(n: Int): Int { forever(n) }\nforever(1)").kind)
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(kind, CompileErrorKind::Runtime);
}
