use super::*;
use crate::{error::CompileErrorKind, frontend::lexer::Location, middle::ty::Type};

fn error_kind(source: &str) -> CompileErrorKind {
    Compiler::default()
        .generate_assembly(&SourceFile::from_memory(source))
        .unwrap_err()
        .kind
}

#[test]
fn test_check_annotates_module() {
    let module = Compiler::default()
        .check(&SourceFile::from_memory("{ var x = 1; x < 2 }"))
        .unwrap();

    assert_eq!(module.body.ty.get(), Some(&Type::Bool));
}

#[test]
fn test_each_stage_reports_its_own_errors() {
    assert_eq!(error_kind("1 $ 2"), CompileErrorKind::Lex);
    assert_eq!(error_kind("1 +"), CompileErrorKind::Parse);
    assert_eq!(error_kind("x + 1"), CompileErrorKind::Scope);
    assert_eq!(error_kind("1 + true"), CompileErrorKind::Type);
    assert_eq!(error_kind("1; break"), CompileErrorKind::Ir);
}

#[test]
fn test_errors_carry_locations() {
    let error = Compiler::default()
        .check(&SourceFile::from_memory("var a = 1;\na = true"))
        .unwrap_err();

    assert_eq!(error.kind, CompileErrorKind::Type);
    assert_eq!(error.location.map(|l| l.line), Some(2));

    let rendered = strip_ansi_escapes::strip_str(error.render(&SourceFile::from_memory(
        "var a = 1;\na = true",
    )));
    assert!(rendered.starts_with("error[type]: "));
    assert!(rendered.contains("<memory>:2:"));
    assert!(rendered.contains("2 | a = true"));
}

#[test]
fn test_interpret() {
    let mut output = Vec::new();

    let value = Compiler::default()
        .interpret(
            &SourceFile::from_memory("fun twice(n: Int): Int { n * 2 }\ntwice(read_int())"),
            "21\n".as_bytes(),
            &mut output,
        )
        .unwrap();

    assert_eq!(value, Value::Int(42));
    assert_eq!(String::from_utf8(output).unwrap(), "42\n");
}

#[test]
fn test_generate_assembly() {
    let compiler = Compiler::new(
        CodegenOptions {
            emit_debug_info: true,
        },
        false,
    );

    let assembly = compiler
        .generate_assembly(&SourceFile::from_memory("print_int(1)"))
        .unwrap();

    assert!(assembly.contains("global $main"));
    assert!(assembly.contains("; Call(print_int, [x1], x2)"));
    assert!(assembly.contains("call $print_int"));
}

#[test]
fn test_error_display() {
    let error = error::CompileError::new(
        CompileErrorKind::Parse,
        Location::new(3, 7),
        "expected `)`".into(),
    );

    assert_eq!(
        error.to_string(),
        "parse error: expected `)` (at line 3, column 7)"
    );
}
