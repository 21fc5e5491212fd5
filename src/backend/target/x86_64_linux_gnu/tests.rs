use indoc::indoc;

use super::*;
use crate::{
    error::CompileErrorKind,
    frontend::{SourceFile, parser::parse_source},
    middle::{ir::lowering::lower_module, type_checker::type_check_module},
};

fn lower(source: &str) -> ir::Module {
    let module = parse_source(&SourceFile::from_memory(source)).unwrap();
    type_check_module(&module).unwrap();
    lower_module(&module).unwrap()
}

fn translate_with(source: &str, options: &CodegenOptions) -> CompileResult<String> {
    CodeGeneratorX86_64LinuxGnu.translate_to_asm(&lower(source), options)
}

fn translate(source: &str) -> String {
    translate_with(source, &CodegenOptions::default()).unwrap()
}

#[test]
fn test_program_header() {
    let asm = translate("1");

    assert!(asm.contains("extern print_int\nextern print_bool\nextern read_int\n"));
    assert!(asm.contains("global _start\n_start:\n    call main\n"));
    assert!(asm.contains("global $main\n$main:\n"));
}

#[test]
fn test_arithmetic_function_body() {
    assert!(translate("1 + 2").contains(indoc! {"
        global $main
        $main:
            push rbp
            mov rbp, rsp
            sub rsp, 32
            mov qword [rbp - 8], 1
            mov qword [rbp - 16], 2
            mov rax, qword [rbp - 8]
            mov rcx, qword [rbp - 16]
            add rax, rcx
            mov qword [rbp - 24], rax
            mov rdi, qword [rbp - 24]
            call $print_int
            mov qword [rbp - 32], rax
            mov rax, 0
        .exit:
            mov rsp, rbp
            pop rbp
            ret
    "}));
}

#[test]
fn test_operator_templates() {
    let division = translate("7 / 2");
    assert!(division.contains("    cqo\n    idiv rcx\n    mov qword [rbp - 24], rax\n"));

    let modulus = translate("7 % 2");
    assert!(modulus.contains("    cqo\n    idiv rcx\n    mov qword [rbp - 24], rdx\n"));

    let comparison = translate("1 <= 2");
    assert!(comparison.contains("    xor rdx, rdx\n    cmp rax, rcx\n    setle dl\n"));

    assert!(translate("1 != 2").contains("setne dl"));
    assert!(translate("-(1)").contains("    neg rax\n"));
    assert!(translate("not false").contains("    xor rax, 1\n"));
}

#[test]
fn test_booleans_are_stored_as_integers() {
    assert!(translate("true").contains("mov qword [rbp - 8], 1\n"));
    assert!(translate("false").contains("mov qword [rbp - 8], 0\n"));
}

#[test]
fn test_wide_constants_go_through_a_register() {
    let asm = translate("5000000000");

    assert!(asm.contains("    mov rax, 5000000000\n    mov qword [rbp - 8], rax\n"));
}

#[test]
fn test_control_flow() {
    let asm = translate("if 1 < 2 then 3 else 4");

    assert!(asm.contains("    cmp qword [rbp - 24], 0\n    jne .L1\n    jmp .L2\n.L1:\n"));
    assert!(asm.contains("    jmp .L3\n.L2:\n"));
}

#[test]
fn test_functions() {
    let asm = translate("fun add(a: Int, b: Int): Int { a + b }\nadd(1, 2)");

    assert!(asm.contains(indoc! {"
        global $add
        $add:
            push rbp
            mov rbp, rsp
            sub rsp, 64
            mov qword [rbp - 8], rdi
            mov qword [rbp - 16], rsi
    "}));
    assert!(asm.contains("    mov rax, qword [rbp - 24]\n    jmp .exit\n.exit:\n"));
    assert!(asm.contains("    mov rdi, qword [rbp - 32]\n    mov rsi, qword [rbp - 40]\n    call $add\n"));
}

#[test]
fn test_debug_info_comments() {
    let options = CodegenOptions {
        emit_debug_info: true,
    };
    let asm = translate_with("fun id(a: Int): Int { a }\nid(1)", &options).unwrap();

    assert!(asm.contains("    ; store parameter x1\n"));
    assert!(asm.contains("    ; LoadIntConst(1, x2)\n"));
    assert!(asm.contains("    ; Call(id, [x2], x3)\n"));
    assert!(!translate("1").contains("; LoadIntConst"));
}

#[test]
fn test_too_many_arguments() {
    let error = translate_with(
        indoc! {"
            fun seven(a: Int, b: Int, c: Int, d: Int, e: Int, f: Int, g: Int): Int { a }
            seven(1, 2, 3, 4, 5, 6, 7)
        "},
        &CodegenOptions::default(),
    )
    .unwrap_err();

    assert_eq!(error.kind, CompileErrorKind::Codegen);
}

#[test]
fn test_commands() {
    let assembler = CodeGeneratorX86_64LinuxGnu
        .create_assembler_command(Path::new("program.s"), Path::new("program.o"));
    assert_eq!(assembler.get_program(), "nasm");
    assert_eq!(
        assembler.get_args().collect::<Vec<_>>(),
        ["-f", "elf64", "-o", "program.o", "program.s"]
    );

    let linker = CodeGeneratorX86_64LinuxGnu.create_linker_command(
        &[Path::new("program.o"), Path::new("runtime.o")],
        Path::new("a.out"),
    );
    assert_eq!(linker.get_program(), "gcc");
    assert!(linker.get_args().any(|arg| arg == "-nostdlib"));
    assert!(linker.get_args().any(|arg| arg == "runtime.o"));
}

#[test]
fn test_runtime_defines_intrinsics() {
    let runtime = CodeGeneratorX86_64LinuxGnu.runtime_asm();

    for builtin in Builtin::iter().filter(|builtin| builtin.is_intrinsic()) {
        assert!(runtime.contains(&format!("global {}\n", builtin.name())));
        assert!(runtime.contains(&format!("\n{}:\n", builtin.name())));
    }
}
