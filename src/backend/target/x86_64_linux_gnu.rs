use std::{path::Path, process::Command};

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::{
    backend::{
        CodegenOptions,
        assemblers::x86_64::{Assembler, X86FullRegister},
        stack_layout::StackLayout,
        target::CodeGenerator,
    },
    error::{CompileError, CompileResult, error_at},
    frontend::lexer::Location,
    middle::{
        builtin::Builtin,
        ir::{self, Instruction, InstructionKind, IrVar, LabelId},
    },
};

pub struct CodeGeneratorX86_64LinuxGnu;

impl CodeGenerator for CodeGeneratorX86_64LinuxGnu {
    fn translate_to_asm(
        &self,
        module: &ir::Module,
        options: &CodegenOptions,
    ) -> CompileResult<String> {
        let layout = StackLayout::for_module(module);

        let externs = Builtin::iter()
            .filter(|builtin| builtin.is_intrinsic())
            .map(|builtin| format!("extern {}", builtin.name()))
            .join("\n");

        let function_bodies = module
            .functions
            .iter()
            .map(|f| codegen_function(f, &layout, options))
            .collect::<CompileResult<Vec<_>>>()?
            .join("\n");

        Ok(indoc::formatdoc! {r#"
            bits 64
            default rel

            ; runtime functions
            {externs}

            section .text

            ; program entrypoint
            global _start
            _start:
                call main

                ; exit syscall using code passed in rax
                mov rdi, rax
                mov rax, 60
                syscall

            ; user code
            {function_bodies}"#,
            externs = externs,
            function_bodies = function_bodies,
        })
    }

    fn runtime_asm(&self) -> &'static str {
        include_str!("./x86_64-linux-gnu_runtime.s")
    }

    fn create_assembler_command(&self, input_file: &Path, output_file: &Path) -> Command {
        let mut cmd = Command::new("nasm");

        cmd.args(["-f", "elf64", "-o"])
            .arg(output_file)
            .arg(input_file);

        cmd
    }

    fn create_linker_command(&self, input_files: &[&Path], output_file: &Path) -> Command {
        let mut cmd = Command::new("gcc");

        cmd.args(["-nostdlib", "-static", "-no-pie", "-o"])
            .arg(output_file)
            .args(input_files);

        cmd
    }
}

fn codegen_function(
    function: &ir::Function,
    layout: &StackLayout,
    options: &CodegenOptions,
) -> CompileResult<String> {
    if function.parameters.len() > X86FullRegister::ARGUMENTS.len() {
        return Err(error_at!(
            Codegen,
            None::<Location>,
            "`{}` has {} parameters but at most {} are supported",
            function.name,
            function.parameters.len(),
            X86FullRegister::ARGUMENTS.len()
        ));
    }

    let mut assembler = Assembler::new(layout);

    assembler.global_label(function.name.value());
    assembler.function_prologue(layout.frame_size());

    /* Move the function arguments into their stack slots */

    for (parameter, register) in function.parameters.iter().zip(X86FullRegister::ARGUMENTS) {
        if options.emit_debug_info {
            assembler.comment(format!("store parameter {parameter}"));
        }

        assembler.store_operand(*parameter, register, Location::default())?;
    }

    for instruction in &function.instructions {
        if options.emit_debug_info {
            assembler.comment(strip_ansi_escapes::strip_str(instruction.to_string()));
        }

        codegen_instruction(&mut assembler, instruction)?;
    }

    if !function.ends_in_return() {
        if function.is_entry_point() {
            assembler.emit("mov rax, 0");
        } else {
            assembler.load_operand(X86FullRegister::Rax, function.result, Location::default())?;
        }
    }

    assembler.function_epilogue();

    Ok(assembler.into_output())
}

fn codegen_instruction(assembler: &mut Assembler, instruction: &Instruction) -> CompileResult<()> {
    let location = instruction.location;

    match &instruction.kind {
        InstructionKind::LoadIntConst { value, destination } => {
            assembler.store_immediate(*destination, *value, location)
        }
        InstructionKind::LoadBoolConst { value, destination } => {
            assembler.store_immediate(*destination, i64::from(*value), location)
        }
        InstructionKind::Copy {
            source,
            destination,
        } => {
            assembler.load_operand(X86FullRegister::Rax, *source, location)?;
            assembler.store_operand(*destination, X86FullRegister::Rax, location)
        }
        InstructionKind::Call {
            function: IrVar::Named(name),
            arguments,
            destination,
        } => match Builtin::from_name(name.value()) {
            Some(builtin) if !builtin.is_intrinsic() => {
                codegen_builtin(assembler, builtin, arguments, *destination, location)
            }
            _ => codegen_call(assembler, name.value(), arguments, *destination, location),
        },
        InstructionKind::Call { function, .. } => Err(error_at!(
            Codegen,
            location,
            "`{function}` is not a function name"
        )),
        InstructionKind::Label(label) => {
            assembler.label(local_label(*label));
            Ok(())
        }
        InstructionKind::Jump(label) => {
            assembler.emit(format!("jmp {}", local_label(*label)));
            Ok(())
        }
        InstructionKind::CondJump {
            condition,
            then_label,
            else_label,
        } => {
            let condition = assembler.operand(*condition, location)?;

            assembler.emit(format!("cmp {condition}, 0"));
            assembler.emit(format!("jne {}", local_label(*then_label)));
            assembler.emit(format!("jmp {}", local_label(*else_label)));
            Ok(())
        }
        InstructionKind::Return(value) => {
            assembler.load_operand(X86FullRegister::Rax, *value, location)?;
            assembler.emit("jmp .exit");
            Ok(())
        }
    }
}

fn local_label(label: LabelId) -> String {
    format!(".{label}")
}

/// Operators are expanded inline: operands go to `rax` and `rcx` and the
/// result is written back from whichever register the template leaves it in
fn codegen_builtin(
    assembler: &mut Assembler,
    builtin: Builtin,
    arguments: &[IrVar],
    destination: IrVar,
    location: Location,
) -> CompileResult<()> {
    use X86FullRegister::{Rax, Rcx, Rdx};

    let result = match (builtin, arguments) {
        (Builtin::Negate, [operand]) => {
            assembler.load_operand(Rax, *operand, location)?;
            assembler.emit(format!("neg {Rax}"));
            Rax
        }
        (Builtin::LogicalNot, [operand]) => {
            assembler.load_operand(Rax, *operand, location)?;
            assembler.emit(format!("xor {Rax}, 1"));
            Rax
        }
        (_, [lhs, rhs]) => {
            assembler.load_operand(Rax, *lhs, location)?;
            assembler.load_operand(Rcx, *rhs, location)?;

            match builtin {
                Builtin::Add => {
                    assembler.emit(format!("add {Rax}, {Rcx}"));
                    Rax
                }
                Builtin::Subtract => {
                    assembler.emit(format!("sub {Rax}, {Rcx}"));
                    Rax
                }
                Builtin::Multiply => {
                    assembler.emit(format!("imul {Rax}, {Rcx}"));
                    Rax
                }
                Builtin::Divide | Builtin::Modulus => {
                    assembler.emit("cqo");
                    assembler.emit(format!("idiv {Rcx}"));

                    // idiv leaves the quotient in rax and the remainder in rdx
                    if builtin == Builtin::Divide { Rax } else { Rdx }
                }
                Builtin::LogicalAnd => {
                    assembler.emit(format!("and {Rax}, {Rcx}"));
                    Rax
                }
                Builtin::LogicalOr => {
                    assembler.emit(format!("or {Rax}, {Rcx}"));
                    Rax
                }
                _ => {
                    let Some(condition) = condition_code(builtin) else {
                        return Err(unsupported_builtin(builtin, arguments, location));
                    };

                    assembler.emit(format!("xor {Rdx}, {Rdx}"));
                    assembler.emit(format!("cmp {Rax}, {Rcx}"));
                    assembler.emit(format!("set{condition} {}", Rdx.as_8_bit()));
                    Rdx
                }
            }
        }
        _ => return Err(unsupported_builtin(builtin, arguments, location)),
    };

    assembler.store_operand(destination, result, location)
}

fn condition_code(builtin: Builtin) -> Option<&'static str> {
    match builtin {
        Builtin::LessThan => Some("l"),
        Builtin::GreaterThan => Some("g"),
        Builtin::LessThanOrEqualTo => Some("le"),
        Builtin::GreaterThanOrEqualTo => Some("ge"),
        Builtin::Equals => Some("e"),
        Builtin::NotEquals => Some("ne"),
        _ => None,
    }
}

fn unsupported_builtin(
    builtin: Builtin,
    arguments: &[IrVar],
    location: Location,
) -> CompileError {
    error_at!(
        Codegen,
        location,
        "no instruction template for `{builtin}` with {} argument(s)",
        arguments.len()
    )
}

fn codegen_call(
    assembler: &mut Assembler,
    name: &str,
    arguments: &[IrVar],
    destination: IrVar,
    location: Location,
) -> CompileResult<()> {
    if arguments.len() > X86FullRegister::ARGUMENTS.len() {
        return Err(error_at!(
            Codegen,
            location,
            "calling `{name}` with {} arguments is not supported (at most {})",
            arguments.len(),
            X86FullRegister::ARGUMENTS.len()
        ));
    }

    for (argument, register) in arguments.iter().zip(X86FullRegister::ARGUMENTS) {
        assembler.load_operand(register, *argument, location)?;
    }

    assembler.emit(format!("call ${name}"));
    assembler.store_operand(destination, X86FullRegister::Rax, location)
}

#[cfg(test)]
mod tests;
