//! A compiler for a small expression-oriented language targeting x86-64
//! Linux.
//!
//! Source text flows through the [`frontend`] (lexing and parsing), the
//! [`middle`] (type checking and lowering to IR) and the [`backend`] (stack
//! layout, assembly emission and the native build). Every stage stops at its
//! first [`error::CompileError`].

use std::{
    io::{BufRead, Write},
    path::Path,
};

use colored::Colorize;

use crate::{
    backend::{
        CodegenOptions,
        target::{CodeGenerator, Target},
        toolchain,
    },
    error::CompileResult,
    frontend::{SourceFile, ast, parser::parse_source},
    middle::{
        ir::{
            self,
            interpreter::{Value, interpret},
            lowering::lower_module,
        },
        type_checker::type_check_module,
    },
};

pub mod backend;
pub mod error;
pub mod frontend;
pub mod index;
pub mod middle;

/// Runs the compilation pipeline over one source file
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    pub options: CodegenOptions,
    pub target: Target,
    /// Report each finished stage on stderr
    pub verbose: bool,
}

impl Compiler {
    pub fn new(options: CodegenOptions, verbose: bool) -> Self {
        Self {
            options,
            verbose,
            ..Default::default()
        }
    }

    /// Parses and type checks, leaving every expression annotated
    pub fn check(&self, source: &SourceFile) -> CompileResult<ast::Module> {
        let module = parse_source(source)?;
        self.log_stage(
            "parse",
            format_args!("{} function(s)", module.functions.len()),
        );

        let ty = type_check_module(&module)?;
        self.log_stage("type check", format_args!("top level is {ty}"));

        Ok(module)
    }

    pub fn lower(&self, source: &SourceFile) -> CompileResult<ir::Module> {
        let module = self.check(source)?;

        let ir = lower_module(&module)?;
        self.log_stage(
            "lower",
            format_args!(
                "{} instruction(s)",
                ir.functions
                    .iter()
                    .map(|function| function.instructions.len())
                    .sum::<usize>()
            ),
        );

        Ok(ir)
    }

    pub fn generate_assembly(&self, source: &SourceFile) -> CompileResult<String> {
        let ir = self.lower(source)?;

        let assembly = self
            .target
            .get_code_generator()
            .translate_to_asm(&ir, &self.options)?;
        self.log_stage(
            "codegen",
            format_args!("{} line(s) of assembly", assembly.lines().count()),
        );

        Ok(assembly)
    }

    /// Compiles `source` into a native executable at `output_file`
    pub fn compile(&self, source: &SourceFile, output_file: &Path) -> CompileResult<()> {
        let assembly = self.generate_assembly(source)?;

        toolchain::build_executable(self.target, &assembly, output_file)?;
        self.log_stage("build", format_args!("wrote {}", output_file.display()));

        Ok(())
    }

    /// Runs `source` on the IR interpreter
    pub fn interpret<R: BufRead, W: Write>(
        &self,
        source: &SourceFile,
        input: R,
        output: W,
    ) -> CompileResult<Value> {
        let ir = self.lower(source)?;

        let value = interpret(&ir, input, output)?;
        self.log_stage("interpret", format_args!("result is {value}"));

        Ok(value)
    }

    fn log_stage(&self, stage: &str, detail: core::fmt::Arguments<'_>) {
        if self.verbose {
            eprintln!("{} {stage} ({detail})", "done".green().bold());
        }
    }
}

#[cfg(test)]
mod tests;
