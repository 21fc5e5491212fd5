use std::{path::Path, process::Command};

use crate::{backend::CodegenOptions, error::CompileResult, middle::ir};

mod x86_64_linux_gnu;

pub trait CodeGenerator {
    fn translate_to_asm(&self, module: &ir::Module, options: &CodegenOptions)
    -> CompileResult<String>;
    /// Assembly source of `print_int`, `print_bool` and `read_int`
    fn runtime_asm(&self) -> &'static str;
    fn create_assembler_command(&self, input_file: &Path, output_file: &Path) -> Command;
    fn create_linker_command(&self, input_files: &[&Path], output_file: &Path) -> Command;
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    x86_64LinuxGnu,
}

impl Target {
    pub fn get_code_generator(self) -> impl CodeGenerator {
        match self {
            Target::x86_64LinuxGnu => x86_64_linux_gnu::CodeGeneratorX86_64LinuxGnu,
        }
    }
}
