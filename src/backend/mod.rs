//! The backend turns IR into native code. Every IR variable is given a stack
//! slot ([`stack_layout`]), each instruction is expanded into a fixed
//! instruction template by a [`target::CodeGenerator`], and the resulting
//! assembly is handed to the host assembler and linker ([`toolchain`]).

pub mod assemblers;
pub mod stack_layout;
pub mod target;
pub mod toolchain;

#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Precede every emitted instruction group with the IR it came from
    pub emit_debug_info: bool,
}
