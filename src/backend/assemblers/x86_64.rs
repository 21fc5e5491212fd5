use crate::{
    backend::stack_layout::StackLayout,
    error::CompileResult,
    frontend::lexer::Location,
    middle::ir::IrVar,
};

/// Accumulates NASM text for one function, moving IR variables between their
/// stack slots and registers.
pub struct Assembler<'a> {
    output: String,
    layout: &'a StackLayout,
}

impl<'a> Assembler<'a> {
    pub fn new(layout: &'a StackLayout) -> Self {
        Self {
            output: String::new(),
            layout,
        }
    }

    pub fn into_output(self) -> String {
        self.output
    }

    fn push_line(&mut self, string: impl AsRef<str>) {
        self.output.push_str(string.as_ref());
        self.output.push('\n');
    }

    pub fn emit(&mut self, string: impl AsRef<str>) {
        self.output.push_str("    ");
        self.push_line(string);
    }

    /// Function names are written with NASM's `$` prefix so a name like
    /// `add` is not read as a mnemonic
    pub fn global_label(&mut self, name: &str) {
        self.push_line(format!("global ${name}"));
        self.push_line(format!("${name}:"));
    }

    pub fn label(&mut self, name: impl AsRef<str>) {
        self.push_line(format!("{}:", name.as_ref()));
    }

    pub fn comment(&mut self, comment: impl AsRef<str>) {
        self.emit(format!("; {}", comment.as_ref()));
    }

    pub fn function_prologue(&mut self, stack_frame_size: usize) {
        self.emit("push rbp");
        self.emit("mov rbp, rsp");

        if stack_frame_size > 0 {
            self.emit(format!("sub rsp, {stack_frame_size}"));
        }
    }

    pub fn function_epilogue(&mut self) {
        self.label(".exit");
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");
    }

    pub fn operand(&self, variable: IrVar, location: Location) -> CompileResult<String> {
        self.layout.operand(variable, location)
    }

    pub fn load_operand(
        &mut self,
        destination: X86FullRegister,
        source: IrVar,
        location: Location,
    ) -> CompileResult<()> {
        let operand = self.operand(source, location)?;
        self.emit(format!("mov {destination}, {operand}"));
        Ok(())
    }

    pub fn store_operand(
        &mut self,
        destination: IrVar,
        source: X86FullRegister,
        location: Location,
    ) -> CompileResult<()> {
        let operand = self.operand(destination, location)?;
        self.emit(format!("mov {operand}, {source}"));
        Ok(())
    }

    /// Writes a constant into a slot. `mov` to memory only takes a sign
    /// extended 32-bit immediate, wider values go through `rax`.
    pub fn store_immediate(
        &mut self,
        destination: IrVar,
        value: i64,
        location: Location,
    ) -> CompileResult<()> {
        if i32::try_from(value).is_ok() {
            let operand = self.operand(destination, location)?;
            self.emit(format!("mov {operand}, {value}"));
            Ok(())
        } else {
            self.emit(format!("mov {}, {value}", X86FullRegister::Rax));
            self.store_operand(destination, X86FullRegister::Rax, location)
        }
    }
}

/// General Purpose Register 64-bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum X86FullRegister {
    Rax,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    R8,
    R9,
}

impl X86FullRegister {
    /// Registers holding the first six integer arguments of a call
    pub const ARGUMENTS: [X86FullRegister; 6] = [
        X86FullRegister::Rdi,
        X86FullRegister::Rsi,
        X86FullRegister::Rdx,
        X86FullRegister::Rcx,
        X86FullRegister::R8,
        X86FullRegister::R9,
    ];

    pub fn as_8_bit(self) -> X86ByteRegister {
        match self {
            Self::Rax => X86ByteRegister::Al,
            Self::Rcx => X86ByteRegister::Cl,
            Self::Rdx => X86ByteRegister::Dl,
            Self::Rsi => X86ByteRegister::Sil,
            Self::Rdi => X86ByteRegister::Dil,
            Self::R8 => X86ByteRegister::R8b,
            Self::R9 => X86ByteRegister::R9b,
        }
    }
}

/// Low byte of a [`X86FullRegister`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[rustfmt::skip]
pub enum X86ByteRegister {
    Al, Cl, Dl, Sil, Dil, R8b, R9b,
}
