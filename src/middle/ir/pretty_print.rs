use colored::Colorize;
use itertools::Itertools;

use crate::{
    index::Index,
    middle::ir::{Function, Instruction, InstructionKind, IrVar, LabelId, Module},
};

pub fn pretty_print_module(module: &Module) -> String {
    module.functions.iter().map(|f| f.to_string()).join("\n")
}

impl core::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} {}{}{}{}",
            "fun".magenta(),
            self.name.value().blue(),
            "(".white(),
            self.parameters.iter().join(", "),
            "):".white()
        )?;

        for instruction in &self.instructions {
            writeln!(f, "    {instruction}")?;
        }

        Ok(())
    }
}

impl core::fmt::Display for IrVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrVar::Temporary(id) => write!(f, "x{}", id.index()),
            IrVar::Named(symbol) => write!(f, "{symbol}"),
            IrVar::Unit => write!(f, "unit"),
        }
    }
}

impl core::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.index())
    }
}

impl core::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        core::fmt::Display::fmt(&self.kind, f)
    }
}

impl core::fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructionKind::LoadIntConst { value, destination } => write!(
                f,
                "{}({}, {destination})",
                "LoadIntConst".cyan(),
                value.to_string().purple()
            ),
            InstructionKind::LoadBoolConst { value, destination } => write!(
                f,
                "{}({}, {destination})",
                "LoadBoolConst".cyan(),
                value.to_string().purple()
            ),
            InstructionKind::Copy {
                source,
                destination,
            } => write!(f, "{}({source}, {destination})", "Copy".cyan()),
            InstructionKind::Call {
                function,
                arguments,
                destination,
            } => write!(
                f,
                "{}({}, [{}], {destination})",
                "Call".cyan(),
                function.to_string().blue(),
                arguments.iter().join(", ")
            ),
            InstructionKind::Label(label) => write!(
                f,
                "{}({})",
                "Label".bright_red(),
                label.to_string().bright_red()
            ),
            InstructionKind::Jump(label) => {
                write!(f, "{}({})", "Jump".cyan(), label.to_string().blue())
            }
            InstructionKind::CondJump {
                condition,
                then_label,
                else_label,
            } => write!(
                f,
                "{}({condition}, {}, {})",
                "CondJump".cyan(),
                then_label.to_string().blue(),
                else_label.to_string().blue()
            ),
            InstructionKind::Return(value) => write!(f, "{}({value})", "Return".cyan()),
        }
    }
}
