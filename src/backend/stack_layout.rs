//! Assigns every IR variable of a module an 8 byte slot below the frame base.
//!
//! The layout is computed once for the whole module, so each function's frame
//! is sized for every variable in the program. Variable numbering is unique
//! across functions, which keeps slots from being shared between them.

use hashbrown::HashMap;

use crate::{
    error::{CompileResult, error_at},
    frontend::lexer::Location,
    middle::ir::{IrVar, Module},
};

pub const SLOT_SIZE: usize = 8;

/// The stack pointer has to stay 16 byte aligned at call sites
const FRAME_ALIGNMENT: usize = 16;

#[derive(Debug, Default)]
pub struct StackLayout {
    offsets: HashMap<IrVar, usize>,
}

impl StackLayout {
    /// Scans parameters and instructions of every function in order. The
    /// first occurrence of a variable decides its slot.
    pub fn for_module(module: &Module) -> Self {
        let mut layout = Self::default();

        for function in &module.functions {
            for parameter in &function.parameters {
                layout.assign(*parameter);
            }

            for instruction in &function.instructions {
                for variable in instruction.kind.variables() {
                    layout.assign(variable);
                }
            }

            layout.assign(function.result);
        }

        layout
    }

    fn assign(&mut self, variable: IrVar) {
        // Functions are called by name and never live on the stack
        if matches!(variable, IrVar::Named(_)) {
            return;
        }

        let next_offset = (self.offsets.len() + 1) * SLOT_SIZE;
        self.offsets.entry(variable).or_insert(next_offset);
    }

    pub fn slot_count(&self) -> usize {
        self.offsets.len()
    }

    pub fn offset_of(&self, variable: IrVar) -> Option<usize> {
        self.offsets.get(&variable).copied()
    }

    /// Size of the area reserved below `rbp` by each function prologue
    pub fn frame_size(&self) -> usize {
        (self.slot_count() * SLOT_SIZE).next_multiple_of(FRAME_ALIGNMENT)
    }

    /// The memory operand addressing `variable`'s slot
    pub fn operand(&self, variable: IrVar, location: Location) -> CompileResult<String> {
        match self.offset_of(variable) {
            Some(offset) => Ok(format!("qword [rbp - {offset}]")),
            None => Err(error_at!(
                Codegen,
                location,
                "`{variable}` has no stack slot"
            )),
        }
    }
}

#[cfg(test)]
mod tests;
