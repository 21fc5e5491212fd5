//! IR (Intermediate Representation). Every function is a flat list of
//! three-address instructions over virtual variables. Control flow is made
//! explicit with labels and jumps, and every operator is a call to a named
//! built-in.

use crate::{
    frontend::{intern::InternedSymbol, lexer::Location},
    index::simple_index,
    middle::ENTRY_POINT,
};

pub mod interpreter;
pub mod lowering;
pub mod pretty_print;

simple_index! {
    /// Identifies a compiler generated variable (`x1`, `x2`, ...)
    pub struct VarId;
}

simple_index! {
    /// Identifies a jump target (`L1`, `L2`, ...)
    pub struct LabelId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IrVar {
    /// Holds one value computed by the program
    Temporary(VarId),
    /// A function, operator, or intrinsic referred to by its name
    Named(InternedSymbol),
    /// Shared by every expression of type Unit
    Unit,
}

impl IrVar {
    pub fn named(name: &str) -> Self {
        Self::Named(InternedSymbol::new(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub location: Location,
    pub kind: InstructionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    LoadIntConst {
        value: i64,
        destination: IrVar,
    },
    LoadBoolConst {
        value: bool,
        destination: IrVar,
    },
    Copy {
        source: IrVar,
        destination: IrVar,
    },
    Call {
        function: IrVar,
        arguments: Vec<IrVar>,
        destination: IrVar,
    },
    Label(LabelId),
    Jump(LabelId),
    /// Jumps to `then_label` if `condition` is true, else to `else_label`
    CondJump {
        condition: IrVar,
        then_label: LabelId,
        else_label: LabelId,
    },
    Return(IrVar),
}

impl InstructionKind {
    /// Every variable the instruction reads or writes, in the order they
    /// appear in its text form. Callees are included.
    pub fn variables(&self) -> Vec<IrVar> {
        match self {
            Self::LoadIntConst { destination, .. } | Self::LoadBoolConst { destination, .. } => {
                vec![*destination]
            }
            Self::Copy {
                source,
                destination,
            } => vec![*source, *destination],
            Self::Call {
                function,
                arguments,
                destination,
            } => std::iter::once(*function)
                .chain(arguments.iter().copied())
                .chain(std::iter::once(*destination))
                .collect(),
            Self::Label(_) | Self::Jump(_) => Vec::new(),
            Self::CondJump { condition, .. } => vec![*condition],
            Self::Return(value) => vec![*value],
        }
    }
}

#[derive(Debug)]
pub struct Function {
    pub name: InternedSymbol,
    pub parameters: Vec<IrVar>,
    pub instructions: Vec<Instruction>,
    /// Holds the value of the body when control reaches the end of the
    /// instructions without a `Return`
    pub result: IrVar,
}

impl Function {
    pub fn is_entry_point(&self) -> bool {
        self.name.value() == ENTRY_POINT
    }

    pub fn ends_in_return(&self) -> bool {
        self.instructions
            .last()
            .is_some_and(|i| matches!(i.kind, InstructionKind::Return(_)))
    }
}

/// Declared functions in source order followed by the entry point
#[derive(Debug)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn function(&self, name: InternedSymbol) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn entry_point(&self) -> Option<&Function> {
        self.functions.iter().find(|function| function.is_entry_point())
    }
}
