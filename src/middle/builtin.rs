use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::{
    frontend::{
        ast::{BinaryOperatorKind, UnaryOperatorKind},
        intern::InternedSymbol,
    },
    middle::ty::{FunctionType, Type},
};

/// Operators and runtime intrinsics bound in the root scope frame. The
/// serialized form of each variant is the name it is bound under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
pub enum Builtin {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulus,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = "<=")]
    LessThanOrEqualTo,
    #[strum(serialize = ">=")]
    GreaterThanOrEqualTo,
    #[strum(serialize = "==")]
    Equals,
    #[strum(serialize = "!=")]
    NotEquals,
    #[strum(serialize = "and")]
    LogicalAnd,
    #[strum(serialize = "or")]
    LogicalOr,
    #[strum(serialize = "not")]
    LogicalNot,
    #[strum(serialize = "unary_-")]
    Negate,
    #[strum(serialize = "print_int")]
    PrintInt,
    #[strum(serialize = "print_bool")]
    PrintBool,
    #[strum(serialize = "read_int")]
    ReadInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinClass {
    /// (Int, Int) -> Int
    Arithmetic,
    /// (Int, Int) -> Bool
    Relational,
    /// (Bool, Bool) -> Bool
    Logical,
    /// (T, T) -> Bool for T in {Int, Bool}
    Equality,
    /// Int -> Int
    Negation,
    /// Bool -> Bool
    LogicalNegation,
    /// Provided by the runtime and reached through a regular call
    Intrinsic,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn symbol(self) -> InternedSymbol {
        InternedSymbol::new(self.name())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn class(self) -> BuiltinClass {
        match self {
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Modulus => {
                BuiltinClass::Arithmetic
            }
            Self::LessThan
            | Self::GreaterThan
            | Self::LessThanOrEqualTo
            | Self::GreaterThanOrEqualTo => BuiltinClass::Relational,
            Self::LogicalAnd | Self::LogicalOr => BuiltinClass::Logical,
            Self::Equals | Self::NotEquals => BuiltinClass::Equality,
            Self::Negate => BuiltinClass::Negation,
            Self::LogicalNot => BuiltinClass::LogicalNegation,
            Self::PrintInt | Self::PrintBool | Self::ReadInt => BuiltinClass::Intrinsic,
        }
    }

    pub fn is_intrinsic(self) -> bool {
        self.class() == BuiltinClass::Intrinsic
    }

    /// The fixed signature of this built-in. Equality operators are
    /// polymorphic over Int and Bool and so have none.
    pub fn signature(self) -> Option<FunctionType> {
        use Type::{Bool, Int, Unit};

        let signature = match self.class() {
            BuiltinClass::Arithmetic => FunctionType::new([Int, Int], Int),
            BuiltinClass::Relational => FunctionType::new([Int, Int], Bool),
            BuiltinClass::Logical => FunctionType::new([Bool, Bool], Bool),
            BuiltinClass::Negation => FunctionType::new([Int], Int),
            BuiltinClass::LogicalNegation => FunctionType::new([Bool], Bool),
            BuiltinClass::Equality => return None,
            BuiltinClass::Intrinsic => match self {
                Self::PrintInt => FunctionType::new([Int], Unit),
                Self::PrintBool => FunctionType::new([Bool], Unit),
                _ => FunctionType::new([], Int),
            },
        };

        Some(signature)
    }

    /// The built-in implementing a binary operator (assignment has none)
    pub fn for_binary_operator(kind: BinaryOperatorKind) -> Option<Self> {
        Some(match kind {
            BinaryOperatorKind::Add => Self::Add,
            BinaryOperatorKind::Subtract => Self::Subtract,
            BinaryOperatorKind::Multiply => Self::Multiply,
            BinaryOperatorKind::Divide => Self::Divide,
            BinaryOperatorKind::Modulus => Self::Modulus,
            BinaryOperatorKind::LessThan => Self::LessThan,
            BinaryOperatorKind::GreaterThan => Self::GreaterThan,
            BinaryOperatorKind::LessThanOrEqualTo => Self::LessThanOrEqualTo,
            BinaryOperatorKind::GreaterThanOrEqualTo => Self::GreaterThanOrEqualTo,
            BinaryOperatorKind::Equals => Self::Equals,
            BinaryOperatorKind::NotEquals => Self::NotEquals,
            BinaryOperatorKind::LogicalAnd => Self::LogicalAnd,
            BinaryOperatorKind::LogicalOr => Self::LogicalOr,
            BinaryOperatorKind::Assign => return None,
        })
    }

    pub fn for_unary_operator(kind: UnaryOperatorKind) -> Self {
        match kind {
            UnaryOperatorKind::Negate => Self::Negate,
            UnaryOperatorKind::LogicalNot => Self::LogicalNot,
        }
    }
}

impl core::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
