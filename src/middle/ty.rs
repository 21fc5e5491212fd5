use itertools::Itertools;

/// A type in the language. Types are compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// 1, -42
    Int,
    /// true, false
    Bool,
    /// The value of statements, loops, and `if` without `else`
    Unit,
    /// (Int, Bool) => Int
    Function(Box<FunctionType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

impl FunctionType {
    pub fn new(parameters: impl Into<Vec<Type>>, return_type: Type) -> Self {
        Self {
            parameters: parameters.into(),
            return_type,
        }
    }
}

impl Type {
    pub fn function(parameters: impl Into<Vec<Type>>, return_type: Type) -> Self {
        Self::Function(Box::new(FunctionType::new(parameters, return_type)))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Type::Unit)
    }

    /// Int and Bool are the only types `==` and `!=` accept
    pub fn supports_equality(&self) -> bool {
        matches!(self, Type::Int | Type::Bool)
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "Int"),
            Self::Bool => write!(f, "Bool"),
            Self::Unit => write!(f, "Unit"),
            Self::Function(function) => write!(
                f,
                "({}) => {}",
                function.parameters.iter().join(", "),
                function.return_type
            ),
        }
    }
}
