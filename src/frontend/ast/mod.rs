//! Syntax tree produced by the parser.
//!
//! Equality on nodes is structural: source locations and inferred types are
//! ignored, so trees built by hand compare equal to parsed ones.

use once_cell::unsync::OnceCell;
use strum::EnumString;

use super::{intern::InternedSymbol, lexer::Location};
use crate::middle::ty::Type;

#[derive(Debug)]
pub struct Module {
    pub location: Location,
    /// `fun` definitions, in source order
    pub functions: Vec<FunctionDefinition>,
    /// Block of the top-level statements, which make up the body of `main`
    pub body: Expression,
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.functions == other.functions && self.body == other.body
    }
}

#[derive(Debug)]
pub struct FunctionDefinition {
    pub location: Location,
    pub name: Identifier,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: TypeAnnotation,
    /// Always a block expression
    pub body: Expression,
}

impl PartialEq for FunctionDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameters == other.parameters
            && self.return_type == other.return_type
            && self.body == other.body
    }
}

#[derive(Debug)]
pub struct FunctionParameter {
    pub location: Location,
    pub name: Identifier,
    pub ty: TypeAnnotation,
}

impl PartialEq for FunctionParameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty
    }
}

/// A written type name such as the `Int` in `var x: Int = 1`
#[derive(Debug, Clone, Copy)]
pub struct TypeAnnotation {
    pub location: Location,
    pub kind: TypeAnnotationKind,
}

impl PartialEq for TypeAnnotation {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum TypeAnnotationKind {
    Int,
    Bool,
    Unit,
}

impl TypeAnnotation {
    pub fn to_type(self) -> Type {
        match self.kind {
            TypeAnnotationKind::Int => Type::Int,
            TypeAnnotationKind::Bool => Type::Bool,
            TypeAnnotationKind::Unit => Type::Unit,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Identifier {
    pub location: Location,
    pub symbol: InternedSymbol,
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

#[derive(Debug)]
pub struct Expression {
    pub location: Location,
    /// Filled in exactly once by the type checker
    pub ty: OnceCell<Type>,
    pub kind: ExpressionKind,
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Expression {
    pub fn new(location: Location, kind: ExpressionKind) -> Self {
        Self {
            location,
            ty: OnceCell::new(),
            kind,
        }
    }

    /// The unit literal the parser inserts after a block's trailing `;`
    pub fn unit(location: Location) -> Self {
        Self::new(location, ExpressionKind::Literal(Literal::Unit))
    }

    /// Whether evaluation of this expression always leaves the function
    pub fn is_return(&self) -> bool {
        matches!(self.kind, ExpressionKind::Return(_))
    }
}

#[derive(Debug, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    Identifier(Identifier),
    Binary {
        lhs: Box<Expression>,
        operator: BinaryOperator,
        rhs: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Option<Box<Expression>>,
    },
    While {
        condition: Box<Expression>,
        body: Box<Expression>,
    },
    Block(Block),
    VarDeclaration {
        name: Identifier,
        ty: Option<TypeAnnotation>,
        initializer: Box<Expression>,
    },
    FunctionCall {
        callee: Identifier,
        arguments: Vec<Expression>,
    },
    LoopControl(LoopControl),
    Return(Option<Box<Expression>>),
}

#[derive(Debug, PartialEq)]
pub struct Block {
    pub statements: Vec<Expression>,
}

impl Block {
    /// The statement whose value becomes the value of the block
    pub fn result(&self) -> Option<&Expression> {
        self.statements.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Break,
    Continue,
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryOperator {
    pub location: Location,
    pub kind: BinaryOperatorKind,
}

impl PartialEq for BinaryOperator {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperatorKind {
    Add,                  // +
    Subtract,             // -
    Multiply,             // *
    Divide,               // /
    Modulus,              // %
    Equals,               // ==
    NotEquals,            // !=
    LessThan,             // <
    LessThanOrEqualTo,    // <=
    GreaterThan,          // >
    GreaterThanOrEqualTo, // >=
    LogicalAnd,           // and
    LogicalOr,            // or
    Assign,               // =
}

impl BinaryOperatorKind {
    pub fn from_token_text(text: &str) -> Option<Self> {
        Some(match text {
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "%" => Self::Modulus,
            "==" => Self::Equals,
            "!=" => Self::NotEquals,
            "<" => Self::LessThan,
            "<=" => Self::LessThanOrEqualTo,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanOrEqualTo,
            "and" => Self::LogicalAnd,
            "or" => Self::LogicalOr,
            "=" => Self::Assign,
            _ => return None,
        })
    }

    pub fn is_short_circuiting(self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryOperator {
    pub location: Location,
    pub kind: UnaryOperatorKind,
}

impl PartialEq for UnaryOperator {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperatorKind {
    Negate,     // -
    LogicalNot, // not
}
