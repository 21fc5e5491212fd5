use itertools::Itertools;

use crate::{
    error::{CompileResult, error_at},
    frontend::{
        ast::{
            BinaryOperatorKind, Block, Expression, ExpressionKind, FunctionDefinition, Identifier,
            Literal, Module,
        },
        lexer::Location,
    },
    middle::{
        ENTRY_POINT,
        builtin::{Builtin, BuiltinClass},
        scope::{Binding, ScopeChain},
        ty::{FunctionType, Type},
    },
};

/// Type checks a module, annotating every expression in it with its type.
/// Returns the type of the top-level statements.
pub fn type_check_module(module: &Module) -> CompileResult<Type> {
    TypeChecker::new().type_check_module(module)
}

#[derive(Debug)]
pub struct TypeChecker {
    scopes: ScopeChain<Binding<Type>>,
    /// Declared return type of the function being checked (`None` while
    /// checking top-level statements)
    return_type: Option<Type>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            scopes: ScopeChain::with_builtins(),
            return_type: None,
        }
    }

    pub fn type_check_module(mut self, module: &Module) -> CompileResult<Type> {
        // Signatures go into the root frame before any body is checked, so
        // functions may call each other regardless of definition order
        for function in &module.functions {
            self.declare_function(function)?;
        }

        for function in &module.functions {
            self.type_check_function(function)?;
        }

        self.return_type = None;
        self.type_check_expression(&module.body)
    }

    fn declare_function(&mut self, function: &FunctionDefinition) -> CompileResult<()> {
        let name = function.name;

        if name.symbol.value() == ENTRY_POINT {
            return Err(error_at!(
                Scope,
                name.location,
                "`{ENTRY_POINT}` is reserved for the top-level statements"
            ));
        }

        if let Some(Binding::Builtin(builtin)) = self.scopes.resolve(name.symbol) {
            return Err(error_at!(
                Scope,
                name.location,
                "`{builtin}` is a built-in and cannot be redefined"
            ));
        }

        let ty = Type::function(
            function
                .parameters
                .iter()
                .map(|parameter| parameter.ty.to_type())
                .collect_vec(),
            function.return_type.to_type(),
        );

        self.scopes
            .declare(name.symbol, Binding::Value(ty))
            .map_err(|_| {
                error_at!(
                    Scope,
                    name.location,
                    "function `{}` is already declared",
                    name.symbol
                )
            })
    }

    fn type_check_function(&mut self, function: &FunctionDefinition) -> CompileResult<()> {
        let return_type = function.return_type.to_type();

        self.scopes.push_scope();

        for parameter in &function.parameters {
            self.scopes
                .declare(parameter.name.symbol, Binding::Value(parameter.ty.to_type()))
                .map_err(|_| {
                    error_at!(
                        Scope,
                        parameter.location,
                        "parameter `{}` is declared more than once",
                        parameter.name.symbol
                    )
                })?;
        }

        self.return_type = Some(return_type.clone());

        let body_type = self.type_check_expression(&function.body)?;

        self.return_type = None;
        self.scopes.pop_scope();

        if body_type != return_type {
            return Err(error_at!(
                Type,
                function.body.location,
                "function `{}` is declared to return `{return_type}` but its body has type `{body_type}`",
                function.name.symbol
            ));
        }

        Ok(())
    }

    /// Records the type of an expression. Checking an already annotated tree
    /// again must arrive at the same types.
    fn annotate(&self, expression: &Expression, ty: Type) -> CompileResult<Type> {
        match expression.ty.get() {
            Some(existing) if *existing != ty => Err(error_at!(
                Type,
                expression.location,
                "expression was previously inferred as `{existing}` but is now `{ty}`"
            )),
            Some(_) => Ok(ty),
            None => {
                let _ = expression.ty.set(ty.clone());
                Ok(ty)
            }
        }
    }

    pub fn type_check_expression(&mut self, expression: &Expression) -> CompileResult<Type> {
        let ty = match &expression.kind {
            ExpressionKind::Literal(literal) => match literal {
                Literal::Int(_) => Type::Int,
                Literal::Bool(_) => Type::Bool,
                Literal::Unit => Type::Unit,
            },
            ExpressionKind::Identifier(identifier) => self.type_check_identifier(identifier)?,
            ExpressionKind::Binary { lhs, operator, rhs } => {
                if operator.kind == BinaryOperatorKind::Assign {
                    self.type_check_assignment(expression, lhs, rhs)?
                } else {
                    self.type_check_binary(expression, operator.kind, lhs, rhs)?
                }
            }
            ExpressionKind::Unary { operator, operand } => {
                let builtin = Builtin::for_unary_operator(operator.kind);
                let builtin = self.lookup_operator(builtin, operator.location)?;
                let operand_type = self.type_check_expression(operand)?;

                self.type_check_operator_call(builtin, expression.location, &[operand_type])?
            }
            ExpressionKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expect_condition(condition)?;

                let then_type = self.type_check_expression(then_branch)?;

                match else_branch {
                    Some(else_branch) => {
                        let else_type = self.type_check_expression(else_branch)?;

                        if then_type != else_type {
                            return Err(error_at!(
                                Type,
                                expression.location,
                                "`if` branches have different types: `{then_type}` and `{else_type}`"
                            ));
                        }

                        then_type
                    }
                    None => Type::Unit,
                }
            }
            ExpressionKind::While { condition, body } => {
                self.expect_condition(condition)?;
                self.type_check_expression(body)?;

                Type::Unit
            }
            ExpressionKind::Block(block) => self.type_check_block(block)?,
            ExpressionKind::VarDeclaration {
                name,
                ty,
                initializer,
            } => {
                let initializer_type = self.type_check_expression(initializer)?;

                if let Some(annotation) = ty {
                    let declared = annotation.to_type();

                    if declared != initializer_type {
                        return Err(error_at!(
                            Type,
                            expression.location,
                            "variable `{}` is declared as `{declared}` but initialized with `{initializer_type}`",
                            name.symbol
                        ));
                    }
                }

                self.scopes
                    .declare(name.symbol, Binding::Value(initializer_type))
                    .map_err(|_| {
                        error_at!(
                            Scope,
                            name.location,
                            "`{}` is already declared in this block",
                            name.symbol
                        )
                    })?;

                Type::Unit
            }
            ExpressionKind::FunctionCall { callee, arguments } => {
                self.type_check_call(callee, arguments)?
            }
            ExpressionKind::LoopControl(_) => Type::Unit,
            ExpressionKind::Return(value) => {
                let Some(return_type) = self.return_type.clone() else {
                    return Err(error_at!(
                        Type,
                        expression.location,
                        "`return` is only allowed inside a function"
                    ));
                };

                let value_type = match value {
                    Some(value) => self.type_check_expression(value)?,
                    None => Type::Unit,
                };

                if value_type != return_type {
                    return Err(error_at!(
                        Type,
                        expression.location,
                        "returning `{value_type}` from a function declared to return `{return_type}`"
                    ));
                }

                // Typed as the function's return type so a returning branch
                // matches its sibling
                return_type
            }
        };

        self.annotate(expression, ty)
    }

    fn type_check_block(&mut self, block: &Block) -> CompileResult<Type> {
        self.scopes.push_scope();

        let mut ty = Type::Unit;

        for statement in &block.statements {
            ty = self.type_check_expression(statement)?;
        }

        self.scopes.pop_scope();

        Ok(ty)
    }

    fn type_check_identifier(&mut self, identifier: &Identifier) -> CompileResult<Type> {
        match self.scopes.resolve(identifier.symbol) {
            None => Err(error_at!(
                Scope,
                identifier.location,
                "`{}` is not declared",
                identifier.symbol
            )),
            Some(Binding::Builtin(builtin)) => Err(error_at!(
                Type,
                identifier.location,
                "built-in `{builtin}` can only be called"
            )),
            Some(Binding::Value(Type::Function(_))) => Err(error_at!(
                Type,
                identifier.location,
                "function `{}` can only be called",
                identifier.symbol
            )),
            Some(Binding::Value(ty)) => Ok(ty.clone()),
        }
    }

    fn type_check_assignment(
        &mut self,
        expression: &Expression,
        lhs: &Expression,
        rhs: &Expression,
    ) -> CompileResult<Type> {
        if !matches!(lhs.kind, ExpressionKind::Identifier(_)) {
            return Err(error_at!(
                Type,
                lhs.location,
                "the left side of `=` must be a variable"
            ));
        }

        let lhs_type = self.type_check_expression(lhs)?;
        let rhs_type = self.type_check_expression(rhs)?;

        if lhs_type != rhs_type {
            return Err(error_at!(
                Type,
                expression.location,
                "cannot assign `{rhs_type}` to a variable of type `{lhs_type}`"
            ));
        }

        Ok(lhs_type)
    }

    fn type_check_binary(
        &mut self,
        expression: &Expression,
        kind: BinaryOperatorKind,
        lhs: &Expression,
        rhs: &Expression,
    ) -> CompileResult<Type> {
        let Some(builtin) = Builtin::for_binary_operator(kind) else {
            return Err(error_at!(
                Type,
                expression.location,
                "operator {kind:?} has no built-in implementation"
            ));
        };

        let builtin = self.lookup_operator(builtin, expression.location)?;

        let lhs_type = self.type_check_expression(lhs)?;
        let rhs_type = self.type_check_expression(rhs)?;

        self.type_check_operator_call(builtin, expression.location, &[lhs_type, rhs_type])
    }

    /// Operators are bound in the root frame like any other name
    fn lookup_operator(&self, builtin: Builtin, location: Location) -> CompileResult<Builtin> {
        match self.scopes.resolve(builtin.symbol()) {
            Some(Binding::Builtin(builtin)) => Ok(*builtin),
            _ => Err(error_at!(
                Scope,
                location,
                "operator `{builtin}` is not bound to a built-in"
            )),
        }
    }

    fn type_check_operator_call(
        &self,
        builtin: Builtin,
        location: Location,
        operand_types: &[Type],
    ) -> CompileResult<Type> {
        if builtin.class() == BuiltinClass::Equality {
            let [lhs, rhs] = operand_types else {
                return Err(error_at!(
                    Type,
                    location,
                    "`{builtin}` takes two operands"
                ));
            };

            if lhs != rhs || !lhs.supports_equality() {
                return Err(error_at!(
                    Type,
                    location,
                    "`{builtin}` needs two operands of the same type (Int or Bool) but found `{lhs}` and `{rhs}`"
                ));
            }

            return Ok(Type::Bool);
        }

        let Some(signature) = builtin.signature() else {
            return Err(error_at!(
                Type,
                location,
                "`{builtin}` has no fixed signature"
            ));
        };

        if signature.parameters != operand_types {
            return Err(error_at!(
                Type,
                location,
                "`{builtin}` expects ({}) but found ({})",
                signature.parameters.iter().join(", "),
                operand_types.iter().join(", ")
            ));
        }

        Ok(signature.return_type)
    }

    fn type_check_call(
        &mut self,
        callee: &Identifier,
        arguments: &[Expression],
    ) -> CompileResult<Type> {
        let signature: FunctionType = match self.scopes.resolve(callee.symbol) {
            None => {
                return Err(error_at!(
                    Scope,
                    callee.location,
                    "`{}` is not declared",
                    callee.symbol
                ));
            }
            Some(Binding::Builtin(builtin)) => match builtin.signature() {
                Some(signature) => signature,
                None => {
                    return Err(error_at!(
                        Type,
                        callee.location,
                        "`{builtin}` cannot be called by name"
                    ));
                }
            },
            Some(Binding::Value(Type::Function(function))) => (**function).clone(),
            Some(Binding::Value(ty)) => {
                return Err(error_at!(
                    Type,
                    callee.location,
                    "`{}` has type `{ty}` and is not a function",
                    callee.symbol
                ));
            }
        };

        if signature.parameters.len() != arguments.len() {
            return Err(error_at!(
                Type,
                callee.location,
                "`{}` takes {} argument(s) but {} were given",
                callee.symbol,
                signature.parameters.len(),
                arguments.len()
            ));
        }

        for (argument, expected) in arguments.iter().zip(&signature.parameters) {
            let found = self.type_check_expression(argument)?;

            if found != *expected {
                return Err(error_at!(
                    Type,
                    argument.location,
                    "expected an argument of type `{expected}` but found `{found}`"
                ));
            }
        }

        Ok(signature.return_type)
    }

    fn expect_condition(&mut self, condition: &Expression) -> CompileResult<()> {
        let ty = self.type_check_expression(condition)?;

        if ty != Type::Bool {
            return Err(error_at!(
                Type,
                condition.location,
                "condition must be `Bool` but found `{ty}`"
            ));
        }

        Ok(())
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}
