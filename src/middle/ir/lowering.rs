use hashbrown::HashSet;

use crate::{
    error::{CompileResult, error_at},
    frontend::{
        ast::{self, BinaryOperatorKind, Expression, ExpressionKind, Literal, LoopControl},
        intern::InternedSymbol,
        lexer::Location,
    },
    index::{Index, IndexCounter},
    middle::{
        ENTRY_POINT,
        builtin::Builtin,
        ir::{self, Instruction, InstructionKind, IrVar, LabelId, VarId},
        scope::{Binding, ScopeChain},
        ty::Type,
    },
};

/// Lowers a type checked module to IR. Variable and label numbering is shared
/// by all functions so no variable is reused across functions.
pub fn lower_module(module: &ast::Module) -> CompileResult<ir::Module> {
    let mut context = LoweringContext::new();

    for function in &module.functions {
        context.declare_function(function)?;
    }

    let mut functions = Vec::with_capacity(module.functions.len() + 1);

    for function in &module.functions {
        functions.push(context.lower_function(function)?);
    }

    functions.push(context.lower_entry_point(&module.body)?);

    Ok(ir::Module { functions })
}

#[derive(Debug, Clone, Copy)]
struct LoopLabels {
    start: LabelId,
    end: LabelId,
}

#[derive(Debug)]
struct LoweringContext {
    variables: IndexCounter<VarId>,
    labels: IndexCounter<LabelId>,
    scopes: ScopeChain<Binding<IrVar>>,

    // State of the function being lowered
    instructions: Vec<Instruction>,
    loops: Vec<LoopLabels>,
    /// Variables owned by a declared variable or parameter
    locals: HashSet<IrVar>,
}

impl LoweringContext {
    fn new() -> Self {
        Self {
            variables: IndexCounter::starting_at(VarId::new(1)),
            labels: IndexCounter::starting_at(LabelId::new(1)),
            scopes: ScopeChain::with_builtins(),
            instructions: Vec::new(),
            loops: Vec::new(),
            locals: HashSet::new(),
        }
    }

    fn create_variable(&mut self) -> IrVar {
        IrVar::Temporary(self.variables.next())
    }

    fn create_label(&mut self) -> LabelId {
        self.labels.next()
    }

    fn emit(&mut self, location: Location, kind: InstructionKind) {
        self.instructions.push(Instruction { location, kind });
    }

    fn finish_function(
        &mut self,
        name: InternedSymbol,
        parameters: Vec<IrVar>,
        result: IrVar,
    ) -> ir::Function {
        self.loops.clear();
        self.locals.clear();

        ir::Function {
            name,
            parameters,
            instructions: std::mem::take(&mut self.instructions),
            result,
        }
    }

    fn declare_function(&mut self, function: &ast::FunctionDefinition) -> CompileResult<()> {
        let name = function.name;

        self.scopes
            .declare(name.symbol, Binding::Value(IrVar::Named(name.symbol)))
            .map_err(|_| {
                error_at!(
                    Scope,
                    name.location,
                    "function `{}` is already declared",
                    name.symbol
                )
            })
    }

    fn lower_function(&mut self, function: &ast::FunctionDefinition) -> CompileResult<ir::Function> {
        self.scopes.push_scope();

        let mut parameters = Vec::with_capacity(function.parameters.len());

        for parameter in &function.parameters {
            let variable = self.create_variable();

            self.declare_local(parameter.name, variable)?;
            parameters.push(variable);
        }

        let result = self.lower_expression(&function.body)?;

        let ends_in_return = match &function.body.kind {
            ExpressionKind::Block(block) => block.result().is_some_and(Expression::is_return),
            _ => function.body.is_return(),
        };

        if !ends_in_return {
            self.emit(function.body.location, InstructionKind::Return(result));
        }

        self.scopes.pop_scope();

        Ok(self.finish_function(function.name.symbol, parameters, result))
    }

    /// The implicit `main` runs the top-level statements and prints their
    /// value when it is an Int or a Bool
    fn lower_entry_point(&mut self, body: &Expression) -> CompileResult<ir::Function> {
        let result = self.lower_expression(body)?;

        let printer = match self.type_of(body)? {
            Type::Int => Some(Builtin::PrintInt),
            Type::Bool => Some(Builtin::PrintBool),
            _ => None,
        };

        if let Some(printer) = printer {
            let function = self.resolve_builtin(printer, body.location)?;
            let destination = self.create_variable();

            self.emit(
                body.location,
                InstructionKind::Call {
                    function,
                    arguments: vec![result],
                    destination,
                },
            );
        }

        Ok(self.finish_function(InternedSymbol::new(ENTRY_POINT), Vec::new(), result))
    }

    fn type_of<'e>(&self, expression: &'e Expression) -> CompileResult<&'e Type> {
        expression.ty.get().ok_or_else(|| {
            error_at!(
                Ir,
                expression.location,
                "expression has no type; the module must be type checked before lowering"
            )
        })
    }

    fn declare_local(&mut self, name: ast::Identifier, variable: IrVar) -> CompileResult<()> {
        self.scopes
            .declare(name.symbol, Binding::Value(variable))
            .map_err(|_| {
                error_at!(
                    Scope,
                    name.location,
                    "`{}` is already declared in this block",
                    name.symbol
                )
            })?;

        self.locals.insert(variable);

        Ok(())
    }

    fn resolve(&self, symbol: InternedSymbol, location: Location) -> CompileResult<IrVar> {
        match self.scopes.resolve(symbol) {
            Some(Binding::Value(variable)) => Ok(*variable),
            Some(Binding::Builtin(builtin)) => Ok(IrVar::Named(builtin.symbol())),
            None => Err(error_at!(Scope, location, "`{symbol}` is not declared")),
        }
    }

    fn resolve_builtin(&self, builtin: Builtin, location: Location) -> CompileResult<IrVar> {
        self.resolve(builtin.symbol(), location)
    }

    fn lower_expression(&mut self, expression: &Expression) -> CompileResult<IrVar> {
        let location = expression.location;

        match &expression.kind {
            ExpressionKind::Literal(Literal::Int(value)) => {
                let destination = self.create_variable();

                self.emit(
                    location,
                    InstructionKind::LoadIntConst {
                        value: *value,
                        destination,
                    },
                );

                Ok(destination)
            }
            ExpressionKind::Literal(Literal::Bool(value)) => {
                let destination = self.create_variable();

                self.emit(
                    location,
                    InstructionKind::LoadBoolConst {
                        value: *value,
                        destination,
                    },
                );

                Ok(destination)
            }
            ExpressionKind::Literal(Literal::Unit) => Ok(IrVar::Unit),
            ExpressionKind::Identifier(identifier) => {
                self.resolve(identifier.symbol, identifier.location)
            }
            ExpressionKind::Binary { lhs, operator, rhs } => match operator.kind {
                BinaryOperatorKind::Assign => self.lower_assignment(lhs, rhs),
                kind if kind.is_short_circuiting() => {
                    self.lower_short_circuit(location, kind, lhs, rhs)
                }
                kind => {
                    let Some(builtin) = Builtin::for_binary_operator(kind) else {
                        return Err(error_at!(
                            Ir,
                            operator.location,
                            "unsupported construct: operator {kind:?}"
                        ));
                    };

                    let function = self.resolve_builtin(builtin, operator.location)?;
                    let lhs = self.lower_expression(lhs)?;
                    let rhs = self.lower_expression(rhs)?;
                    let destination = self.create_variable();

                    self.emit(
                        location,
                        InstructionKind::Call {
                            function,
                            arguments: vec![lhs, rhs],
                            destination,
                        },
                    );

                    Ok(destination)
                }
            },
            ExpressionKind::Unary { operator, operand } => {
                let builtin = Builtin::for_unary_operator(operator.kind);
                let function = self.resolve_builtin(builtin, operator.location)?;
                let operand = self.lower_expression(operand)?;
                let destination = self.create_variable();

                self.emit(
                    location,
                    InstructionKind::Call {
                        function,
                        arguments: vec![operand],
                        destination,
                    },
                );

                Ok(destination)
            }
            ExpressionKind::If {
                condition,
                then_branch,
                else_branch: None,
            } => {
                let then_label = self.create_label();
                let end_label = self.create_label();

                let condition = self.lower_expression(condition)?;

                self.emit(
                    location,
                    InstructionKind::CondJump {
                        condition,
                        then_label,
                        else_label: end_label,
                    },
                );
                self.emit(location, InstructionKind::Label(then_label));
                self.lower_expression(then_branch)?;
                self.emit(location, InstructionKind::Label(end_label));

                Ok(IrVar::Unit)
            }
            ExpressionKind::If {
                condition,
                then_branch,
                else_branch: Some(else_branch),
            } => self.lower_if_else(expression, condition, then_branch, else_branch),
            ExpressionKind::While { condition, body } => {
                let start_label = self.create_label();
                let body_label = self.create_label();
                let end_label = self.create_label();

                self.emit(location, InstructionKind::Label(start_label));

                let condition = self.lower_expression(condition)?;

                self.emit(
                    location,
                    InstructionKind::CondJump {
                        condition,
                        then_label: body_label,
                        else_label: end_label,
                    },
                );
                self.emit(location, InstructionKind::Label(body_label));

                self.loops.push(LoopLabels {
                    start: start_label,
                    end: end_label,
                });
                let body = self.lower_expression(body);
                self.loops.pop();
                body?;

                self.emit(location, InstructionKind::Jump(start_label));
                self.emit(location, InstructionKind::Label(end_label));

                Ok(IrVar::Unit)
            }
            ExpressionKind::Block(block) => {
                self.scopes.push_scope();

                let mut result = IrVar::Unit;

                for statement in &block.statements {
                    result = self.lower_expression(statement)?;
                }

                self.scopes.pop_scope();

                Ok(result)
            }
            ExpressionKind::VarDeclaration {
                name, initializer, ..
            } => {
                let value = self.lower_expression(initializer)?;
                let variable = self.create_variable();

                self.emit(
                    location,
                    InstructionKind::Copy {
                        source: value,
                        destination: variable,
                    },
                );
                self.declare_local(*name, variable)?;

                Ok(IrVar::Unit)
            }
            ExpressionKind::FunctionCall { callee, arguments } => {
                let function = self.resolve(callee.symbol, callee.location)?;

                let arguments = arguments
                    .iter()
                    .map(|argument| self.lower_expression(argument))
                    .collect::<CompileResult<Vec<_>>>()?;

                let destination = self.create_variable();

                self.emit(
                    location,
                    InstructionKind::Call {
                        function,
                        arguments,
                        destination,
                    },
                );

                Ok(destination)
            }
            ExpressionKind::LoopControl(control) => {
                let Some(labels) = self.loops.last().copied() else {
                    let keyword = match control {
                        LoopControl::Break => "break",
                        LoopControl::Continue => "continue",
                    };

                    return Err(error_at!(Ir, location, "`{keyword}` outside of a loop"));
                };

                let target = match control {
                    LoopControl::Break => labels.end,
                    LoopControl::Continue => labels.start,
                };

                self.emit(location, InstructionKind::Jump(target));

                Ok(IrVar::Unit)
            }
            ExpressionKind::Return(value) => {
                let value = match value {
                    Some(value) => self.lower_expression(value)?,
                    None => IrVar::Unit,
                };

                self.emit(location, InstructionKind::Return(value));

                Ok(IrVar::Unit)
            }
        }
    }

    fn lower_assignment(&mut self, lhs: &Expression, rhs: &Expression) -> CompileResult<IrVar> {
        let ExpressionKind::Identifier(target) = &lhs.kind else {
            return Err(error_at!(
                Ir,
                lhs.location,
                "unsupported construct: assignment to something other than a variable"
            ));
        };

        let destination = self.resolve(target.symbol, target.location)?;
        let source = self.lower_expression(rhs)?;

        self.emit(
            lhs.location,
            InstructionKind::Copy {
                source,
                destination,
            },
        );

        Ok(source)
    }

    /// `and` only evaluates its right side when the left is true, `or` only
    /// when it is false
    fn lower_short_circuit(
        &mut self,
        location: Location,
        kind: BinaryOperatorKind,
        lhs: &Expression,
        rhs: &Expression,
    ) -> CompileResult<IrVar> {
        let right_label = self.create_label();
        let skip_label = self.create_label();
        let end_label = self.create_label();

        let lhs = self.lower_expression(lhs)?;

        let (then_label, else_label, skipped_value) = match kind {
            BinaryOperatorKind::LogicalAnd => (right_label, skip_label, false),
            _ => (skip_label, right_label, true),
        };

        self.emit(
            location,
            InstructionKind::CondJump {
                condition: lhs,
                then_label,
                else_label,
            },
        );

        self.emit(location, InstructionKind::Label(right_label));
        let rhs = self.lower_expression(rhs)?;
        let result = self.create_variable();
        self.emit(
            location,
            InstructionKind::Copy {
                source: rhs,
                destination: result,
            },
        );
        self.emit(location, InstructionKind::Jump(end_label));

        self.emit(location, InstructionKind::Label(skip_label));
        self.emit(
            location,
            InstructionKind::LoadBoolConst {
                value: skipped_value,
                destination: result,
            },
        );
        self.emit(location, InstructionKind::Jump(end_label));

        self.emit(location, InstructionKind::Label(end_label));

        Ok(result)
    }

    fn lower_if_else(
        &mut self,
        expression: &Expression,
        condition: &Expression,
        then_branch: &Expression,
        else_branch: &Expression,
    ) -> CompileResult<IrVar> {
        let location = expression.location;
        let is_unit = self.type_of(expression)?.is_unit();

        let then_label = self.create_label();
        let else_label = self.create_label();
        let end_label = self.create_label();

        let condition = self.lower_expression(condition)?;

        self.emit(
            location,
            InstructionKind::CondJump {
                condition,
                then_label,
                else_label,
            },
        );

        self.emit(location, InstructionKind::Label(then_label));
        let then_value = self.lower_expression(then_branch)?;

        if is_unit {
            self.emit(location, InstructionKind::Jump(end_label));
            self.emit(location, InstructionKind::Label(else_label));
            self.lower_expression(else_branch)?;
            self.emit(location, InstructionKind::Label(end_label));

            return Ok(IrVar::Unit);
        }

        // The else branch writes its value into the then branch's variable,
        // which must not be one a program variable lives in
        let result = match then_value {
            IrVar::Temporary(_) if !self.locals.contains(&then_value) => then_value,
            _ => {
                let result = self.create_variable();

                self.emit(
                    location,
                    InstructionKind::Copy {
                        source: then_value,
                        destination: result,
                    },
                );

                result
            }
        };

        self.emit(location, InstructionKind::Jump(end_label));

        self.emit(location, InstructionKind::Label(else_label));
        let else_value = self.lower_expression(else_branch)?;
        self.emit(
            location,
            InstructionKind::Copy {
                source: else_value,
                destination: result,
            },
        );

        self.emit(location, InstructionKind::Label(end_label));

        Ok(result)
    }
}
