use super::{
    SourceFile,
    ast::{
        BinaryOperator, BinaryOperatorKind, Block, Expression, ExpressionKind,
        FunctionDefinition, FunctionParameter, Identifier, Literal, LoopControl, Module,
        TypeAnnotation, UnaryOperator, UnaryOperatorKind,
    },
    lexer::{Keyword, Location, Token, TokenKind, tokenize},
};
use crate::error::{CompileError, CompileResult, error_at};

/// Tokenizes and parses a whole source file
pub fn parse_source(source: &SourceFile) -> CompileResult<Module> {
    Parser::new(tokenize(source)?).parse_module()
}

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

/// What closes a statement sequence
#[derive(Debug, Clone, Copy)]
enum Terminator {
    CloseBrace,
    End,
}

impl Terminator {
    fn describe(self) -> &'static str {
        match self {
            Self::CloseBrace => "`}`",
            Self::End => "end of input",
        }
    }
}

const LOGICAL_OR_OPERATORS: &[&str] = &["or"];
const LOGICAL_AND_OPERATORS: &[&str] = &["and"];
const EQUALITY_OPERATORS: &[&str] = &["==", "!="];
const COMPARISON_OPERATORS: &[&str] = &["<", ">", "<=", ">="];
const ADDITIVE_OPERATORS: &[&str] = &["+", "-"];
const MULTIPLICATIVE_OPERATORS: &[&str] = &["*", "/", "%"];

fn describe_token(token: Token) -> String {
    match token.kind {
        TokenKind::End => "end of input".to_owned(),
        _ => format!("`{}`", token.text),
    }
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Past the end of the stream this keeps returning an end token
    fn peek(&self) -> Token {
        match self.tokens.get(self.position) {
            Some(token) => *token,
            None => {
                let location = self
                    .tokens
                    .last()
                    .map(|token| token.location)
                    .unwrap_or(Location::new(1, 1));

                Token::end(location)
            }
        }
    }

    fn next(&mut self) -> Token {
        let token = self.peek();
        self.position += 1;
        token
    }

    fn previous_was_closing_brace(&self) -> bool {
        self.position
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .is_some_and(|token| token.is("}"))
    }

    fn at(&self, terminator: Terminator) -> bool {
        match terminator {
            Terminator::CloseBrace => self.peek().is("}"),
            Terminator::End => self.peek().kind == TokenKind::End,
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let token = self.peek();

        error_at!(
            Parse,
            token.location,
            "expected {expected} but found {}",
            describe_token(token)
        )
    }

    fn expect(&mut self, text: &str) -> CompileResult<Token> {
        if !self.peek().is(text) {
            return Err(self.unexpected(&format!("`{text}`")));
        }

        Ok(self.next())
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> CompileResult<Token> {
        if !self.peek().is_keyword(keyword) {
            let text: &'static str = keyword.into();
            return Err(self.unexpected(&format!("`{text}`")));
        }

        Ok(self.next())
    }

    pub fn parse_module(mut self) -> CompileResult<Module> {
        let location = self.peek().location;
        let mut functions = Vec::new();

        let statements = self.parse_statements(Terminator::End, Some(&mut functions))?;

        Ok(Module {
            location,
            functions,
            body: Expression::new(location, ExpressionKind::Block(Block { statements })),
        })
    }

    /// Parses a single expression which must span the whole token stream
    pub fn parse_standalone_expression(mut self) -> CompileResult<Expression> {
        let expression = self.parse_expression()?;

        if self.peek().kind != TokenKind::End {
            return Err(self.unexpected("end of input"));
        }

        Ok(expression)
    }

    /// Statements up to (not including) the terminator. Function definitions
    /// are only accepted, and collected, when `functions` is given.
    fn parse_statements(
        &mut self,
        terminator: Terminator,
        mut functions: Option<&mut Vec<FunctionDefinition>>,
    ) -> CompileResult<Vec<Expression>> {
        let mut statements = Vec::new();
        // Location of a `;` ending the last statement; function definitions
        // in between do not change what the block evaluates to
        let mut trailing_semicolon = None;

        loop {
            if self.at(terminator) {
                break;
            }

            if let Some(functions) = functions.as_deref_mut() {
                if self.peek().is_keyword(Keyword::Fun) {
                    functions.push(self.parse_function_definition()?);
                    continue;
                }
            }

            let statement = self.parse_statement()?;
            let is_return = statement.is_return();
            statements.push(statement);
            trailing_semicolon = None;

            if self.peek().is(";") {
                let semicolon = self.next();

                if !is_return {
                    trailing_semicolon = Some(semicolon.location);
                }
            } else if !self.at(terminator)
                && !self.previous_was_closing_brace()
                && !(functions.is_some() && self.peek().is_keyword(Keyword::Fun))
            {
                return Err(self.unexpected(&format!("`;` or {}", terminator.describe())));
            }

            if is_return && !self.at(terminator) {
                return Err(error_at!(
                    Parse,
                    self.peek().location,
                    "`return` must be the last statement in its block"
                ));
            }
        }

        if let Some(location) = trailing_semicolon {
            statements.push(Expression::unit(location));
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> CompileResult<Expression> {
        if self.peek().is_keyword(Keyword::Return) {
            return self.parse_return();
        }

        self.parse_expression()
    }

    /// "return" [expression]
    fn parse_return(&mut self) -> CompileResult<Expression> {
        let keyword = self.expect_keyword(Keyword::Return)?;

        let next = self.peek();
        let value = if next.is(";") || next.is("}") || next.kind == TokenKind::End {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        Ok(Expression::new(keyword.location, ExpressionKind::Return(value)))
    }

    /// fun name(param: Type, ...): ReturnType { body }
    fn parse_function_definition(&mut self) -> CompileResult<FunctionDefinition> {
        let keyword = self.expect_keyword(Keyword::Fun)?;
        let name = self.parse_identifier()?;

        self.expect("(")?;

        let mut parameters = Vec::new();

        if !self.peek().is(")") {
            loop {
                let name = self.parse_identifier()?;
                self.expect(":")?;
                let ty = self.parse_type_annotation()?;

                parameters.push(FunctionParameter {
                    location: name.location,
                    name,
                    ty,
                });

                if !self.peek().is(",") {
                    break;
                }

                self.next();
            }
        }

        self.expect(")")?;
        self.expect(":")?;

        let return_type = self.parse_type_annotation()?;
        let body = self.parse_block()?;

        Ok(FunctionDefinition {
            location: keyword.location,
            name,
            parameters,
            return_type,
            body,
        })
    }

    fn parse_identifier(&mut self) -> CompileResult<Identifier> {
        let token = self.peek();

        if token.kind != TokenKind::Identifier {
            return Err(self.unexpected("an identifier"));
        }

        self.next();

        Ok(Identifier {
            location: token.location,
            symbol: token.text,
        })
    }

    fn parse_type_annotation(&mut self) -> CompileResult<TypeAnnotation> {
        let token = self.peek();

        if token.kind != TokenKind::Identifier {
            return Err(self.unexpected("a type name"));
        }

        let Ok(kind) = token.text.value().parse() else {
            return Err(error_at!(
                Parse,
                token.location,
                "unknown type `{}` (expected `Int`, `Bool`, or `Unit`)",
                token.text
            ));
        };

        self.next();

        Ok(TypeAnnotation {
            location: token.location,
            kind,
        })
    }

    fn parse_block(&mut self) -> CompileResult<Expression> {
        let open = self.expect("{")?;
        let statements = self.parse_statements(Terminator::CloseBrace, None)?;
        self.expect("}")?;

        Ok(Expression::new(
            open.location,
            ExpressionKind::Block(Block { statements }),
        ))
    }

    pub fn parse_expression(&mut self) -> CompileResult<Expression> {
        self.parse_assignment_expression()
    }

    /// Right associative: `a = b = c` is `a = (b = c)`
    fn parse_assignment_expression(&mut self) -> CompileResult<Expression> {
        let lhs = self.parse_logical_or_expression()?;

        if !self.peek().is("=") {
            return Ok(lhs);
        }

        let operator = self.next();
        let rhs = self.parse_assignment_expression()?;

        Ok(Expression::new(
            lhs.location,
            ExpressionKind::Binary {
                lhs: Box::new(lhs),
                operator: BinaryOperator {
                    location: operator.location,
                    kind: BinaryOperatorKind::Assign,
                },
                rhs: Box::new(rhs),
            },
        ))
    }

    fn parse_logical_or_expression(&mut self) -> CompileResult<Expression> {
        self.parse_left_associative(LOGICAL_OR_OPERATORS, Self::parse_logical_and_expression)
    }

    fn parse_logical_and_expression(&mut self) -> CompileResult<Expression> {
        self.parse_left_associative(LOGICAL_AND_OPERATORS, Self::parse_equality_expression)
    }

    fn parse_equality_expression(&mut self) -> CompileResult<Expression> {
        self.parse_left_associative(EQUALITY_OPERATORS, Self::parse_comparison_expression)
    }

    fn parse_comparison_expression(&mut self) -> CompileResult<Expression> {
        self.parse_left_associative(COMPARISON_OPERATORS, Self::parse_additive_expression)
    }

    fn parse_additive_expression(&mut self) -> CompileResult<Expression> {
        self.parse_left_associative(ADDITIVE_OPERATORS, Self::parse_multiplicative_expression)
    }

    fn parse_multiplicative_expression(&mut self) -> CompileResult<Expression> {
        self.parse_left_associative(MULTIPLICATIVE_OPERATORS, Self::parse_unary_expression)
    }

    fn parse_left_associative(
        &mut self,
        operators: &[&str],
        parse_operand: fn(&mut Self) -> CompileResult<Expression>,
    ) -> CompileResult<Expression> {
        let mut expression = parse_operand(self)?;

        loop {
            let token = self.peek();

            if token.kind != TokenKind::Operator || !operators.contains(&token.text.value()) {
                break;
            }

            let Some(kind) = BinaryOperatorKind::from_token_text(token.text.value()) else {
                break;
            };

            self.next();

            let rhs = parse_operand(self)?;
            let location = expression.location;

            expression = Expression::new(
                location,
                ExpressionKind::Binary {
                    lhs: Box::new(expression),
                    operator: BinaryOperator {
                        location: token.location,
                        kind,
                    },
                    rhs: Box::new(rhs),
                },
            );
        }

        Ok(expression)
    }

    fn parse_unary_expression(&mut self) -> CompileResult<Expression> {
        let token = self.peek();

        let kind = if token.is("-") {
            UnaryOperatorKind::Negate
        } else if token.is("not") {
            UnaryOperatorKind::LogicalNot
        } else {
            return self.parse_factor();
        };

        self.next();

        let operand = self.parse_unary_expression()?;

        Ok(Expression::new(
            token.location,
            ExpressionKind::Unary {
                operator: UnaryOperator {
                    location: token.location,
                    kind,
                },
                operand: Box::new(operand),
            },
        ))
    }

    fn parse_factor(&mut self) -> CompileResult<Expression> {
        let token = self.peek();

        match token.kind {
            TokenKind::IntLiteral => self.parse_int_literal(),
            TokenKind::BoolLiteral => {
                self.next();

                Ok(Expression::new(
                    token.location,
                    ExpressionKind::Literal(Literal::Bool(token.is("true"))),
                ))
            }
            TokenKind::Identifier => self.parse_identifier_or_call(),
            TokenKind::Keyword(Keyword::If) => self.parse_if_expression(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_expression(),
            TokenKind::Keyword(Keyword::Var) => self.parse_var_declaration(),
            TokenKind::Keyword(keyword @ (Keyword::Break | Keyword::Continue)) => {
                self.next();

                let control = match keyword {
                    Keyword::Break => LoopControl::Break,
                    _ => LoopControl::Continue,
                };

                Ok(Expression::new(
                    token.location,
                    ExpressionKind::LoopControl(control),
                ))
            }
            TokenKind::Parenthesis if token.is("(") => {
                self.next();
                let expression = self.parse_expression()?;
                self.expect(")")?;
                Ok(expression)
            }
            TokenKind::Parenthesis if token.is("{") => self.parse_block(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_int_literal(&mut self) -> CompileResult<Expression> {
        let token = self.next();

        let Ok(value) = token.text.value().parse::<i64>() else {
            return Err(error_at!(
                Parse,
                token.location,
                "integer literal `{}` does not fit in 64 bits",
                token.text
            ));
        };

        Ok(Expression::new(
            token.location,
            ExpressionKind::Literal(Literal::Int(value)),
        ))
    }

    fn parse_identifier_or_call(&mut self) -> CompileResult<Expression> {
        let identifier = self.parse_identifier()?;

        if !self.peek().is("(") {
            return Ok(Expression::new(
                identifier.location,
                ExpressionKind::Identifier(identifier),
            ));
        }

        self.next();

        let mut arguments = Vec::new();

        if !self.peek().is(")") {
            loop {
                arguments.push(self.parse_expression()?);

                if !self.peek().is(",") {
                    break;
                }

                self.next();
            }
        }

        self.expect(")")?;

        Ok(Expression::new(
            identifier.location,
            ExpressionKind::FunctionCall {
                callee: identifier,
                arguments,
            },
        ))
    }

    /// "if" expression "then" expression ["else" expression]
    fn parse_if_expression(&mut self) -> CompileResult<Expression> {
        let keyword = self.expect_keyword(Keyword::If)?;
        let condition = self.parse_expression()?;

        self.expect_keyword(Keyword::Then)?;
        let then_branch = self.parse_expression()?;

        let else_branch = if self.peek().is_keyword(Keyword::Else) {
            self.next();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        Ok(Expression::new(
            keyword.location,
            ExpressionKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
        ))
    }

    /// "while" expression "do" expression
    fn parse_while_expression(&mut self) -> CompileResult<Expression> {
        let keyword = self.expect_keyword(Keyword::While)?;
        let condition = self.parse_expression()?;

        self.expect_keyword(Keyword::Do)?;
        let body = self.parse_expression()?;

        Ok(Expression::new(
            keyword.location,
            ExpressionKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
        ))
    }

    /// "var" name [":" Type] "=" expression
    fn parse_var_declaration(&mut self) -> CompileResult<Expression> {
        let keyword = self.expect_keyword(Keyword::Var)?;
        let name = self.parse_identifier()?;

        let ty = if self.peek().is(":") {
            self.next();
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        self.expect("=")?;
        let initializer = self.parse_expression()?;

        Ok(Expression::new(
            keyword.location,
            ExpressionKind::VarDeclaration {
                name,
                ty,
                initializer: Box::new(initializer),
            },
        ))
    }
}

#[cfg(test)]
mod tests;
