use super::*;
use crate::{
    error::CompileErrorKind,
    frontend::{
        ast::{Block, TypeAnnotationKind},
        intern::InternedSymbol,
    },
};

fn parse(source: &str) -> Module {
    parse_source(&SourceFile::from_memory(source)).unwrap()
}

fn parse_expression(source: &str) -> Expression {
    let tokens = tokenize(&SourceFile::from_memory(source)).unwrap();

    Parser::new(tokens).parse_standalone_expression().unwrap()
}

fn parse_error(source: &str) -> CompileError {
    parse_source(&SourceFile::from_memory(source)).unwrap_err()
}

fn expression(kind: ExpressionKind) -> Expression {
    Expression::new(Location::default(), kind)
}

fn int(value: i64) -> Expression {
    expression(ExpressionKind::Literal(Literal::Int(value)))
}

fn boolean(value: bool) -> Expression {
    expression(ExpressionKind::Literal(Literal::Bool(value)))
}

fn unit() -> Expression {
    expression(ExpressionKind::Literal(Literal::Unit))
}

fn identifier(name: &str) -> Identifier {
    Identifier {
        location: Location::default(),
        symbol: InternedSymbol::new(name),
    }
}

fn name(name: &str) -> Expression {
    expression(ExpressionKind::Identifier(identifier(name)))
}

fn binary(lhs: Expression, kind: BinaryOperatorKind, rhs: Expression) -> Expression {
    expression(ExpressionKind::Binary {
        lhs: Box::new(lhs),
        operator: BinaryOperator {
            location: Location::default(),
            kind,
        },
        rhs: Box::new(rhs),
    })
}

fn unary(kind: UnaryOperatorKind, operand: Expression) -> Expression {
    expression(ExpressionKind::Unary {
        operator: UnaryOperator {
            location: Location::default(),
            kind,
        },
        operand: Box::new(operand),
    })
}

fn block(statements: Vec<Expression>) -> Expression {
    expression(ExpressionKind::Block(Block { statements }))
}

fn call(callee: &str, arguments: Vec<Expression>) -> Expression {
    expression(ExpressionKind::FunctionCall {
        callee: identifier(callee),
        arguments,
    })
}

fn annotation(kind: TypeAnnotationKind) -> TypeAnnotation {
    TypeAnnotation {
        location: Location::default(),
        kind,
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    use BinaryOperatorKind::{Add, Multiply};

    assert_eq!(
        parse_expression("1+2*3"),
        binary(int(1), Add, binary(int(2), Multiply, int(3)))
    );
    assert_eq!(
        parse_expression("1*2+3"),
        binary(binary(int(1), Multiply, int(2)), Add, int(3))
    );
}

#[test]
fn test_binary_operators_are_left_associative() {
    use BinaryOperatorKind::{Divide, Subtract};

    assert_eq!(
        parse_expression("1 - 2 - 3"),
        binary(binary(int(1), Subtract, int(2)), Subtract, int(3))
    );
    assert_eq!(
        parse_expression("8 / 4 / 2"),
        binary(binary(int(8), Divide, int(4)), Divide, int(2))
    );
}

#[test]
fn test_assignment_is_right_associative() {
    use BinaryOperatorKind::Assign;

    assert_eq!(
        parse_expression("a = b = c"),
        binary(name("a"), Assign, binary(name("b"), Assign, name("c")))
    );
}

#[test]
fn test_logical_and_comparison_precedence() {
    use BinaryOperatorKind::*;

    assert_eq!(
        parse_expression("a or b and c"),
        binary(name("a"), LogicalOr, binary(name("b"), LogicalAnd, name("c")))
    );
    assert_eq!(
        parse_expression("a < b == c >= d"),
        binary(
            binary(name("a"), LessThan, name("b")),
            Equals,
            binary(name("c"), GreaterThanOrEqualTo, name("d"))
        )
    );
    assert_eq!(
        parse_expression("x = 1 + 2 < 4 or y"),
        binary(
            name("x"),
            Assign,
            binary(
                binary(binary(int(1), Add, int(2)), LessThan, int(4)),
                LogicalOr,
                name("y")
            )
        )
    );
}

#[test]
fn test_unary_operators() {
    assert_eq!(
        parse_expression("not not x"),
        unary(
            UnaryOperatorKind::LogicalNot,
            unary(UnaryOperatorKind::LogicalNot, name("x"))
        )
    );
    assert_eq!(
        parse_expression("-x * 2"),
        binary(
            unary(UnaryOperatorKind::Negate, name("x")),
            BinaryOperatorKind::Multiply,
            int(2)
        )
    );
}

#[test]
fn test_parentheses_override_precedence() {
    use BinaryOperatorKind::{Add, Multiply};

    assert_eq!(
        parse_expression("(1 + 2) * 3"),
        binary(binary(int(1), Add, int(2)), Multiply, int(3))
    );
}

#[test]
fn test_if_expressions() {
    assert_eq!(
        parse_expression("if a then b else c"),
        expression(ExpressionKind::If {
            condition: Box::new(name("a")),
            then_branch: Box::new(name("b")),
            else_branch: Some(Box::new(name("c"))),
        })
    );

    // The dangling else belongs to the innermost if
    assert_eq!(
        parse_expression("if a then if b then c else d"),
        expression(ExpressionKind::If {
            condition: Box::new(name("a")),
            then_branch: Box::new(expression(ExpressionKind::If {
                condition: Box::new(name("b")),
                then_branch: Box::new(name("c")),
                else_branch: Some(Box::new(name("d"))),
            })),
            else_branch: None,
        })
    );

    assert_eq!(
        parse_expression("1 + if true then 2 else 3"),
        binary(
            int(1),
            BinaryOperatorKind::Add,
            expression(ExpressionKind::If {
                condition: Box::new(boolean(true)),
                then_branch: Box::new(int(2)),
                else_branch: Some(Box::new(int(3))),
            })
        )
    );
}

#[test]
fn test_while_with_loop_control() {
    assert_eq!(
        parse_expression("while true do { break; continue }"),
        expression(ExpressionKind::While {
            condition: Box::new(boolean(true)),
            body: Box::new(block(vec![
                expression(ExpressionKind::LoopControl(LoopControl::Break)),
                expression(ExpressionKind::LoopControl(LoopControl::Continue)),
            ])),
        })
    );
}

#[test]
fn test_var_declarations() {
    assert_eq!(
        parse_expression("var x = 1"),
        expression(ExpressionKind::VarDeclaration {
            name: identifier("x"),
            ty: None,
            initializer: Box::new(int(1)),
        })
    );
    assert_eq!(
        parse_expression("var flag: Bool = true"),
        expression(ExpressionKind::VarDeclaration {
            name: identifier("flag"),
            ty: Some(annotation(TypeAnnotationKind::Bool)),
            initializer: Box::new(boolean(true)),
        })
    );
}

#[test]
fn test_function_calls() {
    assert_eq!(
        parse_expression("f(1, g(), x + 1)"),
        call(
            "f",
            vec![
                int(1),
                call("g", vec![]),
                binary(name("x"), BinaryOperatorKind::Add, int(1))
            ]
        )
    );
}

#[test]
fn test_block_semicolons() {
    assert_eq!(
        parse_expression("{ a; b }"),
        block(vec![name("a"), name("b")])
    );
    assert_eq!(
        parse_expression("{ a; b; }"),
        block(vec![name("a"), name("b"), unit()])
    );
    assert_eq!(parse_expression("{}"), block(vec![]));
    assert_eq!(
        parse_expression("{ { a } { b } }"),
        block(vec![block(vec![name("a")]), block(vec![name("b")])])
    );
    assert_eq!(
        parse_expression("{ if true then { a } b }"),
        block(vec![
            expression(ExpressionKind::If {
                condition: Box::new(boolean(true)),
                then_branch: Box::new(block(vec![name("a")])),
                else_branch: None,
            }),
            name("b"),
        ])
    );
}

#[test]
fn test_missing_semicolon_between_statements() {
    let error = parse_error("{ a b }");
    assert_eq!(error.kind, CompileErrorKind::Parse);
    assert_eq!(error.location, Some(Location::new(1, 5)));

    let error = parse_error("{ if true then { a } b c }");
    assert_eq!(error.kind, CompileErrorKind::Parse);
    assert_eq!(error.location, Some(Location::new(1, 24)));
}

#[test]
fn test_return_must_end_its_block() {
    let module = parse("fun f(): Int { return 1; }");
    let ExpressionKind::Block(body) = &module.functions[0].body.kind else {
        panic!("function body should be a block");
    };

    // No implicit unit after a trailing `return ...;`
    assert_eq!(body.statements.len(), 1);
    assert!(body.statements[0].is_return());

    let error = parse_error("fun f(): Int { return 1; 2 }");
    assert_eq!(error.kind, CompileErrorKind::Parse);
    assert_eq!(error.location, Some(Location::new(1, 26)));
}

#[test]
fn test_module_with_functions() {
    let module = parse(indoc::indoc! {"
        fun square(x: Int): Int {
            return x * x
        }
        fun noop(): Unit { }
        square(3)
    "});

    assert_eq!(module.functions.len(), 2);

    let square = &module.functions[0];
    assert_eq!(square.name, identifier("square"));
    assert_eq!(square.location, Location::new(1, 1));
    assert_eq!(
        square.parameters,
        vec![FunctionParameter {
            location: Location::default(),
            name: identifier("x"),
            ty: annotation(TypeAnnotationKind::Int),
        }]
    );
    assert_eq!(square.return_type, annotation(TypeAnnotationKind::Int));
    assert_eq!(
        square.body,
        block(vec![expression(ExpressionKind::Return(Some(Box::new(
            binary(name("x"), BinaryOperatorKind::Multiply, name("x"))
        ))))])
    );

    assert_eq!(module.functions[1].parameters, vec![]);
    assert_eq!(module.body, block(vec![call("square", vec![int(3)])]));
}

#[test]
fn test_top_level_statements() {
    assert_eq!(parse("").body, block(vec![]));
    assert_eq!(
        parse("var x = 1; x").body,
        block(vec![
            expression(ExpressionKind::VarDeclaration {
                name: identifier("x"),
                ty: None,
                initializer: Box::new(int(1)),
            }),
            name("x"),
        ])
    );
    assert_eq!(parse("1;").body, block(vec![int(1), unit()]));
}

#[test]
fn test_trailing_semicolon_before_function_definitions() {
    let module = parse("1; fun f(): Int { 2 }");

    assert_eq!(module.functions.len(), 1);
    assert_eq!(module.body, block(vec![int(1), unit()]));

    assert_eq!(
        parse("1; fun f(): Int { 2 } 3").body,
        block(vec![int(1), int(3)])
    );
}

#[test]
fn test_locations() {
    let expression = parse_expression("1 +\n  foo");

    assert_eq!(expression.location, Location::new(1, 1));

    let ExpressionKind::Binary { operator, rhs, .. } = &expression.kind else {
        panic!("expected a binary expression");
    };

    assert_eq!(operator.location, Location::new(1, 3));
    assert_eq!(rhs.location, Location::new(2, 3));
}

#[test]
fn test_parse_errors() {
    let error = parse_error("1 +");
    assert_eq!(error.kind, CompileErrorKind::Parse);
    assert_eq!(error.location, Some(Location::new(1, 4)));
    assert!(error.message.contains("expected an expression"));

    let error = parse_error("(1 + 2");
    assert_eq!(error.kind, CompileErrorKind::Parse);
    assert!(error.message.contains("`)`"));

    let error = parse_error("var x: Foo = 1");
    assert_eq!(error.kind, CompileErrorKind::Parse);
    assert_eq!(error.location, Some(Location::new(1, 8)));

    let error = parse_error("if true 1");
    assert_eq!(error.kind, CompileErrorKind::Parse);
    assert!(error.message.contains("`then`"));

    let error = parse_error("99999999999999999999");
    assert_eq!(error.kind, CompileErrorKind::Parse);
}
