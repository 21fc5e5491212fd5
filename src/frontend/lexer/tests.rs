use super::*;

fn lex(source: &str) -> Vec<Token> {
    tokenize(&SourceFile::from_memory(source)).unwrap()
}

fn texts(source: &str) -> Vec<&'static str> {
    lex(source).iter().map(|t| t.text.value()).collect()
}

#[test]
fn test_basic_expression() {
    let tokens = lex("if  3\nwhile");

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::If));
    assert_eq!(tokens[0].location, Location::new(1, 1));
    assert_eq!(tokens[1].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[1].location, Location::new(1, 5));
    assert_eq!(tokens[2].kind, TokenKind::Keyword(Keyword::While));
    assert_eq!(tokens[2].location, Location::new(2, 1));
    assert_eq!(tokens[3].kind, TokenKind::End);
}

#[test]
fn test_operators() {
    assert_eq!(
        texts("a<=b==c!=d>=e<f>g=h+i-j*k/l%m"),
        vec![
            "a", "<=", "b", "==", "c", "!=", "d", ">=", "e", "<", "f", ">", "g", "=", "h", "+",
            "i", "-", "j", "*", "k", "/", "l", "%", "m", ""
        ]
    );
}

#[test]
fn test_word_classification() {
    let tokens = lex("true false and or not var_1 fun");

    let kinds = tokens.iter().map(|t| t.kind).collect::<Vec<_>>();

    assert_eq!(
        kinds,
        vec![
            TokenKind::BoolLiteral,
            TokenKind::BoolLiteral,
            TokenKind::Operator,
            TokenKind::Operator,
            TokenKind::Operator,
            TokenKind::Identifier,
            TokenKind::Keyword(Keyword::Fun),
            TokenKind::End,
        ]
    );
}

#[test]
fn test_punctuation_and_parenthesis() {
    let tokens = lex("f(a, b): { x; }");

    assert_eq!(tokens[1].kind, TokenKind::Parenthesis);
    assert_eq!(tokens[3].kind, TokenKind::Punctuation);
    assert_eq!(tokens[6].kind, TokenKind::Punctuation);
    assert_eq!(tokens[7].kind, TokenKind::Parenthesis);
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        texts("1 // one\n# two\n/* three\n four */ 2"),
        vec!["1", "2", ""]
    );

    let tokens = lex("/* a\nb */ x");
    assert_eq!(tokens[0].location, Location::new(2, 6));
}

#[test]
fn test_unterminated_block_comment() {
    let error = tokenize(&SourceFile::from_memory("1 /* never closed")).unwrap_err();

    assert_eq!(error.kind, crate::error::CompileErrorKind::Lex);
    assert_eq!(error.location, Some(Location::new(1, 3)));
}

#[test]
fn test_unexpected_character() {
    let error = tokenize(&SourceFile::from_memory("1 +\n  @")).unwrap_err();

    assert_eq!(error.kind, crate::error::CompileErrorKind::Lex);
    assert_eq!(error.location, Some(Location::new(2, 3)));
}
