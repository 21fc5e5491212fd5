use std::{collections::BTreeMap, str::Chars};

use itertools::{PeekNth, peek_nth};
use once_cell::sync::Lazy;
use strum::{EnumString, IntoStaticStr};

use super::{SourceFile, intern::InternedSymbol};
use crate::error::{CompileResult, error_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: InternedSymbol,
    pub location: Location,
}

impl Token {
    /// The token stream is treated as ending in an infinite run of these
    pub fn end(location: Location) -> Self {
        Self {
            kind: TokenKind::End,
            text: InternedSymbol::new(""),
            location,
        }
    }

    pub fn is(&self, text: &str) -> bool {
        self.kind != TokenKind::End && self.text.value() == text
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    IntLiteral,        // 42
    BoolLiteral,       // true
    Identifier,        // print_int
    Keyword(Keyword),  // while
    Operator,          // <=, and, not
    Punctuation,       // , : ;
    Parenthesis,       // ( ) { }
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    If,
    Then,
    Else,
    While,
    Do,
    Var,
    Return,
    Break,
    Continue,
    Fun,
}

/// 1-based position of the first character of a token or node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Table of single char tokens (matched after longer sequences are checked for)
static SINGLE_TOKENS: Lazy<BTreeMap<char, TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        ('(', TokenKind::Parenthesis),
        (')', TokenKind::Parenthesis),
        ('{', TokenKind::Parenthesis),
        ('}', TokenKind::Parenthesis),
        (',', TokenKind::Punctuation),
        (':', TokenKind::Punctuation),
        (';', TokenKind::Punctuation),
        ('+', TokenKind::Operator),
        ('-', TokenKind::Operator),
        ('*', TokenKind::Operator),
        ('/', TokenKind::Operator),
        ('%', TokenKind::Operator),
        ('=', TokenKind::Operator),
        ('<', TokenKind::Operator),
        ('>', TokenKind::Operator),
    ])
});

/// Words which lex as operators rather than identifiers
const WORD_OPERATORS: &[&str] = &["and", "or", "not"];

#[derive(Debug)]
pub struct Lexer<'source> {
    chars: PeekNth<Chars<'source>>,
    line: usize,
    column: usize,
}

/// Splits a source file into tokens. The returned stream always ends with
/// a single [`TokenKind::End`] token.
pub fn tokenize(source: &SourceFile) -> CompileResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }

    tokens.push(Token::end(lexer.location()));

    Ok(tokens)
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source SourceFile) -> Self {
        Self {
            chars: peek_nth(source.contents.chars()),
            line: 1,
            column: 1,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(c)
    }

    fn peek_is(&mut self, n: usize, expected: char) -> bool {
        self.chars.peek_nth(n).is_some_and(|c| *c == expected)
    }

    fn ignore_line(&mut self) {
        while let Some(c) = self.chars.peek().copied() {
            if c == '\n' {
                break;
            }

            self.bump();
        }
    }

    fn ignore_block_comment(&mut self) -> CompileResult<()> {
        let start = self.location();

        // Consume the opening `/*`
        self.bump();
        self.bump();

        loop {
            if self.peek_is(0, '*') && self.peek_is(1, '/') {
                self.bump();
                self.bump();
                return Ok(());
            }

            if self.bump().is_none() {
                return Err(error_at!(Lex, start, "unterminated block comment"));
            }
        }
    }

    fn read_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut text = String::new();

        while let Some(c) = self.chars.peek().copied() {
            if !predicate(c) {
                break;
            }

            text.push(c);
            self.bump();
        }

        text
    }

    // Keyword, identifier, word operator, or boolean literal
    fn read_word(&mut self) -> Token {
        let location = self.location();
        let value = self.read_while(|c| c.is_ascii_alphanumeric() || c == '_');

        let kind = if let Ok(keyword) = value.parse() {
            TokenKind::Keyword(keyword)
        } else if WORD_OPERATORS.contains(&value.as_str()) {
            TokenKind::Operator
        } else {
            match value.as_str() {
                "true" | "false" => TokenKind::BoolLiteral,
                _ => TokenKind::Identifier,
            }
        };

        Token {
            kind,
            text: InternedSymbol::new(&value),
            location,
        }
    }

    fn read_number(&mut self) -> Token {
        let location = self.location();
        let value = self.read_while(|c| c.is_ascii_digit());

        Token {
            kind: TokenKind::IntLiteral,
            text: InternedSymbol::new(&value),
            location,
        }
    }

    fn read_chars(&mut self, count: usize, kind: TokenKind) -> Token {
        let location = self.location();
        let mut text = String::with_capacity(count);

        for _ in 0..count {
            if let Some(c) = self.bump() {
                text.push(c);
            }
        }

        Token {
            kind,
            text: InternedSymbol::new(&text),
            location,
        }
    }

    pub fn next_token(&mut self) -> CompileResult<Option<Token>> {
        while let Some(c) = self.chars.peek().copied() {
            let token = match c {
                // Ignore whitespace
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                // Ignore comments
                '/' if self.peek_is(1, '/') => {
                    self.ignore_line();
                    continue;
                }
                '#' => {
                    self.ignore_line();
                    continue;
                }
                '/' if self.peek_is(1, '*') => {
                    self.ignore_block_comment()?;
                    continue;
                }

                // Integer literals
                n if n.is_ascii_digit() => self.read_number(),

                // Identifiers, keywords, word operators, and boolean literals
                a if a.is_ascii_alphabetic() || a == '_' => self.read_word(),

                // Two character comparison operators (==, !=, <=, >=)
                '=' | '!' | '<' | '>' if self.peek_is(1, '=') => {
                    self.read_chars(2, TokenKind::Operator)
                }

                s if SINGLE_TOKENS.contains_key(&s) => {
                    let kind = SINGLE_TOKENS[&s];
                    self.read_chars(1, kind)
                }
                c => {
                    return Err(error_at!(
                        Lex,
                        self.location(),
                        "unexpected character in stream: `{c}`"
                    ));
                }
            };

            return Ok(Some(token));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests;
