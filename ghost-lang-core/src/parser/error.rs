use std::fmt::Display;
use std::rc::Rc;

use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{}: syntax error: expected {expected}, got {}", .got.position, describe(.got))]
    UnexpectedToken { expected: Expected, got: Token },
    #[error("{}: syntax error: {message}", .token.position)]
    IllegalToken { message: Rc<str>, token: Token },
    #[error("{}: syntax error: invalid literal {}", .0.position, describe(.0))]
    InvalidLiteral(Token),
    #[error("{}: syntax error: cannot assign to this expression", .0.position)]
    InvalidAssignmentTarget(Token),
    #[error("{}: syntax error: {} can only be applied to an identifier", .0.position, describe(.0))]
    InvalidPostfixTarget(Token),
    #[error("{}: syntax error: switch statement has more than one default case", .0.position)]
    MultipleDefaults(Token),
    #[error("{}: syntax error: class bodies may only contain named functions and use statements, got {}", .0.position, describe(.0))]
    InvalidClassMember(Token),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Token(TokenKind),
    Identifier,
    Expression,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "'{}'", kind),
            Expected::Identifier => write!(f, "an identifier"),
            Expected::Expression => write!(f, "an expression"),
        }
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        _ => format!("'{}'", token.lexeme),
    }
}

impl ParseError {
    pub fn unexpected_token(expected: TokenKind, got: Token) -> ParseError {
        ParseError::UnexpectedToken {
            expected: Expected::Token(expected),
            got,
        }
    }

    pub fn unexpected_other(expected: Expected, got: Token) -> ParseError {
        ParseError::UnexpectedToken { expected, got }
    }

    /// The token the error was reported at.
    pub fn token(&self) -> &Token {
        match self {
            ParseError::UnexpectedToken { got, .. } => got,
            ParseError::IllegalToken { token, .. } => token,
            ParseError::InvalidLiteral(token)
            | ParseError::InvalidAssignmentTarget(token)
            | ParseError::InvalidPostfixTarget(token)
            | ParseError::MultipleDefaults(token)
            | ParseError::InvalidClassMember(token) => token,
        }
    }
}
