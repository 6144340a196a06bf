pub mod error;
pub mod expressions;
pub mod statements;

use crate::ast::{Identifier, Program};
use crate::scanner::Scanner;
use crate::token::{Position, Token, TokenKind};
pub use error::ParseError;
use statements::parse_statement;

pub struct Parser<'a> {
    pub iter: std::iter::Peekable<Scanner<'a>>,
    eof: Token,
}

impl<'a> Parser<'a> {
    pub fn new(scanner: Scanner<'a>) -> Self {
        let iter = scanner.peekable();
        let eof = Token::new(TokenKind::Eof, "", Position::new(0, 0, "".into()));
        Self { iter, eof }
    }

    /// The next token without consuming it. Stays on `Eof` once reached.
    pub(crate) fn peek(&mut self) -> &Token {
        self.iter.peek().unwrap_or(&self.eof)
    }

    pub(crate) fn peek_is(&mut self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    /// Consumes the next token. `Eof` is never consumed, so parsing past the
    /// end keeps yielding it.
    pub(crate) fn next_token(&mut self) -> Token {
        if self.peek_is(&TokenKind::Eof) {
            return self.peek().clone();
        }
        self.iter.next().unwrap_or_else(|| self.eof.clone())
    }

    pub(crate) fn next_if(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.peek_is(kind) {
            Some(self.next_token())
        } else {
            None
        }
    }

    pub(crate) fn parse_ident(&mut self) -> Result<Identifier, ParseError> {
        let token = self.next_token();
        match &token.kind {
            TokenKind::Identifier(name) => Ok(Identifier {
                name: name.clone(),
                token,
            }),
            _ => Err(ParseError::unexpected_other(
                error::Expected::Identifier,
                token,
            )),
        }
    }

    pub(crate) fn expect_token(&mut self, token_kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.next_token();
        if token.kind == token_kind {
            Ok(token)
        } else {
            Err(ParseError::unexpected_token(token_kind, token))
        }
    }

    /// Skips the rest of a statement that failed to parse: up to the next
    /// `;` or the first token on a new line outside any braces.
    fn synchronize(&mut self, failed_at: &Token) {
        let mut depth: i32 = 0;
        let mut line = failed_at.position.line;
        loop {
            let token = self.peek();
            let (kind, token_line) = (token.kind.clone(), token.position.line);
            match kind {
                TokenKind::Eof => return,
                TokenKind::SemiColon if depth <= 0 => {
                    self.next_token();
                    return;
                }
                _ if depth <= 0 && token_line > line => return,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            line = line.max(self.next_token().position.line);
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let mut statements = Vec::new();

        let mut errors = Vec::new();

        loop {
            while self.next_if(&TokenKind::SemiColon).is_some() {}
            if self.peek_is(&TokenKind::Eof) {
                break;
            }

            match parse_statement(self) {
                Ok(statement) => {
                    statements.push(statement);
                }
                Err(err) => {
                    let failed_at = err.token().clone();
                    errors.push(err);
                    self.synchronize(&failed_at);
                }
            }
        }
        if errors.is_empty() {
            Ok(Program { statements })
        } else {
            Err(errors)
        }
    }
}

/// Scans and parses `input` in one go.
pub fn parse(input: &str, file: &str) -> Result<Program, Vec<ParseError>> {
    Parser::new(Scanner::new(input, file)).parse_program()
}
