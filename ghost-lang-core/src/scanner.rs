use std::collections::HashSet;
use std::rc::Rc;

use crate::decimal::Decimal;
use crate::token::{keywords, Literal, Position, Token, TokenKind};

/// Lazily turns source text into tokens, ending with a single `Eof` token.
#[derive(Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    file: Rc<str>,
    namespaces: Option<&'a HashSet<Rc<str>>>,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str, file: impl Into<Rc<str>>) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
            column: 1,
            file: file.into(),
            namespaces: None,
            finished: false,
        }
    }

    /// Dotted names such as `math.abs` found in `namespaces` are scanned as a
    /// single identifier instead of `math`, `.`, `abs`.
    pub fn with_namespaces(mut self, namespaces: &'a HashSet<Rc<str>>) -> Self {
        self.namespaces = Some(namespaces);
        self
    }

    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.offset..].chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn next_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.file.clone())
    }

    fn is_letter(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_'
    }

    fn skip_line(&mut self) {
        while self.peek().is_some_and(|ch| ch != '\n') {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self, position: &Position) {
        // opening "/*"
        self.advance();
        self.advance();
        loop {
            match self.advance() {
                Some('*') if self.next_if('/') => return,
                Some(_) => {}
                None => {
                    tracing::warn!(%position, "unterminated block comment");
                    return;
                }
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.advance();
                }
                (Some('#'), _) | (Some('/'), Some('/')) => self.skip_line(),
                (Some('/'), Some('*')) => {
                    let position = self.current_position();
                    self.skip_block_comment(&position);
                }
                _ => return,
            }
        }
    }

    fn token(&self, kind: TokenKind, start: usize, position: Position) -> Token {
        Token::new(kind, &self.input[start..self.offset], position)
    }

    fn illegal(&self, message: String, start: usize, position: Position) -> Token {
        tracing::warn!(%position, "{message}");
        self.token(TokenKind::Illegal(message.into()), start, position)
    }

    fn read_identifier(&mut self, start: usize, position: Position) -> Token {
        while self
            .peek()
            .is_some_and(|ch| Self::is_letter(ch) || ch.is_ascii_digit())
        {
            self.advance();
        }

        if let Some(namespaces) = self.namespaces {
            if let Some(token) = self.read_dotted_identifier(namespaces, start, &position) {
                return token;
            }
        }

        let identifier = &self.input[start..self.offset];
        let kind = keywords(identifier).unwrap_or_else(|| TokenKind::Identifier(identifier.into()));
        self.token(kind, start, position)
    }

    /// Extends the identifier just read over `.segment` parts, keeping the
    /// longest dotted prefix that is a registered name. Backtracks when no
    /// prefix is registered.
    fn read_dotted_identifier(
        &mut self,
        namespaces: &HashSet<Rc<str>>,
        start: usize,
        position: &Position,
    ) -> Option<Token> {
        let checkpoint = (self.offset, self.column);
        let mut segment_ends = Vec::new();

        while self.peek() == Some('.') && self.peek_second().is_some_and(Self::is_letter) {
            self.advance();
            while self
                .peek()
                .is_some_and(|ch| Self::is_letter(ch) || ch.is_ascii_digit())
            {
                self.advance();
            }
            segment_ends.push((self.offset, self.column));
        }

        let found = segment_ends
            .into_iter()
            .rev()
            .find(|(end, _)| namespaces.contains(&self.input[start..*end]));

        let (offset, column) = found.unwrap_or(checkpoint);
        self.offset = offset;
        self.column = column;

        found.map(|_| {
            let name = &self.input[start..self.offset];
            self.token(TokenKind::Identifier(name.into()), start, position.clone())
        })
    }

    fn read_digits(&mut self) {
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
        }
    }

    fn read_number(&mut self, start: usize, position: Position) -> Token {
        self.read_digits();

        if self.peek() == Some('.') && self.peek_second().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
            self.read_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_second(), Some('-' | '+'));
            let rest = &self.input[self.offset + 1..];
            let digit_follows = if signed {
                rest[1..].starts_with(|ch: char| ch.is_ascii_digit())
            } else {
                rest.starts_with(|ch: char| ch.is_ascii_digit())
            };
            if digit_follows {
                self.advance();
                if signed {
                    self.advance();
                }
                self.read_digits();
            }
        }

        let lexeme = &self.input[start..self.offset];
        match lexeme.parse::<Decimal>() {
            Ok(value) => self
                .token(TokenKind::Number, start, position)
                .with_literal(Literal::Number(value)),
            Err(error) => self.illegal(error.to_string(), start, position),
        }
    }

    fn read_string(&mut self, quote: char, start: usize, position: Position) -> Token {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return self.illegal("unterminated string".to_string(), start, position),
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some(ch) => value.push(ch),
                    None => {
                        return self.illegal("unterminated string".to_string(), start, position)
                    }
                },
                Some(ch) if ch == quote => break,
                Some(ch) => value.push(ch),
            }
        }

        self.token(TokenKind::String, start, position)
            .with_literal(Literal::String(value.into()))
    }

    /// `single` unless the next character is `second`, in which case `double`.
    fn either(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.next_if(second) {
            double
        } else {
            single
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        self.skip_whitespace_and_comments();

        let start = self.offset;
        let position = self.current_position();

        let Some(ch) = self.advance() else {
            self.finished = true;
            return Some(self.token(TokenKind::Eof, start, position));
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::SemiColon,
            '?' => TokenKind::Question,
            '%' => TokenKind::Percent,
            ':' => self.either('=', TokenKind::Declare, TokenKind::Colon),
            '.' => self.either('.', TokenKind::Range, TokenKind::Dot),
            '*' => self.either('=', TokenKind::AsteriskAssign, TokenKind::Asterisk),
            '/' => self.either('=', TokenKind::SlashAssign, TokenKind::Slash),
            '!' => self.either('=', TokenKind::NotEqual, TokenKind::Bang),
            '=' => self.either('=', TokenKind::Equal, TokenKind::Assign),
            '<' => self.either('=', TokenKind::LessThanOrEqual, TokenKind::LessThan),
            '>' => self.either('=', TokenKind::GreaterThanOrEqual, TokenKind::GreaterThan),
            '+' => {
                if self.next_if('+') {
                    TokenKind::PlusPlus
                } else {
                    self.either('=', TokenKind::PlusAssign, TokenKind::Plus)
                }
            }
            '-' => {
                if self.next_if('-') {
                    TokenKind::MinusMinus
                } else {
                    self.either('=', TokenKind::MinusAssign, TokenKind::Minus)
                }
            }
            '"' | '\'' => return Some(self.read_string(ch, start, position)),
            ch if ch.is_ascii_digit() => return Some(self.read_number(start, position)),
            ch if Self::is_letter(ch) => return Some(self.read_identifier(start, position)),
            ch => {
                return Some(self.illegal(
                    format!("unexpected character '{ch}'"),
                    start,
                    position,
                ))
            }
        };

        Some(self.token(kind, start, position))
    }
}
