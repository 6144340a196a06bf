use std::fmt::Display;
use std::rc::Rc;

use crate::decimal::Decimal;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum TokenKind {
    Illegal(Rc<str>),
    Eof,

    Identifier(Rc<str>),
    Number,
    String,

    // Operators
    Assign,
    Declare,
    Plus,
    PlusAssign,
    PlusPlus,
    Minus,
    MinusAssign,
    MinusMinus,
    Asterisk,
    AsteriskAssign,
    Slash,
    SlashAssign,
    Percent,
    Bang,
    Question,

    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    Dot,
    Range,
    Comma,
    Colon,
    SemiColon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    And,
    Break,
    Case,
    Class,
    Continue,
    Default,
    Else,
    Extends,
    False,
    For,
    Function,
    If,
    Import,
    In,
    Null,
    Or,
    Return,
    Switch,
    This,
    Trait,
    True,
    Use,
    While,
}

pub fn keywords(identifier: &str) -> Option<TokenKind> {
    match identifier {
        "and" => Some(TokenKind::And),
        "break" => Some(TokenKind::Break),
        "case" => Some(TokenKind::Case),
        "class" => Some(TokenKind::Class),
        "continue" => Some(TokenKind::Continue),
        "default" => Some(TokenKind::Default),
        "else" => Some(TokenKind::Else),
        "extends" => Some(TokenKind::Extends),
        "false" => Some(TokenKind::False),
        "for" => Some(TokenKind::For),
        "function" => Some(TokenKind::Function),
        "if" => Some(TokenKind::If),
        "import" => Some(TokenKind::Import),
        "in" => Some(TokenKind::In),
        "null" => Some(TokenKind::Null),
        "or" => Some(TokenKind::Or),
        "return" => Some(TokenKind::Return),
        "switch" => Some(TokenKind::Switch),
        "this" => Some(TokenKind::This),
        "trait" => Some(TokenKind::Trait),
        "true" => Some(TokenKind::True),
        "use" => Some(TokenKind::Use),
        "while" => Some(TokenKind::While),
        _ => None,
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TokenKind::*;
        let text = match self {
            Illegal(message) => return write!(f, "illegal token ({message})"),
            Identifier(name) => return write!(f, "{name}"),
            Eof => "end of input",
            Number => "number",
            String => "string",
            Assign => "=",
            Declare => ":=",
            Plus => "+",
            PlusAssign => "+=",
            PlusPlus => "++",
            Minus => "-",
            MinusAssign => "-=",
            MinusMinus => "--",
            Asterisk => "*",
            AsteriskAssign => "*=",
            Slash => "/",
            SlashAssign => "/=",
            Percent => "%",
            Bang => "!",
            Question => "?",
            Equal => "==",
            NotEqual => "!=",
            LessThan => "<",
            LessThanOrEqual => "<=",
            GreaterThan => ">",
            GreaterThanOrEqual => ">=",
            Dot => ".",
            Range => "..",
            Comma => ",",
            Colon => ":",
            SemiColon => ";",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            And => "and",
            Break => "break",
            Case => "case",
            Class => "class",
            Continue => "continue",
            Default => "default",
            Else => "else",
            Extends => "extends",
            False => "false",
            For => "for",
            Function => "function",
            If => "if",
            Import => "import",
            In => "in",
            Null => "null",
            Or => "or",
            Return => "return",
            Switch => "switch",
            This => "this",
            Trait => "trait",
            True => "true",
            Use => "use",
            While => "while",
        };
        write!(f, "{text}")
    }
}

/// Where a token starts in its source file. Lines and columns are 1-based.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub file: Rc<str>,
}

impl Position {
    pub fn new(line: usize, column: usize, file: Rc<str>) -> Self {
        Position { line, column, file }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.line, self.column, self.file)
    }
}

/// Decoded value of a literal token.
#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Number(Decimal),
    String(Rc<str>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Rc<str>,
    pub literal: Option<Literal>,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<Rc<str>>, position: Position) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            literal: None,
            position,
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }
}
