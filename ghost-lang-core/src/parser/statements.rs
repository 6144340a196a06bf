use crate::ast::{
    AssignStatement, AssignTarget, CompoundStatement, Expression, InfixOperationKind,
    ReturnStatement, Statement,
};
use crate::parser::expressions::{parse_expression, Precedence};
use crate::parser::{ParseError, Parser};
use crate::token::{Token, TokenKind};

pub fn parse_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    match parser.peek().kind {
        TokenKind::Return => Ok(Statement::Return(parse_return_statement(parser)?)),
        TokenKind::Break => Ok(Statement::Break(parser.next_token())),
        TokenKind::Continue => Ok(Statement::Continue(parser.next_token())),
        _ => parse_simple_statement(parser),
    }
}

fn parse_return_statement(parser: &mut Parser) -> Result<ReturnStatement, ParseError> {
    let token = parser.expect_token(TokenKind::Return)?;
    let value = match parser.peek().kind {
        TokenKind::SemiColon | TokenKind::RBrace | TokenKind::Eof => None,
        _ => Some(parse_expression(parser, Precedence::Lowest)?),
    };

    Ok(ReturnStatement { token, value })
}

/// An expression, optionally followed by `=`, `:=` or a compound operator
/// that turns it into an assignment target.
pub fn parse_simple_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let expression = parse_expression(parser, Precedence::Lowest)?;

    let compound = match parser.peek().kind {
        TokenKind::Assign | TokenKind::Declare => None,
        TokenKind::PlusAssign => Some(InfixOperationKind::Plus),
        TokenKind::MinusAssign => Some(InfixOperationKind::Minus),
        TokenKind::AsteriskAssign => Some(InfixOperationKind::Multiply),
        TokenKind::SlashAssign => Some(InfixOperationKind::Divide),
        _ => return Ok(Statement::Expression(expression)),
    };

    let token = parser.next_token();
    let declare = token.kind == TokenKind::Declare;
    let target = assign_target(expression, &token, declare)?;
    let value = parse_expression(parser, Precedence::Lowest)?;

    Ok(match compound {
        Some(operator) => Statement::Compound(CompoundStatement {
            token,
            operator,
            target,
            value,
        }),
        None => Statement::Assign(AssignStatement {
            token,
            target,
            declare,
            value,
        }),
    })
}

fn assign_target(
    expression: Expression,
    token: &Token,
    declare: bool,
) -> Result<AssignTarget, ParseError> {
    match expression {
        Expression::Identifier(identifier) => Ok(AssignTarget::Identifier(identifier)),
        Expression::Index(index) if !declare => Ok(AssignTarget::Index(index)),
        Expression::Property(property) if !declare => Ok(AssignTarget::Property(property)),
        _ => Err(ParseError::InvalidAssignmentTarget(token.clone())),
    }
}
