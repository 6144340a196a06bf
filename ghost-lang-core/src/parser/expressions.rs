use std::rc::Rc;

use super::error::{Expected, ParseError};
use super::statements::{parse_simple_statement, parse_statement};
use crate::ast::{
    Block, ClassLiteral, Expression, ForExpression, ForInExpression, FunctionLiteral, Identifier,
    IndexExpression, InfixOperationKind, PostfixOperationKind, PrefixOperationKind,
    PropertyExpression, Statement, SwitchCase,
};
use crate::parser::Parser;
use crate::token::{Literal, Token, TokenKind};

#[derive(PartialOrd, PartialEq, Debug)]
pub enum Precedence {
    Lowest = 0,
    Or,
    And,
    Range,
    Equals,
    LessGreater,
    Sum,
    Product,
    Modulo,
    Prefix,
    Call,
    Index,
}

pub fn precedence_of(token: &TokenKind) -> Precedence {
    match token {
        TokenKind::Or => Precedence::Or,
        TokenKind::Question => Precedence::Or,
        TokenKind::And => Precedence::And,
        TokenKind::Range => Precedence::Range,
        TokenKind::Equal => Precedence::Equals,
        TokenKind::NotEqual => Precedence::Equals,
        TokenKind::LessThan => Precedence::LessGreater,
        TokenKind::LessThanOrEqual => Precedence::LessGreater,
        TokenKind::GreaterThan => Precedence::LessGreater,
        TokenKind::GreaterThanOrEqual => Precedence::LessGreater,
        TokenKind::Plus => Precedence::Sum,
        TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk => Precedence::Product,
        TokenKind::Slash => Precedence::Product,
        TokenKind::Percent => Precedence::Modulo,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        TokenKind::Dot => Precedence::Index,
        TokenKind::PlusPlus => Precedence::Index,
        TokenKind::MinusMinus => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

pub fn parse_expression(
    parser: &mut Parser,
    precedence: Precedence,
) -> Result<Expression, ParseError> {
    let token = parser.next_token();
    let mut left_expression = prefix_parsing(token, parser)?;

    loop {
        let next_precedence = precedence_of(&parser.peek().kind);
        if precedence >= next_precedence {
            break;
        }

        let next_token = parser.next_token();
        let Some(infix_parse_function) = infix_parsing_function(&next_token.kind) else {
            break;
        };
        left_expression = infix_parse_function(left_expression, next_token, parser)?;
    }

    Ok(left_expression)
}

fn prefix_operation(
    token: Token,
    kind: PrefixOperationKind,
) -> impl FnOnce(&mut Parser) -> Result<Expression, ParseError> {
    move |parser| {
        Ok(Expression::PrefixOperation {
            token,
            kind,
            right: Box::new(parse_expression(parser, Precedence::Prefix)?),
        })
    }
}

fn parse_grouped_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    let expression = parse_expression(parser, Precedence::Lowest)?;
    parser.expect_token(TokenKind::RParen)?;

    Ok(expression)
}

pub(crate) fn parse_sequence<T>(
    parser: &mut Parser,
    parse_element: impl Fn(&mut Parser) -> Result<T, ParseError>,
    separator: TokenKind,
    terminator: TokenKind,
) -> Result<Vec<T>, ParseError> {
    let mut elements = Vec::new();

    loop {
        if parser.next_if(&terminator).is_some() {
            return Ok(elements);
        }
        elements.push(parse_element(parser)?);

        let next = parser.next_token();
        if next.kind == separator {
            continue;
        } else if next.kind == terminator {
            return Ok(elements);
        } else {
            return Err(ParseError::unexpected_token(terminator, next));
        }
    }
}

fn parse_list_literal(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let elements = parse_sequence(
        parser,
        |parser| parse_expression(parser, Precedence::Lowest),
        TokenKind::Comma,
        TokenKind::RBracket,
    )?;
    Ok(Expression::ListLiteral { token, elements })
}

fn parse_map_literal(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let pairs = parse_sequence(
        parser,
        |parser| {
            let key = parse_expression(parser, Precedence::Lowest)?;
            parser.expect_token(TokenKind::Colon)?;
            let value = parse_expression(parser, Precedence::Lowest)?;
            Ok((key, value))
        },
        TokenKind::Comma,
        TokenKind::RBrace,
    )?;
    Ok(Expression::MapLiteral { token, pairs })
}

/// Parses the statements of a block whose `{` was already consumed.
pub(crate) fn parse_block_statement(token: Token, parser: &mut Parser) -> Result<Block, ParseError> {
    let mut statements = Vec::new();

    loop {
        while parser.next_if(&TokenKind::SemiColon).is_some() {}
        if parser.next_if(&TokenKind::RBrace).is_some() {
            return Ok(Block { token, statements });
        }
        if parser.peek_is(&TokenKind::Eof) {
            let got = parser.next_token();
            return Err(ParseError::unexpected_token(TokenKind::RBrace, got));
        }
        statements.push(parse_statement(parser)?);
    }
}

fn parse_block(parser: &mut Parser) -> Result<Block, ParseError> {
    let token = parser.expect_token(TokenKind::LBrace)?;
    parse_block_statement(token, parser)
}

fn parse_if_expression(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let condition = Box::new(parse_expression(parser, Precedence::Lowest)?);

    let consequence = parse_block(parser)?;

    let alternative = match parser.next_if(&TokenKind::Else) {
        None => None,
        Some(_) => match parser.next_if(&TokenKind::If) {
            // `else if` becomes an `if` nested in the alternative block
            Some(if_token) => {
                let nested = parse_if_expression(if_token.clone(), parser)?;
                Some(Block {
                    token: if_token,
                    statements: vec![Statement::Expression(nested)],
                })
            }
            None => Some(parse_block(parser)?),
        },
    };

    Ok(Expression::If {
        token,
        condition,
        consequence,
        alternative,
    })
}

fn parse_while_expression(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let condition = Box::new(parse_expression(parser, Precedence::Lowest)?);
    let body = parse_block(parser)?;

    Ok(Expression::While {
        token,
        condition,
        body,
    })
}

fn parse_for_expression(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.expect_token(TokenKind::LParen)?;
    let first = parser.parse_ident()?;

    if parser.next_if(&TokenKind::Assign).is_some() || parser.next_if(&TokenKind::Declare).is_some()
    {
        let initial = parse_expression(parser, Precedence::Lowest)?;
        parser.expect_token(TokenKind::SemiColon)?;
        let condition = parse_expression(parser, Precedence::Lowest)?;
        parser.expect_token(TokenKind::SemiColon)?;
        let increment = parse_simple_statement(parser)?;
        parser.expect_token(TokenKind::RParen)?;
        let body = parse_block(parser)?;

        return Ok(Expression::For(Box::new(ForExpression {
            token,
            identifier: first,
            initial,
            condition,
            increment,
            body,
        })));
    }

    let (key, value) = if parser.next_if(&TokenKind::Comma).is_some() {
        (Some(first), parser.parse_ident()?)
    } else {
        (None, first)
    };
    parser.expect_token(TokenKind::In)?;
    let iterable = parse_expression(parser, Precedence::Lowest)?;
    parser.expect_token(TokenKind::RParen)?;
    let body = parse_block(parser)?;

    Ok(Expression::ForIn(Box::new(ForInExpression {
        token,
        key,
        value,
        iterable,
        body,
    })))
}

fn parse_switch_expression(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let value = Box::new(parse_expression(parser, Precedence::Lowest)?);
    parser.expect_token(TokenKind::LBrace)?;

    let mut cases: Vec<SwitchCase> = Vec::new();
    loop {
        while parser.next_if(&TokenKind::SemiColon).is_some() {}
        let case_token = parser.next_token();
        match case_token.kind {
            TokenKind::RBrace => break,
            TokenKind::Case => {
                let mut values = vec![parse_expression(parser, Precedence::Lowest)?];
                while parser.next_if(&TokenKind::Comma).is_some() {
                    values.push(parse_expression(parser, Precedence::Lowest)?);
                }
                let body = parse_block(parser)?;
                cases.push(SwitchCase {
                    token: case_token,
                    values,
                    default: false,
                    body,
                });
            }
            TokenKind::Default => {
                if cases.iter().any(|case| case.default) {
                    return Err(ParseError::MultipleDefaults(case_token));
                }
                let body = parse_block(parser)?;
                cases.push(SwitchCase {
                    token: case_token,
                    values: Vec::new(),
                    default: true,
                    body,
                });
            }
            _ => {
                return Err(ParseError::unexpected_token(TokenKind::Case, case_token));
            }
        }
    }

    Ok(Expression::Switch {
        token,
        value,
        cases,
    })
}

fn parse_parameter(parser: &mut Parser) -> Result<(Identifier, Option<Expression>), ParseError> {
    let identifier = parser.parse_ident()?;
    let default = match parser.next_if(&TokenKind::Assign) {
        Some(_) => Some(parse_expression(parser, Precedence::Lowest)?),
        None => None,
    };
    Ok((identifier, default))
}

fn parse_function_literal(token: Token, parser: &mut Parser) -> Result<FunctionLiteral, ParseError> {
    let name = match parser.peek().kind {
        TokenKind::Identifier(_) => Some(parser.parse_ident()?),
        _ => None,
    };

    parser.expect_token(TokenKind::LParen)?;
    let parameters = parse_sequence(parser, parse_parameter, TokenKind::Comma, TokenKind::RParen)?;

    let body = parse_block(parser)?;

    let mut names = Vec::new();
    let mut defaults = Vec::new();
    for (identifier, default) in parameters {
        if let Some(default) = default {
            defaults.push((identifier.clone(), default));
        }
        names.push(identifier);
    }

    Ok(FunctionLiteral {
        token,
        name,
        parameters: names,
        defaults,
        body,
    })
}

fn parse_class_literal(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let name = parser.parse_ident()?;
    let super_class = match parser.next_if(&TokenKind::Extends) {
        Some(_) => Some(parser.parse_ident()?),
        None => None,
    };

    let body_token = parser.expect_token(TokenKind::LBrace)?;
    let mut statements = Vec::new();
    loop {
        while parser.next_if(&TokenKind::SemiColon).is_some() {}
        let member = parser.next_token();
        match member.kind {
            TokenKind::RBrace => break,
            TokenKind::Function => {
                let function = parse_function_literal(member.clone(), parser)?;
                if function.name.is_none() {
                    return Err(ParseError::InvalidClassMember(member));
                }
                statements.push(Statement::Expression(Expression::Function(Rc::new(function))));
            }
            TokenKind::Use => {
                statements.push(Statement::Expression(parse_use_expression(member, parser)?));
            }
            _ => return Err(ParseError::InvalidClassMember(member)),
        }
    }

    Ok(Expression::Class(Box::new(ClassLiteral {
        token,
        name,
        super_class,
        body: Block {
            token: body_token,
            statements,
        },
    })))
}

fn parse_trait_literal(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let name = parser.parse_ident()?;
    let body = parse_block(parser)?;

    Ok(Expression::Trait { token, name, body })
}

fn parse_use_expression(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut traits = vec![parser.parse_ident()?];
    while parser.next_if(&TokenKind::Comma).is_some() {
        traits.push(parser.parse_ident()?);
    }

    Ok(Expression::Use { token, traits })
}

fn parse_import_expression(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let path = Box::new(parse_expression(parser, Precedence::Prefix)?);

    Ok(Expression::Import { token, path })
}

pub fn prefix_parsing(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    match token.kind.clone() {
        TokenKind::Identifier(name) => Ok(Expression::Identifier(Identifier { token, name })),
        TokenKind::Number => match token.literal.clone() {
            Some(Literal::Number(value)) => Ok(Expression::NumberLiteral { token, value }),
            _ => Err(ParseError::InvalidLiteral(token)),
        },
        TokenKind::String => match token.literal.clone() {
            Some(Literal::String(value)) => Ok(Expression::StringLiteral { token, value }),
            _ => Err(ParseError::InvalidLiteral(token)),
        },
        TokenKind::True => Ok(Expression::BooleanLiteral { token, value: true }),
        TokenKind::False => Ok(Expression::BooleanLiteral {
            token,
            value: false,
        }),
        TokenKind::Null => Ok(Expression::NullLiteral(token)),
        TokenKind::This => Ok(Expression::This(token)),
        TokenKind::Bang => prefix_operation(token, PrefixOperationKind::Bang)(parser),
        TokenKind::Minus => prefix_operation(token, PrefixOperationKind::Minus)(parser),
        TokenKind::LParen => parse_grouped_expression(parser),
        TokenKind::LBracket => parse_list_literal(token, parser),
        TokenKind::LBrace => parse_map_literal(token, parser),
        TokenKind::If => parse_if_expression(token, parser),
        TokenKind::While => parse_while_expression(token, parser),
        TokenKind::For => parse_for_expression(token, parser),
        TokenKind::Switch => parse_switch_expression(token, parser),
        TokenKind::Function => Ok(Expression::Function(Rc::new(parse_function_literal(
            token, parser,
        )?))),
        TokenKind::Class => parse_class_literal(token, parser),
        TokenKind::Trait => parse_trait_literal(token, parser),
        TokenKind::Use => parse_use_expression(token, parser),
        TokenKind::Import => parse_import_expression(token, parser),
        TokenKind::Illegal(message) => Err(ParseError::IllegalToken { message, token }),
        _ => Err(ParseError::unexpected_other(Expected::Expression, token)),
    }
}

type InfixFunction =
    Box<dyn FnOnce(Expression, Token, &mut Parser) -> Result<Expression, ParseError>>;

fn infix_operation(kind: InfixOperationKind) -> InfixFunction {
    Box::new(
        move |left: Expression, token: Token, parser: &mut Parser| -> Result<Expression, ParseError> {
            let new_precedence = precedence_of(&token.kind);

            Ok(Expression::InfixOperation {
                token,
                kind,
                left: Box::new(left),
                right: Box::new(parse_expression(parser, new_precedence)?),
            })
        },
    )
}

fn postfix_operation(kind: PostfixOperationKind) -> InfixFunction {
    Box::new(
        move |left: Expression, token: Token, _: &mut Parser| -> Result<Expression, ParseError> {
            match left {
                Expression::Identifier(target) => Ok(Expression::PostfixOperation {
                    token,
                    kind,
                    target,
                }),
                _ => Err(ParseError::InvalidPostfixTarget(token)),
            }
        },
    )
}

fn parse_call_function(
    left: Expression,
    token: Token,
    parser: &mut Parser,
) -> Result<Expression, ParseError> {
    let arguments = parse_sequence(
        parser,
        |parser| parse_expression(parser, Precedence::Lowest),
        TokenKind::Comma,
        TokenKind::RParen,
    )?;

    Ok(Expression::Call {
        token,
        function: Box::new(left),
        arguments,
    })
}

fn parse_index_expression(
    left: Expression,
    token: Token,
    parser: &mut Parser,
) -> Result<Expression, ParseError> {
    let index = parse_expression(parser, Precedence::Lowest)?;
    parser.expect_token(TokenKind::RBracket)?;

    Ok(Expression::Index(IndexExpression {
        token,
        left: Box::new(left),
        index: Box::new(index),
    }))
}

/// `receiver.name(arguments)` is a method call, `receiver.name` a property.
fn parse_dot_expression(
    left: Expression,
    token: Token,
    parser: &mut Parser,
) -> Result<Expression, ParseError> {
    let name = parser.parse_ident()?;

    if parser.next_if(&TokenKind::LParen).is_some() {
        let arguments = parse_sequence(
            parser,
            |parser| parse_expression(parser, Precedence::Lowest),
            TokenKind::Comma,
            TokenKind::RParen,
        )?;
        return Ok(Expression::Method {
            token,
            receiver: Box::new(left),
            name,
            arguments,
        });
    }

    Ok(Expression::Property(PropertyExpression {
        token,
        receiver: Box::new(left),
        name,
    }))
}

fn parse_ternary_expression(
    condition: Expression,
    token: Token,
    parser: &mut Parser,
) -> Result<Expression, ParseError> {
    let consequence = parse_expression(parser, Precedence::Lowest)?;
    parser.expect_token(TokenKind::Colon)?;
    let alternative = parse_expression(parser, Precedence::Lowest)?;

    Ok(Expression::Ternary {
        token,
        condition: Box::new(condition),
        consequence: Box::new(consequence),
        alternative: Box::new(alternative),
    })
}

pub fn infix_parsing_function(token: &TokenKind) -> Option<InfixFunction> {
    use InfixOperationKind as InfixKind;

    match token {
        TokenKind::Plus => Some(infix_operation(InfixKind::Plus)),
        TokenKind::Minus => Some(infix_operation(InfixKind::Minus)),
        TokenKind::Asterisk => Some(infix_operation(InfixKind::Multiply)),
        TokenKind::Slash => Some(infix_operation(InfixKind::Divide)),
        TokenKind::Percent => Some(infix_operation(InfixKind::Modulo)),
        TokenKind::Equal => Some(infix_operation(InfixKind::Equal)),
        TokenKind::NotEqual => Some(infix_operation(InfixKind::NotEqual)),
        TokenKind::LessThan => Some(infix_operation(InfixKind::LessThan)),
        TokenKind::LessThanOrEqual => Some(infix_operation(InfixKind::LessThanOrEqual)),
        TokenKind::GreaterThan => Some(infix_operation(InfixKind::GreaterThan)),
        TokenKind::GreaterThanOrEqual => Some(infix_operation(InfixKind::GreaterThanOrEqual)),
        TokenKind::And => Some(infix_operation(InfixKind::And)),
        TokenKind::Or => Some(infix_operation(InfixKind::Or)),
        TokenKind::Range => Some(infix_operation(InfixKind::Range)),
        TokenKind::PlusPlus => Some(postfix_operation(PostfixOperationKind::Increment)),
        TokenKind::MinusMinus => Some(postfix_operation(PostfixOperationKind::Decrement)),
        TokenKind::LParen => Some(Box::new(parse_call_function)),
        TokenKind::LBracket => Some(Box::new(parse_index_expression)),
        TokenKind::Dot => Some(Box::new(parse_dot_expression)),
        TokenKind::Question => Some(Box::new(parse_ternary_expression)),
        _ => None,
    }
}
