mod call;
mod class;
mod import;

use ghost_lang_core::ast::{
    AssignStatement, AssignTarget, Block, CompoundStatement, Expression, ForExpression,
    ForInExpression, Identifier, InfixOperationKind, PostfixOperationKind, PrefixOperationKind,
    Program, Statement, SwitchCase,
};
use ghost_lang_core::decimal::Decimal;
use ghost_lang_core::token::{Token, TokenKind};

use crate::environment::Scope;
use crate::object::{sorted_pairs, EvaluationError, MapPair, Object, QuickReturn, RuntimeError};

use call::property_value;

type EvalResult = Result<Object, QuickReturn>;

pub(crate) fn error(token: &Token, kind: EvaluationError) -> QuickReturn {
    QuickReturn::Error(RuntimeError::new(token, kind))
}

fn outside_loop(token: Token) -> RuntimeError {
    let keyword = match token.kind {
        TokenKind::Continue => "continue",
        _ => "break",
    };
    RuntimeError::new(&token, EvaluationError::OutsideLoop(keyword))
}

/// Turns control flow that escaped its construct into errors.
pub(crate) fn settle(result: EvalResult) -> Result<Object, RuntimeError> {
    match result {
        Ok(value) | Err(QuickReturn::Return(value)) => Ok(value),
        Err(QuickReturn::Break(token)) | Err(QuickReturn::Continue(token)) => {
            Err(outside_loop(token))
        }
        Err(QuickReturn::Error(error)) => Err(error),
    }
}

pub fn eval_program(program: &Program, scope: &Scope) -> Result<Object, RuntimeError> {
    let mut output = Object::Null;
    for statement in &program.statements {
        match eval_statement(statement, scope) {
            Ok(object) => output = object,
            escaped => return settle(escaped),
        }
    }
    Ok(output)
}

fn eval_block(block: &Block, scope: &Scope) -> EvalResult {
    let mut output = Object::Null;
    for statement in &block.statements {
        output = eval_statement(statement, scope)?;
    }
    Ok(output)
}

fn eval_statement(statement: &Statement, scope: &Scope) -> EvalResult {
    match statement {
        Statement::Expression(expression) => eval_expression(expression, scope),
        Statement::Return(statement) => {
            let value = match &statement.value {
                Some(value) => eval_expression(value, scope)?,
                None => Object::Null,
            };
            Err(QuickReturn::Return(value))
        }
        Statement::Assign(statement) => eval_assign_statement(statement, scope),
        Statement::Compound(statement) => eval_compound_statement(statement, scope),
        Statement::Break(token) => Err(QuickReturn::Break(token.clone())),
        Statement::Continue(token) => Err(QuickReturn::Continue(token.clone())),
    }
}

fn eval_assign_statement(statement: &AssignStatement, scope: &Scope) -> EvalResult {
    let value = eval_expression(&statement.value, scope)?;
    match &statement.target {
        AssignTarget::Identifier(identifier) if statement.declare => {
            scope.environment.define(identifier.name.clone(), value);
        }
        AssignTarget::Identifier(identifier) => {
            scope.environment.assign(identifier.name.clone(), value);
        }
        AssignTarget::Index(index) => {
            let container = eval_expression(&index.left, scope)?;
            let key = eval_expression(&index.index, scope)?;
            set_index(&container, key, value, &index.token)?;
        }
        AssignTarget::Property(property) => {
            let receiver = eval_expression(&property.receiver, scope)?;
            set_property(&receiver, &property.name, value)?;
        }
    }
    Ok(Object::Null)
}

fn eval_compound_statement(statement: &CompoundStatement, scope: &Scope) -> EvalResult {
    let token = &statement.token;
    match &statement.target {
        AssignTarget::Identifier(identifier) => {
            let current = eval_identifier(identifier, scope)?;
            let value = eval_expression(&statement.value, scope)?;
            let updated = eval_infix(statement.operator, current, value, token)?;
            scope.environment.assign(identifier.name.clone(), updated);
        }
        AssignTarget::Index(index) => {
            let container = eval_expression(&index.left, scope)?;
            let key = eval_expression(&index.index, scope)?;
            let current = index_value(&container, &key, &index.token)?;
            let value = eval_expression(&statement.value, scope)?;
            let updated = eval_infix(statement.operator, current, value, token)?;
            set_index(&container, key, updated, &index.token)?;
        }
        AssignTarget::Property(property) => {
            let receiver = eval_expression(&property.receiver, scope)?;
            let current = property_value(&receiver, &property.name, scope)?;
            let value = eval_expression(&statement.value, scope)?;
            let updated = eval_infix(statement.operator, current, value, token)?;
            set_property(&receiver, &property.name, updated)?;
        }
    }
    Ok(Object::Null)
}

fn eval_expressions(expressions: &[Expression], scope: &Scope) -> Result<Vec<Object>, QuickReturn> {
    expressions
        .iter()
        .map(|expression| eval_expression(expression, scope))
        .collect()
}

fn eval_expression(expression: &Expression, scope: &Scope) -> EvalResult {
    match expression {
        Expression::Identifier(identifier) => eval_identifier(identifier, scope),
        Expression::NumberLiteral { value, .. } => Ok(Object::Number(value.clone())),
        Expression::StringLiteral { value, .. } => Ok(Object::String(value.clone())),
        Expression::BooleanLiteral { value, .. } => Ok(Object::Boolean(*value)),
        Expression::NullLiteral(_) => Ok(Object::Null),
        Expression::ListLiteral { elements, .. } => {
            Ok(Object::list(eval_expressions(elements, scope)?))
        }
        Expression::MapLiteral { token, pairs } => eval_map_literal(pairs, token, scope),
        Expression::PrefixOperation { token, kind, right } => {
            let right = eval_expression(right, scope)?;
            eval_prefix(*kind, right, token)
        }
        Expression::InfixOperation {
            token,
            kind,
            left,
            right,
        } => {
            let left = eval_expression(left, scope)?;
            let short_circuit = matches!(
                (kind, &left),
                (InfixOperationKind::And, Object::Boolean(false))
                    | (InfixOperationKind::Or, Object::Boolean(true))
            );
            if short_circuit {
                return Ok(left);
            }
            let right = eval_expression(right, scope)?;
            eval_infix(*kind, left, right, token)
        }
        Expression::PostfixOperation {
            token,
            kind,
            target,
        } => eval_postfix(*kind, target, token, scope),
        Expression::If {
            condition,
            consequence,
            alternative,
            ..
        } => {
            if eval_expression(condition, scope)?.is_truthy() {
                eval_block(consequence, scope)
            } else if let Some(alternative) = alternative {
                eval_block(alternative, scope)
            } else {
                Ok(Object::Null)
            }
        }
        Expression::While {
            condition, body, ..
        } => eval_while(condition, body, scope),
        Expression::For(expression) => eval_for(expression, scope),
        Expression::ForIn(expression) => eval_for_in(expression, scope),
        Expression::Switch { value, cases, .. } => eval_switch(value, cases, scope),
        Expression::Ternary {
            condition,
            consequence,
            alternative,
            ..
        } => {
            if eval_expression(condition, scope)?.is_truthy() {
                eval_expression(consequence, scope)
            } else {
                eval_expression(alternative, scope)
            }
        }
        Expression::Function(literal) => call::eval_function_literal(literal, scope),
        Expression::Call {
            token,
            function,
            arguments,
        } => {
            let callee = eval_expression(function, scope)?;
            let arguments = eval_expressions(arguments, scope)?;
            call::apply(&callee, arguments, None, token, scope)
        }
        Expression::Method {
            token,
            receiver,
            name,
            arguments,
        } => {
            let receiver = eval_expression(receiver, scope)?;
            let arguments = eval_expressions(arguments, scope)?;
            call::invoke_method(&receiver, name, arguments, token, scope)
        }
        Expression::Property(property) => {
            let receiver = eval_expression(&property.receiver, scope)?;
            property_value(&receiver, &property.name, scope)
        }
        Expression::Index(index) => {
            let left = eval_expression(&index.left, scope)?;
            let key = eval_expression(&index.index, scope)?;
            index_value(&left, &key, &index.token)
        }
        Expression::Class(literal) => class::eval_class(literal, scope),
        Expression::Trait { name, body, .. } => class::eval_trait(name, body, scope),
        Expression::Use { token, traits } => class::eval_use(traits, token, scope),
        Expression::Import { token, path } => {
            let path = eval_expression(path, scope)?;
            import::eval_import(path, token, scope)
        }
        Expression::This(token) => scope
            .receiver
            .clone()
            .ok_or_else(|| error(token, EvaluationError::ThisOutsideMethod)),
    }
}

/// Library modules and functions shadow everything bound in environments.
fn eval_identifier(identifier: &Identifier, scope: &Scope) -> EvalResult {
    let library_object = scope.environment.runtime().library.resolve(&identifier.name);
    match &library_object {
        Some(Object::LibraryProperty(property)) => property
            .read(scope, &identifier.token)
            .map_err(|kind| error(&identifier.token, kind)),
        Some(object) => Ok(object.clone()),
        None => scope.environment.get(&identifier.name).ok_or_else(|| {
            error(
                &identifier.token,
                EvaluationError::UnknownIdentifier(identifier.name.clone()),
            )
        }),
    }
}

fn eval_map_literal(pairs: &[(Expression, Expression)], token: &Token, scope: &Scope) -> EvalResult {
    let mut evaluated = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        let key = match key {
            Expression::Identifier(identifier) => Object::String(identifier.name.clone()),
            key => eval_expression(key, scope)?,
        };
        evaluated.push((key, eval_expression(value, scope)?));
    }
    Object::map_from_pairs(evaluated).map_err(|kind| error(token, kind))
}

fn eval_prefix(kind: PrefixOperationKind, right: Object, token: &Token) -> EvalResult {
    match (kind, &right) {
        (PrefixOperationKind::Bang, right) => Ok(Object::Boolean(!right.is_truthy())),
        (PrefixOperationKind::Minus, Object::Number(value)) => Ok(Object::Number(-value)),
        (operator, right) => Err(error(
            token,
            EvaluationError::UnknownPrefixOperator {
                operator,
                right: right.object_type(),
            },
        )),
    }
}

fn eval_infix(kind: InfixOperationKind, left: Object, right: Object, token: &Token) -> EvalResult {
    use InfixOperationKind::*;

    let unknown_operator = || {
        error(
            token,
            EvaluationError::UnknownInfixOperator {
                left: left.object_type(),
                operator: kind,
                right: right.object_type(),
            },
        )
    };

    match (&left, &right) {
        (Object::Number(a), Object::Number(b)) => {
            eval_number_infix(kind, a, b).map_err(|kind| error(token, kind))
        }
        (Object::String(a), Object::String(b)) => match kind {
            Plus => Ok(Object::string(format!("{}{}", a, b))),
            Equal => Ok(Object::Boolean(a == b)),
            NotEqual => Ok(Object::Boolean(a != b)),
            LessThan => Ok(Object::Boolean(a < b)),
            LessThanOrEqual => Ok(Object::Boolean(a <= b)),
            GreaterThan => Ok(Object::Boolean(a > b)),
            GreaterThanOrEqual => Ok(Object::Boolean(a >= b)),
            _ => Err(unknown_operator()),
        },
        (Object::Boolean(a), Object::Boolean(b)) => match kind {
            And => Ok(Object::Boolean(*a && *b)),
            Or => Ok(Object::Boolean(*a || *b)),
            Equal => Ok(Object::Boolean(a == b)),
            NotEqual => Ok(Object::Boolean(a != b)),
            _ => Err(unknown_operator()),
        },
        (Object::Null, _) | (_, Object::Null) if matches!(kind, Equal | NotEqual) => {
            let both_null = matches!((&left, &right), (Object::Null, Object::Null));
            Ok(Object::Boolean(both_null == (kind == Equal)))
        }
        _ if left.object_type() != right.object_type() => Err(error(
            token,
            EvaluationError::TypeMismatch {
                left: left.object_type(),
                operator: kind,
                right: right.object_type(),
            },
        )),
        _ => match kind {
            Equal => Ok(Object::Boolean(left == right)),
            NotEqual => Ok(Object::Boolean(left != right)),
            _ => Err(unknown_operator()),
        },
    }
}

fn eval_number_infix(
    kind: InfixOperationKind,
    a: &Decimal,
    b: &Decimal,
) -> Result<Object, EvaluationError> {
    use InfixOperationKind::*;

    Ok(match kind {
        Plus => Object::Number(a + b),
        Minus => Object::Number(a - b),
        Multiply => Object::Number(a.checked_mul(b).ok_or(EvaluationError::NumberOutOfRange)?),
        Divide => Object::Number(a.checked_div(b).ok_or(EvaluationError::DivisionByZero)?),
        Modulo => Object::Number(a.checked_rem(b).ok_or(EvaluationError::DivisionByZero)?),
        Equal => Object::Boolean(a == b),
        NotEqual => Object::Boolean(a != b),
        LessThan => Object::Boolean(a < b),
        LessThanOrEqual => Object::Boolean(a <= b),
        GreaterThan => Object::Boolean(a > b),
        GreaterThanOrEqual => Object::Boolean(a >= b),
        Range => {
            let one = Decimal::from(1);
            let mut elements = Vec::new();
            let mut current = a.clone();
            while current <= *b {
                let next = &current + &one;
                elements.push(Object::Number(current));
                current = next;
            }
            Object::list(elements)
        }
        And | Or => {
            return Err(EvaluationError::UnknownInfixOperator {
                left: crate::object::ObjectType::Number,
                operator: kind,
                right: crate::object::ObjectType::Number,
            })
        }
    })
}

/// `i++` and `i--` update the nearest binding and yield the old value.
fn eval_postfix(
    kind: PostfixOperationKind,
    target: &Identifier,
    token: &Token,
    scope: &Scope,
) -> EvalResult {
    let current = eval_identifier(target, scope)?;
    let Object::Number(value) = &current else {
        return Err(error(
            token,
            EvaluationError::UnknownPostfixOperator {
                operator: kind,
                operand: current.object_type(),
            },
        ));
    };
    let one = Decimal::from(1);
    let updated = match kind {
        PostfixOperationKind::Increment => value + &one,
        PostfixOperationKind::Decrement => value - &one,
    };
    scope
        .environment
        .assign(target.name.clone(), Object::Number(updated));
    Ok(current)
}

/// Whether a loop should run another iteration after its body finished
/// with `result`.
fn keep_looping(result: EvalResult) -> Result<bool, QuickReturn> {
    match result {
        Ok(_) | Err(QuickReturn::Continue(_)) => Ok(true),
        Err(QuickReturn::Break(_)) => Ok(false),
        Err(other) => Err(other),
    }
}

fn eval_while(condition: &Expression, body: &Block, scope: &Scope) -> EvalResult {
    while eval_expression(condition, scope)?.is_truthy() {
        if !keep_looping(eval_block(body, scope))? {
            break;
        }
    }
    Ok(Object::Null)
}

/// Runs `body` with `names` bound in the current environment, then puts back
/// whatever those names held before.
fn with_loop_variables(
    names: &[&Identifier],
    scope: &Scope,
    body: impl FnOnce() -> EvalResult,
) -> EvalResult {
    let saved: Vec<Option<Object>> = names
        .iter()
        .map(|name| scope.environment.get_local(&name.name))
        .collect();
    let result = body();
    for (name, saved) in names.iter().zip(saved) {
        match saved {
            Some(value) => scope.environment.define(name.name.clone(), value),
            None => {
                scope.environment.remove(&name.name);
            }
        }
    }
    result
}

fn eval_for(expression: &ForExpression, scope: &Scope) -> EvalResult {
    let identifier = &expression.identifier;
    with_loop_variables(&[identifier], scope, || {
        let initial = eval_expression(&expression.initial, scope)?;
        scope.environment.define(identifier.name.clone(), initial);
        while eval_expression(&expression.condition, scope)?.is_truthy() {
            if !keep_looping(eval_block(&expression.body, scope))? {
                break;
            }
            eval_statement(&expression.increment, scope)?;
        }
        Ok(Object::Null)
    })
}

fn eval_for_in(expression: &ForInExpression, scope: &Scope) -> EvalResult {
    let iterable = eval_expression(&expression.iterable, scope)?;
    let entries: Vec<(Object, Object)> = match &iterable {
        Object::List(elements) => elements
            .borrow()
            .iter()
            .enumerate()
            .map(|(index, element)| (Object::number(index), element.clone()))
            .collect(),
        Object::Map(pairs) => sorted_pairs(&pairs.borrow())
            .into_iter()
            .map(|pair| (pair.key.clone(), pair.value.clone()))
            .collect(),
        Object::String(value) => value
            .chars()
            .enumerate()
            .map(|(index, character)| {
                (Object::number(index), Object::string(character.to_string()))
            })
            .collect(),
        other => {
            return Err(error(
                &expression.token,
                EvaluationError::NotIterable(other.object_type()),
            ))
        }
    };

    let mut names = vec![&expression.value];
    names.extend(expression.key.as_ref());
    with_loop_variables(&names, scope, || {
        for (key, value) in entries {
            if let Some(key_name) = &expression.key {
                scope.environment.define(key_name.name.clone(), key);
            }
            scope
                .environment
                .define(expression.value.name.clone(), value);
            if !keep_looping(eval_block(&expression.body, scope))? {
                break;
            }
        }
        Ok(Object::Null)
    })
}

fn eval_switch(value: &Expression, cases: &[SwitchCase], scope: &Scope) -> EvalResult {
    let value = eval_expression(value, scope)?;
    let mut default = None;
    for case in cases {
        if case.default {
            default = Some(case);
            continue;
        }
        for candidate in &case.values {
            let candidate = eval_expression(candidate, scope)?;
            if candidate.object_type() == value.object_type() && candidate == value {
                return eval_block(&case.body, scope);
            }
        }
    }
    match default {
        Some(case) => eval_block(&case.body, scope),
        None => Ok(Object::Null),
    }
}

/// A list position for `index`, or `None` when no element could live there.
fn list_position(index: &Decimal) -> Option<usize> {
    if index.is_negative() {
        return None;
    }
    index.to_i64().and_then(|index| usize::try_from(index).ok())
}

fn index_value(left: &Object, index: &Object, token: &Token) -> EvalResult {
    match (left, index) {
        (Object::List(elements), Object::Number(index)) => Ok(list_position(index)
            .and_then(|position| elements.borrow().get(position).cloned())
            .unwrap_or(Object::Null)),
        (Object::String(value), Object::Number(index)) => Ok(list_position(index)
            .and_then(|position| value.chars().nth(position))
            .map(|character| Object::string(character.to_string()))
            .unwrap_or(Object::Null)),
        (Object::List(_) | Object::String(_), other) => Err(error(
            token,
            EvaluationError::NonNumericIndex(other.object_type()),
        )),
        (Object::Map(pairs), key) => {
            let hashed = key
                .map_key()
                .ok_or_else(|| error(token, EvaluationError::UnusableAsMapKey(key.object_type())))?;
            Ok(pairs
                .borrow()
                .get(&hashed)
                .map(|pair| pair.value.clone())
                .unwrap_or(Object::Null))
        }
        (other, _) => Err(error(
            token,
            EvaluationError::IndexNotSupported(other.object_type()),
        )),
    }
}

/// How far past its end an index assignment may grow a list.
const MAX_LIST_PADDING: usize = 1 << 16;

/// Writes `container[index] = value`. Lists grow, padding with null, to
/// reach an index up to `MAX_LIST_PADDING` past their end.
fn set_index(container: &Object, index: Object, value: Object, token: &Token) -> Result<(), QuickReturn> {
    match (container, &index) {
        (Object::List(elements), Object::Number(number)) => {
            let mut elements = elements.borrow_mut();
            let position = list_position(number)
                .filter(|position| position.saturating_sub(elements.len()) <= MAX_LIST_PADDING)
                .ok_or_else(|| error(token, EvaluationError::IndexOutOfRange(number.clone())))?;
            if position >= elements.len() {
                elements.resize(position + 1, Object::Null);
            }
            elements[position] = value;
            Ok(())
        }
        (Object::List(_), other) => Err(error(
            token,
            EvaluationError::NonNumericIndex(other.object_type()),
        )),
        (Object::Map(pairs), key) => {
            let hashed = key
                .map_key()
                .ok_or_else(|| error(token, EvaluationError::UnusableAsMapKey(key.object_type())))?;
            pairs.borrow_mut().insert(
                hashed,
                MapPair {
                    key: index.clone(),
                    value,
                },
            );
            Ok(())
        }
        (other, _) => Err(error(
            token,
            EvaluationError::IndexNotSupported(other.object_type()),
        )),
    }
}

fn set_property(receiver: &Object, name: &Identifier, value: Object) -> Result<(), QuickReturn> {
    match receiver {
        Object::Instance(instance) => {
            instance.environment.define(name.name.clone(), value);
            Ok(())
        }
        Object::Map(_) => set_index(receiver, Object::String(name.name.clone()), value, &name.token),
        other => Err(error(
            &name.token,
            EvaluationError::PropertyAssignmentNotSupported {
                property: name.name.clone(),
                receiver: other.object_type(),
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use ghost_lang_core::parser::Parser;
    use ghost_lang_core::scanner::Scanner;

    use super::eval_program;
    use crate::environment::{Environment, Scope};
    use crate::library::Library;
    use crate::object::Object;
    use crate::runtime::Runtime;

    fn evaluate(input: &str) -> Result<Object, String> {
        let runtime = Rc::new(Runtime::new(
            Library::standard(),
            Box::new(std::io::sink()),
            Vec::new(),
        ));
        let scanner = Scanner::new(input, "test").with_namespaces(runtime.library.namespaces());
        let program = Parser::new(scanner).parse_program().unwrap();
        let scope = Scope::new(Environment::new(runtime.clone()));
        eval_program(&program, &scope).map_err(|error| error.to_string())
    }

    fn test_evaluation(inputs: Vec<(&str, Result<Object, &str>)>) {
        for (input, output) in inputs {
            assert_eq!(evaluate(input), output.map_err(str::to_owned), "{input}");
        }
    }

    fn number(text: &str) -> Object {
        Object::Number(text.parse().unwrap())
    }

    fn list(elements: Vec<Object>) -> Object {
        Object::list(elements)
    }

    #[test]
    fn test_literal() {
        let inputs = vec![
            ("5;", Ok(Object::number(5))),
            ("2.50", Ok(number("2.5"))),
            ("true;", Ok(Object::boolean(true))),
            ("false;", Ok(Object::boolean(false))),
            ("\"hello\";", Ok(Object::string("hello"))),
            ("'hello'", Ok(Object::string("hello"))),
            ("null;", Ok(Object::null())),
            ("", Ok(Object::null())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_prefix() {
        let inputs = vec![
            ("-10", Ok(Object::number(-10))),
            ("--5", Ok(Object::number(5))),
            ("!false", Ok(Object::boolean(true))),
            ("!!true", Ok(Object::boolean(true))),
            ("!null", Ok(Object::boolean(true))),
            ("!\"\"", Ok(Object::boolean(true))),
            ("!0", Ok(Object::boolean(false))),
            (
                "-true",
                Err("1:1:test: runtime error: unknown operator: -BOOLEAN"),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_arithmetic() {
        let inputs = vec![
            ("1 + 2 * 3", Ok(Object::number(7))),
            ("(1 + 2) * 3", Ok(Object::number(9))),
            ("0.1 + 0.2", Ok(number("0.3"))),
            ("10 / 4", Ok(number("2.5"))),
            ("1 / 3", Ok(number("0.3333333333333333"))),
            ("7 % 3", Ok(Object::number(1))),
            ("2 - 5", Ok(Object::number(-3))),
            ("1.5 * 1.5", Ok(number("2.25"))),
            ("1 / 0", Err("1:3:test: runtime error: division by zero")),
            ("1 % 0", Err("1:3:test: runtime error: division by zero")),
            ("1e100000 * 1e-100000", Ok(Object::number(1))),
            ("1e99999 * 1e99999", Err("1:9:test: runtime error: number out of range")),
            ("1e-99999 * 1e-99999", Err("1:10:test: runtime error: number out of range")),
            ("x := 1e99999; x * x * 0", Err("1:17:test: runtime error: number out of range")),
            ("(1e-99999 + 1) > 1", Ok(Object::boolean(true))),
            ("math.round(2.5, -2147483648)", Ok(Object::number(0))),
            ("math.round(2.5, 2147483647)", Ok(number("2.5"))),
            ("x := 1234.5; x.round(-2)", Ok(Object::number(1200))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_comparison() {
        let inputs = vec![
            ("1 < 2", Ok(Object::boolean(true))),
            ("2 <= 2", Ok(Object::boolean(true))),
            ("1 > 2", Ok(Object::boolean(false))),
            ("1.0 == 1", Ok(Object::boolean(true))),
            ("1 != 1", Ok(Object::boolean(false))),
            ("\"a\" < \"b\"", Ok(Object::boolean(true))),
            ("\"a\" == \"a\"", Ok(Object::boolean(true))),
            ("true == false", Ok(Object::boolean(false))),
            ("true and false", Ok(Object::boolean(false))),
            ("false or true", Ok(Object::boolean(true))),
            ("null == null", Ok(Object::boolean(true))),
            ("1 == null", Ok(Object::boolean(false))),
            ("[1, 2] == [1, 2]", Ok(Object::boolean(true))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_operator_errors() {
        let inputs = vec![
            (
                "5 + true",
                Err("1:3:test: runtime error: type mismatch: NUMBER + BOOLEAN"),
            ),
            (
                "5;\n\"a\" + 1",
                Err("2:5:test: runtime error: type mismatch: STRING + NUMBER"),
            ),
            (
                "true + false",
                Err("1:6:test: runtime error: unknown operator: BOOLEAN + BOOLEAN"),
            ),
            (
                "\"a\" - \"b\"",
                Err("1:5:test: runtime error: unknown operator: STRING - STRING"),
            ),
            (
                "1 and true",
                Err("1:3:test: runtime error: type mismatch: NUMBER and BOOLEAN"),
            ),
            (
                "foobar",
                Err("1:1:test: runtime error: identifier not found: foobar"),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_strings() {
        let inputs = vec![
            ("\"Hello\" + \" \" + \"World\"", Ok(Object::string("Hello World"))),
            ("\"abc\"[1]", Ok(Object::string("b"))),
            ("\"abc\"[5]", Ok(Object::null())),
            ("\"a,b\".split(\",\").length()", Ok(Object::number(2))),
            ("\"ghost\".toUpperCase()", Ok(Object::string("GHOST"))),
            (
                "n := 5; n.upper()",
                Err("1:10:test: runtime error: undefined method upper for NUMBER"),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_assignment() {
        let inputs = vec![
            ("a := 5; a", Ok(Object::number(5))),
            ("a := 5 * 5; a", Ok(Object::number(25))),
            ("a := 5; b := a; c := a + b + 5; c", Ok(Object::number(15))),
            ("a := 5; a = 6; a", Ok(Object::number(6))),
            ("x := 10; x -= 3; x *= 2; x /= 7; x", Ok(Object::number(2))),
            ("x := 1; x += 1; x", Ok(Object::number(2))),
            ("s := \"a\"; s += \"b\"; s", Ok(Object::string("ab"))),
            ("i := 5; j := i++; [i, j]", Ok(list(vec![Object::number(6), Object::number(5)]))),
            ("i := 5; i--; i", Ok(Object::number(4))),
            (
                "s := \"a\"; s++",
                Err("1:12:test: runtime error: unknown operator: STRING++"),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_lists_and_indexes() {
        let inputs = vec![
            (
                "[1, 2 * 2, 3 + 3]",
                Ok(list(vec![Object::number(1), Object::number(4), Object::number(6)])),
            ),
            ("[1, 2, 3][0]", Ok(Object::number(1))),
            ("[1, 2, 3][1 + 1]", Ok(Object::number(3))),
            ("[1, 2, 3][3]", Ok(Object::null())),
            ("[1, 2, 3][-1]", Ok(Object::null())),
            ("l := [1, 2]; l[0] = 5; l", Ok(list(vec![Object::number(5), Object::number(2)]))),
            (
                "l := [1]; l[3] = 4; l",
                Ok(list(vec![
                    Object::number(1),
                    Object::null(),
                    Object::null(),
                    Object::number(4),
                ])),
            ),
            ("l := [1, 2]; l[1] += 5; l[1]", Ok(Object::number(7))),
            (
                "1..4",
                Ok(list(vec![
                    Object::number(1),
                    Object::number(2),
                    Object::number(3),
                    Object::number(4),
                ])),
            ),
            ("3..1", Ok(list(vec![]))),
            (
                "l := [1]; l[9223372036854775807] = 1",
                Err("1:12:test: runtime error: list index out of range: 9223372036854775807"),
            ),
            (
                "l := []; l[100000] = 1",
                Err("1:11:test: runtime error: list index out of range: 100000"),
            ),
            (
                "l := [1]; l[-1] = 1",
                Err("1:12:test: runtime error: list index out of range: -1"),
            ),
            ("l := []; l[65536] = 1; l.length()", Ok(Object::number(65537))),
            ("l := []; l.push(l); l.toString()", Ok(Object::string("[[...]]"))),
            ("l := [1]; l.push([l]); l.toString()", Ok(Object::string("[1, [[...]]]"))),
            ("a := [1]; a.push(a); b := [1]; b.push(b); a == b", Ok(Object::boolean(true))),
            ("a := [1]; a.push(a); b := [2]; b.push(b); a == b", Ok(Object::boolean(false))),
            (
                "[1][\"a\"]",
                Err("1:4:test: runtime error: list index must be a number, got STRING"),
            ),
            (
                "5[0]",
                Err("1:2:test: runtime error: index operator not supported: NUMBER"),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_maps() {
        let inputs = vec![
            ("{\"a\": 1}[\"a\"]", Ok(Object::number(1))),
            ("{\"a\": 1}[\"b\"]", Ok(Object::null())),
            ("m := {1.0: \"one\"}; m[1]", Ok(Object::string("one"))),
            ("m := {-2.50: \"x\"}; m[-2.5]", Ok(Object::string("x"))),
            ("m := {true: 1, false: 0}; m[1 == 1]", Ok(Object::number(1))),
            ("m := {name: \"x\"}; m[\"name\"]", Ok(Object::string("x"))),
            ("m := {name: \"x\"}; m.name", Ok(Object::string("x"))),
            ("m := {}; m.name = 1; m[\"name\"]", Ok(Object::number(1))),
            ("m := {\"a\": 1}; m[\"a\"] += 5; m.a", Ok(Object::number(6))),
            ("m := {}; m[[1]]", Err("1:11:test: runtime error: unusable as map key: LIST")),
            ("{[1]: 2}", Err("1:1:test: runtime error: unusable as map key: LIST")),
            ("m := {}; m.me = m; m.toString()", Ok(Object::string("{\"me\": {...}}"))),
            ("m := {}; m.me = m; m == m.me", Ok(Object::boolean(true))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_conditionals() {
        let inputs = vec![
            ("if (true) { 10 }", Ok(Object::number(10))),
            ("if (false) { 10 }", Ok(Object::null())),
            ("if (1 < 2) { 10 } else { 20 }", Ok(Object::number(10))),
            ("if (1 > 2) { 10 } else { 20 }", Ok(Object::number(20))),
            ("if (1 > 2) { 10 } else if (2 > 1) { 30 } else { 20 }", Ok(Object::number(30))),
            ("if (\"\") { 1 } else { 2 }", Ok(Object::number(2))),
            ("if (null) { 1 } else { 2 }", Ok(Object::number(2))),
            ("true ? 1 : 2", Ok(Object::number(1))),
            ("1 > 2 ? \"yes\" : \"no\"", Ok(Object::string("no"))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_loops() {
        let inputs = vec![
            (
                "n := 0; while (n < 5) { n = n + 1; if (n == 3) { break } }; n",
                Ok(Object::number(3)),
            ),
            (
                "total := 0; for (i := 0; i < 5; i++) { if (i == 2) { continue }; total += i }; total",
                Ok(Object::number(8)),
            ),
            (
                "count := 0; for (i := 0; i < 100; i++) { count++; if (count == 4) { break } }; count",
                Ok(Object::number(4)),
            ),
            ("for (i := 0; i < 3; i++) { }; i", Err("1:31:test: runtime error: identifier not found: i")),
            ("i := 10; for (i := 0; i < 3; i++) { }; i", Ok(Object::number(10))),
            ("sum := 0; for (x in [1, 2, 3]) { sum += x }; sum", Ok(Object::number(6))),
            (
                "keys := \"\"; for (k, v in {\"b\": 2, \"a\": 1}) { keys += k }; keys",
                Ok(Object::string("ab")),
            ),
            (
                "total := 0; for (i, x in [5, 6]) { total += i * x }; total",
                Ok(Object::number(6)),
            ),
            ("while (false) { 1 }", Ok(Object::null())),
            ("for (x in 5) { }", Err("1:1:test: runtime error: cannot iterate over NUMBER")),
            ("break", Err("1:1:test: runtime error: 'break' outside of a loop")),
            (
                "f := function() { continue }; while (true) { f() }",
                Err("1:19:test: runtime error: 'continue' outside of a loop"),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_switch() {
        let inputs = vec![
            (
                "switch 2 { case 1 { \"one\" } case 2, 3 { \"two or three\" } default { \"other\" } }",
                Ok(Object::string("two or three")),
            ),
            (
                "switch 9 { default { \"other\" } case 9 { \"nine\" } }",
                Ok(Object::string("nine")),
            ),
            (
                "switch 4 { case 1 { \"one\" } default { \"other\" } }",
                Ok(Object::string("other")),
            ),
            ("switch \"1\" { case 1 { \"number\" } }", Ok(Object::null())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_functions() {
        let inputs = vec![
            ("identity := function(x) { x }; identity(5)", Ok(Object::number(5))),
            ("identity := function(x) { return x }; identity(5)", Ok(Object::number(5))),
            ("add := function(x, y) { x + y }; add(5 + 5, add(5, 5))", Ok(Object::number(20))),
            ("function(x) { x }(5)", Ok(Object::number(5))),
            (
                "function fib(n) { if (n <= 1) { return n }; return fib(n-1) + fib(n-2) }; fib(10)",
                Ok(Object::number(55)),
            ),
            (
                "function greet(name, greeting = \"hello\") { greeting + \" \" + name }; greet(\"bob\")",
                Ok(Object::string("hello bob")),
            ),
            (
                "function greet(name, greeting = \"hello\") { greeting + \" \" + name }; greet(\"bob\", \"hi\")",
                Ok(Object::string("hi bob")),
            ),
            ("function f(a = 2, b = a * 3) { a + b }; f()", Ok(Object::number(8))),
            ("function f(a = 2, b = a * 3) { a + b }; f(1)", Ok(Object::number(7))),
            ("function f(a) { a }; f(1, 2, 3)", Ok(Object::number(1))),
            ("function f() { return }; f()", Ok(Object::null())),
            (
                "function f() { for (i := 0; i < 10; i++) { if (i == 3) { return i } } }; f()",
                Ok(Object::number(3)),
            ),
            ("5()", Err("1:2:test: runtime error: not a function: NUMBER")),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_closures() {
        let inputs = vec![
            (
                "function make(a) { function(b) { a + b } }; make(5)(10)",
                Ok(Object::number(15)),
            ),
            (
                r#"
                function counter() {
                    count := 0
                    return function() { count = count + 1; return count }
                }
                c := counter()
                c(); c(); c()"#,
                Ok(Object::number(3)),
            ),
            (
                r#"
                function make(x) {
                    f := function() { x }
                    x = x * 10
                    return f
                }
                a := make(1)
                b := make(2)
                a() + b()"#,
                Ok(Object::number(30)),
            ),
            (
                "x := 1; function bump() { x = x + 1 }; bump(); bump(); x",
                Ok(Object::number(3)),
            ),
            (
                "x := 1; function shadow() { x := 100 }; shadow(); x",
                Ok(Object::number(1)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_classes() {
        let inputs = vec![
            (
                r#"
                class Animal {
                    function constructor(name) { this.name = name }
                    function speak() { return this.name + " makes a sound" }
                    function describe() { return "I am " + this.name }
                }
                class Dog extends Animal {
                    function speak() { return this.name + " barks" }
                }
                d := Dog.new("Rex");
                [d.speak(), d.describe(), Animal.new("Cat").speak()]"#,
                Ok(list(vec![
                    Object::string("Rex barks"),
                    Object::string("I am Rex"),
                    Object::string("Cat makes a sound"),
                ])),
            ),
            (
                r#"
                class Counter {
                    function constructor() { this.count = 0 }
                    function increment(by = 1) { this.count += by; return this }
                }
                c := Counter.new()
                c.increment().increment(5).count"#,
                Ok(Object::number(6)),
            ),
            (
                "class A { function value() { return \"class\" } }; a := A.new(); a.value = \"instance\"; a.value",
                Ok(Object::string("instance")),
            ),
            (
                "class A { }; a := A.new(); first := a.missing; a.missing = 2; [first, a.missing]",
                Ok(list(vec![Object::null(), Object::number(2)])),
            ),
            (
                "class A { }; A.new().fly()",
                Err("1:21:test: runtime error: undefined method fly for class A"),
            ),
            (
                "B := 5; class A extends B { }",
                Err("1:25:test: runtime error: 'B' is not a class"),
            ),
            ("this", Err("1:1:test: runtime error: 'this' used outside of a method")),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_traits() {
        let inputs = vec![
            (
                r#"
                trait Greets { function greet() { return "hi " + this.name } }
                class Person {
                    use Greets
                    function constructor(name) { this.name = name }
                }
                Person.new("Ann").greet()"#,
                Ok(Object::string("hi Ann")),
            ),
            (
                r#"
                trait Loud { function who() { return "trait" } }
                class Base { function who() { return "base" } }
                class Child extends Base { use Loud }
                Child.new().who()"#,
                Ok(Object::string("base")),
            ),
            (
                r#"
                trait Named { function label() { return "named" } }
                class Base { use Named }
                class Child extends Base { }
                Child.new().label()"#,
                Ok(Object::string("named")),
            ),
            (
                "class A { use B }",
                Err("1:15:test: runtime error: identifier not found: B"),
            ),
            (
                "B := 1; class A { use B }",
                Err("1:23:test: runtime error: 'B' is not a trait"),
            ),
            (
                "trait T { }; use T",
                Err("1:14:test: runtime error: 'use' is only allowed inside a class body"),
            ),
        ];

        test_evaluation(inputs);
    }
}
