use ghost_lang_core::decimal::Decimal;
use ghost_lang_core::parser::{ParseError, Parser};
use ghost_lang_core::scanner::Scanner;
use ghost_lang_core::token::Token;

use crate::environment::Scope;
use crate::library::{
    expect_arity, integer_argument, number_argument, string_argument, Library, LibraryModule,
};
use crate::object::{EvaluationError, Object};

const PI: &str = "3.1415926535897932384626433832795";

impl Library {
    /// The natives every engine starts with.
    pub fn standard() -> Self {
        let mut library = Library::new();
        library.register_function("print", builtin_print);
        library.register_function("type", builtin_type);
        library.register_module(
            LibraryModule::new("math")
                .function("abs", math_abs)
                .function("ceil", math_ceil)
                .function("floor", math_floor)
                .function("max", math_max)
                .function("min", math_min)
                .function("round", math_round)
                .property("pi", math_pi),
        );
        library.register_module(
            LibraryModule::new("ghost")
                .function("execute", ghost_execute)
                .property("version", ghost_version),
        );
        library
    }
}

fn builtin_print(
    scope: &Scope,
    _: &Token,
    arguments: Vec<Object>,
) -> Result<Option<Object>, EvaluationError> {
    let line: Vec<String> = arguments.iter().map(Object::to_string).collect();
    scope
        .environment
        .runtime()
        .write_output(&format!("{}\n", line.join(" ")))
        .map_err(|error| EvaluationError::Custom(format!("could not write output: {}", error).into()))?;
    Ok(None)
}

fn builtin_type(
    _: &Scope,
    _: &Token,
    arguments: Vec<Object>,
) -> Result<Option<Object>, EvaluationError> {
    expect_arity("type", &arguments, 1, 1)?;
    Ok(Some(Object::string(arguments[0].object_type().to_string())))
}

fn math_abs(_: &Scope, _: &Token, arguments: Vec<Object>) -> Result<Option<Object>, EvaluationError> {
    expect_arity("math.abs", &arguments, 1, 1)?;
    Ok(Some(Object::Number(number_argument("math.abs", &arguments, 0)?.abs())))
}

fn math_ceil(_: &Scope, _: &Token, arguments: Vec<Object>) -> Result<Option<Object>, EvaluationError> {
    expect_arity("math.ceil", &arguments, 1, 1)?;
    Ok(Some(Object::Number(number_argument("math.ceil", &arguments, 0)?.ceil())))
}

fn math_floor(
    _: &Scope,
    _: &Token,
    arguments: Vec<Object>,
) -> Result<Option<Object>, EvaluationError> {
    expect_arity("math.floor", &arguments, 1, 1)?;
    Ok(Some(Object::Number(number_argument("math.floor", &arguments, 0)?.floor())))
}

fn math_round(
    _: &Scope,
    _: &Token,
    arguments: Vec<Object>,
) -> Result<Option<Object>, EvaluationError> {
    expect_arity("math.round", &arguments, 1, 2)?;
    let value = number_argument("math.round", &arguments, 0)?;
    let places = match arguments.len() {
        2 => integer_argument("math.round", &arguments, 1)?,
        _ => 0,
    };
    Ok(Some(Object::Number(value.round(places))))
}

fn extreme(
    name: &str,
    arguments: &[Object],
    keep: fn(&Decimal, &Decimal) -> bool,
) -> Result<Option<Object>, EvaluationError> {
    expect_arity(name, arguments, 1, usize::MAX)?;
    let mut best = number_argument(name, arguments, 0)?;
    for index in 1..arguments.len() {
        let candidate = number_argument(name, arguments, index)?;
        if keep(candidate, best) {
            best = candidate;
        }
    }
    Ok(Some(Object::Number(best.clone())))
}

fn math_max(_: &Scope, _: &Token, arguments: Vec<Object>) -> Result<Option<Object>, EvaluationError> {
    extreme("math.max", &arguments, |candidate, best| candidate > best)
}

fn math_min(_: &Scope, _: &Token, arguments: Vec<Object>) -> Result<Option<Object>, EvaluationError> {
    extreme("math.min", &arguments, |candidate, best| candidate < best)
}

fn math_pi(_: &Scope, _: &Token) -> Result<Object, EvaluationError> {
    PI.parse::<Decimal>()
        .map(Object::Number)
        .map_err(|error| EvaluationError::Custom(error.to_string().into()))
}

fn ghost_version(_: &Scope, _: &Token) -> Result<Object, EvaluationError> {
    Ok(Object::string(env!("CARGO_PKG_VERSION")))
}

/// Runs source text in the caller's scope and yields its value.
fn ghost_execute(
    scope: &Scope,
    token: &Token,
    arguments: Vec<Object>,
) -> Result<Option<Object>, EvaluationError> {
    expect_arity("ghost.execute", &arguments, 1, 1)?;
    let source = string_argument("ghost.execute", &arguments, 0)?;
    let runtime = scope.environment.runtime();

    let scanner = Scanner::new(source, token.position.file.clone())
        .with_namespaces(runtime.library.namespaces());
    let program = Parser::new(scanner).parse_program().map_err(|errors| {
        let errors: Vec<String> = errors.iter().map(ParseError::to_string).collect();
        EvaluationError::Custom(errors.join("; ").into())
    })?;

    runtime
        .evaluate(&program, scope)
        .map(Some)
        .map_err(|error| EvaluationError::Execute(Box::new(error)))
}
