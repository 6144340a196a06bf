use std::rc::Rc;

use gc::Gc;
use ghost_lang_core::ast::{FunctionLiteral, Identifier};
use ghost_lang_core::token::Token;
use tracing::trace;

use super::{error, eval_block, eval_expression, settle, EvalResult};
use crate::environment::{Environment, Scope};
use crate::object::{
    Class, EvaluationError, Function, Instance, Module, Object, ObjectType, QuickReturn,
};

pub(super) fn eval_function_literal(literal: &Rc<FunctionLiteral>, scope: &Scope) -> EvalResult {
    let function = Object::function(literal.clone(), scope.clone());
    if let Some(name) = &literal.name {
        scope.environment.define(name.name.clone(), function.clone());
    }
    Ok(function)
}

/// Calls a user function. Defaults are bound first, in order, so a default
/// may refer to an earlier default. Positional arguments are bound over them
/// and extra arguments are dropped.
fn call_function(
    function: &Gc<Function>,
    arguments: Vec<Object>,
    receiver: Option<Object>,
) -> EvalResult {
    let literal = &function.literal;
    let scope = Scope {
        environment: Environment::new_enclosed(&function.scope.environment),
        receiver: receiver.or_else(|| function.scope.receiver.clone()),
    };

    trace!(
        function = literal.name.as_ref().map_or("<anonymous>", |name| &*name.name),
        arguments = arguments.len(),
        "call"
    );

    for (parameter, default) in &literal.defaults {
        let value = eval_expression(default, &scope)?;
        scope.environment.define(parameter.name.clone(), value);
    }
    for (parameter, argument) in literal.parameters.iter().zip(arguments) {
        scope.environment.define(parameter.name.clone(), argument);
    }

    settle(eval_block(&literal.body, &scope)).map_err(QuickReturn::Error)
}

/// Calls anything callable: user functions, natives and native properties.
pub(super) fn apply(
    callee: &Object,
    arguments: Vec<Object>,
    receiver: Option<Object>,
    token: &Token,
    scope: &Scope,
) -> EvalResult {
    match callee {
        Object::Function(function) => call_function(function, arguments, receiver),
        Object::LibraryFunction(function) => function
            .call(scope, token, arguments)
            .map_err(|kind| error(token, kind)),
        Object::LibraryProperty(property) => property
            .read(scope, token)
            .map_err(|kind| error(token, kind)),
        other => Err(error(
            token,
            EvaluationError::CallNonFunction(other.object_type()),
        )),
    }
}

fn instantiate(class: &Gc<Class>, arguments: Vec<Object>, token: &Token, scope: &Scope) -> EvalResult {
    let instance = Object::Instance(Gc::new(Instance {
        class: class.clone(),
        environment: Environment::new_enclosed(&class.environment),
    }));
    if let Some(constructor) = class.resolve("constructor") {
        apply(&constructor, arguments, Some(instance.clone()), token, scope)?;
    }
    Ok(instance)
}

/// `receiver.name(arguments)`.
pub(super) fn invoke_method(
    receiver: &Object,
    name: &Identifier,
    arguments: Vec<Object>,
    token: &Token,
    scope: &Scope,
) -> EvalResult {
    let undefined = |class: &Rc<str>| {
        error(
            token,
            EvaluationError::UndefinedMethod {
                method: name.name.clone(),
                class: class.clone(),
            },
        )
    };

    let method = match receiver {
        Object::Instance(instance) => Some(
            instance
                .environment
                .get_local(&name.name)
                .or_else(|| instance.class.resolve(&name.name))
                .ok_or_else(|| undefined(&instance.class.name))?,
        ),
        Object::Class(class) if &*name.name == "new" => {
            return instantiate(class, arguments, token, scope);
        }
        Object::Class(class) => Some(class.resolve(&name.name).ok_or_else(|| undefined(&class.name))?),
        Object::Trait(attached) => attached.environment.get_local(&name.name),
        Object::LibraryModule(module) => module.member(&name.name),
        Object::Module(module) => Some(exported(module, name)?),
        Object::Map(pairs) => Object::String(name.name.clone())
            .map_key()
            .and_then(|key| pairs.borrow().get(&key).map(|pair| pair.value.clone()))
            .filter(|value| {
                matches!(
                    value,
                    Object::Function(_) | Object::LibraryFunction(_) | Object::LibraryProperty(_)
                )
            }),
        _ => None,
    };

    match method {
        Some(method) => apply(&method, arguments, Some(receiver.clone()), token, scope),
        None => match receiver.method(&name.name, arguments) {
            Some(result) => result.map_err(|kind| error(token, kind)),
            None => Err(error(
                token,
                EvaluationError::UnknownMethod {
                    method: name.name.clone(),
                    receiver: receiver.object_type(),
                },
            )),
        },
    }
}

fn exported(module: &Module, name: &Identifier) -> Result<Object, QuickReturn> {
    if let Some(value) = module.export(&name.name) {
        return Ok(value);
    }
    let kind = if module.environment.contains_local(&name.name) {
        EvaluationError::NotExported {
            name: name.name.clone(),
            module: module.name.clone(),
        }
    } else {
        EvaluationError::UnknownProperty {
            property: name.name.clone(),
            receiver: ObjectType::Module,
        }
    };
    Err(error(&name.token, kind))
}

/// `receiver.name`. Reading a property an instance does not have anywhere
/// in its hierarchy binds it to null on the instance.
pub(super) fn property_value(receiver: &Object, name: &Identifier, scope: &Scope) -> EvalResult {
    let unknown = || {
        error(
            &name.token,
            EvaluationError::UnknownProperty {
                property: name.name.clone(),
                receiver: receiver.object_type(),
            },
        )
    };

    match receiver {
        Object::Instance(instance) => {
            let found = instance
                .environment
                .get_local(&name.name)
                .or_else(|| instance.class.resolve(&name.name));
            Ok(found.unwrap_or_else(|| {
                instance
                    .environment
                    .define(name.name.clone(), Object::Null);
                Object::Null
            }))
        }
        Object::Class(class) => class.resolve(&name.name).ok_or_else(unknown),
        Object::Trait(attached) => attached.environment.get_local(&name.name).ok_or_else(unknown),
        Object::Map(pairs) => Ok(Object::String(name.name.clone())
            .map_key()
            .and_then(|key| pairs.borrow().get(&key).map(|pair| pair.value.clone()))
            .unwrap_or(Object::Null)),
        Object::LibraryModule(module) => match &module.member(&name.name) {
            Some(Object::LibraryProperty(property)) => property
                .read(scope, &name.token)
                .map_err(|kind| error(&name.token, kind)),
            Some(member) => Ok(member.clone()),
            None => Err(unknown()),
        },
        Object::Module(module) => exported(module, name),
        _ => Err(unknown()),
    }
}
