use gc::{Gc, GcCell};
use ghost_lang_core::ast::{Block, ClassLiteral, Identifier};
use ghost_lang_core::token::Token;

use super::{error, eval_block, eval_identifier, EvalResult};
use crate::environment::{Environment, Scope};
use crate::object::{Class, EvaluationError, Object, Trait};

/// Binds the class before its body runs, so methods can refer to it by
/// name. The body runs with the class as receiver.
pub(super) fn eval_class(literal: &ClassLiteral, scope: &Scope) -> EvalResult {
    let super_class = match &literal.super_class {
        Some(identifier) => match &eval_identifier(identifier, scope)? {
            Object::Class(class) => Some(class.clone()),
            _ => {
                return Err(error(
                    &identifier.token,
                    EvaluationError::NotAClass(identifier.name.clone()),
                ))
            }
        },
        None => None,
    };

    let class = Gc::new(Class {
        name: literal.name.name.clone(),
        environment: Environment::new_enclosed(&scope.environment),
        super_class,
        traits: GcCell::new(Vec::new()),
    });
    let object = Object::Class(class.clone());
    scope
        .environment
        .define(literal.name.name.clone(), object.clone());

    let body_scope = Scope::with_receiver(class.environment.clone(), object.clone());
    eval_block(&literal.body, &body_scope)?;
    Ok(object)
}

pub(super) fn eval_trait(name: &Identifier, body: &Block, scope: &Scope) -> EvalResult {
    let environment = Environment::new_enclosed(&scope.environment);
    let object = Object::Trait(Gc::new(Trait {
        name: name.name.clone(),
        environment: environment.clone(),
    }));
    scope.environment.define(name.name.clone(), object.clone());

    eval_block(body, &Scope::with_receiver(environment, object.clone()))?;
    Ok(object)
}

/// `use A, B` attaches traits to the class whose body is being evaluated.
pub(super) fn eval_use(traits: &[Identifier], token: &Token, scope: &Scope) -> EvalResult {
    let Some(Object::Class(class)) = &scope.receiver else {
        return Err(error(token, EvaluationError::UseOutsideClass));
    };
    for identifier in traits {
        match &eval_identifier(identifier, scope)? {
            Object::Trait(attached) => class.traits.borrow_mut().push(attached.clone()),
            _ => {
                return Err(error(
                    &identifier.token,
                    EvaluationError::NotATrait(identifier.name.clone()),
                ))
            }
        }
    }
    Ok(Object::Null)
}
