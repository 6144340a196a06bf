use std::rc::Rc;

use ghost_lang_core::decimal::Decimal;

use crate::library::{expect_arity, integer_argument, string_argument};
use crate::object::{sorted_pairs, EvaluationError, Object};

type MethodResult = Option<Result<Object, EvaluationError>>;

impl Object {
    /// Built-in methods every value of a type carries. `None` when the type
    /// has no method called `name`.
    pub fn method(&self, name: &str, arguments: Vec<Object>) -> MethodResult {
        if name == "toString" {
            return Some(expect_arity(name, &arguments, 0, 0).map(|_| Object::string(self.to_string())));
        }
        match self {
            Object::String(value) => string_method(value, name, &arguments),
            Object::List(_) => list_method(self, name, arguments),
            Object::Map(_) => map_method(self, name, &arguments),
            Object::Number(value) => number_method(value, name, &arguments),
            _ => None,
        }
    }
}

fn string_method(value: &Rc<str>, name: &str, arguments: &[Object]) -> MethodResult {
    let result = match name {
        "length" => expect_arity(name, arguments, 0, 0)
            .map(|_| Object::number(value.chars().count())),
        "toUpperCase" => expect_arity(name, arguments, 0, 0)
            .map(|_| Object::string(value.to_uppercase())),
        "toLowerCase" => expect_arity(name, arguments, 0, 0)
            .map(|_| Object::string(value.to_lowercase())),
        "trim" => expect_arity(name, arguments, 0, 0).map(|_| Object::string(value.trim())),
        "split" => split(value, arguments),
        "contains" => string_predicate(name, arguments, |pattern| value.contains(pattern)),
        "startsWith" => string_predicate(name, arguments, |pattern| value.starts_with(pattern)),
        "endsWith" => string_predicate(name, arguments, |pattern| value.ends_with(pattern)),
        "replace" => expect_arity(name, arguments, 2, 2).and_then(|_| {
            let from = string_argument(name, arguments, 0)?;
            let to = string_argument(name, arguments, 1)?;
            Ok(Object::string(value.replace(from, to)))
        }),
        "toNumber" => expect_arity(name, arguments, 0, 0).map(|_| {
            value
                .trim()
                .parse::<Decimal>()
                .map(Object::Number)
                .unwrap_or(Object::Null)
        }),
        _ => return None,
    };
    Some(result)
}

fn string_predicate(
    name: &str,
    arguments: &[Object],
    predicate: impl FnOnce(&str) -> bool,
) -> Result<Object, EvaluationError> {
    expect_arity(name, arguments, 1, 1)?;
    let pattern = string_argument(name, arguments, 0)?;
    Ok(Object::boolean(predicate(pattern)))
}

/// Without a separator the string is split on whitespace; an empty
/// separator splits it into characters.
fn split(value: &str, arguments: &[Object]) -> Result<Object, EvaluationError> {
    expect_arity("split", arguments, 0, 1)?;
    let parts: Vec<Object> = match arguments.first() {
        None => value.split_whitespace().map(Object::string).collect(),
        Some(_) => match string_argument("split", arguments, 0)? {
            "" => value
                .chars()
                .map(|character| Object::string(character.to_string()))
                .collect(),
            separator => value.split(separator).map(Object::string).collect(),
        },
    };
    Ok(Object::list(parts))
}

fn list_method(list: &Object, name: &str, mut arguments: Vec<Object>) -> MethodResult {
    let Object::List(elements) = list else {
        return None;
    };
    let result = match name {
        "length" => expect_arity(name, &arguments, 0, 0)
            .map(|_| Object::number(elements.borrow().len())),
        "first" => expect_arity(name, &arguments, 0, 0)
            .map(|_| elements.borrow().first().cloned().unwrap_or(Object::Null)),
        "last" => expect_arity(name, &arguments, 0, 0)
            .map(|_| elements.borrow().last().cloned().unwrap_or(Object::Null)),
        "tail" => expect_arity(name, &arguments, 0, 0).map(|_| match elements.borrow().split_first() {
            Some((_, rest)) => Object::list(rest.to_vec()),
            None => Object::Null,
        }),
        "push" => expect_arity(name, &arguments, 1, usize::MAX).map(|_| {
            let mut elements = elements.borrow_mut();
            elements.append(&mut arguments);
            Object::number(elements.len())
        }),
        // Removes from the front, so push and pop together make a queue.
        "pop" => expect_arity(name, &arguments, 0, 0).map(|_| {
            let mut elements = elements.borrow_mut();
            if elements.is_empty() {
                Object::Null
            } else {
                elements.remove(0)
            }
        }),
        "join" => expect_arity(name, &arguments, 0, 1).and_then(|_| {
            let separator = match arguments.len() {
                1 => string_argument(name, &arguments, 0)?,
                _ => "",
            };
            let parts: Vec<String> = elements.borrow().iter().map(Object::to_string).collect();
            Ok(Object::string(parts.join(separator)))
        }),
        "contains" => expect_arity(name, &arguments, 1, 1)
            .map(|_| Object::boolean(elements.borrow().contains(&arguments[0]))),
        "reverse" => expect_arity(name, &arguments, 0, 0).map(|_| {
            Object::list(elements.borrow().iter().rev().cloned().collect())
        }),
        _ => return None,
    };
    Some(result)
}

fn map_method(map: &Object, name: &str, arguments: &[Object]) -> MethodResult {
    let Object::Map(pairs) = map else {
        return None;
    };
    let key_of = |key: &Object| {
        key.map_key()
            .ok_or_else(|| EvaluationError::UnusableAsMapKey(key.object_type()))
    };
    let result = match name {
        "length" => expect_arity(name, arguments, 0, 0).map(|_| Object::number(pairs.borrow().len())),
        "keys" => expect_arity(name, arguments, 0, 0).map(|_| {
            Object::list(sorted_pairs(&pairs.borrow()).into_iter().map(|pair| pair.key.clone()).collect())
        }),
        "values" => expect_arity(name, arguments, 0, 0).map(|_| {
            Object::list(
                sorted_pairs(&pairs.borrow())
                    .iter()
                    .map(|pair| pair.value.clone())
                    .collect(),
            )
        }),
        "has" => expect_arity(name, arguments, 1, 1)
            .and_then(|_| key_of(&arguments[0]))
            .map(|key| Object::boolean(pairs.borrow().contains_key(&key))),
        "delete" => expect_arity(name, arguments, 1, 1)
            .and_then(|_| key_of(&arguments[0]))
            .map(|key| {
                pairs
                    .borrow_mut()
                    .remove(&key)
                    .map(|pair| pair.value.clone())
                    .unwrap_or(Object::Null)
            }),
        _ => return None,
    };
    Some(result)
}

fn number_method(value: &Decimal, name: &str, arguments: &[Object]) -> MethodResult {
    let result = match name {
        "round" => expect_arity(name, arguments, 0, 1).and_then(|_| {
            let places = match arguments.len() {
                1 => integer_argument(name, arguments, 0)?,
                _ => 0,
            };
            Ok(Object::Number(value.round(places)))
        }),
        "floor" => expect_arity(name, arguments, 0, 0).map(|_| Object::Number(value.floor())),
        "ceil" => expect_arity(name, arguments, 0, 0).map(|_| Object::Number(value.ceil())),
        "abs" => expect_arity(name, arguments, 0, 0).map(|_| Object::Number(value.abs())),
        _ => return None,
    };
    Some(result)
}
