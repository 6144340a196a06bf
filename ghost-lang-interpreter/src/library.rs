use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::rc::Rc;

use ghost_lang_core::decimal::Decimal;
use ghost_lang_core::token::Token;

use crate::environment::Scope;
use crate::object::{EvaluationError, Object};

/// A native callable. Returning `Ok(None)` means the call produced no value.
pub type NativeFunctionPointer =
    fn(&Scope, &Token, Vec<Object>) -> Result<Option<Object>, EvaluationError>;

/// A native zero-argument value, computed each time it is read.
pub type NativePropertyPointer = fn(&Scope, &Token) -> Result<Object, EvaluationError>;

#[derive(Clone)]
pub struct NativeFunction {
    pub name: Rc<str>,
    pub function: NativeFunctionPointer,
}

#[derive(Clone)]
pub struct NativeProperty {
    pub name: Rc<str>,
    pub property: NativePropertyPointer,
}

impl NativeFunction {
    pub fn call(
        &self,
        scope: &Scope,
        token: &Token,
        arguments: Vec<Object>,
    ) -> Result<Object, EvaluationError> {
        Ok((self.function)(scope, token, arguments)?.unwrap_or(Object::Null))
    }
}

impl NativeProperty {
    pub fn read(&self, scope: &Scope, token: &Token) -> Result<Object, EvaluationError> {
        (self.property)(scope, token)
    }
}

/// A named group of natives reached as `module.member`.
pub struct LibraryModule {
    pub name: Rc<str>,
    functions: HashMap<Rc<str>, NativeFunction>,
    properties: HashMap<Rc<str>, NativeProperty>,
}

impl LibraryModule {
    pub fn new(name: &str) -> Self {
        LibraryModule {
            name: name.into(),
            functions: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    pub fn function(mut self, name: &str, function: NativeFunctionPointer) -> Self {
        let qualified: Rc<str> = format!("{}.{}", self.name, name).into();
        self.functions.insert(
            name.into(),
            NativeFunction {
                name: qualified,
                function,
            },
        );
        self
    }

    pub fn property(mut self, name: &str, property: NativePropertyPointer) -> Self {
        let qualified: Rc<str> = format!("{}.{}", self.name, name).into();
        self.properties.insert(
            name.into(),
            NativeProperty {
                name: qualified,
                property,
            },
        );
        self
    }

    pub fn member(&self, name: &str) -> Option<Object> {
        if let Some(function) = self.functions.get(name) {
            return Some(Object::LibraryFunction(function.clone()));
        }
        self.properties
            .get(name)
            .map(|property| Object::LibraryProperty(property.clone()))
    }

    fn member_names(&self) -> impl Iterator<Item = &Rc<str>> {
        self.functions.keys().chain(self.properties.keys())
    }
}

impl Debug for LibraryModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryModule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Natives visible to every program run by one runtime.
#[derive(Default)]
pub struct Library {
    functions: HashMap<Rc<str>, NativeFunction>,
    modules: HashMap<Rc<str>, Rc<LibraryModule>>,
    namespaces: HashSet<Rc<str>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_function(&mut self, name: &str, function: NativeFunctionPointer) {
        self.functions.insert(
            name.into(),
            NativeFunction {
                name: name.into(),
                function,
            },
        );
    }

    pub fn register_module(&mut self, module: LibraryModule) {
        for member in module.member_names() {
            self.namespaces
                .insert(format!("{}.{}", module.name, member).into());
        }
        self.modules.insert(module.name.clone(), Rc::new(module));
    }

    pub fn module(&self, name: &str) -> Option<Rc<LibraryModule>> {
        self.modules.get(name).cloned()
    }

    pub fn function(&self, name: &str) -> Option<NativeFunction> {
        self.functions.get(name).cloned()
    }

    /// Resolves a module name, a function name, or a qualified
    /// `module.member` name.
    pub fn resolve(&self, name: &str) -> Option<Object> {
        if let Some(module) = self.module(name) {
            return Some(Object::LibraryModule(module));
        }
        if let Some(function) = self.function(name) {
            return Some(Object::LibraryFunction(function));
        }
        let (module, member) = name.split_once('.')?;
        self.modules.get(module)?.member(member)
    }

    /// Qualified member names, used by the scanner to keep `module.member`
    /// together as one identifier.
    pub fn namespaces(&self) -> &HashSet<Rc<str>> {
        &self.namespaces
    }
}

/// Fails unless `arguments` holds between `min` and `max` values.
pub fn expect_arity(
    name: &str,
    arguments: &[Object],
    min: usize,
    max: usize,
) -> Result<(), EvaluationError> {
    if (min..=max).contains(&arguments.len()) {
        return Ok(());
    }
    let expected = match (min, max) {
        (min, max) if min == max => min.to_string(),
        (min, usize::MAX) => format!("at least {}", min),
        (min, max) => format!("{} to {}", min, max),
    };
    Err(EvaluationError::wrong_argument_count(
        name,
        &expected,
        arguments.len(),
    ))
}

pub fn number_argument<'a>(
    name: &str,
    arguments: &'a [Object],
    index: usize,
) -> Result<&'a Decimal, EvaluationError> {
    match arguments.get(index) {
        Some(Object::Number(value)) => Ok(value),
        Some(other) => Err(EvaluationError::invalid_argument(
            name,
            format!("argument {} must be NUMBER, got {}", index + 1, other.object_type()),
        )),
        None => Err(EvaluationError::wrong_argument_count(
            name,
            &(index + 1).to_string(),
            arguments.len(),
        )),
    }
}

pub fn string_argument<'a>(
    name: &str,
    arguments: &'a [Object],
    index: usize,
) -> Result<&'a str, EvaluationError> {
    match arguments.get(index) {
        Some(Object::String(value)) => Ok(value),
        Some(other) => Err(EvaluationError::invalid_argument(
            name,
            format!("argument {} must be STRING, got {}", index + 1, other.object_type()),
        )),
        None => Err(EvaluationError::wrong_argument_count(
            name,
            &(index + 1).to_string(),
            arguments.len(),
        )),
    }
}

/// A number argument that must be a whole number fitting in an `i32`.
pub fn integer_argument(
    name: &str,
    arguments: &[Object],
    index: usize,
) -> Result<i32, EvaluationError> {
    let value = number_argument(name, arguments, index)?;
    value
        .to_i64()
        .filter(|_| value.is_integer())
        .and_then(|value| i32::try_from(value).ok())
        .ok_or_else(|| {
            EvaluationError::invalid_argument(
                name,
                format!("argument {} must be a whole number, got {}", index + 1, value),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(_: &Scope, _: &Token) -> Result<Object, EvaluationError> {
        Ok(Object::number(42))
    }

    fn nothing(_: &Scope, _: &Token, _: Vec<Object>) -> Result<Option<Object>, EvaluationError> {
        Ok(None)
    }

    #[test]
    fn test_resolve() {
        let mut library = Library::new();
        library.register_function("nothing", nothing);
        library.register_module(
            LibraryModule::new("deep")
                .property("answer", answer)
                .function("nothing", nothing),
        );

        assert!(matches!(library.resolve("deep"), Some(Object::LibraryModule(_))));
        assert!(matches!(library.resolve("nothing"), Some(Object::LibraryFunction(_))));
        assert!(matches!(
            library.resolve("deep.answer"),
            Some(Object::LibraryProperty(_))
        ));
        match &library.resolve("deep.nothing") {
            Some(Object::LibraryFunction(function)) => assert_eq!(&*function.name, "deep.nothing"),
            other => panic!("expected a library function, got {other:?}"),
        }
        assert!(library.resolve("deep.missing").is_none());
        assert!(library.resolve("missing").is_none());

        let mut namespaces: Vec<&str> = library.namespaces().iter().map(|name| &**name).collect();
        namespaces.sort();
        assert_eq!(namespaces, vec!["deep.answer", "deep.nothing"]);
    }
}
