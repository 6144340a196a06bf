use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::rc::Rc;

use gc::{Finalize, Gc, GcCell, Trace};
use ghost_lang_core::ast::{
    FunctionLiteral, InfixOperationKind, PostfixOperationKind, PrefixOperationKind,
};
use ghost_lang_core::decimal::Decimal;
use ghost_lang_core::parser::ParseError;
use ghost_lang_core::token::{Position, Token};
use thiserror::Error;

use crate::environment::{Environment, Scope};
use crate::library::{LibraryModule, NativeFunction, NativeProperty};

#[derive(Clone, Trace, Finalize)]
pub enum Object {
    Number(#[unsafe_ignore_trace] Decimal),
    String(#[unsafe_ignore_trace] Rc<str>),
    Boolean(bool),
    Null,
    List(Gc<GcCell<Vec<Object>>>),
    Map(Gc<GcCell<HashMap<MapKey, MapPair>>>),
    Function(Gc<Function>),
    Class(Gc<Class>),
    Instance(Gc<Instance>),
    Trait(Gc<Trait>),
    Module(Gc<Module>),
    LibraryModule(#[unsafe_ignore_trace] Rc<LibraryModule>),
    LibraryFunction(#[unsafe_ignore_trace] NativeFunction),
    LibraryProperty(#[unsafe_ignore_trace] NativeProperty),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ObjectType {
    Number,
    String,
    Boolean,
    Null,
    List,
    Map,
    Function,
    Class,
    Instance,
    Trait,
    Module,
    LibraryModule,
    LibraryFunction,
    LibraryProperty,
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ObjectType::*;
        let name = match self {
            Number => "NUMBER",
            String => "STRING",
            Boolean => "BOOLEAN",
            Null => "NULL",
            List => "LIST",
            Map => "MAP",
            Function => "FUNCTION",
            Class => "CLASS",
            Instance => "INSTANCE",
            Trait => "TRAIT",
            Module => "MODULE",
            LibraryModule => "LIBRARY_MODULE",
            LibraryFunction => "LIBRARY_FUNCTION",
            LibraryProperty => "LIBRARY_PROPERTY",
        };
        write!(f, "{}", name)
    }
}

/// Hashed form of a map key. Equal numbers, strings and booleans always
/// produce equal keys.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Trace, Finalize)]
pub struct MapKey {
    #[unsafe_ignore_trace]
    pub kind: ObjectType,
    pub hash: u64,
}

#[derive(Clone, Trace, Finalize)]
pub struct MapPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Trace, Finalize)]
pub struct Function {
    #[unsafe_ignore_trace]
    pub literal: Rc<FunctionLiteral>,
    pub scope: Scope,
}

#[derive(Trace, Finalize)]
pub struct Class {
    #[unsafe_ignore_trace]
    pub name: Rc<str>,
    pub environment: Environment,
    pub super_class: Option<Gc<Class>>,
    pub traits: GcCell<Vec<Gc<Trait>>>,
}

#[derive(Trace, Finalize)]
pub struct Instance {
    pub class: Gc<Class>,
    pub environment: Environment,
}

#[derive(Trace, Finalize)]
pub struct Trait {
    #[unsafe_ignore_trace]
    pub name: Rc<str>,
    pub environment: Environment,
}

/// An imported source file.
#[derive(Trace, Finalize)]
pub struct Module {
    #[unsafe_ignore_trace]
    pub name: Rc<str>,
    #[unsafe_ignore_trace]
    pub path: PathBuf,
    pub environment: Environment,
}

impl Module {
    /// Exported bindings start with an uppercase letter.
    pub fn is_exported(name: &str) -> bool {
        name.chars().next().is_some_and(char::is_uppercase)
    }

    pub fn export(&self, name: &str) -> Option<Object> {
        if Self::is_exported(name) {
            self.environment.get_local(name)
        } else {
            None
        }
    }
}

impl Class {
    /// Looks `name` up in this class, then its superclasses, then the traits
    /// attached along the way.
    pub fn resolve(&self, name: &str) -> Option<Object> {
        self.resolve_in_hierarchy(name)
            .or_else(|| self.resolve_in_traits(name))
    }

    fn resolve_in_hierarchy(&self, name: &str) -> Option<Object> {
        self.environment.get_local(name).or_else(|| {
            self.super_class
                .as_ref()
                .and_then(|super_class| super_class.resolve_in_hierarchy(name))
        })
    }

    fn resolve_in_traits(&self, name: &str) -> Option<Object> {
        self.traits
            .borrow()
            .iter()
            .find_map(|attached| attached.environment.get_local(name))
            .or_else(|| {
                self.super_class
                    .as_ref()
                    .and_then(|super_class| super_class.resolve_in_traits(name))
            })
    }
}

/// Map entries ordered by key: booleans, then numbers, then strings.
pub fn sorted_pairs(map: &HashMap<MapKey, MapPair>) -> Vec<MapPair> {
    fn rank(key: &Object) -> u8 {
        match key {
            Object::Boolean(_) => 0,
            Object::Number(_) => 1,
            _ => 2,
        }
    }

    let mut pairs: Vec<MapPair> = map.values().cloned().collect();
    pairs.sort_by(|left, right| match (&left.key, &right.key) {
        (Object::Number(a), Object::Number(b)) => a.cmp(b),
        (Object::String(a), Object::String(b)) => a.cmp(b),
        (Object::Boolean(a), Object::Boolean(b)) => a.cmp(b),
        (a, b) => rank(a).cmp(&rank(b)),
    });
    pairs
}

fn hash_of(value: &impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl Object {
    pub fn null() -> Object {
        Object::Null
    }

    pub fn boolean(value: bool) -> Object {
        Object::Boolean(value)
    }

    pub fn number(value: impl Into<Decimal>) -> Object {
        Object::Number(value.into())
    }

    pub fn string(value: impl Into<Rc<str>>) -> Object {
        Object::String(value.into())
    }

    pub fn list(elements: Vec<Object>) -> Object {
        Object::List(Gc::new(GcCell::new(elements)))
    }

    pub fn map(pairs: HashMap<MapKey, MapPair>) -> Object {
        Object::Map(Gc::new(GcCell::new(pairs)))
    }

    /// Builds a map, failing on the first key that cannot be hashed.
    pub fn map_from_pairs(
        pairs: impl IntoIterator<Item = (Object, Object)>,
    ) -> Result<Object, EvaluationError> {
        let mut map = HashMap::new();
        for (key, value) in pairs {
            let hashed = key
                .map_key()
                .ok_or_else(|| EvaluationError::UnusableAsMapKey(key.object_type()))?;
            map.insert(hashed, MapPair { key, value });
        }
        Ok(Object::map(map))
    }

    pub fn function(literal: Rc<FunctionLiteral>, scope: Scope) -> Object {
        Object::Function(Gc::new(Function { literal, scope }))
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Number(_) => ObjectType::Number,
            Object::String(_) => ObjectType::String,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Null => ObjectType::Null,
            Object::List(_) => ObjectType::List,
            Object::Map(_) => ObjectType::Map,
            Object::Function(_) => ObjectType::Function,
            Object::Class(_) => ObjectType::Class,
            Object::Instance(_) => ObjectType::Instance,
            Object::Trait(_) => ObjectType::Trait,
            Object::Module(_) => ObjectType::Module,
            Object::LibraryModule(_) => ObjectType::LibraryModule,
            Object::LibraryFunction(_) => ObjectType::LibraryFunction,
            Object::LibraryProperty(_) => ObjectType::LibraryProperty,
        }
    }

    /// `None` for values that cannot be used as map keys.
    pub fn map_key(&self) -> Option<MapKey> {
        let hash = match self {
            Object::Number(value) => hash_of(&value.to_string()),
            Object::String(value) => hash_of(&value.as_bytes()),
            Object::Boolean(value) => u64::from(*value),
            _ => return None,
        };
        Some(MapKey {
            kind: self.object_type(),
            hash,
        })
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Null => false,
            Object::Boolean(value) => *value,
            Object::String(value) => !value.is_empty(),
            _ => true,
        }
    }

    /// Text shown in the REPL and inside collections: strings are quoted.
    pub fn inspect(&self) -> String {
        match self {
            Object::String(value) => format!("{:?}", value),
            _ => self.to_string(),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_to(f, &mut Vec::new())
    }
}

/// Identity of a list or map, used to notice containers that hold themselves.
type Address = *const ();

fn address<T: Trace + 'static>(container: &Gc<T>) -> Address {
    &**container as *const T as Address
}

impl Object {
    /// Writes the value, printing `[...]` or `{...}` for a container that is
    /// already being written further up in `open`.
    fn write_to(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        open: &mut Vec<Address>,
    ) -> std::fmt::Result {
        match self {
            Object::Number(value) => write!(f, "{}", value),
            Object::String(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::Null => write!(f, "null"),
            Object::List(elements) => {
                let address = address(elements);
                if open.contains(&address) {
                    return write!(f, "[...]");
                }
                open.push(address);
                write!(f, "[")?;
                for (index, element) in elements.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    element.write_inspected(f, open)?;
                }
                open.pop();
                write!(f, "]")
            }
            Object::Map(pairs) => {
                let address = address(pairs);
                if open.contains(&address) {
                    return write!(f, "{{...}}");
                }
                open.push(address);
                write!(f, "{{")?;
                for (index, pair) in sorted_pairs(&pairs.borrow()).iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", pair.key.inspect())?;
                    pair.value.write_inspected(f, open)?;
                }
                open.pop();
                write!(f, "}}")
            }
            Object::Function(function) => {
                let parameters: Vec<&str> = function
                    .literal
                    .parameters
                    .iter()
                    .map(|parameter| &*parameter.name)
                    .collect();
                match &function.literal.name {
                    Some(name) => write!(f, "function {}({})", name, parameters.join(", ")),
                    None => write!(f, "function({})", parameters.join(", ")),
                }
            }
            Object::Class(class) => write!(f, "class {}", class.name),
            Object::Instance(instance) => write!(f, "instance of {}", instance.class.name),
            Object::Trait(attached) => write!(f, "trait {}", attached.name),
            Object::Module(module) => write!(f, "module {}", module.name),
            Object::LibraryModule(module) => write!(f, "module {}", module.name),
            Object::LibraryFunction(function) => write!(f, "builtin function {}", function.name),
            Object::LibraryProperty(property) => write!(f, "builtin property {}", property.name),
        }
    }

    fn write_inspected(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        open: &mut Vec<Address>,
    ) -> std::fmt::Result {
        match self {
            Object::String(value) => write!(f, "{:?}", value),
            _ => self.write_to(f, open),
        }
    }

    /// Structural equality. A pair of containers met again while already
    /// being compared counts as equal.
    fn equals(&self, other: &Object, open: &mut Vec<(Address, Address)>) -> bool {
        match (self, other) {
            (Object::List(left), Object::List(right)) => {
                let pair = (address(left), address(right));
                if Gc::ptr_eq(left, right) || open.contains(&pair) {
                    return true;
                }
                open.push(pair);
                let (left, right) = (left.borrow(), right.borrow());
                let equal = left.len() == right.len()
                    && left.iter().zip(right.iter()).all(|(a, b)| a.equals(b, open));
                open.pop();
                equal
            }
            (Object::Map(left), Object::Map(right)) => {
                let pair = (address(left), address(right));
                if Gc::ptr_eq(left, right) || open.contains(&pair) {
                    return true;
                }
                open.push(pair);
                let (left, right) = (left.borrow(), right.borrow());
                let equal = left.len() == right.len()
                    && left.iter().all(|(key, entry)| {
                        right
                            .get(key)
                            .is_some_and(|other| entry.value.equals(&other.value, open))
                    });
                open.pop();
                equal
            }
            (Object::Number(left), Object::Number(right)) => left == right,
            (Object::String(left), Object::String(right)) => left == right,
            (Object::Boolean(left), Object::Boolean(right)) => left == right,
            (Object::Null, Object::Null) => true,
            (Object::Function(left), Object::Function(right)) => Gc::ptr_eq(left, right),
            (Object::Class(left), Object::Class(right)) => Gc::ptr_eq(left, right),
            (Object::Instance(left), Object::Instance(right)) => Gc::ptr_eq(left, right),
            (Object::Trait(left), Object::Trait(right)) => Gc::ptr_eq(left, right),
            (Object::Module(left), Object::Module(right)) => Gc::ptr_eq(left, right),
            (Object::LibraryModule(left), Object::LibraryModule(right)) => Rc::ptr_eq(left, right),
            (Object::LibraryFunction(left), Object::LibraryFunction(right)) => {
                left.name == right.name
            }
            (Object::LibraryProperty(left), Object::LibraryProperty(right)) => {
                left.name == right.name
            }
            _ => false,
        }
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.object_type(), self.inspect())
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, &mut Vec::new())
    }
}

/// Non-local exits from evaluation. Everything but `Error` is consumed by
/// the construct it targets.
#[derive(Debug, PartialEq)]
pub enum QuickReturn {
    Return(Object),
    Break(Token),
    Continue(Token),
    Error(RuntimeError),
}

impl From<RuntimeError> for QuickReturn {
    fn from(error: RuntimeError) -> Self {
        QuickReturn::Error(error)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{position}: runtime error: {kind}")]
pub struct RuntimeError {
    pub position: Position,
    pub kind: EvaluationError,
}

impl RuntimeError {
    pub fn new(token: &Token, kind: EvaluationError) -> Self {
        RuntimeError {
            position: token.position.clone(),
            kind,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: ObjectType,
        operator: InfixOperationKind,
        right: ObjectType,
    },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: ObjectType,
        operator: InfixOperationKind,
        right: ObjectType,
    },
    #[error("unknown operator: {operator}{right}")]
    UnknownPrefixOperator {
        operator: PrefixOperationKind,
        right: ObjectType,
    },
    #[error("unknown operator: {operand}{operator}")]
    UnknownPostfixOperator {
        operator: PostfixOperationKind,
        operand: ObjectType,
    },
    #[error("identifier not found: {0}")]
    UnknownIdentifier(Rc<str>),
    #[error("not a function: {0}")]
    CallNonFunction(ObjectType),
    #[error("index operator not supported: {0}")]
    IndexNotSupported(ObjectType),
    #[error("list index must be a number, got {0}")]
    NonNumericIndex(ObjectType),
    #[error("list index out of range: {0}")]
    IndexOutOfRange(Decimal),
    #[error("unusable as map key: {0}")]
    UnusableAsMapKey(ObjectType),
    #[error("division by zero")]
    DivisionByZero,
    #[error("number out of range")]
    NumberOutOfRange,
    #[error("undefined method {method} for class {class}")]
    UndefinedMethod { method: Rc<str>, class: Rc<str> },
    #[error("undefined method {method} for {receiver}")]
    UnknownMethod { method: Rc<str>, receiver: ObjectType },
    #[error("undefined property {property} for {receiver}")]
    UnknownProperty {
        property: Rc<str>,
        receiver: ObjectType,
    },
    #[error("cannot assign property {property} on {receiver}")]
    PropertyAssignmentNotSupported {
        property: Rc<str>,
        receiver: ObjectType,
    },
    #[error("'{name}' is not exported by module {module}")]
    NotExported { name: Rc<str>, module: Rc<str> },
    #[error("'this' used outside of a method")]
    ThisOutsideMethod,
    #[error("'use' is only allowed inside a class body")]
    UseOutsideClass,
    #[error("'{0}' is not a trait")]
    NotATrait(Rc<str>),
    #[error("'{0}' is not a class")]
    NotAClass(Rc<str>),
    #[error("'{0}' outside of a loop")]
    OutsideLoop(&'static str),
    #[error("cannot iterate over {0}")]
    NotIterable(ObjectType),
    #[error("import path must be a string, got {0}")]
    InvalidImportPath(ObjectType),
    #[error("no module named '{0}' found")]
    ModuleNotFound(Rc<str>),
    #[error("could not read module {path}: {message}")]
    ModuleUnreadable { path: Rc<str>, message: Rc<str> },
    #[error("syntax errors in module {path}: {}", render_parse_errors(.errors))]
    ModuleParseFailed {
        path: Rc<str>,
        errors: Vec<ParseError>,
    },
    #[error("circular import of {0}")]
    CircularImport(Rc<str>),
    #[error("wrong number of arguments to {name}: got {actual}, expected {expected}")]
    WrongArgumentCount {
        name: Rc<str>,
        expected: Rc<str>,
        actual: usize,
    },
    #[error("invalid argument to {name}: {message}")]
    InvalidArgument { name: Rc<str>, message: Rc<str> },
    #[error("in executed source: {0}")]
    Execute(Box<RuntimeError>),
    #[error("{0}")]
    Custom(Rc<str>),
}

fn render_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ParseError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl EvaluationError {
    pub fn wrong_argument_count(name: &str, expected: &str, actual: usize) -> Self {
        EvaluationError::WrongArgumentCount {
            name: name.into(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn invalid_argument(name: &str, message: impl Into<Rc<str>>) -> Self {
        EvaluationError::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}
