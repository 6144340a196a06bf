use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::Rc;

use gc::{Finalize, Gc, GcCell, Trace};

use crate::object::Object;
use crate::runtime::Runtime;

#[derive(Trace, Finalize)]
pub struct EnvironmentCore {
    store: HashMap<Rc<str>, Object>,
    outer: Option<Environment>,
    #[unsafe_ignore_trace]
    runtime: Rc<Runtime>,
}

/// A chain of name bindings. Cloning shares the underlying bindings.
#[derive(Clone, Trace, Finalize)]
pub struct Environment {
    environment: Gc<GcCell<EnvironmentCore>>,
}

impl Environment {
    /// A root environment. Every environment enclosed by it shares `runtime`.
    pub fn new(runtime: Rc<Runtime>) -> Self {
        Environment {
            environment: Gc::new(GcCell::new(EnvironmentCore {
                store: HashMap::new(),
                outer: None,
                runtime,
            })),
        }
    }

    pub fn new_enclosed(outer: &Environment) -> Environment {
        Environment {
            environment: Gc::new(GcCell::new(EnvironmentCore {
                store: HashMap::new(),
                outer: Some(outer.clone()),
                runtime: outer.runtime(),
            })),
        }
    }

    pub fn runtime(&self) -> Rc<Runtime> {
        self.environment.borrow().runtime.clone()
    }

    pub fn get(&self, key: &str) -> Option<Object> {
        let env = self.environment.borrow();
        match env.store.get(key) {
            Some(value) => Some(value.clone()),
            None => env.outer.as_ref().and_then(|outer| outer.get(key)),
        }
    }

    /// Looks `key` up in this environment only, ignoring enclosing ones.
    pub fn get_local(&self, key: &str) -> Option<Object> {
        self.environment.borrow().store.get(key).cloned()
    }

    pub fn contains_local(&self, key: &str) -> bool {
        self.environment.borrow().store.contains_key(key)
    }

    pub fn define(&self, key: Rc<str>, value: Object) {
        self.environment.borrow_mut().store.insert(key, value);
    }

    /// Rebinds the nearest existing binding of `key`, or defines it here when
    /// no enclosing environment has one.
    pub fn assign(&self, key: Rc<str>, value: Object) {
        if let Err(value) = self.assign_existing(&key, value) {
            self.define(key, value);
        }
    }

    fn assign_existing(&self, key: &Rc<str>, value: Object) -> Result<(), Object> {
        if self.contains_local(key) {
            self.define(key.clone(), value);
            return Ok(());
        }
        let outer = self.environment.borrow().outer.clone();
        match outer {
            Some(outer) => outer.assign_existing(key, value),
            None => Err(value),
        }
    }

    pub fn remove(&self, key: &str) -> Option<Object> {
        self.environment.borrow_mut().store.remove(key)
    }

    /// Names bound directly in this environment, sorted.
    pub fn names(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = self.environment.borrow().store.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Gc::ptr_eq(&self.environment, &other.environment)
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}

/// An environment paired with the value `this` refers to.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct Scope {
    pub environment: Environment,
    pub receiver: Option<Object>,
}

impl Scope {
    pub fn new(environment: Environment) -> Self {
        Scope {
            environment,
            receiver: None,
        }
    }

    pub fn with_receiver(environment: Environment, receiver: Object) -> Self {
        Scope {
            environment,
            receiver: Some(receiver),
        }
    }

    /// A fresh environment enclosed by this one, keeping the receiver.
    pub fn enclosed(&self) -> Scope {
        Scope {
            environment: Environment::new_enclosed(&self.environment),
            receiver: self.receiver.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    fn root() -> Environment {
        Environment::new(Rc::new(Runtime::default()))
    }

    #[test]
    fn test_lookup_walks_outwards() {
        let outer = root();
        outer.define("a".into(), Object::number(1));
        let inner = Environment::new_enclosed(&outer);
        inner.define("b".into(), Object::number(2));

        assert_eq!(inner.get("a"), Some(Object::number(1)));
        assert_eq!(inner.get("b"), Some(Object::number(2)));
        assert_eq!(outer.get("b"), None);
        assert_eq!(inner.get_local("a"), None);
    }

    #[test]
    fn test_assign_updates_nearest_binding() {
        let outer = root();
        outer.define("a".into(), Object::number(1));
        let inner = Environment::new_enclosed(&outer);

        inner.assign("a".into(), Object::number(5));
        assert_eq!(outer.get("a"), Some(Object::number(5)));
        assert!(!inner.contains_local("a"));

        inner.assign("fresh".into(), Object::boolean(true));
        assert!(inner.contains_local("fresh"));
        assert_eq!(outer.get("fresh"), None);
    }

    #[test]
    fn test_define_shadows() {
        let outer = root();
        outer.define("a".into(), Object::number(1));
        let inner = Environment::new_enclosed(&outer);
        inner.define("a".into(), Object::number(2));

        assert_eq!(inner.get("a"), Some(Object::number(2)));
        assert_eq!(outer.get("a"), Some(Object::number(1)));

        inner.remove("a");
        assert_eq!(inner.get("a"), Some(Object::number(1)));
    }
}
