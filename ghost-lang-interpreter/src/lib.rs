pub mod builtins;
pub mod engine;
pub mod environment;
pub mod evaluator;
pub mod library;
pub mod methods;
pub mod object;
pub mod runtime;

pub use engine::{Engine, EngineConfig, EngineError};
pub use object::{Object, RuntimeError};
