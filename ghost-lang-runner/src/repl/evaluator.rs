use ghost_lang_interpreter::{Engine, EngineError, Object};

pub trait Evaluator {
    type Object;

    fn evaluate(&mut self, line: &str) -> Self::Object;
}

/// Evaluates each line against one engine, so bindings carry over.
pub struct EngineEvaluator {
    engine: Engine,
}

impl EngineEvaluator {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}

impl Evaluator for EngineEvaluator {
    type Object = Result<Object, EngineError>;

    fn evaluate(&mut self, line: &str) -> Self::Object {
        self.engine.run(line, "repl")
    }
}
