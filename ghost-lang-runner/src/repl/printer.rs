use ghost_lang_interpreter::{EngineError, Object};

pub trait Printer {
    type Object;

    fn print(&mut self, object: Self::Object);
}

pub struct ConsolePrinter {}

/// What the REPL shows for a result. Null results print nothing.
fn render(result: &Result<Object, EngineError>) -> Option<String> {
    match result {
        Ok(Object::Null) => None,
        Ok(object) => Some(object.inspect()),
        Err(error) => Some(error.to_string()),
    }
}

impl Printer for ConsolePrinter {
    type Object = Result<Object, EngineError>;

    fn print(&mut self, object: Self::Object) {
        match (render(&object), object.is_ok()) {
            (Some(text), true) => println!("{}", text),
            (Some(text), false) => eprintln!("{}", text),
            (None, _) => {}
        }
    }
}
