use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use ghost_lang_interpreter::{Engine, EngineError, Object};

/// Runs a script file. Parse and runtime errors are reported on stderr and
/// turn into a failing exit code; an unreadable file is a host error.
pub fn execute(engine: &Engine, path: &Path) -> anyhow::Result<ExitCode> {
    match engine.run_file(path) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(EngineError::Io { path, source }) => {
            Err(source).with_context(|| format!("could not read {}", path.display()))
        }
        Err(error) => {
            eprintln!("{}", error);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub fn evaluate(engine: &Engine, source: &str) -> ExitCode {
    match engine.run(source, "<eval>") {
        Ok(Object::Null) => ExitCode::SUCCESS,
        Ok(value) => {
            println!("{}", value.inspect());
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
