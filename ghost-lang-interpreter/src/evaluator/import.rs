use std::path::Path;
use std::rc::Rc;

use gc::Gc;
use ghost_lang_core::parser::Parser;
use ghost_lang_core::scanner::Scanner;
use ghost_lang_core::token::Token;
use tracing::debug;

use super::{error, eval_program, EvalResult};
use crate::environment::{Environment, Scope};
use crate::object::{EvaluationError, Module, Object, QuickReturn};
use crate::runtime::{ImportState, Runtime};

/// `import("name")`. Each file is evaluated once per runtime; later imports
/// of the same file share the module.
pub(super) fn eval_import(path: Object, token: &Token, scope: &Scope) -> EvalResult {
    let name = match &path {
        Object::String(name) => name.clone(),
        other => {
            return Err(error(
                token,
                EvaluationError::InvalidImportPath(other.object_type()),
            ))
        }
    };

    let runtime = scope.environment.runtime();
    let file_name = if name.ends_with(".ghost") {
        name.to_string()
    } else {
        format!("{}.ghost", name)
    };
    let path = runtime
        .resolve_import(&file_name)
        .ok_or_else(|| error(token, EvaluationError::ModuleNotFound(name.clone())))?;

    match runtime.begin_import(&path) {
        Some(ImportState::Loaded(module)) => {
            debug!(path = %path.display(), "module already loaded");
            return Ok(Object::Module(module));
        }
        Some(ImportState::Loading) => {
            return Err(error(
                token,
                EvaluationError::CircularImport(path.display().to_string().into()),
            ));
        }
        None => {}
    }

    let module = load_module(&path, token, &runtime);
    runtime.finish_import(&path, module.as_ref().ok().cloned());
    module.map(Object::Module)
}

fn load_module(path: &Path, token: &Token, runtime: &Rc<Runtime>) -> Result<Gc<Module>, QuickReturn> {
    debug!(path = %path.display(), "loading module");
    let file: Rc<str> = path.display().to_string().into();
    let source = std::fs::read_to_string(path).map_err(|io_error| {
        error(
            token,
            EvaluationError::ModuleUnreadable {
                path: file.clone(),
                message: io_error.to_string().into(),
            },
        )
    })?;

    let scanner = Scanner::new(&source, file.clone()).with_namespaces(runtime.library.namespaces());
    let program = Parser::new(scanner).parse_program().map_err(|errors| {
        error(
            token,
            EvaluationError::ModuleParseFailed {
                path: file.clone(),
                errors,
            },
        )
    })?;

    let environment = Environment::new(runtime.clone());
    let scope = Scope::new(environment.clone());
    runtime.in_directory(path.parent(), || eval_program(&program, &scope))?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());
    Ok(Gc::new(Module {
        name: name.into(),
        path: path.to_path_buf(),
        environment,
    }))
}
