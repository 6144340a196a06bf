use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ghost_lang_core::ast::Program;
use ghost_lang_core::parser::{ParseError, Parser};
use ghost_lang_core::scanner::Scanner;
use thiserror::Error;
use tracing::debug;

use crate::environment::{Environment, Scope};
use crate::library::Library;
use crate::object::{Object, RuntimeError};
use crate::runtime::Runtime;

pub struct EngineConfig {
    pub library: Library,
    /// Extra directories searched for imports after the importing file's
    /// directory and the working directory.
    pub search_paths: Vec<PathBuf>,
    pub writer: Box<dyn Write>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            library: Library::standard(),
            search_paths: Vec::new(),
            writer: Box::new(std::io::stdout()),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{}", render_parse_errors(.0))]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn render_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ParseError::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One interpreter instance: a runtime plus a root scope that keeps its
/// bindings between runs.
pub struct Engine {
    runtime: Rc<Runtime>,
    scope: Scope,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let runtime = Rc::new(Runtime::new(
            config.library,
            config.writer,
            config.search_paths,
        ));
        let scope = Scope::new(Environment::new(runtime.clone()));
        Engine { runtime, scope }
    }

    pub fn parse(&self, source: &str, file: &str) -> Result<Program, EngineError> {
        let scanner = Scanner::new(source, file).with_namespaces(self.runtime.library.namespaces());
        Parser::new(scanner)
            .parse_program()
            .map_err(EngineError::Parse)
    }

    pub fn run(&self, source: &str, file: &str) -> Result<Object, EngineError> {
        let program = self.parse(source, file)?;
        Ok(self.runtime.evaluate(&program, &self.scope)?)
    }

    /// Runs a source file. Imports inside it resolve relative to its
    /// directory first.
    pub fn run_file(&self, path: &Path) -> Result<Object, EngineError> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        debug!(path = %path.display(), "running file");
        let source = std::fs::read_to_string(&path).map_err(|source| EngineError::Io {
            path: path.clone(),
            source,
        })?;
        let program = self.parse(&source, &path.display().to_string())?;
        let result = self
            .runtime
            .in_directory(path.parent(), || self.runtime.evaluate(&program, &self.scope));
        Ok(result?)
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Cached modules hold the runtime through their environments.
        self.runtime.clear_imports();
    }
}
