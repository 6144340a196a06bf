use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use gc::Gc;
use ghost_lang_core::ast::Program;
use tracing::debug;

use crate::environment::Scope;
use crate::evaluator::eval_program;
use crate::library::Library;
use crate::object::{Module, Object, RuntimeError};

#[derive(Clone)]
pub enum ImportState {
    Loading,
    Loaded(Gc<Module>),
}

/// State shared by every environment of one interpreter instance.
pub struct Runtime {
    pub library: Library,
    writer: RefCell<Box<dyn Write>>,
    search_paths: Vec<PathBuf>,
    imports: RefCell<HashMap<PathBuf, ImportState>>,
    directories: RefCell<Vec<PathBuf>>,
}

impl Runtime {
    pub fn new(library: Library, writer: Box<dyn Write>, search_paths: Vec<PathBuf>) -> Self {
        Runtime {
            library,
            writer: RefCell::new(writer),
            search_paths,
            imports: RefCell::new(HashMap::new()),
            directories: RefCell::new(Vec::new()),
        }
    }

    /// Evaluates a parsed program in `scope`. Natives that run source text
    /// go through here too.
    pub fn evaluate(&self, program: &Program, scope: &Scope) -> Result<Object, RuntimeError> {
        eval_program(program, scope)
    }

    pub fn write_output(&self, text: &str) -> std::io::Result<()> {
        let mut writer = self.writer.borrow_mut();
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }

    /// Finds `file_name` in the directory of the file being evaluated, the
    /// working directory, then the configured search paths.
    pub fn resolve_import(&self, file_name: &str) -> Option<PathBuf> {
        let current = self.directories.borrow().last().cloned();
        let working = std::env::current_dir().ok();
        current
            .into_iter()
            .chain(working)
            .chain(self.search_paths.iter().cloned())
            .map(|directory| directory.join(file_name))
            .inspect(|candidate| debug!(candidate = %candidate.display(), "import candidate"))
            .find(|candidate| candidate.is_file())
            .map(|found| found.canonicalize().unwrap_or(found))
    }

    /// The import state of `path`. When the path is new it is marked as
    /// loading and `None` is returned.
    pub fn begin_import(&self, path: &Path) -> Option<ImportState> {
        let mut imports = self.imports.borrow_mut();
        match imports.get(path) {
            Some(state) => Some(state.clone()),
            None => {
                imports.insert(path.to_path_buf(), ImportState::Loading);
                None
            }
        }
    }

    pub fn finish_import(&self, path: &Path, module: Option<Gc<Module>>) {
        let mut imports = self.imports.borrow_mut();
        match module {
            Some(module) => {
                debug!(path = %path.display(), "module cached");
                imports.insert(path.to_path_buf(), ImportState::Loaded(module));
            }
            None => {
                imports.remove(path);
            }
        }
    }

    pub fn clear_imports(&self) {
        self.imports.borrow_mut().clear();
    }

    /// Runs `f` with `directory` as the base for relative imports.
    pub fn in_directory<T>(&self, directory: Option<&Path>, f: impl FnOnce() -> T) -> T {
        let Some(directory) = directory else {
            return f();
        };
        self.directories.borrow_mut().push(directory.to_path_buf());
        let result = f();
        self.directories.borrow_mut().pop();
        result
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(Library::standard(), Box::new(std::io::stdout()), Vec::new())
    }
}
