use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ghost_lang_interpreter::library::Library;
use ghost_lang_interpreter::{Engine, EngineConfig, EngineError, Object};

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn engine_with_output(search_paths: Vec<PathBuf>) -> (Engine, SharedBuffer) {
    let output = SharedBuffer::default();
    let engine = Engine::new(EngineConfig {
        library: Library::standard(),
        search_paths,
        writer: Box::new(output.clone()),
    });
    (engine, output)
}

fn scratch_directory(name: &str) -> PathBuf {
    let directory =
        std::env::temp_dir().join(format!("ghost-lang-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&directory);
    std::fs::create_dir_all(&directory).unwrap();
    directory
}

fn write_script(directory: &Path, name: &str, source: &str) -> PathBuf {
    let path = directory.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, source).unwrap();
    path
}

#[test]
fn test_print_writes_to_configured_output() {
    let (engine, output) = engine_with_output(Vec::new());

    let result = engine
        .run(
            "print(\"hello\", 1.50, [1, \"a\"], {\"k\": true}); print()",
            "main",
        )
        .unwrap();

    assert_eq!(result, Object::Null);
    assert_eq!(output.contents(), "hello 1.5 [1, \"a\"] {\"k\": true}\n\n");
}

#[test]
fn test_state_persists_between_runs() {
    let (engine, _) = engine_with_output(Vec::new());

    engine.run("x := 5", "repl").unwrap();
    engine.run("function double(n) { n * 2 }", "repl").unwrap();

    assert_eq!(engine.run("double(x)", "repl").unwrap(), Object::number(10));
}

#[test]
fn test_errors() {
    let (engine, _) = engine_with_output(Vec::new());

    let parse_error = engine.run("x := ", "main").unwrap_err();
    assert!(matches!(parse_error, EngineError::Parse(ref errors) if errors.len() == 1));

    let runtime_error = engine.run("1 / 0", "main").unwrap_err();
    assert!(matches!(runtime_error, EngineError::Runtime(_)));
    assert_eq!(
        runtime_error.to_string(),
        "1:3:main: runtime error: division by zero"
    );

    // Updates made before a runtime error are kept.
    engine.run("kept := 1", "main").unwrap();
    assert!(engine.run("kept = 2; missing", "main").is_err());
    assert_eq!(engine.run("kept", "main").unwrap(), Object::number(2));
}

#[test]
fn test_library_functions() {
    let (engine, _) = engine_with_output(Vec::new());

    let inputs = vec![
        ("type([])", Object::string("LIST")),
        ("type(math)", Object::string("LIBRARY_MODULE")),
        ("math.abs(-2)", Object::number(2)),
        ("math.max(1, 5, 3)", Object::number(5)),
        ("math.min(4, -1)", Object::number(-1)),
        ("math.floor(2.7)", Object::number(2)),
        ("math.ceil(2.1)", Object::number(3)),
        ("math.round(3.14159, 2)", Object::Number("3.14".parse().unwrap())),
        ("math.pi > 3.14 and math.pi < 3.15", Object::boolean(true)),
        ("ghost.version", Object::string(env!("CARGO_PKG_VERSION"))),
    ];

    for (input, expected) in inputs {
        assert_eq!(engine.run(input, "main").unwrap(), expected, "{input}");
    }

    let error = engine.run("math.abs(\"a\")", "main").unwrap_err();
    assert!(error.to_string().contains("math.abs"), "{error}");
}

#[test]
fn test_execute_runs_in_callers_scope() {
    let (engine, output) = engine_with_output(Vec::new());

    let result = engine
        .run(
            "ghost.execute(\"y := 3; print(y)\"); y + ghost.execute(\"1 + 1\")",
            "main",
        )
        .unwrap();

    assert_eq!(result, Object::number(5));
    assert_eq!(output.contents(), "3\n");
    assert!(engine.run("ghost.execute(\"1 +\")", "main").is_err());
    assert!(engine.run("ghost.execute(\"1 / 0\")", "main").is_err());
}

#[test]
fn test_import_exports_and_caches_modules() {
    let directory = scratch_directory("import");
    write_script(
        &directory,
        "util.ghost",
        "Double := function(x) { x * 2 }\nhelper := 1\nprint(\"loaded\")\n",
    );
    let main = write_script(
        &directory,
        "main.ghost",
        "u := import(\"util\")\nv := import(\"util.ghost\")\nu.Double(4) + v.Double(1)\n",
    );
    let (engine, output) = engine_with_output(Vec::new());

    assert_eq!(engine.run_file(&main).unwrap(), Object::number(10));
    assert_eq!(output.contents(), "loaded\n");

    let error = engine.run("u.helper", "repl").unwrap_err();
    assert_eq!(
        error.to_string(),
        "1:3:repl: runtime error: 'helper' is not exported by module util"
    );
}

#[test]
fn test_import_resolves_from_importing_file() {
    let directory = scratch_directory("nested");
    write_script(&directory, "lib/inner.ghost", "Value := 41\n");
    write_script(
        &directory,
        "lib/outer.ghost",
        "inner := import(\"inner\")\nValue := inner.Value + 1\n",
    );
    let main = write_script(
        &directory,
        "main.ghost",
        "outer := import(\"lib/outer\")\nouter.Value\n",
    );
    let (engine, _) = engine_with_output(Vec::new());

    assert_eq!(engine.run_file(&main).unwrap(), Object::number(42));
}

#[test]
fn test_import_uses_search_paths() {
    let directory = scratch_directory("search");
    write_script(&directory, "shapes.ghost", "Sides := 4\n");
    let (engine, _) = engine_with_output(vec![directory]);

    assert_eq!(
        engine.run("shapes := import(\"shapes\"); shapes.Sides", "repl").unwrap(),
        Object::number(4)
    );
}

#[test]
fn test_import_failures() {
    let directory = scratch_directory("failures");
    write_script(&directory, "a.ghost", "B := import(\"b\")\n");
    write_script(&directory, "b.ghost", "A := import(\"a\")\n");
    write_script(&directory, "broken.ghost", "x := \n");
    let main = write_script(&directory, "main.ghost", "import(\"a\")\n");
    let (engine, _) = engine_with_output(Vec::new());

    let circular = engine.run_file(&main).unwrap_err();
    assert!(circular.to_string().contains("circular import"), "{circular}");

    let missing = engine.run("import(\"nope\")", "repl").unwrap_err();
    assert_eq!(
        missing.to_string(),
        "1:1:repl: runtime error: no module named 'nope' found"
    );

    let broken = engine
        .run_file(&write_script(&directory, "uses_broken.ghost", "import(\"broken\")\n"))
        .unwrap_err();
    assert!(broken.to_string().contains("syntax errors in module"), "{broken}");

    let not_a_string = engine.run("import(5)", "repl").unwrap_err();
    assert!(not_a_string.to_string().contains("NUMBER"), "{not_a_string}");
}

#[test]
fn test_script() {
    let (engine, output) = engine_with_output(Vec::new());
    let source = r#"
        trait Describes {
            function describe() { return this.name + " has " + this.legs.toString() + " legs" }
        }

        class Animal {
            use Describes
            function constructor(name, legs = 4) {
                this.name = name
                this.legs = legs
            }
        }

        class Bird extends Animal {
            function constructor(name) {
                this.name = name
                this.legs = 2
            }
        }

        animals := [Animal.new("cat"), Bird.new("robin"), Animal.new("spider", 8)]
        total := 0
        for (animal in animals) {
            print(animal.describe())
            total += animal.legs
        }

        counts := {}
        for (word in "a b a c a".split()) {
            counts[word] = (counts.has(word) ? counts[word] : 0) + 1
        }
        print(counts)

        total
    "#;

    assert_eq!(engine.run(source, "script").unwrap(), Object::number(14));
    assert_eq!(
        output.contents(),
        "cat has 4 legs\nrobin has 2 legs\nspider has 8 legs\n{\"a\": 3, \"b\": 1, \"c\": 1}\n"
    );
}
