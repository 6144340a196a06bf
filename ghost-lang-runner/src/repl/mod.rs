mod evaluator;
mod printer;
mod reader;

use anyhow::Context;
use ghost_lang_interpreter::Engine;
use rustyline::DefaultEditor;

use evaluator::{EngineEvaluator, Evaluator};
use printer::{ConsolePrinter, Printer};
use reader::{ReadOutput, Reader};

struct Repl<E: Evaluator, P: Printer> {
    reader: Reader,
    evaluator: E,
    printer: P,
}

impl<O, E: Evaluator<Object = O>, P: Printer<Object = O>> Repl<E, P> {
    fn run(mut self) {
        loop {
            match self.reader.read() {
                ReadOutput::Exit => break,
                ReadOutput::Clear => continue,
                ReadOutput::Line(line) => {
                    let result = self.evaluator.evaluate(&line);
                    self.printer.print(result)
                }
            }
        }
    }
}

pub fn start(engine: Engine) -> anyhow::Result<()> {
    let editor = DefaultEditor::new().context("could not start the line editor")?;

    Repl {
        reader: Reader::new(editor),
        evaluator: EngineEvaluator::new(engine),
        printer: ConsolePrinter {},
    }
    .run();
    Ok(())
}
