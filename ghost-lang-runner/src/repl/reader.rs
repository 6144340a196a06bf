use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

const PROMPT: &str = ">> ";

pub enum ReadOutput {
    Exit,
    Clear,
    Line(String),
}

pub struct Reader {
    rl: DefaultEditor,
}

impl Reader {
    pub fn new(rl: DefaultEditor) -> Self {
        Self { rl }
    }

    pub fn read(&mut self) -> ReadOutput {
        match self.rl.readline(PROMPT) {
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                ReadOutput::Clear
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                ReadOutput::Exit
            }
            Err(err) => {
                println!("Error: {:?}", err);
                ReadOutput::Exit
            }
            Ok(line) if line.trim().is_empty() => ReadOutput::Clear,
            Ok(line) => {
                if let Err(error) = self.rl.add_history_entry(line.as_str()) {
                    warn!(%error, "could not record history entry");
                }
                ReadOutput::Line(line)
            }
        }
    }
}
