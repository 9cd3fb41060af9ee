use crate::builtin;
use crate::command::{ExitCode, Pipeline};
use crate::config::{Mode, ShellConfig};
use crate::error::ShellError;
use crate::history::{HistoryStore, RecallSelector};
use crate::external;
use crate::launcher::{self, SpawnFn};
use crate::parser;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// What happened to one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// `exit` was entered; no further lines are read.
    Exited,
    /// The line was empty or rejected before anything ran.
    Continue,
    /// The line ran; carries the exit code of its last stage.
    Completed(ExitCode),
}

/// Supplier of command lines.
pub trait LineSource {
    /// Next trimmed, non-empty line, or `None` once input is exhausted.
    fn next_line(&mut self) -> anyhow::Result<Option<String>>;
}

/// Lines read from a file or any other buffered reader, without a prompt.
pub struct BatchSource<R> {
    reader: R,
}

impl<R: BufRead> BatchSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl BatchSource<BufReader<File>> {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open file '{}'", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineSource for BatchSource<R> {
    fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .context("failed to read batch input")?;
            if read == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }
}

/// Lines typed at an interactive prompt, with line editing.
pub struct EditorSource {
    editor: DefaultEditor,
    prompt: String,
}

impl EditorSource {
    pub fn new(prompt: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new().context("failed to initialize line editor")?,
            prompt: prompt.into(),
        })
    }
}

impl LineSource for EditorSource {
    fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        loop {
            match self.editor.readline(&self.prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(trimmed)?;
                    return Ok(Some(trimmed.to_string()));
                }
                // Ctrl-C drops the line being typed
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err).context("failed to read line"),
            }
        }
    }
}

/// A shell session: reads lines, expands recall syntax, keeps history and runs
/// the resulting pipelines.
///
/// Example
/// ```
/// use osh::{Interpreter, LineOutcome, ShellConfig};
/// let mut sh = Interpreter::new(ShellConfig::default());
/// assert_eq!(sh.execute_line("exit").unwrap(), LineOutcome::Exited);
/// assert!(!sh.is_running());
/// ```
pub struct Interpreter {
    config: ShellConfig,
    history: HistoryStore,
    running: bool,
    spawn: SpawnFn,
}

impl Interpreter {
    pub fn new(config: ShellConfig) -> Self {
        Self::with_spawner(config, external::spawn)
    }

    pub(crate) fn with_spawner(config: ShellConfig, spawn: SpawnFn) -> Self {
        Self {
            history: HistoryStore::with_capacity(config.history_capacity),
            config,
            running: true,
            spawn,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Read from the source the configuration names until `exit` or end of input.
    pub fn start(&mut self) -> anyhow::Result<()> {
        match self.config.mode.clone() {
            Mode::Interactive => self.repl(),
            Mode::Batch(path) => {
                let mut source = BatchSource::open(&path)?;
                self.run(&mut source)
            }
        }
    }

    /// Interactive Read-Eval-Print Loop on the terminal.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut source = EditorSource::new(self.config.prompt.clone())?;
        self.run(&mut source)
    }

    /// Execute lines from `source` until `exit` or end of input.
    ///
    /// Returns an error only for failures that end the session: the source failing,
    /// or, outside batch mode, the launcher failing to create a process.
    pub fn run(&mut self, source: &mut dyn LineSource) -> anyhow::Result<()> {
        while self.running {
            let Some(line) = source.next_line()? else {
                break;
            };
            self.execute_line(&line)?;
        }
        Ok(())
    }

    /// Execute one line.
    ///
    /// Recall, parse and per-stage failures are reported on stderr and do not
    /// produce an `Err`.
    pub fn execute_line(&mut self, line: &str) -> Result<LineOutcome, ShellError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineOutcome::Continue);
        }

        let (line, recalled) = match RecallSelector::parse(line) {
            Some(selector) => match self.history.recall(selector) {
                Ok(text) => {
                    println!("{text}");
                    (Cow::Owned(text.to_string()), true)
                }
                Err(e) => {
                    report(&e);
                    return Ok(LineOutcome::Continue);
                }
            },
            None => (Cow::Borrowed(line), false),
        };
        debug!(%line, recalled, "executing line");

        let first_word = line.split(' ').find(|word| !word.is_empty()).unwrap_or_default();
        if !recalled && !builtin::is_builtin(first_word) {
            self.history.record(&*line);
        }

        let pipeline = match parser::construct_pipeline(&line, self.config.max_tokens) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                report(&e);
                if self.config.is_batch() {
                    eprintln!("osh: skipping malformed command: {line}");
                }
                return Ok(LineOutcome::Continue);
            }
        };

        if let Pipeline::Single(command) = &pipeline {
            if builtin::is_exit(command.name()) {
                self.running = false;
                return Ok(LineOutcome::Exited);
            }
        }

        match launcher::launch_with(&pipeline, &self.history, self.spawn) {
            Ok(codes) => {
                if self.config.is_batch() {
                    for (stage, code) in pipeline.stages().into_iter().zip(&codes) {
                        if *code != 0 {
                            eprintln!("osh: '{}' exited with status {code}", stage.name());
                        }
                    }
                }
                Ok(LineOutcome::Completed(codes.last().copied().unwrap_or(0)))
            }
            Err(e) if self.config.is_batch() => {
                report(&e);
                Ok(LineOutcome::Continue)
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

fn report(e: &ShellError) {
    eprintln!("osh: {e}");
}
