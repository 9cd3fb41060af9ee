//! Runs parsed pipelines as child processes.
//!
//! Every stage gets its standard streams wired before anything is started: the
//! shell's own streams by default, a pipe end when the stage is part of a pipe, and
//! a file when the stage redirects. Redirection is applied last, so a file always
//! wins over the pipe.
//!
//! Failures that belong to a single stage (unreadable input file, unknown program)
//! are reported on stderr and give that stage exit status 1, the same outcome a
//! forked child would have. Only failures of the launcher itself come back as `Err`.

use crate::builtin::{self, NotBuiltin};
use crate::command::{Command, ExitCode, Pipeline, Stdin, Stdout};
use crate::error::ShellError;
use crate::external;
use crate::history::HistoryStore;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Stdio};
use tracing::{debug, warn};

/// Status reported for a stage that failed before its program could run.
const STAGE_FAILURE: ExitCode = 1;

/// Starts the program of one stage with the given streams.
pub(crate) type SpawnFn =
    fn(&Command, Box<dyn Stdin>, Box<dyn Stdout>) -> Result<Child, ShellError>;

/// Run every stage of `pipeline` and return their exit codes in stage order.
pub fn launch(pipeline: &Pipeline, history: &HistoryStore) -> Result<Vec<ExitCode>, ShellError> {
    launch_with(pipeline, history, external::spawn)
}

pub(crate) fn launch_with(
    pipeline: &Pipeline,
    history: &HistoryStore,
    spawn: SpawnFn,
) -> Result<Vec<ExitCode>, ShellError> {
    match pipeline {
        Pipeline::Single(command) => Ok(vec![run_with(command, history, spawn)?]),
        Pipeline::Pipe { left, right } => {
            Ok(run_pipe_with(left, right, history, spawn)?.to_vec())
        }
    }
}

/// Run a single command with the shell's standard streams, waiting for it to finish.
///
/// Builtins run in-process but still honour redirection.
pub fn run(command: &Command, history: &HistoryStore) -> Result<ExitCode, ShellError> {
    run_with(command, history, external::spawn)
}

fn run_with(
    command: &Command,
    history: &HistoryStore,
    spawn: SpawnFn,
) -> Result<ExitCode, ShellError> {
    launch_stage(command, StageIo::inherit(), history, spawn)?.wait()
}

/// Run `left | right`, returning both exit codes once both stages have terminated.
pub fn run_pipe(
    left: &Command,
    right: &Command,
    history: &HistoryStore,
) -> Result<[ExitCode; 2], ShellError> {
    run_pipe_with(left, right, history, external::spawn)
}

fn run_pipe_with(
    left: &Command,
    right: &Command,
    history: &HistoryStore,
    spawn: SpawnFn,
) -> Result<[ExitCode; 2], ShellError> {
    for stage in [left, right] {
        if builtin::is_builtin(stage.name()) {
            return Err(ShellError::BuiltinInPipeline(stage.name().to_string()));
        }
    }

    let (reader, writer) = os_pipe::pipe().map_err(ShellError::PipeSetupFailed)?;
    debug!(left = left.name(), right = right.name(), "created pipe");

    let left_io = StageIo {
        stdin: Box::new(InheritedStdin(io::stdin())),
        stdout: Box::new(writer),
    };
    let left_stage = launch_stage(left, left_io, history, spawn)?;

    let right_io = StageIo {
        stdin: Box::new(reader),
        stdout: Box::new(io::stdout()),
    };
    let right_stage = match launch_stage(right, right_io, history, spawn) {
        Ok(stage) => stage,
        Err(e) => {
            // The read end is gone, so the left stage cannot block forever.
            if let Err(wait_error) = left_stage.wait() {
                warn!(error = %wait_error, "left stage lost after right stage failed");
            }
            return Err(e);
        }
    };

    let left_code = left_stage.wait();
    let right_code = right_stage.wait();
    Ok([left_code?, right_code?])
}

/// A stage that was either started or finished without a process.
enum Stage {
    Running(Child),
    Finished(ExitCode),
}

impl Stage {
    fn wait(self) -> Result<ExitCode, ShellError> {
        match self {
            Stage::Running(child) => external::wait(child),
            Stage::Finished(code) => Ok(code),
        }
    }
}

struct StageIo {
    stdin: Box<dyn Stdin>,
    stdout: Box<dyn Stdout>,
}

impl StageIo {
    fn inherit() -> Self {
        Self {
            stdin: Box::new(InheritedStdin(io::stdin())),
            stdout: Box::new(io::stdout()),
        }
    }

    /// Replace the streams `command` redirects. Streams that are replaced, or left
    /// behind on error, are closed here.
    fn redirect(mut self, command: &Command) -> Result<Self, ShellError> {
        if let Some(path) = command.input_file() {
            self.stdin = Box::new(open_input(path)?);
        }
        if let Some(path) = command.output_file() {
            self.stdout = Box::new(open_output(path)?);
        }
        Ok(self)
    }
}

fn launch_stage(
    command: &Command,
    io: StageIo,
    history: &HistoryStore,
    spawn: SpawnFn,
) -> Result<Stage, ShellError> {
    let StageIo { stdin, mut stdout } = match io.redirect(command) {
        Ok(io) => io,
        Err(e) => {
            report(&e);
            return Ok(Stage::Finished(STAGE_FAILURE));
        }
    };

    match builtin::run_builtin(command, &mut stdout, history) {
        Ok(code) => return Ok(Stage::Finished(code)),
        // `exit` has no output of its own
        Err(NotBuiltin(_)) if builtin::is_builtin(command.name()) => {
            return Ok(Stage::Finished(0));
        }
        Err(NotBuiltin(_)) => {}
    }

    match spawn(command, stdin, stdout) {
        Ok(child) => Ok(Stage::Running(child)),
        Err(e @ ShellError::CommandNotFound(_)) => {
            report(&e);
            Ok(Stage::Finished(STAGE_FAILURE))
        }
        Err(e) => Err(e),
    }
}

fn open_input(path: &Path) -> Result<File, ShellError> {
    File::open(path).map_err(|source| ShellError::CannotOpenInput {
        path: path.to_path_buf(),
        source,
    })
}

fn open_output(path: &Path) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options
        .open(path)
        .map_err(|source| ShellError::CannotOpenOutput {
            path: path.to_path_buf(),
            source,
        })
}

fn report(e: &ShellError) {
    debug!(error = ?e, "stage failed before running");
    eprintln!("osh: {e}");
}

struct InheritedStdin(io::Stdin);

impl Read for InheritedStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Stdin for InheritedStdin {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::inherit()
    }
}
