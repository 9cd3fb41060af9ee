use crate::command::{Command, ExitCode};
use crate::history::HistoryStore;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use tracing::warn;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "history".
    fn name() -> &'static str;

    /// Executes the command, writing its output to `stdout`.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, history: &HistoryStore) -> Result<ExitCode>;
}

const EXIT: &str = "exit";

/// The builtin was not recognized by [`run_builtin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotBuiltin(pub String);

/// Whether `name` is handled by the shell itself.
///
/// Such names are never looked up as programs, never recorded into history and
/// never accepted as a pipeline stage.
pub fn is_builtin(name: &str) -> bool {
    name == History::name() || is_exit(name)
}

/// Whether `name` ends the session.
pub fn is_exit(name: &str) -> bool {
    name == EXIT
}

/// Run an in-process builtin.
///
/// `exit` is reported as [`NotBuiltin`]: ending the session is the caller's job.
/// Errors raised while running the builtin are written to `stdout` and turn into
/// exit status 1.
pub fn run_builtin(
    command: &Command,
    stdout: &mut dyn Write,
    history: &HistoryStore,
) -> std::result::Result<ExitCode, NotBuiltin> {
    if command.name() == History::name() {
        Ok(dispatch::<History>(command, stdout, history))
    } else {
        Err(NotBuiltin(command.name().to_string()))
    }
}

fn dispatch<T: BuiltinCommand>(
    command: &Command,
    stdout: &mut dyn Write,
    history: &HistoryStore,
) -> ExitCode {
    let args: Vec<&str> = command.args().iter().map(String::as_str).collect();
    let parsed = match T::from_args(&[T::name()], &args) {
        Ok(cmd) => cmd,
        Err(EarlyExit { output, status }) => {
            // --help output or a usage error
            let written = stdout.write_all(output.as_bytes());
            if let Err(e) = &written {
                warn!(builtin = T::name(), error = %e, "failed to write usage");
            }
            return if status.is_err() || written.is_err() { 1 } else { 0 };
        }
    };
    match parsed.execute(stdout, history) {
        Ok(code) => code,
        Err(e) => {
            if let Err(write_error) = writeln!(stdout, "{}: {e}", T::name()) {
                warn!(builtin = T::name(), error = %write_error, "failed to report error");
            }
            1
        }
    }
}

#[derive(FromArgs)]
/// Print the recorded commands, oldest first, numbered from 1.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, history: &HistoryStore) -> Result<ExitCode> {
        writeln!(stdout)?;
        for entry in history.display() {
            writeln!(stdout, "{}  {}", entry.ordinal, entry.text)?;
        }
        writeln!(stdout)?;
        stdout.flush()?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Pipeline;
    use crate::parser::{DEFAULT_MAX_TOKENS, construct_pipeline};
    use std::io;

    /// A stream whose reader has gone away.
    struct ClosedStream;

    impl Write for ClosedStream {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn single(line: &str) -> Command {
        match construct_pipeline(line, DEFAULT_MAX_TOKENS).unwrap() {
            Pipeline::Single(command) => command,
            other => panic!("Expected a single command, got {:?}", other),
        }
    }

    #[test]
    fn test_recognizes_builtins() {
        assert!(is_builtin("history"));
        assert!(is_builtin("exit"));
        assert!(!is_builtin("ls"));
        assert!(!is_builtin("History"));
    }

    #[test]
    fn test_history_prints_entries() {
        let mut history = HistoryStore::default();
        history.record("ls -l");
        history.record("pwd");

        let mut out: Vec<u8> = Vec::new();
        let code = run_builtin(&single("history"), &mut out, &history).unwrap();
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "\n1  ls -l\n2  pwd\n\n");
    }

    #[test]
    fn test_history_on_empty_store() {
        let history = HistoryStore::default();
        let mut out: Vec<u8> = Vec::new();
        let code = run_builtin(&single("history"), &mut out, &history).unwrap();
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "\n\n");
    }

    #[test]
    fn test_history_rejects_arguments() {
        let history = HistoryStore::default();
        let mut out: Vec<u8> = Vec::new();
        let code = run_builtin(&single("history 5"), &mut out, &history).unwrap();
        assert_eq!(code, 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_exit_and_programs_are_not_run() {
        let history = HistoryStore::default();
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(
            run_builtin(&single("exit"), &mut out, &history),
            Err(NotBuiltin("exit".to_string()))
        );
        assert_eq!(
            run_builtin(&single("ls -l"), &mut out, &history),
            Err(NotBuiltin("ls".to_string()))
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_help_succeeds_only_when_written() {
        let history = HistoryStore::default();
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(run_builtin(&single("history --help"), &mut out, &history), Ok(0));
        assert!(String::from_utf8(out).unwrap().contains("history"));

        assert_eq!(
            run_builtin(&single("history --help"), &mut ClosedStream, &history),
            Ok(1)
        );
    }

    #[test]
    fn test_listing_to_closed_stream_fails() {
        let mut history = HistoryStore::default();
        history.record("pwd");
        assert_eq!(run_builtin(&single("history"), &mut ClosedStream, &history), Ok(1));
        assert_eq!(run_builtin(&single("history 5"), &mut ClosedStream, &history), Ok(1));
    }
}
