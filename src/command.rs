use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Children killed by a signal are reported as `128 + signal`, like POSIX shells do.
pub type ExitCode = i32;

/// Abstraction over a readable input stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// A blanket implementation exists for any type that implements `Read` and
/// `Into<Stdio>` (files and pipe read ends).
pub trait Stdin: Read {
    /// Convert this input into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Read + Into<Stdio>> Stdin for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Abstraction over a writable output stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// Builtins write to it in-process, external programs receive it as their stdout.
/// A blanket implementation exists for any type that implements `Write` and `Into<Stdio>`.
pub trait Stdout: Write {
    /// Convert this output into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Write + Into<Stdio>> Stdout for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// One pipeline stage: the argument vector plus its optional redirections.
///
/// `argv[0]` is the program or builtin name. A `Command` is only ever built by the
/// parser, which guarantees `argv` is non-empty and holds no empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl Command {
    pub(crate) fn new(
        argv: Vec<String>,
        input_file: Option<PathBuf>,
        output_file: Option<PathBuf>,
    ) -> Self {
        debug_assert!(!argv.is_empty());
        Self {
            argv,
            input_file,
            output_file,
        }
    }

    /// Program or builtin name.
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// File to read standard input from (`<`).
    pub fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }

    /// File to write standard output to (`>`), created or truncated.
    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }
}

/// A parsed line: one command, or two commands joined by `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pipeline {
    Single(Command),
    /// `left`'s standard output feeds `right`'s standard input.
    Pipe { left: Command, right: Command },
}

impl Pipeline {
    /// Stages in execution order.
    pub fn stages(&self) -> Vec<&Command> {
        match self {
            Pipeline::Single(command) => vec![command],
            Pipeline::Pipe { left, right } => vec![left, right],
        }
    }
}
