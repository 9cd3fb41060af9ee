use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which redirection operator was left without a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOperator {
    /// `<`
    Input,
    /// `>`
    Output,
}

impl fmt::Display for RedirectOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectOperator::Input => f.write_str("<"),
            RedirectOperator::Output => f.write_str(">"),
        }
    }
}

/// Everything that can go wrong between reading a line and collecting exit statuses.
#[derive(Debug, Error)]
pub enum ShellError {
    /// One side of `|` is empty, or the line has more than one `|`.
    #[error("malformed pipe: each side of '|' needs a command")]
    MalformedPipe,

    /// `<` or `>` is the last token of a stage.
    #[error("missing filename after '{operator}'")]
    MissingRedirectTarget { operator: RedirectOperator },

    /// Nothing is left to run once the redirection operators are stripped.
    #[error("empty command")]
    EmptyCommand,

    #[error("builtin '{0}' cannot be used in a pipeline")]
    BuiltinInPipeline(String),

    #[error("no commands in history")]
    EmptyHistory,

    #[error("no such command in history: {0}")]
    NoSuchEntry(usize),

    #[error("cannot open input file '{}': {source}", .path.display())]
    CannotOpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open output file '{}': {source}", .path.display())]
    CannotOpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create pipe: {0}")]
    PipeSetupFailed(#[source] io::Error),

    #[error("failed to wait for child process: {0}")]
    WaitFailed(#[source] io::Error),
}

impl ShellError {
    /// Errors detected while turning a line into a pipeline, before any process exists.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ShellError::MalformedPipe
                | ShellError::MissingRedirectTarget { .. }
                | ShellError::EmptyCommand
                | ShellError::BuiltinInPipeline(_)
        )
    }
}
