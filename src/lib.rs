//! A small POSIX-flavoured command interpreter.
//!
//! Lines are split into words, optionally joined into a two-stage pipe with `|`,
//! redirected with `<` and `>`, and run as child processes. A bounded in-memory
//! history backs the `history` builtin and the `!!` / `!n` recall syntax.
//!
//! The main entry point is [`Interpreter`], which drives a session from any
//! [`LineSource`]. The lower-level pieces are public too: [`parser`] turns a line
//! into a [`Pipeline`], [`launcher`] runs it, and [`history`] keeps past lines.

mod builtin;
pub mod command;
pub mod config;
pub mod error;
mod external;
pub mod history;
mod interpreter;
pub mod launcher;
pub mod parser;
mod redirect;

pub use builtin::{NotBuiltin, is_builtin, run_builtin};
pub use command::{Command, ExitCode, Pipeline};
pub use config::{Mode, ShellConfig};
pub use error::ShellError;
pub use history::{HistoryStore, RecallSelector};
/// Just a convenient re-export of the session runner and its line sources.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{BatchSource, EditorSource, Interpreter, LineOutcome, LineSource};
