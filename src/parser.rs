//! Turns a command line into a [`Pipeline`].
//!
//! The grammar is deliberately flat: words are separated by runs of spaces, there is
//! no quoting or escaping, and the only operators are `<`, `>` and `|`, each of which
//! must stand alone as a word.

use crate::builtin;
use crate::command::{Command, Pipeline};
use crate::error::ShellError;
use crate::redirect::resolve_redirects;
use tracing::{debug, warn};

/// Maximum number of words kept from one line when no limit is configured.
pub const DEFAULT_MAX_TOKENS: usize = 40;

const PIPE: &str = "|";

/// Split a line into words on runs of plain spaces.
///
/// Words past `max_tokens` are dropped.
pub fn split_into_tokens(line: &str, max_tokens: usize) -> Vec<&str> {
    let mut words = line.split(' ').filter(|word| !word.is_empty());
    let tokens: Vec<&str> = words.by_ref().take(max_tokens).collect();
    let dropped = words.count();
    if dropped > 0 {
        warn!(max_tokens, dropped, "line has too many words, truncating");
    }
    tokens
}

/// Parse a trimmed line into one or two pipeline stages.
///
/// # Errors
///
/// * [`ShellError::MalformedPipe`] when a side of `|` is empty or a second `|` is present.
/// * [`ShellError::MissingRedirectTarget`] when `<` or `>` ends a stage.
/// * [`ShellError::EmptyCommand`] when a stage consists of redirections only.
/// * [`ShellError::BuiltinInPipeline`] when a builtin is used as a pipe stage.
pub fn construct_pipeline(line: &str, max_tokens: usize) -> Result<Pipeline, ShellError> {
    let tokens = split_into_tokens(line, max_tokens);

    let pipeline = match tokens.iter().position(|token| *token == PIPE) {
        None => Pipeline::Single(construct_command(&tokens)?),
        Some(at) => {
            let (left, right) = (&tokens[..at], &tokens[at + 1..]);
            if left.is_empty() || right.is_empty() || right.contains(&PIPE) {
                return Err(ShellError::MalformedPipe);
            }
            let left = construct_command(left)?;
            let right = construct_command(right)?;
            for stage in [&left, &right] {
                if builtin::is_builtin(stage.name()) {
                    return Err(ShellError::BuiltinInPipeline(stage.name().to_string()));
                }
            }
            Pipeline::Pipe { left, right }
        }
    };

    debug!(?pipeline, "parsed line");
    Ok(pipeline)
}

fn construct_command(tokens: &[&str]) -> Result<Command, ShellError> {
    let redirected = resolve_redirects(tokens)?;
    if redirected.argv.is_empty() {
        return Err(ShellError::EmptyCommand);
    }
    Ok(Command::new(
        redirected.argv,
        redirected.input_file,
        redirected.output_file,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(line: &str) -> Result<Pipeline, ShellError> {
        construct_pipeline(line, DEFAULT_MAX_TOKENS)
    }

    #[test]
    fn test_split_on_runs_of_spaces() {
        assert_eq!(
            split_into_tokens("ls   -l  /tmp", DEFAULT_MAX_TOKENS),
            vec!["ls", "-l", "/tmp"]
        );
        // tabs are not separators
        assert_eq!(split_into_tokens("a\tb", DEFAULT_MAX_TOKENS), vec!["a\tb"]);
    }

    #[test]
    fn test_too_many_tokens_are_truncated() {
        let line = (0..50).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let tokens = split_into_tokens(&line, DEFAULT_MAX_TOKENS);
        assert_eq!(tokens.len(), DEFAULT_MAX_TOKENS);
        assert_eq!(tokens.last(), Some(&"39"));

        let Pipeline::Single(command) = construct_pipeline("echo a b c d", 3).unwrap() else {
            panic!("Expected a single command");
        };
        assert_eq!(command.argv(), ["echo", "a", "b"]);
    }

    #[test]
    fn test_single_command() {
        let Pipeline::Single(command) = parse("ls -l").unwrap() else {
            panic!("Expected a single command");
        };
        assert_eq!(command.name(), "ls");
        assert_eq!(command.args(), ["-l"]);
        assert_eq!(command.input_file(), None);
        assert_eq!(command.output_file(), None);
    }

    #[test]
    fn test_two_stage_pipe() {
        let Pipeline::Pipe { left, right } = parse("ls -l | grep foo").unwrap() else {
            panic!("Expected a pipe");
        };
        assert_eq!(left.argv(), ["ls", "-l"]);
        assert_eq!(right.argv(), ["grep", "foo"]);
        assert_eq!(left.output_file(), None);
        assert_eq!(right.input_file(), None);
    }

    #[test]
    fn test_input_and_output_redirection() {
        let Pipeline::Single(command) = parse("cat < in.txt > out.txt").unwrap() else {
            panic!("Expected a single command");
        };
        assert_eq!(command.argv(), ["cat"]);
        assert_eq!(command.input_file(), Some(Path::new("in.txt")));
        assert_eq!(command.output_file(), Some(Path::new("out.txt")));
    }

    #[test]
    fn test_redirection_combined_with_pipe() {
        let Pipeline::Pipe { left, right } = parse("sort < data.txt | uniq > out.txt").unwrap()
        else {
            panic!("Expected a pipe");
        };
        assert_eq!(left.argv(), ["sort"]);
        assert_eq!(left.input_file(), Some(Path::new("data.txt")));
        assert_eq!(right.argv(), ["uniq"]);
        assert_eq!(right.output_file(), Some(Path::new("out.txt")));
    }

    #[test]
    fn test_malformed_pipes() {
        assert!(matches!(parse("echo hi |"), Err(ShellError::MalformedPipe)));
        assert!(matches!(parse("| echo hi"), Err(ShellError::MalformedPipe)));
        assert!(matches!(parse("|"), Err(ShellError::MalformedPipe)));
        assert!(matches!(parse("ls | sort | uniq"), Err(ShellError::MalformedPipe)));
    }

    #[test]
    fn test_missing_redirect_target() {
        assert!(matches!(
            parse("sort >"),
            Err(ShellError::MissingRedirectTarget { .. })
        ));
        assert!(matches!(
            parse("cat < | wc"),
            Err(ShellError::MissingRedirectTarget { .. })
        ));
    }

    #[test]
    fn test_redirection_without_command() {
        assert!(matches!(parse("> out.txt"), Err(ShellError::EmptyCommand)));
        assert!(matches!(
            parse("< in.txt | wc -l"),
            Err(ShellError::EmptyCommand)
        ));
    }

    #[test]
    fn test_builtin_in_pipeline() {
        assert!(matches!(
            parse("history | wc -l"),
            Err(ShellError::BuiltinInPipeline(name)) if name == "history"
        ));
        assert!(matches!(
            parse("ls | exit"),
            Err(ShellError::BuiltinInPipeline(name)) if name == "exit"
        ));
    }

    #[test]
    fn test_builtin_with_redirection_is_allowed() {
        let Pipeline::Single(command) = parse("history > out.txt").unwrap() else {
            panic!("Expected a single command");
        };
        assert_eq!(command.name(), "history");
        assert_eq!(command.output_file(), Some(Path::new("out.txt")));
    }
}
