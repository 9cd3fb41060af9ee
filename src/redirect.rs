use crate::error::{RedirectOperator, ShellError};
use std::path::PathBuf;

/// An argument vector with its `<`/`>` operators and their filenames removed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Redirected {
    pub argv: Vec<String>,
    pub input_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
}

/// Strip `<` and `>` together with the token following each of them.
///
/// Operators may appear anywhere in the vector. A repeated operator silently
/// replaces the filename of the earlier one. The returned `argv` may be empty;
/// rejecting that is up to the caller.
pub fn resolve_redirects(tokens: &[&str]) -> Result<Redirected, ShellError> {
    let mut redirected = Redirected::default();
    let mut iter = tokens.iter();

    while let Some(&token) = iter.next() {
        let operator = match token {
            "<" => RedirectOperator::Input,
            ">" => RedirectOperator::Output,
            _ => {
                redirected.argv.push(token.to_string());
                continue;
            }
        };

        let target = iter
            .next()
            .map(|name| PathBuf::from(*name))
            .ok_or(ShellError::MissingRedirectTarget { operator })?;

        match operator {
            RedirectOperator::Input => redirected.input_file = Some(target),
            RedirectOperator::Output => redirected.output_file = Some(target),
        }
    }

    Ok(redirected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_operators() {
        let r = resolve_redirects(&["ls", "-l"]).unwrap();
        assert_eq!(r.argv, vec!["ls", "-l"]);
        assert_eq!(r.input_file, None);
        assert_eq!(r.output_file, None);
    }

    #[test]
    fn test_both_operators_in_any_order() {
        let r = resolve_redirects(&[">", "out.txt", "sort", "<", "in.txt", "-r"]).unwrap();
        assert_eq!(r.argv, vec!["sort", "-r"]);
        assert_eq!(r.input_file, Some(PathBuf::from("in.txt")));
        assert_eq!(r.output_file, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn test_later_operator_wins() {
        let r = resolve_redirects(&["cat", ">", "a", ">", "b"]).unwrap();
        assert_eq!(r.argv, vec!["cat"]);
        assert_eq!(r.output_file, Some(PathBuf::from("b")));
    }

    #[test]
    fn test_missing_targets() {
        assert!(matches!(
            resolve_redirects(&["sort", ">"]),
            Err(ShellError::MissingRedirectTarget {
                operator: RedirectOperator::Output
            })
        ));
        assert!(matches!(
            resolve_redirects(&["cat", "<"]),
            Err(ShellError::MissingRedirectTarget {
                operator: RedirectOperator::Input
            })
        ));
    }

    #[test]
    fn test_only_redirection_leaves_empty_argv() {
        let r = resolve_redirects(&["<", "in.txt"]).unwrap();
        assert!(r.argv.is_empty());
        assert_eq!(r.input_file, Some(PathBuf::from("in.txt")));
    }
}
