use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::parser::DEFAULT_MAX_TOKENS;
use std::path::PathBuf;

/// Prompt printed before each interactive line.
pub const DEFAULT_PROMPT: &str = "osh> ";

/// Where lines come from, which also decides how failures are reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Lines typed at a prompt. Failure to create a process ends the session.
    Interactive,
    /// Lines read from a file without a prompt. Every failure is reported and the
    /// next line is read.
    Batch(PathBuf),
}

/// Settings for one shell session.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub prompt: String,
    /// Number of lines kept for `history` and recall.
    pub history_capacity: usize,
    /// Words kept from one line; the rest are dropped.
    pub max_tokens: usize,
    pub mode: Mode,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_tokens: DEFAULT_MAX_TOKENS,
            mode: Mode::Interactive,
        }
    }
}

impl ShellConfig {
    pub fn is_batch(&self) -> bool {
        matches!(self.mode, Mode::Batch(_))
    }

    /// Same settings, reading from `path` instead of a prompt.
    pub fn batch(mut self, path: impl Into<PathBuf>) -> Self {
        self.mode = Mode::Batch(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.prompt, "osh> ");
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.max_tokens, 40);
        assert!(!config.is_batch());
    }

    #[test]
    fn test_batch_mode() {
        let config = ShellConfig::default().batch("commands.txt");
        assert!(config.is_batch());
        assert_eq!(config.mode, Mode::Batch(PathBuf::from("commands.txt")));
    }
}
