use argh::FromArgs;
use osh::history::DEFAULT_HISTORY_CAPACITY;
use osh::parser::DEFAULT_MAX_TOKENS;
use osh::{Interpreter, ShellConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A small command interpreter. Reads commands from the terminal, or from a batch
/// file when one is given.
struct Args {
    #[argh(positional)]
    /// file to read commands from instead of the terminal.
    batch_file: Option<PathBuf>,

    #[argh(option, default = "DEFAULT_HISTORY_CAPACITY")]
    /// number of commands kept for `history` and recall.
    history_size: usize,

    #[argh(option, default = "DEFAULT_MAX_TOKENS")]
    /// words kept from one line; the rest are dropped.
    max_tokens: usize,

    #[argh(option)]
    /// prompt printed before each interactive line.
    prompt: Option<String>,

    #[argh(switch, short = 'v')]
    /// log debug information to stderr.
    verbose: bool,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    init_logging(args.verbose);

    let mut config = ShellConfig {
        history_capacity: args.history_size,
        max_tokens: args.max_tokens,
        ..ShellConfig::default()
    };
    if let Some(prompt) = args.prompt {
        config.prompt = prompt;
    }
    if let Some(path) = args.batch_file {
        config = config.batch(path);
    }
    debug!(?config, "starting session");

    match Interpreter::new(config).start() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
