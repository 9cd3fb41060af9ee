use crate::command::{Command, ExitCode, Stdin, Stdout};
use crate::error::ShellError;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus};
use tracing::debug;

/// Start `command` as a child process with the given standard streams.
///
/// The program is resolved through `PATH` first. A program that cannot be found,
/// or that the OS refuses to load, yields [`ShellError::CommandNotFound`]; any other
/// failure to create the process is [`ShellError::SpawnFailed`].
///
/// The stream handles are moved into the process builder, which is dropped before
/// returning, so the caller keeps no copy of them.
pub fn spawn(
    command: &Command,
    stdin: Box<dyn Stdin>,
    stdout: Box<dyn Stdout>,
) -> Result<Child, ShellError> {
    let search_paths = std::env::var_os("PATH").unwrap_or_default();
    let program = find_command_path(&search_paths, Path::new(command.name()))
        .ok_or_else(|| ShellError::CommandNotFound(command.name().to_string()))?;

    let mut process = std::process::Command::new(program.as_ref());
    process
        .args(command.args())
        .stdin(stdin.stdio())
        .stdout(stdout.stdio());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        process.arg0(command.name());
    }

    match process.spawn() {
        Ok(child) => {
            debug!(pid = child.id(), program = %program.display(), "spawned");
            Ok(child)
        }
        Err(e) if is_load_failure(&e) => {
            debug!(error = %e, program = %program.display(), "program could not be loaded");
            Err(ShellError::CommandNotFound(command.name().to_string()))
        }
        Err(source) => Err(ShellError::SpawnFailed {
            program: command.name().to_string(),
            source,
        }),
    }
}

/// Whether a spawn error comes from loading the program rather than from creating
/// the process. A forked child would hit these in `exec` and exit on its own.
#[cfg(unix)]
fn is_load_failure(e: &io::Error) -> bool {
    use nix::errno::Errno;
    let Some(code) = e.raw_os_error() else {
        return false;
    };
    matches!(
        Errno::from_raw(code),
        Errno::ENOEXEC
            | Errno::EACCES
            | Errno::EPERM
            | Errno::ENOENT
            | Errno::ENOTDIR
            | Errno::EISDIR
            | Errno::ELOOP
            | Errno::ENAMETOOLONG
            | Errno::ETXTBSY
            | Errno::E2BIG
    )
}

#[cfg(not(unix))]
fn is_load_failure(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}

/// Block until `child` terminates and translate its status.
pub fn wait(mut child: Child) -> Result<ExitCode, ShellError> {
    let status = child.wait().map_err(ShellError::WaitFailed)?;
    let code = exit_code(status);
    debug!(pid = child.id(), code, "child terminated");
    Ok(code)
}

/// Exit code of a terminated child; a signal `n` becomes `128 + n`.
#[cfg(unix)]
fn exit_code(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> ExitCode {
    status.code().unwrap_or(-1)
}

/// Resolve a program name to a path.
///
/// Names containing a separator are taken as paths and must exist. A bare name is
/// searched for in each directory of `search_paths` (PATH); the first regular file
/// wins.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if path.is_file() {
            return Some(path);
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
