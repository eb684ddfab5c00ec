//! Shell dispatch: one command line at a time, through `/bin/sh -c`, with the outcome classified
//! for the evaluator.

use std::process::Command;

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

const SHELL: &str = "/bin/sh";
const SHELL_ARG: &str = "-c";

pub const SIGINT: i32 = 2;
pub const SIGQUIT: i32 = 3;

/// What became of a submitted command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecStatus {
    /// The shell ran and exited with this status.
    Exited(i32),
    /// The shell ran but was killed by this signal.
    Interrupted(i32),
    /// The shell itself could not be started.
    Unreachable(String),
}

impl ExecStatus {
    /// The process exit status to report when this outcome is fatal.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exited(code) => *code,
            Self::Interrupted(signal) => 128 + signal,
            Self::Unreachable(_) => 127,
        }
    }
}

/// Capability trait the executor dispatches through.
pub trait ShellRunner {
    /// Run `command` to completion. The string is passed verbatim to the shell.
    fn run(&self, command: &str) -> ExecStatus;
}

/// Runs commands under the POSIX shell.
pub struct ShRunner;

impl ShellRunner for ShRunner {
    fn run(&self, command: &str) -> ExecStatus {
        match Command::new(SHELL).arg(SHELL_ARG).arg(command).status() {
            Err(e) => ExecStatus::Unreachable(e.to_string()),
            Ok(status) => match status.code() {
                Some(code) => ExecStatus::Exited(code),
                #[cfg(unix)]
                None => ExecStatus::Interrupted(status.signal().unwrap_or(SIGINT)),
                #[cfg(not(unix))]
                None => ExecStatus::Interrupted(SIGINT),
            },
        }
    }
}
