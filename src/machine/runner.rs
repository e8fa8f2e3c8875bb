//! Helper process invocation.
//!
//! The discoverer never spawns processes directly. It goes through
//! [`CommandRunner`] so tests can stand in a fake helper.

use std::io;
use std::process::{Command, Stdio};

/// Captured result of one helper invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited successfully.
    pub success: bool,
    /// The exit code, when the platform reports one.
    pub code: Option<i32>,
    /// Standard output decoded as UTF-8 (lossily).
    pub stdout: String,
}

impl CommandOutput {
    /// Output of a process that exited with status zero.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
        }
    }

    /// Output of a process that exited unsuccessfully.
    #[must_use]
    pub const fn failure(code: Option<i32>) -> Self {
        Self {
            success: false,
            code,
            stdout: String::new(),
        }
    }
}

/// Capability to run an external program and capture its standard output.
///
/// Implementations block until the program exits. An `Err` means the program
/// could not be started at all; a non-zero exit is reported in the `success`
/// field of [`CommandOutput`].
pub trait CommandRunner {
    /// Run `program` with `args`, returning its captured output.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the program cannot be spawned or waited on.
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

impl<F> CommandRunner for F
where
    F: Fn(&str, &[&str]) -> io::Result<CommandOutput>,
{
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        self(program, args)
    }
}

/// Runs programs with `std::process::Command`.
///
/// Standard input is closed and standard error is discarded. No timeout is
/// applied: a hung helper blocks the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
