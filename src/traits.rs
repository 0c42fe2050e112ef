use std::ffi::OsString;
use std::fmt;

use crate::errors::Result;

/// How an external process came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    /// Exited on its own with this status code.
    Exited(i32),
    /// Killed by a signal, no exit code available.
    Terminated,
    /// Killed by the runner after exceeding its time limit.
    TimedOut,
}

impl ToolExit {
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }

    pub const fn code(self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(code),
            Self::Terminated | Self::TimedOut => None,
        }
    }
}

impl fmt::Display for ToolExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exit status {code}"),
            Self::Terminated => f.write_str("terminated by signal"),
            Self::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Capability to start external programs.
///
/// The pipeline never touches `std::process` directly, so tests can swap in
/// [`crate::mocks::RecordingRunner`] and inspect every call.
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` to completion with inherited stdio.
    ///
    /// `Err` means the program could not be started at all.
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolExit>;

    /// Runs `program` and returns what it wrote to stdout.
    fn capture(&self, program: &str, args: &[OsString]) -> Result<(ToolExit, String)>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolExit> {
        (**self).run(program, args)
    }

    fn capture(&self, program: &str, args: &[OsString]) -> Result<(ToolExit, String)> {
        (**self).capture(program, args)
    }
}
