use std::collections::VecDeque;
use std::ffi::OsString;

use parking_lot::Mutex;

use crate::errors::{Result, SynthSegError};
use crate::traits::{ProcessRunner, ToolExit};

/// One call observed by [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<OsString>,
}

impl RecordedCall {
    /// Arguments as plain strings, for easy assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following `flag`, e.g. the path after `--o`.
    pub fn flag_value(&self, flag: &str) -> Option<String> {
        let args = self.args_lossy();
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|i| args.get(i + 1).cloned())
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }
}

/// Scripted reply for a single `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedRun {
    Exit(ToolExit),
    LaunchFailure,
}

/// Test double for [`ProcessRunner`] that records calls instead of spawning.
///
/// `run` replies come from the script queue in order and default to a clean
/// exit once the queue is empty. `capture` always replies with the banner.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    script: Mutex<VecDeque<ScriptedRun>>,
    banner: Mutex<Option<(ToolExit, String)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, replies: impl IntoIterator<Item = ScriptedRun>) -> Self {
        self.script.lock().extend(replies);
        self
    }

    pub fn with_banner(self, exit: ToolExit, banner: impl Into<String>) -> Self {
        *self.banner.lock() = Some((exit, banner.into()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn record(&self, program: &str, args: &[OsString]) {
        self.calls.lock().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
        });
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolExit> {
        self.record(program, args);
        match self.script.lock().pop_front() {
            Some(ScriptedRun::Exit(exit)) => Ok(exit),
            Some(ScriptedRun::LaunchFailure) => Err(SynthSegError::ToolLaunch {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
            }),
            None => Ok(ToolExit::Exited(0)),
        }
    }

    fn capture(&self, program: &str, args: &[OsString]) -> Result<(ToolExit, String)> {
        self.record(program, args);
        self.banner
            .lock()
            .clone()
            .ok_or_else(|| SynthSegError::ToolLaunch {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no banner scripted"),
            })
    }
}
