use std::fmt;

use tracing::{debug, info, warn};

use crate::dispatcher::RunMode;
use crate::errors::SynthSegError;
use crate::selector::ScanFile;
use crate::traits::ToolExit;

/// What became of a single segmentation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationStatus {
    Succeeded,
    /// Non-zero exit, or killed by a signal when `code` is `None`.
    Failed { code: Option<i32> },
    TimedOut,
    /// The tool never ran: missing binary or unwritable output directory.
    LaunchFailed { reason: String },
}

impl InvocationStatus {
    pub fn launch_failed(err: SynthSegError) -> Self {
        Self::LaunchFailed {
            reason: format!("{:#}", anyhow::Error::from(err)),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl From<ToolExit> for InvocationStatus {
    fn from(exit: ToolExit) -> Self {
        match exit {
            ToolExit::Exited(0) => Self::Succeeded,
            ToolExit::Exited(code) => Self::Failed { code: Some(code) },
            ToolExit::Terminated => Self::Failed { code: None },
            ToolExit::TimedOut => Self::TimedOut,
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed { code: Some(code) } => write!(f, "exit status {code}"),
            Self::Failed { code: None } => f.write_str("terminated by signal"),
            Self::TimedOut => f.write_str("timed out"),
            Self::LaunchFailed { reason } => write!(f, "could not start: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub scan: ScanFile,
    pub mode: RunMode,
    pub status: InvocationStatus,
}

/// A (scan, mode) pair that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedInvocation {
    pub scan: String,
    pub mode: RunMode,
    pub status: InvocationStatus,
}

/// Tally of a finished run. Informational only, the exit code ignores it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<FailedInvocation>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Closing report printed by both binaries.
impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SynthSeg runs: {} attempted, {} succeeded, {} failed",
            self.attempted,
            self.succeeded,
            self.failed()
        )?;
        for failure in &self.failures {
            write!(
                f,
                "\n  SynthSeg {} did not run for scan: {} ({})",
                failure.mode, failure.scan, failure.status
            )?;
        }
        Ok(())
    }
}

/// Collects invocation results and reports failures as they arrive.
#[derive(Debug, Default)]
pub struct OutcomeTracker {
    summary: RunSummary,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: InvocationResult) {
        self.summary.attempted += 1;

        if result.status.is_success() {
            self.summary.succeeded += 1;
            debug!(scan = %result.scan, mode = %result.mode, "segmentation finished");
            return;
        }

        warn!(
            status = %result.status,
            "SynthSeg {} did not run for scan: {}",
            result.mode,
            result.scan
        );
        self.summary.failures.push(FailedInvocation {
            scan: result.scan.file_name,
            mode: result.mode,
            status: result.status,
        });
    }

    pub fn finish(self) -> RunSummary {
        info!(
            attempted = self.summary.attempted,
            succeeded = self.summary.succeeded,
            failed = self.summary.failed(),
            "segmentation run complete"
        );
        self.summary
    }
}
