use std::ffi::OsString;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::errors::{Result, SynthSegError};
use crate::traits::{ProcessRunner, ToolExit};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runs programs with `std::process::Command`, one at a time.
#[derive(Debug, Clone, Default)]
pub struct SystemProcessRunner {
    timeout: Option<Duration>,
}

impl SystemProcessRunner {
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill a tool that runs longer than `timeout`.
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn spawn(&self, command: &mut Command, program: &str) -> Result<Child> {
        command.spawn().map_err(|e| SynthSegError::ToolLaunch {
            program: program.to_string(),
            source: e,
        })
    }

    fn wait(&self, child: &mut Child, program: &str) -> Result<ToolExit> {
        let Some(limit) = self.timeout else {
            let status = child.wait().map_err(|e| SynthSegError::ToolLaunch {
                program: program.to_string(),
                source: e,
            })?;
            return Ok(exit_of(status));
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(exit_of(status)),
                Ok(None) if started.elapsed() >= limit => {
                    warn!(program, timeout_secs = limit.as_secs(), "killing tool after timeout");
                    stop(child, program);
                    return Ok(ToolExit::TimedOut);
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    warn!(program, error = %e, "lost track of tool, killing it");
                    stop(child, program);
                    return Err(SynthSegError::ToolLaunch {
                        program: program.to_string(),
                        source: e,
                    });
                }
            }
        }
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ToolExit> {
        debug!(program, ?args, "starting tool");
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = self.spawn(&mut command, program)?;
        self.wait(&mut child, program)
    }

    fn capture(&self, program: &str, args: &[OsString]) -> Result<(ToolExit, String)> {
        debug!(program, ?args, "capturing tool output");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| SynthSegError::ToolLaunch {
                program: program.to_string(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok((exit_of(output.status), stdout))
    }
}

/// Kills and reaps `child`, logging whatever goes wrong on the way.
fn stop(child: &mut Child, program: &str) {
    if let Err(e) = child.kill() {
        warn!(program, error = %e, "failed to kill tool");
    }
    if let Err(e) = child.wait() {
        warn!(program, error = %e, "failed to reap killed tool");
    }
}

fn exit_of(status: ExitStatus) -> ToolExit {
    match status.code() {
        Some(code) => ToolExit::Exited(code),
        None => ToolExit::Terminated,
    }
}
