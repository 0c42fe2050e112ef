use std::ffi::OsString;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::errors::{Result, SynthSegError};
use crate::traits::ProcessRunner;

pub const DEFAULT_VERSION_COMMAND: &str = "recon-all";
/// Tag used by the job submitter, which never asks FreeSurfer.
pub const FIXED_VERSION_TAG: &str = "7.4.1";
/// Stand-in when the banner holds no recognizable version.
pub const UNKNOWN_VERSION: &str = "unknown";

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(?:\.\d+)*").expect("version pattern compiles"));

/// Asks FreeSurfer which release is installed.
///
/// The command must start and exit cleanly; otherwise output directories
/// would be named after a guess, so the run stops. A banner without a version
/// number only earns a warning and [`UNKNOWN_VERSION`].
pub fn resolve_tool_version<R: ProcessRunner>(runner: &R, command: &str) -> Result<String> {
    let (exit, banner) = runner.capture(command, &[OsString::from("-version")])?;
    if !exit.success() {
        return Err(SynthSegError::VersionResolution {
            program: command.to_string(),
            reason: exit.to_string(),
        });
    }

    match parse_version_banner(&banner) {
        Some(version) => {
            info!(version = %version, "resolved FreeSurfer version");
            Ok(version)
        }
        None => {
            warn!(
                banner = banner.trim(),
                fallback = UNKNOWN_VERSION,
                "no version number in FreeSurfer banner"
            );
            Ok(UNKNOWN_VERSION.to_string())
        }
    }
}

/// First dotted numeric token, e.g. `7.4.1` in
/// `freesurfer-linux-ubuntu22_x86_64-7.4.1-20230614-7eb8460`.
pub fn parse_version_banner(banner: &str) -> Option<String> {
    VERSION_PATTERN
        .find(banner)
        .map(|m| m.as_str().to_string())
}
