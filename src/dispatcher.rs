use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{Result, SynthSegError};
use crate::outcome::{InvocationResult, InvocationStatus};
use crate::selector::{ScanFile, NIFTI_MARKER};
use crate::traits::ProcessRunner;

pub const DEFAULT_SEGMENT_COMMAND: &str = "mri_synthseg";
pub const VOLUMES_FILE: &str = "volumes.csv";
pub const QC_FILE: &str = "qc_scores.csv";
pub const POSTERIORS_FILE: &str = "posterior_probability_maps.nii.gz";

/// The two ways each scan is segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    Robust,
    NotRobust,
}

impl RunMode {
    /// Execution order for every scan.
    pub const ALL: [RunMode; 2] = [Self::Robust, Self::NotRobust];

    pub const fn dir_suffix(self) -> &'static str {
        match self {
            Self::Robust => "robust",
            Self::NotRobust => "notrobust",
        }
    }

    /// Flag added on top of `--parc`, if any.
    pub const fn extra_flag(self) -> Option<&'static str> {
        match self {
            Self::Robust => Some("--robust"),
            Self::NotRobust => None,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Robust => f.write_str("Robust"),
            Self::NotRobust => f.write_str("Not Robust"),
        }
    }
}

/// Strips everything from the first `.nii` on: `x_T1w.nii.gz` becomes `x_T1w`.
pub fn scan_stem(file_name: &str) -> &str {
    file_name
        .split_once(NIFTI_MARKER)
        .map_or(file_name, |(stem, _)| stem)
}

/// Stems claimed by more than one selected scan, in first-seen order.
///
/// Such scans share an output directory, so the later run overwrites the
/// earlier one. Each collision is logged once.
pub fn shared_stems(scans: &[ScanFile]) -> Vec<String> {
    let mut owners: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut order = Vec::new();
    for scan in scans {
        let stem = scan_stem(&scan.file_name);
        let files = owners.entry(stem).or_default();
        if files.is_empty() {
            order.push(stem);
        }
        files.push(&scan.file_name);
    }

    order
        .into_iter()
        .filter(|stem| owners[stem].len() > 1)
        .map(|stem| {
            warn!(stem, scans = ?owners[stem], "scans share an output directory, later runs overwrite earlier ones");
            stem.to_string()
        })
        .collect()
}

/// Versioned roots of the robust and non-robust output trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    robust_root: PathBuf,
    notrobust_root: PathBuf,
}

impl OutputLayout {
    pub fn new(output_root: &Path, version: &str) -> Self {
        let root = |mode: RunMode| {
            output_root.join(format!("synthseg_fs{version}_parc_{}", mode.dir_suffix()))
        };
        Self {
            robust_root: root(RunMode::Robust),
            notrobust_root: root(RunMode::NotRobust),
        }
    }

    pub fn mode_root(&self, mode: RunMode) -> &Path {
        match mode {
            RunMode::Robust => &self.robust_root,
            RunMode::NotRobust => &self.notrobust_root,
        }
    }

    pub fn target(&self, scan: &ScanFile, mode: RunMode) -> OutputTarget {
        OutputTarget::new(self.mode_root(mode).join(scan_stem(&scan.file_name)))
    }

    /// Creates both mode roots; existing directories are left alone.
    pub fn ensure_roots(&self) -> Result<()> {
        for mode in RunMode::ALL {
            let root = self.mode_root(mode);
            fs::create_dir_all(root)
                .map_err(|e| SynthSegError::file_system(root, "output root creation", e))?;
        }
        Ok(())
    }
}

/// Where one (scan, mode) invocation writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    pub volumes: PathBuf,
    pub qc_scores: PathBuf,
    pub posteriors: PathBuf,
}

impl OutputTarget {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            volumes: dir.join(VOLUMES_FILE),
            qc_scores: dir.join(QC_FILE),
            posteriors: dir.join(POSTERIORS_FILE),
            dir,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| SynthSegError::file_system(&self.dir, "scan output directory creation", e))
    }
}

/// Argument list for one segmentation call, program name excluded.
pub fn invocation_args(input: &Path, target: &OutputTarget, mode: RunMode) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--i".into(),
        input.into(),
        "--o".into(),
        target.dir.clone().into(),
        "--vol".into(),
        target.volumes.clone().into(),
        "--qc".into(),
        target.qc_scores.clone().into(),
        "--post".into(),
        target.posteriors.clone().into(),
    ];
    if let Some(flag) = mode.extra_flag() {
        args.push(flag.into());
    }
    args.push("--parc".into());
    args
}

/// Turns one scan and mode into a blocking segmentation call.
pub struct Dispatcher<R: ProcessRunner> {
    runner: R,
    command: String,
    layout: OutputLayout,
}

impl<R: ProcessRunner> Dispatcher<R> {
    pub fn new(runner: R, command: impl Into<String>, layout: OutputLayout) -> Self {
        Self {
            runner,
            command: command.into(),
            layout,
        }
    }

    /// Never fails: every problem ends up in the returned status.
    pub fn run(&self, scan: &ScanFile, mode: RunMode) -> InvocationResult {
        info!("===== Running SynthSeg ({mode}) on: {scan} =====");

        let target = self.layout.target(scan, mode);
        let status = match target.ensure() {
            Ok(()) => self.invoke(scan, &target, mode),
            Err(e) => InvocationStatus::launch_failed(e),
        };

        InvocationResult {
            scan: scan.clone(),
            mode,
            status,
        }
    }

    fn invoke(&self, scan: &ScanFile, target: &OutputTarget, mode: RunMode) -> InvocationStatus {
        let args = invocation_args(&scan.path, target, mode);
        debug!(command = %self.command, output = %target.dir.display(), "invoking segmentation");

        match self.runner.run(&self.command, &args) {
            Ok(exit) => InvocationStatus::from(exit),
            Err(e) => InvocationStatus::launch_failed(e),
        }
    }
}
