pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod logging;
pub mod modality;
pub mod outcome;
pub mod participant;
pub mod process;
pub mod selector;
pub mod traits;
pub mod version;

pub mod mocks;

use std::fs;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

pub use config::{FlagConfig, RunnerSettings, ValueConfig, VersionSource};
pub use dispatcher::{Dispatcher, OutputLayout, RunMode};
pub use errors::{Result, SynthSegError};
pub use modality::{Modality, ModalitySelection};
pub use outcome::{InvocationResult, InvocationStatus, OutcomeTracker, RunSummary};
pub use participant::{ParticipantLabel, ParticipantRequest};
pub use process::SystemProcessRunner;
pub use selector::ScanFile;
pub use traits::*;

/// Runs SynthSeg in both modes over every selected scan of one participant.
pub struct SegmentationPipeline<R: ProcessRunner> {
    runner: R,
    settings: RunnerSettings,
}

impl<R: ProcessRunner> SegmentationPipeline<R> {
    pub const fn new(runner: R, settings: RunnerSettings) -> Self {
        Self { runner, settings }
    }

    /// Selection, version lookup and output root creation are fatal on
    /// failure. After that every (scan, mode) pair is attempted and its
    /// outcome only lands in the summary.
    pub fn run(&self, request: &ParticipantRequest) -> Result<RunSummary> {
        info!(participant = %request.participant, modalities = %request.modalities, "starting participant");

        let scans = selector::select(
            &request.dataset_root,
            &request.participant,
            &request.modalities,
        )?;
        info!(count = scans.len(), "selected scans");
        dispatcher::shared_stems(&scans);

        let version = self.version_tag()?;
        let layout = OutputLayout::new(&request.output_root, &version);
        fs::create_dir_all(&request.output_root).map_err(|e| {
            SynthSegError::file_system(&request.output_root, "output directory creation", e)
        })?;
        layout.ensure_roots()?;

        let dispatcher = Dispatcher::new(&self.runner, self.settings.segment_command.as_str(), layout);
        let progress = self.progress_bar(scans.len() * RunMode::ALL.len());
        let mut tracker = OutcomeTracker::new();

        for scan in &scans {
            for mode in RunMode::ALL {
                progress.suspend(|| {
                    let result = dispatcher.run(scan, mode);
                    tracker.record(result);
                });
                progress.inc(1);
            }
        }

        progress.finish_and_clear();
        Ok(tracker.finish())
    }

    fn version_tag(&self) -> Result<String> {
        match &self.settings.version {
            VersionSource::Fixed(tag) => Ok(tag.clone()),
            VersionSource::Resolve { command } => version::resolve_tool_version(&self.runner, command),
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style);
        progress
    }
}
