use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, ValueEnum};

use crate::dispatcher::DEFAULT_SEGMENT_COMMAND;
use crate::errors::{Result, SynthSegError};
use crate::modality::{Modality, ModalitySelection};
use crate::participant::{ParticipantLabel, ParticipantRequest};
use crate::version::{DEFAULT_VERSION_COMMAND, FIXED_VERSION_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisLevel {
    Participant,
}

/// Arguments shared by both front-ends.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// The directory of the (unzipped) input dataset, formatted according to the BIDS standard.
    pub input_dir: PathBuf,

    /// The directory where the output files should be stored.
    pub output_dir: PathBuf,

    /// Level of the analysis that will be performed. Currently only 'participant' is allowed.
    #[arg(value_enum)]
    pub analysis_level: AnalysisLevel,

    /// The label of the participant to analyze, either <sub-xx> or just <xx>.
    #[arg(long = "participant_label", alias = "participant-label")]
    pub participant_label: String,

    /// Segmentation executable.
    #[arg(long, default_value = DEFAULT_SEGMENT_COMMAND)]
    pub segment_command: String,

    /// Kill a segmentation call that runs longer than this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl CommonArgs {
    fn request(&self, modalities: ModalitySelection) -> ParticipantRequest {
        ParticipantRequest::new(
            ParticipantLabel::new(&self.participant_label),
            &self.input_dir,
            &self.output_dir,
            modalities,
        )
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Where the version tag in output directory names comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    Fixed(String),
    Resolve { command: String },
}

/// Settings for the pipeline that do not describe the participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub segment_command: String,
    pub version: VersionSource,
    pub timeout: Option<Duration>,
    pub show_progress: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            segment_command: DEFAULT_SEGMENT_COMMAND.to_string(),
            version: VersionSource::Resolve {
                command: DEFAULT_VERSION_COMMAND.to_string(),
            },
            timeout: None,
            show_progress: false,
        }
    }
}

/// SynthSeg BIDS App: scan types are chosen with presence flags.
#[derive(Parser, Debug, Clone)]
#[command(name = "synthseg-bids", version, about = "SynthSeg BIDS App", long_about = None)]
pub struct FlagConfig {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Process T1w scans.
    #[arg(long)]
    pub t1w: bool,

    /// Process T2w scans.
    #[arg(long)]
    pub t2w: bool,

    /// Process FLAIR scans.
    #[arg(long)]
    pub flair: bool,

    /// Process MPRAGE scans.
    #[arg(long)]
    pub mprage: bool,

    /// Use this FreeSurfer version in output names instead of asking the version command.
    #[arg(long)]
    pub fs_version: Option<String>,

    /// Command run with `-version` to find the FreeSurfer release.
    #[arg(long, default_value = DEFAULT_VERSION_COMMAND)]
    pub version_command: String,
}

impl FlagConfig {
    pub fn modalities(&self) -> ModalitySelection {
        ModalitySelection::new()
            .with(Modality::T1w, self.t1w)
            .with(Modality::T2w, self.t2w)
            .with(Modality::Flair, self.flair)
            .with(Modality::Mprage, self.mprage)
    }

    /// Fails when no scan type flag was given.
    pub fn request(&self) -> Result<ParticipantRequest> {
        let modalities = self.modalities();
        if modalities.is_empty() {
            return Err(SynthSegError::Validation {
                field: "modalities".to_string(),
                reason: "must select at least one scan type (--t1w, --t2w, --flair or --mprage)"
                    .to_string(),
            });
        }
        Ok(self.common.request(modalities))
    }

    pub fn settings(&self) -> RunnerSettings {
        let version = match &self.fs_version {
            Some(tag) => VersionSource::Fixed(tag.clone()),
            None => VersionSource::Resolve {
                command: self.version_command.clone(),
            },
        };
        RunnerSettings {
            segment_command: self.common.segment_command.clone(),
            version,
            timeout: self.common.timeout(),
            show_progress: true,
        }
    }
}

/// SynthSeg BIDS job submitter: every scan type takes an explicit 0 or 1.
#[derive(Parser, Debug, Clone)]
#[command(name = "synthseg-job-submitter", version, about = "SynthSeg BIDS App", long_about = None)]
pub struct ValueConfig {
    #[command(flatten)]
    pub common: CommonArgs,

    /// If 1, T1w scans will be processed. If 0, they will not.
    #[arg(long, action = ArgAction::Set, required = true, value_parser = parse_switch)]
    pub t1w: bool,

    /// If 1, T2w scans will be processed. If 0, they will not.
    #[arg(long, action = ArgAction::Set, required = true, value_parser = parse_switch)]
    pub t2w: bool,

    /// If 1, FLAIR scans will be processed. If 0, they will not.
    #[arg(long, action = ArgAction::Set, required = true, value_parser = parse_switch)]
    pub flair: bool,
}

impl ValueConfig {
    pub fn modalities(&self) -> ModalitySelection {
        ModalitySelection::new()
            .with(Modality::T1w, self.t1w)
            .with(Modality::T2w, self.t2w)
            .with(Modality::Flair, self.flair)
    }

    /// All switches at 0 is valid and processes nothing.
    pub fn request(&self) -> ParticipantRequest {
        self.common.request(self.modalities())
    }

    pub fn settings(&self) -> RunnerSettings {
        RunnerSettings {
            segment_command: self.common.segment_command.clone(),
            version: VersionSource::Fixed(FIXED_VERSION_TAG.to_string()),
            timeout: self.common.timeout(),
            show_progress: true,
        }
    }
}

fn parse_switch(s: &str) -> std::result::Result<bool, String> {
    match s.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(format!("expected 0 or 1, got `{other}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definitions_are_valid() {
        FlagConfig::command().debug_assert();
        ValueConfig::command().debug_assert();
    }

    #[test]
    fn test_flag_front_end() -> Result<()> {
        let config = FlagConfig::try_parse_from([
            "synthseg-bids",
            "/bids",
            "/out",
            "participant",
            "--participant_label",
            "01",
            "--t1w",
            "--mprage",
        ]);
        let Ok(config) = config else {
            panic!("parse should succeed");
        };

        let modalities = config.modalities();
        assert!(modalities.is_enabled(Modality::T1w));
        assert!(modalities.is_enabled(Modality::Mprage));
        assert!(!modalities.is_enabled(Modality::Flair));

        let request = config.request()?;
        assert_eq!(request.participant.as_str(), "sub-01");
        assert_eq!(
            config.settings().version,
            VersionSource::Resolve {
                command: "recon-all".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn test_flag_front_end_accepts_dashed_alias_and_fixed_version() {
        let config = FlagConfig::try_parse_from([
            "synthseg-bids",
            "/bids",
            "/out",
            "participant",
            "--participant-label",
            "sub-02",
            "--flair",
            "--fs-version",
            "7.3.2",
            "--timeout-secs",
            "600",
        ]);

        let config = match config {
            Ok(config) => config,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(config.common.participant_label, "sub-02");
        let settings = config.settings();
        assert_eq!(settings.version, VersionSource::Fixed("7.3.2".to_string()));
        assert_eq!(settings.timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_flag_front_end_without_scan_types_fails_validation() {
        let config = FlagConfig::try_parse_from([
            "synthseg-bids",
            "/bids",
            "/out",
            "participant",
            "--participant_label",
            "01",
        ]);
        let Ok(config) = config else {
            panic!("parse should succeed");
        };
        assert!(matches!(
            config.request(),
            Err(SynthSegError::Validation { .. })
        ));
    }

    #[test]
    fn test_value_front_end() {
        let config = ValueConfig::try_parse_from([
            "synthseg-job-submitter",
            "/bids",
            "/out",
            "participant",
            "--participant_label",
            "03",
            "--t1w",
            "1",
            "--t2w",
            "0",
            "--flair",
            "1",
        ]);
        let Ok(config) = config else {
            panic!("parse should succeed");
        };

        let modalities = config.modalities();
        assert!(modalities.is_enabled(Modality::T1w));
        assert!(!modalities.is_enabled(Modality::T2w));
        assert!(modalities.is_enabled(Modality::Flair));
        assert!(!modalities.is_enabled(Modality::Mprage));
        assert_eq!(
            config.settings().version,
            VersionSource::Fixed("7.4.1".to_string())
        );
    }

    #[test]
    fn test_value_front_end_accepts_all_switches_off() {
        let config = ValueConfig::try_parse_from([
            "synthseg-job-submitter",
            "/bids",
            "/out",
            "participant",
            "--participant_label",
            "03",
            "--t1w",
            "0",
            "--t2w",
            "0",
            "--flair",
            "0",
        ]);
        let Ok(config) = config else {
            panic!("parse should succeed");
        };

        let request = config.request();
        assert!(request.modalities.is_empty());
        assert_eq!(request.participant.as_str(), "sub-03");
    }

    #[test]
    fn test_value_front_end_requires_all_switches() {
        let result = ValueConfig::try_parse_from([
            "synthseg-job-submitter",
            "/bids",
            "/out",
            "participant",
            "--participant_label",
            "03",
            "--t1w",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_switch_parser() {
        assert_eq!(parse_switch("1"), Ok(true));
        assert_eq!(parse_switch("0"), Ok(false));
        assert!(parse_switch("yes").is_err());
    }

    #[test]
    fn test_analysis_level_is_restricted() {
        let result = FlagConfig::try_parse_from([
            "synthseg-bids",
            "/bids",
            "/out",
            "group",
            "--participant_label",
            "01",
            "--t1w",
        ]);
        assert!(result.is_err());
    }
}
