use std::fmt;
use std::path::{Path, PathBuf};

use crate::modality::ModalitySelection;

pub const SUBJECT_PREFIX: &str = "sub-";

/// BIDS participant label, always carrying the `sub-` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantLabel(String);

impl ParticipantLabel {
    /// Accepts either `sub-xx` or bare `xx`.
    pub fn new(label: &str) -> Self {
        if label.starts_with(SUBJECT_PREFIX) {
            Self(label.to_string())
        } else {
            Self(format!("{SUBJECT_PREFIX}{label}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the pipeline needs to know about one participant run.
///
/// An empty modality selection is allowed here; it simply selects nothing.
/// Front-ends that treat it as a usage error reject it before building one.
#[derive(Debug, Clone)]
pub struct ParticipantRequest {
    pub participant: ParticipantLabel,
    pub dataset_root: PathBuf,
    pub output_root: PathBuf,
    pub modalities: ModalitySelection,
}

impl ParticipantRequest {
    pub fn new(
        participant: ParticipantLabel,
        dataset_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        modalities: ModalitySelection,
    ) -> Self {
        Self {
            participant,
            dataset_root: dataset_root.into(),
            output_root: output_root.into(),
            modalities,
        }
    }
}

pub fn participant_dir(dataset_root: &Path, participant: &ParticipantLabel) -> PathBuf {
    dataset_root.join(participant.as_str())
}
