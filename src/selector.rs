use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{Result, SynthSegError};
use crate::modality::ModalitySelection;
use crate::participant::{participant_dir, ParticipantLabel};

pub const ANAT_DIR: &str = "anat";
pub const NIFTI_MARKER: &str = ".nii";

/// One anatomical scan selected for segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFile {
    pub session: String,
    pub file_name: String,
    pub path: PathBuf,
}

impl fmt::Display for ScanFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}

/// Lists the scans of `participant` whose names carry an enabled modality tag.
///
/// Sessions are the directories directly under the participant directory.
/// Sessions without an `anat` directory contribute nothing. Both sessions and
/// scans are returned sorted by file name. An empty selection still checks
/// the participant directory and returns no scans.
pub fn select(
    dataset_root: &Path,
    participant: &ParticipantLabel,
    modalities: &ModalitySelection,
) -> Result<Vec<ScanFile>> {
    let participant_dir = participant_dir(dataset_root, participant);
    let metadata = fs::metadata(&participant_dir)
        .map_err(|e| SynthSegError::file_system(&participant_dir, "participant lookup", e))?;
    if !metadata.is_dir() {
        return Err(SynthSegError::file_system(
            &participant_dir,
            "participant lookup",
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut scans = Vec::new();
    for session in list_sessions(&participant_dir)? {
        let anat_dir = session.path().join(ANAT_DIR);
        let session_name = session.file_name().to_string_lossy().into_owned();
        if !anat_dir.is_dir() {
            debug!(session = %session_name, "no anat directory, skipping session");
            continue;
        }

        for entry in child_entries(&anat_dir)? {
            if !entry.path().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                warn!(path = %entry.path().display(), "skipping scan with non UTF-8 name");
                continue;
            };
            if is_nifti(file_name) && modalities.matches(file_name) {
                scans.push(ScanFile {
                    session: session_name.clone(),
                    file_name: file_name.to_string(),
                    path: entry.path().to_path_buf(),
                });
            }
        }
    }

    debug!(participant = %participant, count = scans.len(), "scan selection finished");
    Ok(scans)
}

pub fn is_nifti(file_name: &str) -> bool {
    file_name.contains(NIFTI_MARKER)
}

fn list_sessions(participant_dir: &Path) -> Result<Vec<DirEntry>> {
    Ok(child_entries(participant_dir)?
        .into_iter()
        .filter(|entry| entry.path().is_dir())
        .collect())
}

fn child_entries(dir: &Path) -> Result<Vec<DirEntry>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.map_err(SynthSegError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modality::Modality;
    use tempfile::TempDir;

    fn touch(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, b"")
    }

    fn t1w() -> ModalitySelection {
        [Modality::T1w].into_iter().collect()
    }

    #[test]
    fn test_nifti_marker() {
        assert!(is_nifti("a_T1w.nii"));
        assert!(is_nifti("a_T1w.nii.gz"));
        assert!(!is_nifti("a_T1w.json"));
        assert!(!is_nifti("a_T1w.mgz"));
    }

    #[test]
    fn test_selects_matching_scan_only() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let anat = temp_dir.path().join("sub-01/ses-01/anat");
        touch(&anat.join("sub-01_ses-01_T1w.nii.gz"))?;
        touch(&anat.join("sub-01_ses-01_T2w.nii.gz"))?;
        touch(&anat.join("sub-01_ses-01_T1w.json"))?;

        let scans = select(temp_dir.path(), &ParticipantLabel::new("01"), &t1w())?;

        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].session, "ses-01");
        assert_eq!(scans[0].file_name, "sub-01_ses-01_T1w.nii.gz");
        assert_eq!(scans[0].path, anat.join("sub-01_ses-01_T1w.nii.gz"));
        Ok(())
    }

    #[test]
    fn test_session_without_anat_is_skipped() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let participant = temp_dir.path().join("sub-01");
        touch(&participant.join("ses-01/func/sub-01_ses-01_T1w.nii.gz"))?;
        touch(&participant.join("ses-02/anat/sub-01_ses-02_T1w.nii"))?;

        let scans = select(temp_dir.path(), &ParticipantLabel::new("sub-01"), &t1w())?;

        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].session, "ses-02");
        Ok(())
    }

    #[test]
    fn test_files_beside_sessions_are_ignored() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let participant = temp_dir.path().join("sub-01");
        touch(&participant.join("sub-01_sessions.tsv"))?;
        touch(&participant.join("ses-01/anat/sub-01_ses-01_T1w.nii.gz"))?;

        let scans = select(temp_dir.path(), &ParticipantLabel::new("01"), &t1w())?;
        assert_eq!(scans.len(), 1);
        Ok(())
    }

    #[test]
    fn test_results_are_sorted() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let participant = temp_dir.path().join("sub-01");
        touch(&participant.join("ses-02/anat/sub-01_ses-02_T1w.nii.gz"))?;
        touch(&participant.join("ses-01/anat/sub-01_ses-01_run-2_T1w.nii.gz"))?;
        touch(&participant.join("ses-01/anat/sub-01_ses-01_run-1_T1w.nii.gz"))?;

        let scans = select(temp_dir.path(), &ParticipantLabel::new("01"), &t1w())?;
        let names: Vec<_> = scans.iter().map(|s| s.file_name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "sub-01_ses-01_run-1_T1w.nii.gz",
                "sub-01_ses-01_run-2_T1w.nii.gz",
                "sub-01_ses-02_T1w.nii.gz",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_lowercase_tag_is_selected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let anat = temp_dir.path().join("sub-01/ses-01/anat");
        touch(&anat.join("sub-01_ses-01_flair.nii.gz"))?;

        let flair: ModalitySelection = [Modality::Flair].into_iter().collect();
        let scans = select(temp_dir.path(), &ParticipantLabel::new("01"), &flair)?;
        assert_eq!(scans.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_participant_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let result = select(temp_dir.path(), &ParticipantLabel::new("99"), &t1w());

        match result {
            Err(SynthSegError::FileSystem { path, .. }) => {
                assert_eq!(path, temp_dir.path().join("sub-99"));
            }
            other => panic!("expected filesystem error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_empty_selection_selects_nothing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        touch(&temp_dir.path().join("sub-01/ses-01/anat/sub-01_ses-01_T1w.nii.gz"))?;

        let none_enabled = ModalitySelection::new()
            .with(Modality::T1w, false)
            .with(Modality::T2w, false)
            .with(Modality::Flair, false);
        let scans = select(temp_dir.path(), &ParticipantLabel::new("01"), &none_enabled)?;

        assert!(scans.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_selection_still_requires_participant() {
        let result = select(
            Path::new("/definitely/not/here"),
            &ParticipantLabel::new("01"),
            &ModalitySelection::new(),
        );
        assert!(matches!(result, Err(SynthSegError::FileSystem { .. })));
    }
}
