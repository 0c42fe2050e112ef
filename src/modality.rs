use std::collections::BTreeMap;
use std::fmt;

/// MRI acquisition sequences a scan file name can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modality {
    T1w,
    T2w,
    Flair,
    Mprage,
}

impl Modality {
    /// Tag as it conventionally appears in BIDS file names.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::T1w => "T1w",
            Self::T2w => "T2w",
            Self::Flair => "FLAIR",
            Self::Mprage => "MPRAGE",
        }
    }

    /// Case-insensitive substring match of the tag against a file name.
    pub fn matches(self, file_name: &str) -> bool {
        file_name
            .to_lowercase()
            .contains(&self.tag().to_lowercase())
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which modalities to process, independent of how the CLI spelled it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalitySelection {
    enabled: BTreeMap<Modality, bool>,
}

impl ModalitySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, modality: Modality, enabled: bool) -> Self {
        self.set(modality, enabled);
        self
    }

    pub fn set(&mut self, modality: Modality, enabled: bool) {
        self.enabled.insert(modality, enabled);
    }

    pub fn is_enabled(&self, modality: Modality) -> bool {
        self.enabled.get(&modality).copied().unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        !self.enabled.values().any(|&on| on)
    }

    /// Enabled modalities in a stable order.
    pub fn enabled(&self) -> impl Iterator<Item = Modality> + '_ {
        self.enabled
            .iter()
            .filter(|(_, &on)| on)
            .map(|(&modality, _)| modality)
    }

    /// True when `file_name` carries at least one enabled modality tag.
    pub fn matches(&self, file_name: &str) -> bool {
        self.enabled().any(|modality| modality.matches(file_name))
    }
}

impl FromIterator<Modality> for ModalitySelection {
    fn from_iter<I: IntoIterator<Item = Modality>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |selection, modality| selection.with(modality, true))
    }
}

impl fmt::Display for ModalitySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<_> = self.enabled().map(Modality::tag).collect();
        f.write_str(&tags.join(", "))
    }
}
