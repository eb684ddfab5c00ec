//! The special pseudo-targets that configure the run instead of naming files.

use crate::implicit::{DEFAULT, SUFFIXES};

/// The recognized special targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialTarget {
    Suffixes,
    Default,
    Precious,
    Silent,
    Ignore,
    Phony,
}

impl SpecialTarget {
    pub const VARIANTS: [Self; 6] = [
        Self::Suffixes,
        Self::Default,
        Self::Precious,
        Self::Silent,
        Self::Ignore,
        Self::Phony,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS.into_iter().find(|v| v.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suffixes => SUFFIXES,
            Self::Default => DEFAULT,
            Self::Precious => ".PRECIOUS",
            Self::Silent => ".SILENT",
            Self::Ignore => ".IGNORE",
            Self::Phony => ".PHONY",
        }
    }
}
