//! Errors surfaced to hosts.

/// Everything the emulator can report back to its host.
///
/// Asset errors come back from `load_file`; the rest come back from `tick`.
/// A failed tick leaves device state exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PawPetError {
    /// A recognised file failed validation on load.
    #[error("invalid asset '{name}': {reason}")]
    InvalidAsset { name: String, reason: String },

    /// No file with this name has been loaded.
    #[error("asset '{0}' not found")]
    NotFound(String),

    /// `tick` was called before every boot asset arrived.
    #[error("not ready: waiting for {}", .missing.join(", "))]
    NotReady { missing: Vec<String> },

    /// A loaded sprite sheet turned out to be unusable while drawing.
    #[error("corrupt asset '{name}': {source}")]
    CorruptAsset {
        name: String,
        source: format_paw::PawError,
    },
}

impl PawPetError {
    pub(crate) fn invalid(name: &str, reason: impl ToString) -> Self {
        Self::InvalidAsset {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn corrupt(name: &str, source: format_paw::PawError) -> Self {
        Self::CorruptAsset {
            name: name.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_lists_missing_assets() {
        let err = PawPetError::NotReady {
            missing: vec!["icons".into(), "petsit".into()],
        };
        assert_eq!(err.to_string(), "not ready: waiting for icons, petsit");
    }

    #[test]
    fn corrupt_asset_exposes_source() {
        use std::error::Error;
        let err = PawPetError::corrupt("egg_wobble", format_paw::PawError::NoFrames);
        assert!(err.source().is_some());
    }
}
