//! Save-state error types

use thiserror::Error;

/// Errors raised while saving or restoring a snapshot
///
/// Any error aborts the whole restore; there is no best-effort recovery.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("expected section \"{expected}\", found \"{found}\"")]
    SectionMismatch { expected: String, found: String },

    #[error("section \"{title}\" has version {found}, supported range is {min}..={max}")]
    UnsupportedVersion {
        title: String,
        found: u32,
        min: u32,
        max: u32,
    },

    #[error("section \"{title}\" declared {declared} bytes but {consumed} were consumed")]
    SectionLength {
        title: String,
        declared: u32,
        consumed: usize,
    },

    #[error("section \"{title}\" body reads past its {declared} declared bytes")]
    SectionOverrun { title: String, declared: u32 },

    #[error("section \"{title}\" is too large to frame")]
    SectionTooLarge { title: String },

    #[error("snapshot truncated at offset {offset}")]
    Truncated { offset: usize },

    #[error("structural mismatch: {0}")]
    Structure(String),

    #[error("unknown kernel object kind {0:#x}")]
    UnknownObjectKind(u32),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

impl StateError {
    /// Whether the snapshot is incompatible with this build
    ///
    /// Structural failures mean the data was produced by a different build
    /// (capacity, section layout or object kinds differ). Non-structural
    /// failures mean the data itself is damaged.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            StateError::SectionMismatch { .. }
                | StateError::UnsupportedVersion { .. }
                | StateError::SectionLength { .. }
                | StateError::SectionOverrun { .. }
                | StateError::Structure(_)
                | StateError::UnknownObjectKind(_)
        )
    }
}

pub type Result<T> = core::result::Result<T, StateError>;
