// src/error.rs
//
// Errors surfaced when an engine instance cannot be created.
//
// Nothing past construction can fail: events, parameter changes and block
// rendering clamp or ignore bad input instead.

use crate::preset::Chip;

/// Reported by a chip-emulation backend that cannot be opened.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The emulator cannot resample to the requested output rate
    #[error("unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),

    /// The emulator's buffers could not be allocated
    #[error("allocation failed: {0}")]
    Allocation(String),
}

/// Instance-creation failure.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("failed to open {chip} backend")]
    Backend {
        chip: Chip,
        #[source]
        source: BackendError,
    },

    #[error("invalid engine configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
