use thiserror::Error;

/// Failures the player surfaces to its host.
///
/// Empty sample data, silent peaks and drawing before the surface exists are
/// not errors: they are absorbed where they happen and only logged.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The source could not be probed or decoded.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// The output stream could not be opened or written.
    #[error("audio playback failed: {0}")]
    Playback(String),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
