//! Error types for the hark daemon

use thiserror::Error;

/// Result type alias for hark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the hark daemon
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reading a bundled asset or writing its mirror
    #[error("asset error: {0}")]
    Asset(String),

    /// Recognition engine construction failure
    #[error("engine error: {0}")]
    Engine(String),

    /// Audio capture error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
