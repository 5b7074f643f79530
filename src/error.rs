//! Error types for the AR playback runtime

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bringing up or running an AR session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Missing or malformed page identifier (raised before any network call)
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Asset payload could not be retrieved or decoded
    #[error("Asset retrieval failed: {0}")]
    RetrievalError(String),

    /// Camera or tracking engine refused to start
    #[error("Camera access denied: {0}")]
    PermissionError(String),

    /// The platform rejected a play request
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    /// An optional asset failed to load and a fallback was used
    #[error("Asset degraded: {0}")]
    AssetDegradation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Fatal errors abort initialization and surface on the loader.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigError(_) | Error::RetrievalError(_) | Error::PermissionError(_)
        )
    }
}
