use thiserror::Error;

/// Errors that can occur while loading or writing settings
///
/// None of these are fatal to the monitor: the in-memory settings stay
/// authoritative for the session and the caller decides whether to warn.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The file was written by a newer build than this one understands
    #[error("Unsupported settings version: {0}")]
    InvalidVersion(u32),

    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}
