use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Report descriptor needs at least {needed} bytes but capacity is {capacity}")]
    DescriptorOverflow { needed: usize, capacity: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown special button: {0}")]
    UnknownSpecialButton(u8),

    #[error("Unknown axis: {0}")]
    UnknownAxis(String),

    #[error("Invalid button number: {0}")]
    InvalidButton(u8),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Controller already started")]
    AlreadyStarted,

    #[error("Controller not started")]
    NotStarted,

    #[error("Pairing cancelled")]
    PairingCancelled,

    #[error("Pairing timed out")]
    PairingTimeout,

    #[error("Pairing already in progress")]
    PairingInProgress,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ControllerError {
    /// Whether this error means the configuration can never produce a working session
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DescriptorOverflow { .. } | Self::Config(_) | Self::UnknownAxis(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ControllerError>;
