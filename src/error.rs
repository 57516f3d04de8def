//! Error types for the ricecooker-autopilot crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A cooking profile could not be decoded.
    #[error("Invalid profile: {context}")]
    InvalidProfile {
        /// Description of what was wrong with the profile.
        context: String,
    },

    /// The trailing checksum of a cooking profile does not match its payload.
    #[error("Profile checksum error: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumError {
        /// The checksum computed over the payload.
        expected: u16,
        /// The checksum carried by the profile.
        actual: u16,
    },

    /// No bundled profile template exists for the given identifier.
    #[error("Unknown profile type: {name}")]
    UnknownProfile {
        /// The identifier that was looked up.
        name: String,
    },

    /// The configuration file is malformed or fails validation.
    #[error("Invalid configuration: {context}")]
    InvalidConfig {
        /// Description of the problem.
        context: String,
    },

    /// A meal window whose bounds are out of order (e.g. one spanning midnight).
    #[error("Unsupported meal window {earliest} ~ {latest} (usual {usual}): windows must not span midnight")]
    UnsupportedMealWindow {
        /// Earliest time of day.
        earliest: String,
        /// Usual time of day.
        usual: String,
        /// Latest time of day.
        latest: String,
    },

    /// Invalid data was received from the appliance.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// The appliance did not answer in time.
    #[error("Appliance request timed out")]
    Timeout,

    /// The appliance answered with an RPC error.
    #[error("Appliance reported error {code}: {message}")]
    DeviceError {
        /// Error code from the appliance.
        code: i64,
        /// Error message from the appliance.
        message: String,
    },

    /// Payload encryption or decryption failed.
    #[error("Crypto error: {context}")]
    Crypto {
        /// Description of the failure.
        context: String,
    },

    /// Socket or file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP error from the notification service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
