use thiserror::Error;

use crate::types::MetadataStatus;

/// Result type alias for street-heading operations.
pub type Result<T> = std::result::Result<T, StreetViewError>;

/// Errors that can occur while resolving a Street View image.
#[derive(Error, Debug)]
pub enum StreetViewError {
    /// The provider rejected the API key or request configuration
    #[error("Request rejected by Google: {0}")]
    ConfigurationError(String),

    /// No panorama exists within the search radius of the target
    #[error("No panorama found near the target (status {0})")]
    MetadataUnavailable(MetadataStatus),

    /// Network-level failure reaching either endpoint
    #[error("HTTP request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    /// The image endpoint returned bytes that are not an image
    #[error("Failed to decode panorama image: {0}")]
    DecodeError(#[from] image::ImageError),

    /// The provider answered with a non-OK status we do not map elsewhere
    #[error("Google returned {status}: {message}")]
    ProviderError {
        status: String,
        message: String,
    },

    /// Invalid response from Google
    #[error("Invalid response from Google: {0}")]
    InvalidResponse(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// A caller-supplied value is out of range or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Settings file could not be read
    #[error("Invalid settings: {0}")]
    SettingsError(String),

    /// Writing the image to disk failed
    #[error("Failed to encode image: {0}")]
    EncodeError(#[source] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid URL format
    #[error("Invalid Google Maps URL format")]
    InvalidUrl,
}
