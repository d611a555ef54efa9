use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreetViewError};
use crate::params::RequestParameters;

/// GPS location with latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude coordinate
    pub lat: f64,
    /// Longitude coordinate
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both coordinates are finite and inside the WGS-84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Formats as the `lat,lng` text Google expects for `location`.
impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// What the camera should be placed near.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A point in decimal degrees. The camera is turned to face it.
    Coordinates(LatLng),
    /// A free-form address, passed to Google verbatim.
    Address(String),
}

impl Target {
    pub fn coordinates(lat: f64, lng: f64) -> Self {
        Target::Coordinates(LatLng::new(lat, lng))
    }

    pub fn address(text: impl Into<String>) -> Self {
        Target::Address(text.into())
    }

    /// The value sent as the `location` query parameter.
    pub fn location(&self) -> String {
        match self {
            Target::Coordinates(point) => point.to_string(),
            Target::Address(text) => text.clone(),
        }
    }
}

impl From<LatLng> for Target {
    fn from(point: LatLng) -> Self {
        Target::Coordinates(point)
    }
}

/// Requested image dimensions, written `{width}x{height}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(640, 640)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ImageSize {
    type Err = StreetViewError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StreetViewError::InvalidArgument(format!("size must be WIDTHxHEIGHT, got {s:?}"));
        let (width, height) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = width.parse().map_err(|_| invalid())?;
        let height: u32 = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Restricts the panorama search to a kind of imagery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Any Street View imagery
    #[default]
    Default,
    /// Outdoor imagery only
    Outdoor,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Default => "default",
            Source::Outdoor => "outdoor",
        }
    }
}

impl FromStr for Source {
    type Err = StreetViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(Source::Default),
            "outdoor" => Ok(Source::Outdoor),
            other => Err(StreetViewError::InvalidArgument(format!(
                "source must be \"default\" or \"outdoor\", got {other:?}"
            ))),
        }
    }
}

/// Status field of a metadata response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetadataStatus {
    Ok,
    ZeroResults,
    NotFound,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    /// Any status string this crate does not know about, kept verbatim
    Other(String),
}

impl MetadataStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MetadataStatus::Ok => "OK",
            MetadataStatus::ZeroResults => "ZERO_RESULTS",
            MetadataStatus::NotFound => "NOT_FOUND",
            MetadataStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            MetadataStatus::RequestDenied => "REQUEST_DENIED",
            MetadataStatus::InvalidRequest => "INVALID_REQUEST",
            MetadataStatus::UnknownError => "UNKNOWN_ERROR",
            MetadataStatus::Other(status) => status,
        }
    }
}

impl From<String> for MetadataStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "OK" => MetadataStatus::Ok,
            "ZERO_RESULTS" => MetadataStatus::ZeroResults,
            "NOT_FOUND" => MetadataStatus::NotFound,
            "OVER_QUERY_LIMIT" => MetadataStatus::OverQueryLimit,
            "REQUEST_DENIED" => MetadataStatus::RequestDenied,
            "INVALID_REQUEST" => MetadataStatus::InvalidRequest,
            "UNKNOWN_ERROR" => MetadataStatus::UnknownError,
            _ => MetadataStatus::Other(status),
        }
    }
}

impl From<MetadataStatus> for String {
    fn from(status: MetadataStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for MetadataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for the panorama nearest a requested location.
///
/// Only `status` is always present. The other fields are filled when
/// `status` is `OK`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanoramaMetadata {
    pub status: MetadataStatus,
    /// Where the panorama was captured
    #[serde(default)]
    pub location: Option<LatLng>,
    /// Panorama ID
    #[serde(default)]
    pub pano_id: Option<String>,
    /// Date of panorama capture, `YYYY-MM`
    #[serde(default)]
    pub date: Option<String>,
    /// Copyright information
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl PanoramaMetadata {
    /// Location of the panorama, or the error the status stands for.
    pub fn panorama_location(&self) -> Result<LatLng> {
        match &self.status {
            MetadataStatus::Ok => self.location.ok_or_else(|| {
                StreetViewError::InvalidResponse("metadata status OK but no location".to_string())
            }),
            MetadataStatus::ZeroResults | MetadataStatus::NotFound => {
                Err(StreetViewError::MetadataUnavailable(self.status.clone()))
            }
            MetadataStatus::RequestDenied => Err(StreetViewError::ConfigurationError(
                self.error_message
                    .clone()
                    .unwrap_or_else(|| self.status.to_string()),
            )),
            other => Err(StreetViewError::ProviderError {
                status: other.to_string(),
                message: self.error_message.clone().unwrap_or_default(),
            }),
        }
    }
}

/// The outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct ResolvedPanorama {
    /// The decoded view
    pub image: image::DynamicImage,
    /// Metadata of the panorama the view was taken from
    pub metadata: PanoramaMetadata,
    /// Parameters sent with the image request, including the applied heading
    pub parameters: RequestParameters,
}

/// Image output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG format
    Jpeg,
    /// PNG format
    Png,
    /// WebP format
    WebP,
}

impl ImageFormat {
    /// Pick a format from a file extension, case-insensitively.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

/// Options for writing a resolved view to disk.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Image format
    pub format: ImageFormat,
    /// JPEG quality (1-100, default 90)
    pub jpeg_quality: u8,
}

impl SaveOptions {
    /// Default options: JPEG at quality 90.
    pub fn new() -> Self {
        Self {
            format: ImageFormat::Jpeg,
            jpeg_quality: 90,
        }
    }

    /// Options for `path`, falling back to JPEG for unknown extensions.
    pub fn for_path(path: impl AsRef<std::path::Path>) -> Self {
        Self::new().format(ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg))
    }

    /// Set the output format.
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set JPEG quality (1-100).
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self::new()
    }
}
