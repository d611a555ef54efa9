//! # street_heading
//!
//! An async Rust library that fetches the Google Street View image nearest a
//! point and turns the camera to look at it.
//!
//! This library provides:
//! - Default request parameters with per-request overrides
//! - Great-circle bearing from the panorama to the target
//! - Metadata lookup and image download through the Street View Static API
//! - Saving the view as JPEG, PNG or WebP
//!
//! ## Example
//!
//! ```no_run
//! use street_heading::{ParameterOverrides, StreetView, Target, ViewSaveExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StreetView::with_api_key("YOUR_API_KEY");
//!
//!     // Look at a point from the nearest panorama
//!     let target = Target::coordinates(42.4385, -76.5032);
//!     let view = client.resolve(&target, &ParameterOverrides::new().fov(80.0)).await?;
//!
//!     println!("heading {:.1}", view.parameters.heading);
//!     view.image.save_view("view.jpg")?;
//!
//!     Ok(())
//! }
//! ```

mod error;
mod types;
mod params;
mod provider;
mod resolver;
mod save;
pub mod bearing;
pub mod config;
pub mod maps_url;

pub use error::{Result, StreetViewError};
pub use types::{
    ImageFormat, ImageSize, LatLng, MetadataStatus, PanoramaMetadata, ResolvedPanorama,
    SaveOptions, Source, Target,
};
pub use params::{ParameterOverrides, ParameterStore, RequestParameters};
pub use provider::{HttpProvider, StreetViewProvider, METADATA_ENDPOINT, STREETVIEW_ENDPOINT};
pub use resolver::PanoramaResolver;
pub use save::{save_image, ViewSaveExt};

use config::Settings;

/// A resolver talking to Google over HTTP.
pub type StreetView = PanoramaResolver<HttpProvider>;

impl PanoramaResolver<HttpProvider> {
    /// Creates a client with the built-in defaults and the given API key.
    ///
    /// The key is not checked here; Google rejects a bad key on the first
    /// request with [`StreetViewError::ConfigurationError`].
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(RequestParameters::new(api_key), HttpProvider::new())
    }

    /// Creates a client from loaded [`Settings`], honoring its timeout.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let settings = street_heading::config::load()?;
    /// let client = street_heading::StreetView::from_settings(&settings)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = match settings.timeout() {
            Some(timeout) => HttpProvider::with_timeout(timeout)?,
            None => HttpProvider::new(),
        };
        Ok(Self::new(settings.defaults()?, provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_api_key_uses_builtin_defaults() {
        let client = StreetView::with_api_key("abc");
        assert_eq!(client.defaults(), &RequestParameters::new("abc"));
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            api_key: Some("abc".to_string()),
            fov: Some(80.0),
            heading: Some(30.0),
            radius: Some(100),
            timeout_secs: Some(10),
            ..Settings::default()
        };
        let client = StreetView::from_settings(&settings).unwrap();
        let params = client.get_parameters(&ParameterOverrides::new());
        assert_eq!(params.key, "abc");
        assert_eq!(params.fov, 80.0);
        assert_eq!(params.heading, 30.0);
        assert_eq!(params.radius, 100);
    }
}
