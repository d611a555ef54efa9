use reqwest::Url;
use tracing::debug;

use crate::bearing::initial_bearing;
use crate::error::{Result, StreetViewError};
use crate::params::{ParameterOverrides, ParameterStore, RequestParameters};
use crate::provider::{HttpProvider, StreetViewProvider};
use crate::types::{ResolvedPanorama, Target};

/// Finds the panorama nearest a target and fetches a view from it.
///
/// Holds the default request parameters and a provider. Each call to
/// [`resolve`](Self::resolve) sends two requests, metadata then image, one
/// after the other. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct PanoramaResolver<P = HttpProvider> {
    store: ParameterStore,
    provider: P,
}

impl<P: StreetViewProvider> PanoramaResolver<P> {
    pub fn new(defaults: RequestParameters, provider: P) -> Self {
        Self {
            store: ParameterStore::new(defaults),
            provider,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn defaults(&self) -> &RequestParameters {
        self.store.defaults()
    }

    /// The defaults with `overrides` applied, without changing the defaults.
    pub fn get_parameters(&self, overrides: &ParameterOverrides) -> RequestParameters {
        self.store.get_parameters(overrides)
    }

    /// Make `overrides` part of the defaults for every later request.
    pub fn update_parameters(&mut self, overrides: &ParameterOverrides) -> RequestParameters {
        self.store.update_parameters(overrides)
    }

    /// Fetch a view of the panorama nearest `target`.
    ///
    /// For a [`Target::Coordinates`] target with no `heading` override the
    /// camera is turned from the panorama toward the target. For an address,
    /// or when `heading` is overridden, the heading is used as given.
    ///
    /// # Errors
    ///
    /// [`MetadataUnavailable`](crate::StreetViewError::MetadataUnavailable)
    /// when there is no panorama within the search radius. No image request
    /// is made in that case, and the radius is not widened.
    ///
    /// [`InvalidArgument`](crate::StreetViewError::InvalidArgument) for
    /// coordinates that are not finite or out of range, before any request.
    pub async fn resolve(
        &self,
        target: &Target,
        overrides: &ParameterOverrides,
    ) -> Result<ResolvedPanorama> {
        if let Target::Coordinates(point) = target {
            if !point.is_valid() {
                return Err(StreetViewError::InvalidArgument(format!(
                    "target coordinates out of range: {point}"
                )));
            }
        }

        let explicit_heading = overrides.heading.is_some() || overrides.extra.contains_key("heading");

        let mut lookup = overrides.clone();
        lookup.extra.remove("location");
        lookup.location = Some(target.location());
        let metadata_params = self.store.get_parameters(&lookup);

        let metadata = self.provider.fetch_metadata(&metadata_params).await?;
        let pano_location = metadata.panorama_location()?;

        let heading = match target {
            Target::Coordinates(point) if !explicit_heading => {
                let heading = initial_bearing(pano_location, *point);
                debug!(pano = %pano_location, target = %point, heading, "computed heading toward target");
                Some(heading)
            }
            _ => overrides.heading,
        };

        let mut view = overrides.clone();
        view.extra.remove("location");
        view.location = Some(pano_location.to_string());
        view.heading = heading;
        let image_params = self.store.get_parameters(&view);

        let image = self.provider.fetch_image(&image_params).await?;

        Ok(ResolvedPanorama {
            image,
            metadata,
            parameters: image_params,
        })
    }
}

impl PanoramaResolver<HttpProvider> {
    /// Metadata URL for the given overrides. Contains the API key.
    pub fn metadata_url(&self, overrides: &ParameterOverrides) -> Result<Url> {
        self.provider.metadata_url(&self.get_parameters(overrides))
    }

    /// Image URL for the given overrides. Contains the API key.
    pub fn panorama_url(&self, overrides: &ParameterOverrides) -> Result<Url> {
        self.provider.streetview_url(&self.get_parameters(overrides))
    }
}
