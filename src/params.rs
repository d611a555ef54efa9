//! Request parameters and the store that holds their defaults.

use std::collections::BTreeMap;

use crate::types::{ImageSize, Source};

/// Location used when nothing else was asked for.
pub const DEFAULT_LOCATION: &str = "Cornell Tech";
pub const DEFAULT_HEADING: f64 = 90.0;
pub const DEFAULT_FOV: f64 = 90.0;
pub const DEFAULT_PITCH: f64 = 0.0;
/// Search radius in meters.
pub const DEFAULT_RADIUS: u32 = 50;

/// A complete parameter set for one Street View request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParameters {
    /// `lat,lng` or a free-form address
    pub location: String,
    pub size: ImageSize,
    /// Google Maps API key
    pub key: String,
    /// Camera heading in degrees (0 = north, 90 = east)
    pub heading: f64,
    /// Horizontal field of view in degrees, at most 120
    pub fov: f64,
    /// Camera pitch in degrees
    pub pitch: f64,
    /// Panorama search radius in meters
    pub radius: u32,
    pub source: Source,
    /// Request-signing hash, passed through untouched
    pub signature: Option<String>,
    /// Provider options this crate has no field for
    pub extra: BTreeMap<String, String>,
}

impl RequestParameters {
    /// Default parameters for the given API key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            size: ImageSize::default(),
            key: key.into(),
            heading: DEFAULT_HEADING,
            fov: DEFAULT_FOV,
            pitch: DEFAULT_PITCH,
            radius: DEFAULT_RADIUS,
            source: Source::Default,
            signature: None,
            extra: BTreeMap::new(),
        }
    }

    /// Copy of `self` with every key set in `overrides` replaced.
    pub fn merged(&self, overrides: &ParameterOverrides) -> Self {
        let overrides = &overrides.with_extras_routed();
        let mut merged = self.clone();
        if let Some(location) = &overrides.location {
            merged.location = location.clone();
        }
        if let Some(size) = overrides.size {
            merged.size = size;
        }
        if let Some(key) = &overrides.key {
            merged.key = key.clone();
        }
        if let Some(heading) = overrides.heading {
            merged.heading = heading;
        }
        if let Some(fov) = overrides.fov {
            merged.fov = fov;
        }
        if let Some(pitch) = overrides.pitch {
            merged.pitch = pitch;
        }
        if let Some(radius) = overrides.radius {
            merged.radius = radius;
        }
        if let Some(source) = overrides.source {
            merged.source = source;
        }
        if let Some(signature) = &overrides.signature {
            merged.signature = Some(signature.clone());
        }
        for (name, is_set) in [
            ("location", overrides.location.is_some()),
            ("size", overrides.size.is_some()),
            ("key", overrides.key.is_some()),
            ("heading", overrides.heading.is_some()),
            ("fov", overrides.fov.is_some()),
            ("pitch", overrides.pitch.is_some()),
            ("radius", overrides.radius.is_some()),
            ("source", overrides.source.is_some()),
            ("signature", overrides.signature.is_some()),
        ] {
            if is_set {
                merged.extra.remove(name);
            }
        }
        merged
            .extra
            .extend(overrides.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Query-string pairs in a stable order, extras last.
    ///
    /// An extra named like a recognized key replaces that key's value, so no
    /// key is ever sent twice.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("location".to_string(), self.location.clone()),
            ("size".to_string(), self.size.to_string()),
            ("key".to_string(), self.key.clone()),
            ("heading".to_string(), self.heading.to_string()),
            ("fov".to_string(), self.fov.to_string()),
            ("pitch".to_string(), self.pitch.to_string()),
            ("radius".to_string(), self.radius.to_string()),
            ("source".to_string(), self.source.as_str().to_string()),
        ];
        if let Some(signature) = &self.signature {
            query.push(("signature".to_string(), signature.clone()));
        }
        for (name, value) in &self.extra {
            match query.iter_mut().find(|(k, _)| k == name) {
                Some(entry) => entry.1 = value.clone(),
                None => query.push((name.clone(), value.clone())),
            }
        }
        query
    }
}

/// Per-request changes to the stored defaults. Unset fields keep the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterOverrides {
    pub location: Option<String>,
    pub size: Option<ImageSize>,
    pub key: Option<String>,
    pub heading: Option<f64>,
    pub fov: Option<f64>,
    pub pitch: Option<f64>,
    pub radius: Option<u32>,
    pub source: Option<Source>,
    pub signature: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl ParameterOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(ImageSize::new(width, height));
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn fov(mut self, fov: f64) -> Self {
        self.fov = Some(fov);
        self
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn radius(mut self, radius: u32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Add a provider option by name.
    ///
    /// A recognized name with a parseable value sets the typed field instead.
    pub fn extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        if !self.set_named(&name, &value) {
            self.extra.insert(name, value);
        }
        self
    }

    /// Set the typed field called `name`. False when `name` is not a
    /// recognized key or `value` does not parse for it.
    fn set_named(&mut self, name: &str, value: &str) -> bool {
        match name {
            "location" => self.location = Some(value.to_string()),
            "key" => self.key = Some(value.to_string()),
            "signature" => self.signature = Some(value.to_string()),
            "size" => match value.parse() {
                Ok(size) => self.size = Some(size),
                Err(_) => return false,
            },
            "heading" => match value.parse() {
                Ok(heading) => self.heading = Some(heading),
                Err(_) => return false,
            },
            "fov" => match value.parse() {
                Ok(fov) => self.fov = Some(fov),
                Err(_) => return false,
            },
            "pitch" => match value.parse() {
                Ok(pitch) => self.pitch = Some(pitch),
                Err(_) => return false,
            },
            "radius" => match value.parse() {
                Ok(radius) => self.radius = Some(radius),
                Err(_) => return false,
            },
            "source" => match value.parse() {
                Ok(source) => self.source = Some(source),
                Err(_) => return false,
            },
            _ => return false,
        }
        true
    }

    /// Copy with every routable entry of `extra` moved onto its typed field.
    /// Covers maps filled directly through the public `extra` field.
    fn with_extras_routed(&self) -> Self {
        let mut routed = self.clone();
        routed.extra = BTreeMap::new();
        for (name, value) in &self.extra {
            if !routed.set_named(name, value) {
                routed.extra.insert(name.clone(), value.clone());
            }
        }
        routed
    }
}

/// Holds the default parameters and derives per-request sets from them.
///
/// The store has a single owner. `update_parameters` takes `&mut self`, so it
/// can never race with a read on the same store; consumers that need the
/// defaults elsewhere should clone a snapshot.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    defaults: RequestParameters,
}

impl ParameterStore {
    pub fn new(defaults: RequestParameters) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &RequestParameters {
        &self.defaults
    }

    /// The defaults with `overrides` applied. The stored defaults are not touched.
    pub fn get_parameters(&self, overrides: &ParameterOverrides) -> RequestParameters {
        self.defaults.merged(overrides)
    }

    /// Apply `overrides` to the stored defaults and return the new defaults.
    pub fn update_parameters(&mut self, overrides: &ParameterOverrides) -> RequestParameters {
        self.defaults = self.get_parameters(overrides);
        self.defaults.clone()
    }
}
