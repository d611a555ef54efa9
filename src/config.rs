//! Settings loaded from a `settings.toml` file.
//!
//! Every field is optional. Missing fields fall back to the built-in request
//! defaults. The API key can also come from the `GOOGLE_MAPS_API_KEY`
//! environment variable, which wins over the file.
//!
//! ```toml
//! api_key = "..."
//! size = "640x640"
//! fov = 80
//! heading = 30
//! radius = 100
//! source = "outdoor"
//! timeout_secs = 20
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreetViewError};
use crate::params::RequestParameters;
use crate::types::{ImageSize, Source};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "street-heading";
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    /// `{width}x{height}`
    pub size: Option<String>,
    pub heading: Option<f64>,
    pub fov: Option<f64>,
    pub pitch: Option<f64>,
    pub radius: Option<u32>,
    pub source: Option<Source>,
    /// Per-request timeout; no timeout when unset
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Request defaults described by these settings.
    pub fn defaults(&self) -> Result<RequestParameters> {
        let mut params = RequestParameters::new(self.api_key.clone().unwrap_or_default());
        if let Some(size) = &self.size {
            params.size = size.parse::<ImageSize>()?;
        }
        if let Some(heading) = self.heading {
            params.heading = heading;
        }
        if let Some(fov) = self.fov {
            params.fov = fov;
        }
        if let Some(pitch) = self.pitch {
            params.pitch = pitch;
        }
        if let Some(radius) = self.radius {
            params.radius = radius;
        }
        if let Some(source) = self.source {
            params.source = source;
        }
        Ok(params)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Replace the API key with `value` when it is set and non-empty.
    fn apply_key_override(&mut self, value: Option<String>) {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Settings from the default location, or defaults when there is no file.
pub fn load() -> Result<Settings> {
    let mut settings = match default_config_path() {
        Some(path) if path.exists() => read_file(&path)?,
        _ => Settings::default(),
    };
    settings.apply_key_override(std::env::var(API_KEY_ENV).ok());
    Ok(settings)
}

/// Settings from `path`, with the environment key override applied.
pub fn load_from_path(path: &Path) -> Result<Settings> {
    let mut settings = read_file(path)?;
    settings.apply_key_override(std::env::var(API_KEY_ENV).ok());
    Ok(settings)
}

fn read_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| StreetViewError::SettingsError(format!("{}: {e}", path.display())))
}
