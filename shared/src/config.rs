use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LatLon;

pub const DEFAULT_COLLECTION: &str = "emergency_requests";
pub const DEFAULT_ORDER_FIELD: &str = "time";
pub const DEFAULT_MAP_ZOOM: f64 = 13.0;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 20.0;
pub const MAX_COLLECTION_NAME_LENGTH: usize = 128;

/// Where the responding volunteer is shown on the tracking map until real
/// assignment exists.
pub const DEFAULT_RESCUER_LOCATION: LatLon = LatLon::new(26.85, 80.95);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid collection name {name:?}: {reason}")]
    InvalidCollection { name: String, reason: &'static str },

    #[error("invalid order field {0:?}")]
    InvalidOrderField(String),

    #[error("map zoom {0} is outside the supported range")]
    InvalidZoom(f64),

    #[error("invalid rescuer location: {0}")]
    InvalidRescuerLocation(#[from] crate::geo::CoordinateError),
}

/// Static core configuration. Built once at process start and handed to the
/// core with `Event::Configure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub collection: String,
    pub order_field: String,
    pub rescuer_location: LatLon,
    pub map_zoom: f64,
    pub high_accuracy: bool,
    /// Overrides the geolocation provider's own timeout when set.
    pub location_timeout_ms: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            order_field: DEFAULT_ORDER_FIELD.to_string(),
            rescuer_location: DEFAULT_RESCUER_LOCATION,
            map_zoom: DEFAULT_MAP_ZOOM,
            high_accuracy: true,
            location_timeout_ms: None,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_collection(&self.collection)?;

        if self.order_field.trim().is_empty() || self.order_field.contains('/') {
            return Err(ConfigError::InvalidOrderField(self.order_field.clone()));
        }

        if !self.map_zoom.is_finite() || !(MIN_ZOOM..=MAX_ZOOM).contains(&self.map_zoom) {
            return Err(ConfigError::InvalidZoom(self.map_zoom));
        }

        LatLon::validated(self.rescuer_location.lat, self.rescuer_location.lon)?;
        Ok(())
    }
}

fn validate_collection(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidCollection {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.len() > MAX_COLLECTION_NAME_LENGTH {
        return Err(invalid("name is too long"));
    }
    if name.contains('/') {
        return Err(invalid("name cannot contain '/'"));
    }
    if name.starts_with("__") && name.ends_with("__") {
        return Err(invalid("names of the form __.*__ are reserved"));
    }
    Ok(())
}
