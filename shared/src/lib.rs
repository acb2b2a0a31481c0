#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod geo;
pub mod memory_store;
pub mod model;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::AppConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use model::{Category, EmergencyRequest, Model, RequestId, Screen};
pub use view::ViewModel;

use capabilities::{GeolocationError, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Location,
    LocationPermissionDenied,
    StoreUnavailable,
    StoreRejected,
    Configuration,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::StoreRejected => "STORE_REJECTED",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Location | Self::StoreUnavailable => ErrorSeverity::Transient,
            Self::Validation
            | Self::LocationPermissionDenied
            | Self::StoreRejected
            | Self::Configuration
            | Self::Internal => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Location | Self::LocationPermissionDenied | Self::StoreUnavailable
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub context: BTreeMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Location => {
                "Unable to determine your location. Please check your GPS settings.".into()
            }
            ErrorKind::LocationPermissionDenied => "Please allow GPS access!".into(),
            ErrorKind::StoreUnavailable | ErrorKind::StoreRejected => {
                "Your SOS was not sent. Please try again.".into()
            }
            ErrorKind::Configuration | ErrorKind::Internal => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<GeolocationError> for AppError {
    fn from(e: GeolocationError) -> Self {
        let kind = if e.is_denial() {
            ErrorKind::LocationPermissionDenied
        } else {
            ErrorKind::Location
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        let kind = if e.is_retryable() {
            ErrorKind::StoreUnavailable
        } else {
            ErrorKind::StoreRejected
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<geo::CoordinateError> for AppError {
    fn from(e: geo::CoordinateError) -> Self {
        AppError::new(ErrorKind::Location, e.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[must_use]
pub fn format_time_ago(timestamp_ms: u64, now_ms: u64) -> String {
    if timestamp_ms > now_ms {
        return "Just now".into();
    }

    let diff_secs = now_ms.saturating_sub(timestamp_ms) / 1000;

    if diff_secs < 5 {
        return "Just now".into();
    }
    if diff_secs < 60 {
        return format!("{diff_secs}s ago");
    }

    let diff_mins = diff_secs / 60;
    if diff_mins < 60 {
        return format!("{diff_mins}m ago");
    }

    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return format!("{diff_hours}h ago");
    }

    let diff_days = diff_hours / 24;
    if diff_days < 7 {
        return format!("{diff_days}d ago");
    }

    format!("{}w ago", diff_days / 7)
}
