use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    /// `None` leaves the provider's default timeout in place.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum GeolocationOperation {
    GetCurrentPosition(PositionOptions),
}

impl Operation for GeolocationOperation {
    type Output = GeolocationResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
}

impl Position {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            timestamp_ms: None,
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {message}")]
    PositionUnavailable { message: String },

    #[error("location request timed out")]
    Timeout,

    #[error("geolocation is not supported on this device")]
    Unsupported,
}

impl GeolocationError {
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::PositionUnavailable {
            message: message.into(),
        }
    }
}

pub type GeolocationResult = Result<Position, GeolocationError>;

/// One-shot device position requests.
pub struct Geolocation<Ev> {
    context: CapabilityContext<GeolocationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Geolocation<Ev> {
    type Operation = GeolocationOperation;
    type MappedSelf<MappedEv> = Geolocation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geolocation::new(self.context.map_event(f))
    }
}

impl<Ev> Geolocation<Ev>
where
    Ev: 'static + Send,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get_current_position<F>(&self, options: PositionOptions, callback: F)
    where
        F: FnOnce(GeolocationResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(GeolocationOperation::GetCurrentPosition(options))
                .await;
            ctx.update_app(callback(result));
        });
    }
}
