mod geolocation;
mod store;

pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult, Position,
    PositionOptions,
};
pub use self::store::{
    AppendResult, Direction, FeedUpdate, Query, RequestStore, StoreError, StoreOperation,
    StoreOutput, StoreResult,
};

// Crux's built-in Render capability covers view updates.
pub use crux_core::render::Render;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub geolocation: Geolocation<Event>,
    pub request_store: RequestStore<Event>,
}
