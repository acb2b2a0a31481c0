use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use serde::{Deserialize, Serialize};

use crate::geo::{format_km, LatLon};
use crate::model::{Category, EmergencyRequest, Model, Screen, ToastKind, ToastMessage};
use crate::{format_time_ago, AppError, ErrorSeverity};

pub const APP_TITLE: &str = "RESQUENET";
pub const APP_TAGLINE: &str = "Community Crisis Lifeline";
/// Static placeholder; no routing or ETA is computed.
pub const ETA_PLACEHOLDER: &str = "8 minutes";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryOption {
    pub category: Category,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    User,
    Rescuer,
    Request,
}

impl MarkerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Rescuer => "rescuer",
            Self::Request => "request",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
    pub kind: MarkerKind,
    pub label: String,
}

impl MapMarker {
    fn new(at: LatLon, kind: MarkerKind, label: impl Into<String>) -> Self {
        Self {
            lat: at.lat,
            lon: at.lon,
            kind,
            label: label.into(),
        }
    }

    fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("kind".into(), JsonValue::from(self.kind.as_str()));
        properties.insert("label".into(), JsonValue::from(self.label.clone()));

        Feature {
            bbox: None,
            // GeoJSON positions are [lon, lat]
            geometry: Some(Geometry::new(Value::Point(vec![self.lon, self.lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

#[must_use]
pub fn markers_to_geojson(markers: &[MapMarker]) -> String {
    FeatureCollection {
        bbox: None,
        features: markers.iter().map(MapMarker::to_feature).collect(),
        foreign_members: None,
    }
    .to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MapView {
    pub user: LatLon,
    pub rescuer: LatLon,
    pub rescuer_distance_km: f64,
    pub distance_text: String,
    pub zoom: f64,
    pub eta_text: String,
    pub markers: Vec<MapMarker>,
    pub markers_geojson: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestListItem {
    pub id: String,
    pub category_label: String,
    pub status: String,
    pub time_text: String,
    pub location_text: String,
    /// Resolution is display-only; records are never updated.
    pub can_resolve: bool,
}

impl RequestListItem {
    fn build(request: &EmergencyRequest, now_ms: u64) -> Self {
        let time_text = match request.time {
            Some(time) => format_time_ago(time.as_millis(), now_ms),
            None => "Just now".into(),
        };

        Self {
            id: request.id.to_string(),
            category_label: request.category.label().to_string(),
            status: request.status.clone(),
            time_text,
            location_text: format!("{:.3}, {:.3}", request.latitude, request.longitude),
            can_resolve: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenView {
    Home {
        title: String,
        tagline: String,
    },
    Category {
        categories: Vec<CategoryOption>,
        location: Option<LatLon>,
        fetch_label: String,
        locating: bool,
        submitting: bool,
        can_submit: bool,
    },
    Map(MapView),
    /// The map was reached without a tracked location.
    MapUnavailable,
    Dashboard {
        items: Vec<RequestListItem>,
        feed_live: bool,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub screen: Screen,
    pub content: ScreenView,
    pub toast: Option<ToastView>,
    pub error: Option<UserFacingError>,
}

impl ViewModel {
    #[must_use]
    pub fn build(model: &Model) -> Self {
        let content = match model.screen {
            Screen::Home => ScreenView::Home {
                title: APP_TITLE.into(),
                tagline: APP_TAGLINE.into(),
            },
            Screen::Category => category_view(model),
            Screen::Map => model
                .tracked_location
                .map_or(ScreenView::MapUnavailable, |user| {
                    ScreenView::Map(map_view(model, user))
                }),
            Screen::Dashboard => ScreenView::Dashboard {
                items: model
                    .feed
                    .requests
                    .iter()
                    .map(|r| RequestListItem::build(r, model.view_timestamp_ms))
                    .collect(),
                feed_live: model.feed.live,
            },
        };

        Self {
            screen: model.screen,
            content,
            toast: model
                .active_toast
                .as_ref()
                .filter(|t| !t.is_expired(model.view_timestamp_ms))
                .map(ToastView::from),
            error: model.active_error.as_ref().map(UserFacingError::from),
        }
    }
}

fn category_view(model: &Model) -> ScreenView {
    let draft = &model.draft;
    let fetch_label = match (draft.location, draft.is_locating()) {
        (Some(_), _) => "LOCATION LOCKED",
        (None, true) => "LOCATING...",
        (None, false) => "1. FETCH MY LOCATION",
    };

    ScreenView::Category {
        categories: Category::ALL
            .into_iter()
            .map(|category| CategoryOption {
                category,
                label: category.label().to_string(),
                selected: draft.category == Some(category),
            })
            .collect(),
        location: draft.location,
        fetch_label: fetch_label.into(),
        locating: draft.is_locating(),
        submitting: draft.is_submitting(),
        can_submit: draft.can_submit(),
    }
}

fn map_view(model: &Model, user: LatLon) -> MapView {
    let rescuer = model.config.rescuer_location;
    let distance = user.distance_km_to(rescuer);

    let mut markers = vec![
        MapMarker::new(user, MarkerKind::User, "You are here"),
        MapMarker::new(rescuer, MarkerKind::Rescuer, "Rescuer is coming"),
    ];
    markers.extend(
        model
            .feed
            .requests
            .iter()
            .filter(|r| model.last_submitted.as_ref() != Some(&r.id))
            .map(|r| MapMarker::new(r.location(), MarkerKind::Request, r.category.label())),
    );

    MapView {
        user,
        rescuer,
        rescuer_distance_km: distance,
        distance_text: format!("{} KM", format_km(distance)),
        zoom: model.config.map_zoom,
        eta_text: ETA_PLACEHOLDER.into(),
        markers_geojson: markers_to_geojson(&markers),
        markers,
    }
}
