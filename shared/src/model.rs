use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::config::AppConfig;
use crate::geo::LatLon;
use crate::{get_current_time_ms, AppError};

pub const ACTIVE_STATUS: &str = "Active";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one feed subscription for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    #[must_use]
    pub fn now() -> Self {
        Self(get_current_time_ms())
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Medical,
    Fire,
    #[serde(rename = "Food/Shelter")]
    FoodShelter,
    Rescue,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Medical, Self::Fire, Self::FoodShelter, Self::Rescue];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Medical => "Medical",
            Self::Fire => "Fire",
            Self::FoodShelter => "Food/Shelter",
            Self::Rescue => "Rescue",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown emergency category: {0:?}")]
pub struct UnknownCategory(pub String);

/// Letters and digits only, lowercased. "Food / Shelter" and "food_shelter"
/// both fold to "foodshelter".
fn fold_label(label: &str) -> String {
    label
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold_label(s);
        if folded.is_empty() {
            return Err(UnknownCategory(s.to_string()));
        }

        Self::ALL
            .into_iter()
            .find(|c| fold_label(c.label()) == folded)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// Records written by other clients spell the labels differently.
impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Marker written in place of the creation time; the store substitutes its
/// own clock when it persists the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerTimestamp {
    #[serde(rename = "serverTimestamp")]
    Pending,
}

/// Append payload for the `emergency_requests` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEmergencyRequest {
    #[serde(rename = "type")]
    pub category: Category,
    pub status: String,
    pub time: ServerTimestamp,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewEmergencyRequest {
    #[must_use]
    pub fn active(category: Category, location: LatLon) -> Self {
        Self {
            category,
            status: ACTIVE_STATUS.to_string(),
            time: ServerTimestamp::Pending,
            latitude: location.lat,
            longitude: location.lon,
        }
    }
}

/// A stored emergency request as delivered by the feed. Immutable once
/// created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmergencyRequest {
    pub id: RequestId,
    #[serde(rename = "type")]
    pub category: Category,
    pub status: String,
    /// `None` until the server timestamp has resolved.
    #[serde(default)]
    pub time: Option<UnixTimeMs>,
    pub latitude: f64,
    pub longitude: f64,
}

impl EmergencyRequest {
    #[must_use]
    pub fn from_new(id: RequestId, time: UnixTimeMs, record: NewEmergencyRequest) -> Self {
        Self {
            id,
            category: record.category,
            status: record.status,
            time: Some(time),
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }

    #[must_use]
    pub const fn location(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Home,
    Category,
    Map,
    Dashboard,
}

impl Screen {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Category => "category",
            Self::Map => "map",
            Self::Dashboard => "dashboard",
        }
    }

    /// Screens that keep the request feed open while visible.
    #[must_use]
    pub const fn wants_feed(self) -> bool {
        matches!(self, Self::Map | Self::Dashboard)
    }
}

/// Tags one location fetch or one append so that its result can be matched
/// against the draft that asked for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// In-progress SOS submission data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionDraft {
    pub category: Option<Category>,
    pub location: Option<LatLon>,
    /// Outstanding location fetch, if any.
    pub locating: Option<AttemptId>,
    /// Outstanding append, if any.
    pub submitting: Option<AttemptId>,
}

impl SubmissionDraft {
    #[must_use]
    pub fn ready(&self) -> Option<(Category, LatLon)> {
        Some((self.category?, self.location?))
    }

    #[must_use]
    pub const fn is_locating(&self) -> bool {
        self.locating.is_some()
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting.is_some()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.ready().is_some() && !self.is_submitting()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedState {
    pub active: Option<SubscriptionId>,
    pub requests: Vec<EmergencyRequest>,
    pub live: bool,
    pub snapshots_received: u64,
    next_id: u64,
}

impl FeedState {
    pub fn next_subscription_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    #[must_use]
    pub fn is_current(&self, subscription: SubscriptionId) -> bool {
        self.active == Some(subscription)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at_ms: get_current_time_ms(),
            duration_ms: kind.default_duration_ms(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > self.duration_ms
    }
}

#[derive(Debug)]
pub struct Model {
    pub config: AppConfig,
    pub screen: Screen,
    pub draft: SubmissionDraft,
    pub feed: FeedState,
    /// Location of the submission that led to the map screen.
    pub tracked_location: Option<LatLon>,
    pub last_submitted: Option<RequestId>,
    pub active_toast: Option<ToastMessage>,
    pub active_error: Option<AppError>,
    pub view_timestamp_ms: u64,
    /// Never reset, so ids stay unique across drafts.
    next_attempt: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            screen: Screen::Home,
            draft: SubmissionDraft::default(),
            feed: FeedState::default(),
            tracked_location: None,
            last_submitted: None,
            active_toast: None,
            active_error: None,
            view_timestamp_ms: get_current_time_ms(),
            next_attempt: 0,
        }
    }
}

impl Model {
    pub fn update_timestamp(&mut self) {
        self.view_timestamp_ms = get_current_time_ms();
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(ToastMessage::new(message, kind));
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn next_attempt(&mut self) -> AttemptId {
        self.next_attempt += 1;
        AttemptId(self.next_attempt)
    }

    pub fn reset_draft(&mut self) {
        self.draft = SubmissionDraft::default();
    }
}
