use serde::{Deserialize, Serialize};

use crate::capabilities::{AppendResult, FeedUpdate, GeolocationResult};
use crate::config::AppConfig;
use crate::model::{AttemptId, Category, SubscriptionId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    Noop,

    // Startup
    Configure(Box<AppConfig>),

    // Navigation
    SosPressed,
    CancelPressed,
    DashboardPressed,
    BackPressed,
    ExitTrackingPressed,

    // Submission
    CategorySelected(Category),
    FetchLocationPressed,
    SubmitPressed,

    DismissToast,
    DismissError,

    // Capability responses
    #[serde(skip)]
    LocationResolved {
        attempt: AttemptId,
        result: GeolocationResult,
    },
    #[serde(skip)]
    SubmitCompleted {
        attempt: AttemptId,
        result: AppendResult,
    },
    #[serde(skip)]
    FeedUpdated {
        subscription: SubscriptionId,
        update: Box<FeedUpdate>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::SosPressed => "sos_pressed",
            Self::CancelPressed => "cancel_pressed",
            Self::DashboardPressed => "dashboard_pressed",
            Self::BackPressed => "back_pressed",
            Self::ExitTrackingPressed => "exit_tracking_pressed",
            Self::CategorySelected(_) => "category_selected",
            Self::FetchLocationPressed => "fetch_location_pressed",
            Self::SubmitPressed => "submit_pressed",
            Self::DismissToast => "dismiss_toast",
            Self::DismissError => "dismiss_error",
            Self::LocationResolved { .. } => "location_resolved",
            Self::SubmitCompleted { .. } => "submit_completed",
            Self::FeedUpdated { .. } => "feed_updated",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::SosPressed
                | Self::CancelPressed
                | Self::DashboardPressed
                | Self::BackPressed
                | Self::ExitTrackingPressed
                | Self::CategorySelected(_)
                | Self::FetchLocationPressed
                | Self::SubmitPressed
                | Self::DismissToast
                | Self::DismissError
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}
