use tracing::{debug, error, info, warn};

use crate::capabilities::{Capabilities, FeedUpdate, PositionOptions, Query};
use crate::event::Event;
use crate::geo::LatLon;
use crate::model::{Model, NewEmergencyRequest, Screen, ToastKind};
use crate::view::ViewModel;
use crate::AppError;

pub const LOCATION_LOCKED_MESSAGE: &str = "Location locked!";
pub const FETCH_LOCATION_FIRST_MESSAGE: &str = "Fetch location first!";
pub const SELECT_CATEGORY_FIRST_MESSAGE: &str = "Select an emergency type first!";

#[derive(Default)]
pub struct App;

impl App {
    fn ignore(event_name: &str, model: &Model) -> bool {
        debug!(
            event = event_name,
            screen = model.screen.as_str(),
            "event does not apply to current screen"
        );
        false
    }

    /// Moves to `to`, opening or releasing the request feed as the target
    /// screen requires.
    fn go_to(model: &mut Model, caps: &Capabilities, to: Screen) {
        let from = model.screen;
        model.screen = to;
        debug!(from = from.as_str(), to = to.as_str(), "screen transition");

        if to.wants_feed() {
            Self::open_feed(model, caps);
        } else {
            Self::release_feed(model, caps);
        }
    }

    fn open_feed(model: &mut Model, caps: &Capabilities) {
        if model.feed.active.is_some() {
            return;
        }

        let subscription = model.feed.next_subscription_id();
        let query = Query::newest_first(&model.config.collection, &model.config.order_field);
        info!(
            %subscription,
            collection = %query.collection,
            order_by = %query.order_by,
            "opening request feed"
        );

        model.feed.active = Some(subscription);
        model.feed.live = true;
        caps.request_store
            .subscribe(subscription, query, move |update| Event::FeedUpdated {
                subscription,
                update: Box::new(update),
            });
    }

    fn release_feed(model: &mut Model, caps: &Capabilities) {
        if let Some(subscription) = model.feed.active.take() {
            info!(%subscription, "releasing request feed");
            model.feed.live = false;
            caps.request_store.unsubscribe(subscription);
        }
    }

    fn fetch_location(model: &mut Model, caps: &Capabilities) -> bool {
        if model.draft.is_locating() {
            debug!("location request already in flight");
            return false;
        }

        let attempt = model.next_attempt();
        model.draft.locating = Some(attempt);
        let options = PositionOptions {
            enable_high_accuracy: model.config.high_accuracy,
            timeout_ms: model.config.location_timeout_ms,
        };
        debug!(%attempt, "requesting current position");
        caps.geolocation
            .get_current_position(options, move |result| Event::LocationResolved {
                attempt,
                result,
            });
        true
    }

    fn submit(model: &mut Model, caps: &Capabilities) -> bool {
        if model.draft.is_submitting() {
            debug!("submission already in flight");
            return false;
        }

        let Some(location) = model.draft.location else {
            warn!("submit without a locked location");
            model.show_toast(FETCH_LOCATION_FIRST_MESSAGE, ToastKind::Warning);
            return true;
        };
        let Some(category) = model.draft.category else {
            warn!("submit without a category");
            model.show_toast(SELECT_CATEGORY_FIRST_MESSAGE, ToastKind::Warning);
            return true;
        };

        let attempt = model.next_attempt();
        info!(
            %attempt,
            %category,
            lat = location.lat,
            lon = location.lon,
            collection = %model.config.collection,
            "submitting SOS"
        );

        model.draft.submitting = Some(attempt);
        model.clear_error();
        caps.request_store.append(
            model.config.collection.clone(),
            NewEmergencyRequest::active(category, location),
            move |result| Event::SubmitCompleted { attempt, result },
        );
        true
    }

    fn apply_feed_update(model: &mut Model, update: FeedUpdate) {
        match update {
            FeedUpdate::Snapshot(records) => {
                debug!(count = records.len(), "request feed snapshot");
                model.feed.requests = records;
                model.feed.live = true;
                model.feed.snapshots_received += 1;
            }
            FeedUpdate::Failed(e) => {
                warn!(error = %e, "request feed stopped");
                model.feed.active = None;
                model.feed.live = false;
            }
            FeedUpdate::Closed => {
                debug!("request feed closed by store");
                model.feed.active = None;
                model.feed.live = false;
            }
        }
    }

    /// Applies one event. Returns whether anything visible may have changed.
    fn handle(event: Event, model: &mut Model, caps: &Capabilities) -> bool {
        let event_name = event.name();

        match event {
            Event::Noop => false,

            Event::Configure(config) => {
                match config.validate() {
                    Ok(()) => {
                        info!(collection = %config.collection, "configuration applied");
                        model.config = *config;
                    }
                    Err(e) => {
                        error!(error = %e, "configuration rejected");
                        model.set_error(AppError::from(e));
                    }
                }
                true
            }

            Event::SosPressed => {
                if model.screen != Screen::Home {
                    return Self::ignore(event_name, model);
                }
                model.reset_draft();
                model.clear_error();
                Self::go_to(model, caps, Screen::Category);
                true
            }

            Event::CancelPressed => {
                if model.screen != Screen::Category {
                    return Self::ignore(event_name, model);
                }
                model.reset_draft();
                model.clear_error();
                Self::go_to(model, caps, Screen::Home);
                true
            }

            Event::DashboardPressed => {
                if model.screen != Screen::Home {
                    return Self::ignore(event_name, model);
                }
                Self::go_to(model, caps, Screen::Dashboard);
                true
            }

            Event::BackPressed => {
                if model.screen != Screen::Dashboard {
                    return Self::ignore(event_name, model);
                }
                Self::go_to(model, caps, Screen::Home);
                true
            }

            Event::ExitTrackingPressed => {
                if model.screen != Screen::Map {
                    return Self::ignore(event_name, model);
                }
                model.tracked_location = None;
                Self::go_to(model, caps, Screen::Home);
                true
            }

            Event::CategorySelected(category) => {
                if model.screen != Screen::Category {
                    return Self::ignore(event_name, model);
                }
                debug!(%category, "category selected");
                model.draft.category = Some(category);
                true
            }

            Event::FetchLocationPressed => {
                if model.screen != Screen::Category {
                    return Self::ignore(event_name, model);
                }
                Self::fetch_location(model, caps)
            }

            Event::LocationResolved { attempt, result } => {
                if model.draft.locating != Some(attempt) {
                    debug!(%attempt, "discarding location result for an abandoned draft");
                    return false;
                }
                model.draft.locating = None;
                if model.screen != Screen::Category {
                    debug!(%attempt, "discarding location result outside category screen");
                    return false;
                }

                let located = result
                    .map_err(AppError::from)
                    .and_then(|p| LatLon::validated(p.latitude, p.longitude).map_err(AppError::from));

                match located {
                    Ok(location) => {
                        info!(lat = location.lat, lon = location.lon, "location locked");
                        model.draft.location = Some(location);
                        model.show_toast(LOCATION_LOCKED_MESSAGE, ToastKind::Success);
                    }
                    Err(e) => {
                        warn!(error = %e, "location unavailable");
                        model.show_toast(e.user_facing_message(), ToastKind::Warning);
                    }
                }
                true
            }

            Event::SubmitPressed => {
                if model.screen != Screen::Category {
                    return Self::ignore(event_name, model);
                }
                Self::submit(model, caps)
            }

            Event::SubmitCompleted { attempt, result } => {
                if model.draft.submitting != Some(attempt) {
                    match &result {
                        Ok(id) => {
                            debug!(%id, %attempt, "discarding confirmation for an abandoned draft");
                        }
                        Err(e) => {
                            warn!(error = %e, %attempt, "append for an abandoned draft failed");
                        }
                    }
                    return false;
                }
                model.draft.submitting = None;

                match result {
                    Ok(id) => {
                        info!(%id, "SOS recorded");
                        if model.screen != Screen::Category {
                            debug!(%id, "submission confirmed after leaving category screen");
                            return false;
                        }
                        model.last_submitted = Some(id);
                        model.tracked_location = model.draft.location;
                        Self::go_to(model, caps, Screen::Map);
                    }
                    Err(e) => {
                        error!(error = %e, retryable = e.is_retryable(), "failed to record SOS");
                        model.set_error(
                            AppError::from(e).with_context("screen", model.screen.as_str()),
                        );
                    }
                }
                true
            }

            Event::FeedUpdated {
                subscription,
                update,
            } => {
                if !model.feed.is_current(subscription) {
                    debug!(%subscription, "dropping update from released subscription");
                    return false;
                }
                Self::apply_feed_update(model, *update);
                true
            }

            Event::DismissToast => {
                model.clear_toast();
                true
            }

            Event::DismissError => {
                model.clear_error();
                true
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        model.update_timestamp();

        if event.is_user_initiated() {
            debug!(event = event.name(), screen = model.screen.as_str(), "user action");
        }

        if Self::handle(event, model, caps) {
            caps.render.render();
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::build(model)
    }
}
