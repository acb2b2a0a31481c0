mod common;

use common::{TestShell, LUCKNOW};
use resquenet_shared::capabilities::{FeedUpdate, StoreError};
use resquenet_shared::geo::LatLon;
use resquenet_shared::model::NewEmergencyRequest;
use resquenet_shared::view::ScreenView;
use resquenet_shared::{Category, Event, Screen};

fn dashboard_items(shell: &TestShell) -> (Vec<String>, bool) {
    let ScreenView::Dashboard { items, feed_live } = shell.view().content else {
        panic!("expected dashboard view");
    };
    (items.into_iter().map(|i| i.category_label).collect(), feed_live)
}

fn store_sos(shell: &TestShell, category: Category) {
    let collection = shell.store.collection().to_string();
    shell
        .store
        .append(
            &collection,
            NewEmergencyRequest::active(category, LatLon::new(LUCKNOW.0, LUCKNOW.1)),
        )
        .expect("append");
}

#[test]
fn snapshots_apply_in_delivery_order() {
    let mut shell = TestShell::default();
    shell.send(Event::DashboardPressed);

    assert_eq!(shell.model.screen, Screen::Dashboard);
    assert_eq!(shell.open_subscriptions().len(), 1);
    assert_eq!(dashboard_items(&shell), (vec![], true));

    store_sos(&shell, Category::Fire);
    shell.publish();

    assert_eq!(dashboard_items(&shell), (vec!["Fire".to_string()], true));
    assert_eq!(shell.model.feed.snapshots_received, 2);
}

#[test]
fn dashboard_lists_newest_first() {
    let mut shell = TestShell::default();
    store_sos(&shell, Category::Medical);
    store_sos(&shell, Category::Rescue);

    shell.send(Event::DashboardPressed);

    let (labels, _) = dashboard_items(&shell);
    assert_eq!(labels, vec!["Rescue".to_string(), "Medical".to_string()]);

    let ScreenView::Dashboard { items, .. } = shell.view().content else {
        panic!("expected dashboard view");
    };
    assert!(items.iter().all(|i| i.status == "Active" && !i.can_resolve));
    assert!(items.iter().all(|i| i.location_text == "26.850, 80.950"));
}

#[test]
fn leaving_dashboard_releases_subscription() {
    let mut shell = TestShell::default();
    shell.send(Event::DashboardPressed);
    let subscription = shell.open_subscriptions()[0];

    shell.send(Event::BackPressed);

    assert_eq!(shell.model.screen, Screen::Home);
    assert_eq!(shell.unsubscribed, vec![subscription]);
    assert!(shell.open_subscriptions().is_empty());
    assert!(shell.model.feed.active.is_none());

    // Reopening uses a fresh subscription.
    shell.send(Event::DashboardPressed);
    let reopened = shell.open_subscriptions()[0];
    assert_ne!(reopened, subscription);
}

#[test]
fn stale_snapshots_are_ignored() {
    let mut shell = TestShell::default();
    shell.send(Event::DashboardPressed);
    let first = shell.open_subscriptions()[0];
    shell.send(Event::BackPressed);
    shell.send(Event::DashboardPressed);

    let before = shell.model.feed.requests.clone();
    shell.send(Event::FeedUpdated {
        subscription: first,
        update: Box::new(FeedUpdate::Snapshot(vec![])),
    });
    store_sos(&shell, Category::Fire);
    let records = shell.store.snapshot();
    shell.send(Event::FeedUpdated {
        subscription: first,
        update: Box::new(FeedUpdate::Snapshot(records)),
    });

    assert_eq!(shell.model.feed.requests, before);
    assert_eq!(shell.model.feed.snapshots_received, 2);
}

#[test]
fn subscription_error_marks_feed_not_live() {
    let mut shell = TestShell::default();
    shell.send(Event::DashboardPressed);
    let subscription = shell.open_subscriptions()[0];

    shell.fail_subscription(subscription, StoreError::PermissionDenied);

    let (_, feed_live) = dashboard_items(&shell);
    assert!(!feed_live);
    assert_eq!(shell.model.screen, Screen::Dashboard);
    assert!(shell.model.active_error.is_none());

    // Back and forth reopens the feed.
    shell.send(Event::BackPressed);
    shell.send(Event::DashboardPressed);
    let (_, feed_live) = dashboard_items(&shell);
    assert!(feed_live);
}

#[test]
fn map_shows_other_requests_live() {
    let mut shell = TestShell::default();
    shell.send(Event::SosPressed);
    shell.send(Event::CategorySelected(Category::Medical));
    shell.send(Event::FetchLocationPressed);
    shell.send(Event::SubmitPressed);
    assert_eq!(shell.model.screen, Screen::Map);

    store_sos(&shell, Category::FoodShelter);
    shell.publish();

    let ScreenView::Map(map) = shell.view().content else {
        panic!("expected map view");
    };
    assert_eq!(map.markers.len(), 3);
    assert_eq!(map.markers[2].label, "Food/Shelter");
    assert!(map.markers_geojson.contains("FeatureCollection"));
}
