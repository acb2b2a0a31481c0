#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use resquenet_shared::capabilities::{
    GeolocationOperation, GeolocationResult, Position, Query, StoreError, StoreOperation,
    StoreOutput,
};
use resquenet_shared::memory_store::MemoryRequestStore;
use resquenet_shared::model::SubscriptionId;
use resquenet_shared::{App, Effect, Event, Model, ViewModel};

pub const LUCKNOW: (f64, f64) = (26.85, 80.95);

/// Drives the core the way a platform shell would: geolocation answers come
/// from `location`, store operations go to an in-memory store.
pub struct TestShell {
    pub app: AppTester<App, Effect>,
    pub model: Model,
    pub store: MemoryRequestStore,
    pub location: GeolocationResult,
    /// Keep geolocation requests unanswered until `release_location`.
    pub hold_location: bool,
    /// Keep appends unanswered until `release_appends`.
    pub hold_appends: bool,
    pub renders: usize,
    pub location_requests: usize,
    pub unsubscribed: Vec<SubscriptionId>,
    pending_locations: Vec<Request<GeolocationOperation>>,
    pending_appends: Vec<Request<StoreOperation>>,
    subscriptions: HashMap<SubscriptionId, (Query, Request<StoreOperation>)>,
}

impl Default for TestShell {
    fn default() -> Self {
        Self {
            app: AppTester::default(),
            model: Model::default(),
            store: MemoryRequestStore::default(),
            location: Ok(Position::new(LUCKNOW.0, LUCKNOW.1)),
            hold_location: false,
            hold_appends: false,
            renders: 0,
            location_requests: 0,
            unsubscribed: Vec::new(),
            pending_locations: Vec::new(),
            pending_appends: Vec::new(),
            subscriptions: HashMap::new(),
        }
    }
}

impl TestShell {
    pub fn send(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        self.drain(&mut queue);
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    pub fn open_subscriptions(&self) -> Vec<SubscriptionId> {
        self.subscriptions.keys().copied().collect()
    }

    pub fn release_location(&mut self) {
        let mut queue = VecDeque::new();
        for mut request in std::mem::take(&mut self.pending_locations) {
            let update = self
                .app
                .resolve(&mut request, self.location.clone())
                .expect("geolocation resolves");
            self.absorb(update, &mut queue);
        }
        self.drain(&mut queue);
    }

    pub fn release_appends(&mut self) {
        let mut queue = VecDeque::new();
        for request in std::mem::take(&mut self.pending_appends) {
            self.answer_store(request, &mut queue);
        }
        self.drain(&mut queue);
    }

    /// Pushes the store's current contents to every open subscription.
    pub fn publish(&mut self) {
        let mut queue = VecDeque::new();
        let ids = self.open_subscriptions();
        for id in ids {
            self.push_snapshot(id, &mut queue);
        }
        self.drain(&mut queue);
    }

    pub fn fail_subscription(&mut self, id: SubscriptionId, error: StoreError) {
        let mut queue = VecDeque::new();
        if let Some((_, mut request)) = self.subscriptions.remove(&id) {
            let update = self
                .app
                .resolve(&mut request, Err(error))
                .expect("subscription resolves");
            self.absorb(update, &mut queue);
        }
        self.drain(&mut queue);
    }

    fn drain(&mut self, queue: &mut VecDeque<Event>) {
        while let Some(event) = queue.pop_front() {
            let update = self.app.update(event, &mut self.model);
            self.absorb(update, queue);
        }
    }

    fn absorb(&mut self, update: Update<Effect, Event>, queue: &mut VecDeque<Event>) {
        queue.extend(update.events);
        for effect in update.effects {
            self.handle(effect, queue);
        }
    }

    fn handle(&mut self, effect: Effect, queue: &mut VecDeque<Event>) {
        match effect {
            Effect::Render(_) => self.renders += 1,
            Effect::Geolocation(mut request) => {
                self.location_requests += 1;
                if self.hold_location {
                    self.pending_locations.push(request);
                    return;
                }
                let update = self
                    .app
                    .resolve(&mut request, self.location.clone())
                    .expect("geolocation resolves");
                self.absorb(update, queue);
            }
            Effect::RequestStore(request) => {
                let is_append = matches!(request.operation, StoreOperation::Append { .. });
                if is_append && self.hold_appends {
                    self.pending_appends.push(request);
                    return;
                }
                self.answer_store(request, queue);
            }
        }
    }

    fn answer_store(&mut self, mut request: Request<StoreOperation>, queue: &mut VecDeque<Event>) {
        match request.operation.clone() {
            StoreOperation::Append { collection, record } => {
                let result = self
                    .store
                    .append(&collection, record)
                    .map(|id| StoreOutput::Appended { id });
                let stored = result.is_ok();
                let update = self
                    .app
                    .resolve(&mut request, result)
                    .expect("append resolves");
                self.absorb(update, queue);

                if stored {
                    let ids = self.open_subscriptions();
                    for id in ids {
                        self.push_snapshot(id, queue);
                    }
                }
            }
            StoreOperation::Subscribe {
                subscription,
                query,
            } => {
                let initial = self
                    .store
                    .query(&query)
                    .map(|records| StoreOutput::Snapshot { records });
                let accepted = initial.is_ok();
                let update = self
                    .app
                    .resolve(&mut request, initial)
                    .expect("subscription resolves");
                if accepted {
                    self.subscriptions.insert(subscription, (query, request));
                }
                self.absorb(update, queue);
            }
            StoreOperation::Unsubscribe { subscription } => {
                self.subscriptions.remove(&subscription);
                self.unsubscribed.push(subscription);
            }
        }
    }

    fn push_snapshot(&mut self, id: SubscriptionId, queue: &mut VecDeque<Event>) {
        let Some((query, request)) = self.subscriptions.get_mut(&id) else {
            return;
        };
        let output = self
            .store
            .query(query)
            .map(|records| StoreOutput::Snapshot { records });
        let update = self
            .app
            .resolve(request, output)
            .expect("snapshot resolves");
        self.absorb(update, queue);
    }
}
