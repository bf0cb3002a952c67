use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::trip::{Identifier, Trip, STATUS_COMPLETED},
    services::trip_api::TripApi,
    view::render::{render, TripRow},
};

#[derive(Default)]
struct ViewState {
    trips: Vec<Trip>,
    mounted: bool,
    /// Bumped on every mount and unmount; a fetch only lands if its generation is current.
    generation: u64,
    fetch: Option<JoinHandle<()>>,
}

/// Local trip list kept by the admin page.
///
/// The sequence is only written from here: by the fetch task of the current
/// mount and by [`TripListView::complete`] once the API accepted the update.
/// The mutex is never held across an await.
pub struct TripListView {
    api: Arc<dyn TripApi>,
    state: Arc<Mutex<ViewState>>,
    settled: Arc<watch::Sender<u64>>,
}

impl TripListView {
    pub fn new(api: Arc<dyn TripApi>) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            api,
            state: Arc::new(Mutex::new(ViewState::default())),
            settled: Arc::new(settled),
        }
    }

    /// Resets the list and starts exactly one fetch scoped to this mount.
    ///
    /// Must be called from within a tokio runtime. A previous mount's fetch is
    /// aborted and its result, should it still arrive, is discarded.
    pub fn mount(&self) {
        let mut state = lock(&self.state);
        if let Some(previous) = state.fetch.take() {
            previous.abort();
        }
        state.generation += 1;
        state.mounted = true;
        state.trips.clear();

        let generation = state.generation;
        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.state);
        let settled = Arc::clone(&self.settled);
        state.fetch = Some(tokio::spawn(async move {
            let result = api.fetch_trips().await;
            {
                let mut state = lock(&shared);
                if state.generation != generation {
                    debug!(generation, "discarding trips fetched for a stale mount");
                    return;
                }
                match result {
                    Ok(trips) => {
                        info!(count = trips.len(), "trips loaded");
                        state.trips = trips;
                    }
                    Err(err) => warn!("fetching trips failed: {err}"),
                }
                state.fetch = None;
            }
            settled.send_replace(generation);
        }));
        debug!(generation, "trip list mounted");
    }

    /// Tears the view down. Any in-flight fetch is aborted and late results are dropped.
    pub fn unmount(&self) {
        let mut state = lock(&self.state);
        if let Some(fetch) = state.fetch.take() {
            fetch.abort();
        }
        state.generation += 1;
        state.mounted = false;
        state.trips.clear();
        self.settled.send_replace(state.generation);
        debug!("trip list unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.state).mounted
    }

    /// Resolves once the fetch of the current mount finished, whether it succeeded or not.
    pub async fn settled(&self) {
        let target = lock(&self.state).generation;
        let mut done = self.settled.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = done.wait_for(|generation| *generation >= target).await;
    }

    pub fn snapshot(&self) -> Vec<Trip> {
        lock(&self.state).trips.clone()
    }

    pub fn rows(&self) -> Vec<TripRow> {
        render(&lock(&self.state).trips)
    }

    /// Asks the API to complete the trip with this row key, then patches the
    /// local copy. The response body is not trusted; only success matters.
    ///
    /// The patch is dropped if the view was unmounted or remounted meanwhile.
    /// Nothing guards against a second call while the first is in flight:
    /// both requests reach the API.
    pub async fn complete(&self, key: &str) -> Result<(), AppError> {
        let (trip_id, generation) = {
            let state = lock(&self.state);
            let trip = state
                .trips
                .iter()
                .find(|trip| trip.key() == key)
                .ok_or(AppError::NotFound)?;
            if trip.is_completed() {
                return Err(AppError::BadRequest(format!(
                    "trip {key} is already completed"
                )));
            }
            (trip.id.clone(), state.generation)
        };

        let response = self
            .api
            .update_trip_status(&trip_id, STATUS_COMPLETED)
            .await
            .inspect_err(|err| warn!(trip = %trip_id, "completing trip failed: {err}"))?;
        debug!(trip = %trip_id, ?response, "status update acknowledged");

        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!(trip = %trip_id, "view unmounted or remounted before the update resolved");
            return Ok(());
        }
        state.trips = mark_completed(&state.trips, &trip_id);
        info!(trip = %trip_id, "trip marked completed");
        Ok(())
    }
}

impl Drop for TripListView {
    fn drop(&mut self) {
        if let Some(fetch) = lock(&self.state).fetch.take() {
            fetch.abort();
        }
    }
}

/// Rebuilds the list with the matching trip's status set to `completed`.
pub fn mark_completed(trips: &[Trip], trip_id: &Identifier) -> Vec<Trip> {
    trips
        .iter()
        .map(|trip| {
            if &trip.id == trip_id {
                trip.with_status(STATUS_COMPLETED)
            } else {
                trip.clone()
            }
        })
        .collect()
}

fn lock(state: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
