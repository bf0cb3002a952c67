use std::sync::Arc;

use crate::{config::AppConfig, view::TripListView};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub trips: Arc<TripListView>,
}

impl AppState {
    pub fn new(config: AppConfig, trips: TripListView) -> Self {
        Self {
            config,
            trips: Arc::new(trips),
        }
    }
}
