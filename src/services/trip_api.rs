use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{
    error::AppError,
    models::trip::{Identifier, Trip},
};

/// The two calls the admin view makes against the trip-management API.
#[async_trait]
pub trait TripApi: Send + Sync {
    async fn fetch_trips(&self) -> Result<Vec<Trip>, AppError>;

    /// Returns the parsed response body, `None` when the server sent no body.
    async fn update_trip_status(
        &self,
        trip_id: &Identifier,
        status: &str,
    ) -> Result<Option<Value>, AppError>;
}

#[derive(Serialize)]
struct StatusUpdate<'a> {
    status: &'a str,
}

/// reqwest-backed client. Single attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct TripApiClient {
    client: Client,
    base: Url,
}

impl TripApiClient {
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!("trip api base cannot hold a path: {}", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl TripApi for TripApiClient {
    async fn fetch_trips(&self) -> Result<Vec<Trip>, AppError> {
        let url = self.endpoint(&["trips"])?;
        debug!(%url, "fetching trips");
        let trips = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Trip>>()
            .await?;
        Ok(trips)
    }

    async fn update_trip_status(
        &self,
        trip_id: &Identifier,
        status: &str,
    ) -> Result<Option<Value>, AppError> {
        let key = trip_id.to_string();
        let url = self.endpoint(&["trips", &key, "status"])?;
        debug!(%url, status, "updating trip status");
        let body = self
            .client
            .post(url)
            .json(&StatusUpdate { status })
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }
}
